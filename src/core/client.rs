use crate::domain::model::{
    AnalyzeInput, AnalyzeResponse, ApplyCorrectionsRequest, ApplyCorrectionsResponse,
    HealthStatus, UploadResponse,
};
use crate::domain::ports::CorrectionService;
use crate::utils::error::{FixError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// 透過 HTTP 呼叫資料清理伺服器
#[derive(Debug, Clone)]
pub struct HttpCorrectionService {
    client: Client,
    base_url: String,
}

impl HttpCorrectionService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 非 2xx 回應轉為錯誤；伺服器以 `{"error": "..."}` 回報時取出訊息
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("Response status: {}", status);
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(text);

        Err(FixError::HttpStatus {
            status: status.as_u16(),
            body,
        })
    }

    fn file_part(file_name: &str, bytes: Vec<u8>) -> Part {
        Part::bytes(bytes).file_name(file_name.to_string())
    }
}

#[async_trait]
impl CorrectionService for HttpCorrectionService {
    async fn health(&self) -> Result<HealthStatus> {
        let url = self.url("/api/health");
        tracing::debug!("GET {}", url);
        let response = Self::check_status(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn analyze(&self, input: AnalyzeInput) -> Result<AnalyzeResponse> {
        let url = self.url("/api/analyze");
        tracing::debug!("POST {} with {}", url, input.describe());

        let form = match input {
            AnalyzeInput::File { name, bytes } => {
                Form::new().part("file", Self::file_part(&name, bytes))
            }
            AnalyzeInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(FixError::EmptyInput {
                        message: "No data to analyze".to_string(),
                    });
                }
                Form::new().text("data", text)
            }
        };

        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check_status(response).await?;
        let analysis: AnalyzeResponse = response.json().await?;

        tracing::info!(
            "Analysis returned {} rows and {} issues",
            analysis.data.len(),
            analysis.issues.len()
        );
        Ok(analysis)
    }

    async fn apply_corrections(
        &self,
        request: &ApplyCorrectionsRequest,
    ) -> Result<ApplyCorrectionsResponse> {
        let url = self.url("/api/apply_corrections");
        tracing::debug!(
            "POST {} with {} corrections",
            url,
            request.corrections.len()
        );

        let response = self.client.post(&url).json(request).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse> {
        let url = self.url("/upload");
        tracing::debug!("POST {} with file '{}'", url, file_name);

        let form = Form::new().part("file", Self::file_part(file_name, bytes));
        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::check_status(response).await?;

        // 上傳端點在 2xx 時仍可能夾帶 error 欄位
        let body: serde_json::Value = response.json().await?;
        if let Some(message) = body.get("error").and_then(|e| e.as_str()) {
            return Err(FixError::ServerError {
                message: message.to_string(),
            });
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn correct(&self, filename: &str) -> Result<Vec<u8>> {
        let url = self.url("/correct");
        tracing::debug!("POST {} for '{}'", url, filename);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "filename": filename }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
