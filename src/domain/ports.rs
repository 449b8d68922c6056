use crate::domain::model::{
    AnalyzeInput, AnalyzeResponse, ApplyCorrectionsRequest, ApplyCorrectionsResponse,
    HealthStatus, UploadResponse,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 寫入後檔案的完整路徑
    fn location(&self, path: &str) -> String;
}

/// 資料清理伺服器提供的端點
#[async_trait]
pub trait CorrectionService: Send + Sync {
    async fn health(&self) -> Result<HealthStatus>;
    async fn analyze(&self, input: AnalyzeInput) -> Result<AnalyzeResponse>;
    async fn apply_corrections(
        &self,
        request: &ApplyCorrectionsRequest,
    ) -> Result<ApplyCorrectionsResponse>;
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadResponse>;
    async fn correct(&self, filename: &str) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn output_path(&self) -> &str;
    fn export_filename(&self) -> &str;
    /// `None` 表示由輸入內容判斷分隔符號
    fn delimiter(&self) -> Option<char>;
    fn timeout_seconds(&self) -> u64;
}
