use crate::core::csv_codec::{self, cell_to_string, DEFAULT_DELIMITER};
use crate::core::session::{ApplyAllReport, CorrectionSession};
use crate::core::{ConfigProvider, CorrectionService, Pipeline, Storage};
use crate::domain::model::{AnalyzeInput, Issue, IssueSeverity, UploadResponse, CORRECTED_PREFIX};
use crate::utils::error::{FixError, Result};
use std::path::{Path, PathBuf};

/// 分析請求的資料來源
#[derive(Debug, Clone)]
pub enum InputSource {
    File(PathBuf),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub filename: String,
    pub delimiter: Option<char>,
}

impl ExportOptions {
    pub fn from_config<P: ConfigProvider>(config: &P) -> Self {
        Self {
            filename: config.export_filename().to_string(),
            delimiter: config.delimiter(),
        }
    }
}

/// 修正步驟的結果，交給 load 階段輸出
#[derive(Debug)]
pub struct FixOutcome {
    pub session: CorrectionSession,
    pub report: ApplyAllReport,
    pub delimiter: char,
}

pub fn describe_issue(issue: &Issue) -> String {
    let column = issue
        .column_name
        .clone()
        .unwrap_or_else(|| issue.column.to_string());
    let mut line = format!(
        "Linha {}, Coluna {} [{}] '{}'",
        issue.row + 1,
        column,
        issue.issue_type.label(),
        cell_to_string(&issue.value)
    );
    if let Some(suggestion) = issue.suggestion() {
        line.push_str(&format!(" -> '{}'", cell_to_string(suggestion)));
    }
    if let Some(description) = issue.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(&format!(" ({})", description));
    }
    line
}

/// 加上表格中目前的儲存格內容；找不到儲存格時註明原因
pub fn describe_outstanding(session: &CorrectionSession, issue: &Issue) -> String {
    let line = describe_issue(issue);
    match session.cell(issue.row, issue.column) {
        Ok(Some(current)) if current != &issue.value => {
            format!("{} [atual: '{}']", line, cell_to_string(current))
        }
        Ok(_) => line,
        Err(e) => format!("{} [{}]", line, e),
    }
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| FixError::EmptyInput {
            message: format!("'{}' is not a file path", path.display()),
        })
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(FixError::EmptyInput {
            message: format!("'{}' is empty", path.display()),
        });
    }
    Ok(bytes)
}

fn apply_fixes(mut session: CorrectionSession, apply: bool, delimiter: char) -> FixOutcome {
    let report = if apply {
        session.apply_all()
    } else {
        tracing::info!("Review-only mode, no corrections applied");
        ApplyAllReport::default()
    };

    for issue in session.issues() {
        match issue.issue_type.severity() {
            IssueSeverity::Error => {
                tracing::warn!("❌ {}", describe_outstanding(&session, issue))
            }
            _ => tracing::info!("⚠️  {}", describe_outstanding(&session, issue)),
        }
    }

    FixOutcome {
        session,
        report,
        delimiter,
    }
}

async fn export_csv<S: Storage>(
    storage: &S,
    filename: &str,
    session: &CorrectionSession,
    delimiter: char,
) -> Result<String> {
    let csv = session.to_csv(delimiter);
    tracing::debug!("Writing {} bytes of CSV to '{}'", csv.len(), filename);
    storage.write_file(filename, csv.as_bytes()).await?;
    Ok(storage.location(filename))
}

/// 送到伺服器分析、套用建議修正、輸出 CSV，並可將修正回傳伺服器
pub struct AnalyzePipeline<S: Storage, C: CorrectionService> {
    storage: S,
    service: C,
    source: InputSource,
    options: ExportOptions,
    apply: bool,
    push: bool,
}

impl<S: Storage, C: CorrectionService> AnalyzePipeline<S, C> {
    pub fn new(storage: S, service: C, source: InputSource, options: ExportOptions) -> Self {
        Self {
            storage,
            service,
            source,
            options,
            apply: true,
            push: false,
        }
    }

    pub fn review_only(mut self, review_only: bool) -> Self {
        self.apply = !review_only;
        self
    }

    pub fn push_to_server(mut self, push: bool) -> Self {
        self.push = push;
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: CorrectionService> Pipeline for AnalyzePipeline<S, C> {
    type Extracted = CorrectionSession;
    type Transformed = FixOutcome;

    async fn extract(&self) -> Result<CorrectionSession> {
        let input = match &self.source {
            InputSource::File(path) => AnalyzeInput::File {
                name: file_name_of(path)?,
                bytes: read_input(path).await?,
            },
            InputSource::Text(text) => AnalyzeInput::Text(text.trim().to_string()),
        };

        let analysis = self.service.analyze(input).await?;
        let mut session = CorrectionSession::new();
        session.load_analysis(analysis);
        Ok(session)
    }

    async fn transform(&self, session: CorrectionSession) -> Result<FixOutcome> {
        let delimiter = self.options.delimiter.unwrap_or(DEFAULT_DELIMITER);
        Ok(apply_fixes(session, self.apply, delimiter))
    }

    async fn load(&self, mut outcome: FixOutcome) -> Result<String> {
        if self.push && !outcome.session.corrections().is_empty() {
            let request = outcome.session.correction_request();
            let response = self.service.apply_corrections(&request).await?;
            tracing::info!(
                "☁️  Server applied {} corrections",
                request.corrections.len()
            );
            outcome.session.replace_rows(response.corrected_data);
        } else if self.push {
            tracing::info!("No corrections to send to the server");
        }

        export_csv(
            &self.storage,
            &self.options.filename,
            &outcome.session,
            outcome.delimiter,
        )
        .await
    }
}

/// 不經伺服器：讀取本機 CSV 與先前儲存的問題清單後套用修正
pub struct LocalPipeline<S: Storage> {
    storage: S,
    csv_path: PathBuf,
    issues_path: Option<PathBuf>,
    options: ExportOptions,
}

impl<S: Storage> LocalPipeline<S> {
    pub fn new(
        storage: S,
        csv_path: PathBuf,
        issues_path: Option<PathBuf>,
        options: ExportOptions,
    ) -> Self {
        Self {
            storage,
            csv_path,
            issues_path,
            options,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for LocalPipeline<S> {
    type Extracted = (CorrectionSession, char);
    type Transformed = FixOutcome;

    async fn extract(&self) -> Result<(CorrectionSession, char)> {
        let bytes = read_input(&self.csv_path).await?;
        let text = String::from_utf8_lossy(&bytes);
        let delimiter = self
            .options
            .delimiter
            .unwrap_or_else(|| csv_codec::sniff_delimiter(&text));
        tracing::debug!("Using delimiter '{}'", delimiter.escape_default());

        let table = csv_codec::parse_csv(&text, delimiter)?;
        let issues: Vec<Issue> = match &self.issues_path {
            Some(path) => serde_json::from_slice(&tokio::fs::read(path).await?)?,
            None => Vec::new(),
        };
        tracing::info!(
            "Loaded {} rows and {} issues from disk",
            table.len(),
            issues.len()
        );

        let mut session = CorrectionSession::new();
        session.load_table(table, issues);
        Ok((session, delimiter))
    }

    async fn transform(&self, data: (CorrectionSession, char)) -> Result<FixOutcome> {
        let (session, delimiter) = data;
        Ok(apply_fixes(session, true, delimiter))
    }

    async fn load(&self, outcome: FixOutcome) -> Result<String> {
        export_csv(
            &self.storage,
            &self.options.filename,
            &outcome.session,
            outcome.delimiter,
        )
        .await
    }
}

#[derive(Debug)]
pub struct CorrectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// 上傳檔案，由伺服器修正後下載為 `corrigido_<原檔名>`
pub struct UploadPipeline<S: Storage, C: CorrectionService> {
    storage: S,
    service: C,
    path: PathBuf,
}

impl<S: Storage, C: CorrectionService> UploadPipeline<S, C> {
    pub fn new(storage: S, service: C, path: PathBuf) -> Self {
        Self {
            storage,
            service,
            path,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: CorrectionService> Pipeline for UploadPipeline<S, C> {
    type Extracted = (String, UploadResponse);
    type Transformed = CorrectedFile;

    async fn extract(&self) -> Result<(String, UploadResponse)> {
        let name = file_name_of(&self.path)?;
        let bytes = read_input(&self.path).await?;
        let uploaded = self.service.upload(&name, bytes).await?;

        tracing::info!("✅ Upload complete: {}", name);
        tracing::info!("Detected {} possible issues", uploaded.issues.len());
        Ok((name, uploaded))
    }

    async fn transform(&self, data: (String, UploadResponse)) -> Result<CorrectedFile> {
        let (name, uploaded) = data;
        let bytes = self.service.correct(&uploaded.filename).await?;
        Ok(CorrectedFile {
            name: format!("{}{}", CORRECTED_PREFIX, name),
            bytes,
        })
    }

    async fn load(&self, file: CorrectedFile) -> Result<String> {
        self.storage.write_file(&file.name, &file.bytes).await?;
        tracing::info!("📦 Corrected file saved ({} bytes)", file.bytes.len());
        Ok(self.storage.location(&file.name))
    }
}
