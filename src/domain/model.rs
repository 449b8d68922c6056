use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 單一儲存格的值（字串、數字或空值）
pub type CellValue = Value;

/// 一列資料：欄位名稱對應到值，保留欄位插入順序
pub type Row = Map<String, Value>;

/// 匯出檔案的預設檔名
pub const EXPORT_FILENAME: &str = "dados_corrigidos.csv";

/// 上傳修正流程下載檔案的前綴
pub const CORRECTED_PREFIX: &str = "corrigido_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn columns_from_rows(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueType {
    DateFormat,
    InvalidCpf,
    InvalidCnpj,
    CpfFormat,
    CnpjFormat,
    TextCase,
    NumberFormat,
    Other(String),
}

impl IssueType {
    pub fn as_str(&self) -> &str {
        match self {
            IssueType::DateFormat => "date_format",
            IssueType::InvalidCpf => "invalid_cpf",
            IssueType::InvalidCnpj => "invalid_cnpj",
            IssueType::CpfFormat => "cpf_format",
            IssueType::CnpjFormat => "cnpj_format",
            IssueType::TextCase => "text_case",
            IssueType::NumberFormat => "number_format",
            IssueType::Other(name) => name,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            IssueType::DateFormat => "Data",
            IssueType::InvalidCpf => "CPF Inválido",
            IssueType::InvalidCnpj => "CNPJ Inválido",
            IssueType::CpfFormat => "Formato CPF",
            IssueType::CnpjFormat => "Formato CNPJ",
            IssueType::TextCase => "Texto",
            IssueType::NumberFormat => "Número",
            IssueType::Other(name) => name,
        }
    }

    pub fn severity(&self) -> IssueSeverity {
        match self {
            IssueType::InvalidCpf | IssueType::InvalidCnpj => IssueSeverity::Error,
            IssueType::DateFormat => IssueSeverity::Info,
            _ => IssueSeverity::Warning,
        }
    }
}

impl From<String> for IssueType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "date_format" => IssueType::DateFormat,
            "invalid_cpf" => IssueType::InvalidCpf,
            "invalid_cnpj" => IssueType::InvalidCnpj,
            "cpf_format" => IssueType::CpfFormat,
            "cnpj_format" => IssueType::CnpjFormat,
            "text_case" => IssueType::TextCase,
            "number_format" => IssueType::NumberFormat,
            _ => IssueType::Other(value),
        }
    }
}

impl From<IssueType> for String {
    fn from(value: IssueType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 伺服器回報的單一儲存格問題
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub row: usize,
    pub column: usize,
    #[serde(default)]
    pub column_name: Option<String>,
    pub issue_type: IssueType,
    #[serde(default)]
    pub value: CellValue,
    #[serde(default)]
    pub suggested_value: Option<CellValue>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Issue {
    /// null 與缺漏都代表沒有自動修正
    pub fn suggestion(&self) -> Option<&CellValue> {
        self.suggested_value.as_ref().filter(|v| !v.is_null())
    }

    pub fn has_suggestion(&self) -> bool {
        self.suggestion().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub row: usize,
    pub column: usize,
    pub column_name: String,
    pub old_value: CellValue,
    pub new_value: CellValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub row: usize,
    pub column: usize,
    pub column_name: String,
    pub suggested_value: CellValue,
}

impl From<&Correction> for CorrectionEntry {
    fn from(correction: &Correction) -> Self {
        Self {
            row: correction.row,
            column: correction.column,
            column_name: correction.column_name.clone(),
            suggested_value: correction.new_value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyCorrectionsRequest {
    pub data: Vec<Row>,
    pub corrections: Vec<CorrectionEntry>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyCorrectionsResponse {
    #[serde(default)]
    pub corrected_data: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

impl AnalyzeResponse {
    /// 沒有 columns 或為空時，使用第一列的欄位順序
    pub fn resolved_columns(&self) -> Vec<String> {
        match &self.columns {
            Some(columns) if !columns.is_empty() => columns.clone(),
            _ => columns_from_rows(&self.data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    #[serde(default)]
    pub issues: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// 分析請求的輸入：上傳檔案或貼上的文字
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzeInput {
    File { name: String, bytes: Vec<u8> },
    Text(String),
}

impl AnalyzeInput {
    pub fn describe(&self) -> String {
        match self {
            AnalyzeInput::File { name, bytes } => format!("file '{}' ({} bytes)", name, bytes.len()),
            AnalyzeInput::Text(text) => format!("pasted text ({} chars)", text.chars().count()),
        }
    }
}
