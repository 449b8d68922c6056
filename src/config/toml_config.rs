use crate::utils::error::{FixError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub api_base: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: Option<String>,
    pub filename: Option<String>,
    pub delimiter: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FixError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| FixError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_BASE})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 分隔符號設定必須剛好一個字元
    pub fn delimiter(&self) -> Result<Option<char>> {
        match self.export.delimiter.as_deref() {
            None => Ok(None),
            Some("\\t") => Ok(Some('\t')),
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Some(c)),
                    _ => Err(FixError::InvalidConfigValueError {
                        field: "export.delimiter".to_string(),
                        value: value.to_string(),
                        reason: "Delimiter must be exactly one character".to_string(),
                    }),
                }
            }
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(api_base) = &self.server.api_base {
            validation::validate_url("server.api_base", api_base)?;
        }
        if let Some(timeout) = self.server.timeout_seconds {
            validation::validate_range("server.timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(path) = &self.export.output_path {
            validation::validate_path("export.output_path", path)?;
        }
        if let Some(name) = &self.export.filename {
            validation::validate_file_name("export.filename", name)?;
        }
        if let Some(delimiter) = self.delimiter()? {
            validation::validate_delimiter("export.delimiter", delimiter)?;
        }
        Ok(())
    }
}
