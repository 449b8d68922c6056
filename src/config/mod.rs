pub mod cli;
pub mod toml_config;

use crate::core::client::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECONDS};
use crate::core::ConfigProvider;
use crate::domain::model::EXPORT_FILENAME;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "sheet-fixer")]
#[command(about = "Analyze spreadsheets on a data-cleaning server and apply suggested fixes")]
pub struct CliConfig {
    /// Base URL of the analysis server
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Directory where output files are written
    #[arg(long, global = true)]
    pub output_path: Option<String>,

    /// CSV delimiter for reading and export (default: ',' or sniffed for local files)
    #[arg(long, global = true)]
    pub delimiter: Option<char>,

    #[arg(long, global = true)]
    pub timeout_seconds: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Send a file or pasted CSV to the server, apply all suggested fixes and export CSV
    Analyze {
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        file: Option<PathBuf>,

        #[arg(long)]
        text: Option<String>,

        /// Only list issues, do not apply corrections
        #[arg(long)]
        review_only: bool,

        /// Send applied corrections back to the server before exporting
        #[arg(long)]
        push: bool,
    },
    /// Upload a file and download the server-corrected version
    Upload {
        #[arg(long)]
        file: PathBuf,
    },
    /// Apply a saved issue list to a local CSV file without contacting the server
    Local {
        #[arg(long)]
        file: PathBuf,

        /// JSON array of issues
        #[arg(long)]
        issues: Option<PathBuf>,
    },
    /// Check that the server is reachable
    Health,
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Analyze {
                file: Some(file), ..
            }
            | Command::Upload { file } => validation::validate_file_extensions(
                "file",
                &[file.display().to_string()],
                &["csv", "xls", "xlsx"],
            ),
            Command::Local { file, issues } => {
                validation::validate_file_extensions(
                    "file",
                    &[file.display().to_string()],
                    &["csv", "txt"],
                )?;
                if let Some(issues) = issues {
                    validation::validate_file_extensions(
                        "issues",
                        &[issues.display().to_string()],
                        &["json"],
                    )?;
                }
                Ok(())
            }
            Command::Analyze {
                text: Some(text), ..
            } if text.trim().is_empty() => Err(crate::utils::error::FixError::EmptyInput {
                message: "Please select a file or paste data".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// 命令列與 TOML 檔合併後的設定；命令列優先
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api_base: String,
    pub output_path: String,
    pub export_filename: String,
    pub delimiter: Option<char>,
    pub timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            export_filename: EXPORT_FILENAME.to_string(),
            delimiter: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Settings {
    pub fn from_toml(file: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_base: file.server.api_base.clone().unwrap_or(defaults.api_base),
            output_path: file.export.output_path.clone().unwrap_or(defaults.output_path),
            export_filename: file.export.filename.clone().unwrap_or(defaults.export_filename),
            delimiter: file.delimiter()?,
            timeout_seconds: file.server.timeout_seconds.unwrap_or(defaults.timeout_seconds),
        })
    }

    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                file
            }
            None => TomlConfig::default(),
        };

        let mut settings = Self::from_toml(&file)?;
        if let Some(api_base) = &cli.api_base {
            settings.api_base = api_base.clone();
        }
        if let Some(output_path) = &cli.output_path {
            settings.output_path = output_path.clone();
        }
        if let Some(delimiter) = cli.delimiter {
            settings.delimiter = Some(delimiter);
        }
        if let Some(timeout) = cli.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_base", &self.api_base)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_name("export_filename", &self.export_filename)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, 3600)?;
        if let Some(delimiter) = self.delimiter {
            validation::validate_delimiter("delimiter", delimiter)?;
        }
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn export_filename(&self) -> &str {
        &self.export_filename
    }

    fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}
