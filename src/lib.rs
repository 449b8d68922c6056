pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, Settings};

pub use core::{
    client::HttpCorrectionService,
    engine::FixEngine,
    pipeline::{AnalyzePipeline, ExportOptions, InputSource, LocalPipeline, UploadPipeline},
    session::CorrectionSession,
};
pub use utils::error::{FixError, Result};
