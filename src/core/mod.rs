pub mod client;
pub mod csv_codec;
pub mod engine;
pub mod pipeline;
pub mod session;

pub use crate::domain::model::{Issue, Row, Table};
pub use crate::domain::ports::{ConfigProvider, CorrectionService, Pipeline, Storage};
pub use crate::utils::error::Result;
