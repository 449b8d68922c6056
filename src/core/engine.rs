use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct FixEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> FixEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting correction run");

        tracing::info!("🔍 Loading data...");
        let extracted = self.pipeline.extract().await?;

        tracing::info!("🛠️  Applying corrections...");
        let transformed = self.pipeline.transform(extracted).await?;

        tracing::info!("💾 Saving output...");
        let output_path = self.pipeline.load(transformed).await?;

        tracing::info!(
            "Output saved to: {} (took {:?})",
            output_path,
            started.elapsed()
        );
        Ok(output_path)
    }
}
