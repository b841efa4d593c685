use crate::core::{Manifest, Pipeline};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<Manifest> {
        tracing::info!("🚀 Starting generation run");

        // Extract
        let sources = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} source locations", sources.len());

        // Transform
        let resources = self.pipeline.transform(sources).await?;
        tracing::info!(
            "🔄 Built {} locations, {} schedules, {} slots in {} partitions",
            resources.locations.len(),
            resources.schedules.len(),
            resources.slot_count(),
            resources.slot_partitions.len()
        );

        // Load
        let manifest = self.pipeline.load(resources).await?;
        tracing::info!("✅ Manifest lists {} outputs", manifest.output.len());

        Ok(manifest)
    }
}
