use crate::domain::model::{GeneratedResources, Manifest};
use crate::domain::source::SourceLocation;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Destination for generated partitions. Paths are relative to the storage root.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceLocation>>;
    async fn transform(&self, sources: Vec<SourceLocation>) -> Result<GeneratedResources>;
    async fn load(&self, resources: GeneratedResources) -> Result<Manifest>;
}
