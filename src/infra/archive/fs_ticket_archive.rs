use crate::domain::models::delivery::TicketArtifact;
use crate::domain::ports::TicketArchive;
use crate::error::AppError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Last-resort fallback: tickets land on disk as JSON so staff can hand
/// them out manually.
pub struct FsTicketArchive {
    dir: PathBuf,
}

impl FsTicketArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl TicketArchive for FsTicketArchive {
    async fn store(&self, artifact: &TicketArtifact) -> Result<String, AppError> {
        fs::create_dir_all(&self.dir).await
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to create archive dir: {}", e)))?;

        let path = self.dir.join(format!("{}.json", artifact.ticket_id));
        let json = serde_json::to_vec_pretty(artifact)
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to serialize ticket: {}", e)))?;

        fs::write(&path, json).await
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to write ticket archive: {}", e)))?;

        let path_str = path.to_string_lossy().to_string();
        info!("Archived ticket {} to {}", artifact.ticket_id, path_str);
        Ok(path_str)
    }
}
