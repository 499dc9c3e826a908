pub mod dynamodb;
pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;
use types::{PodcastArtifact, PodcastStatus, UserPreferences};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),
    #[error("failed to convert stored item: {0}")]
    Serde(String),
}

/// Persistence for listener profiles and generated episode artifacts.
pub trait ProfileStore {
    /// Look up a listener's stored preferences, `None` when the profile
    /// does not exist.
    async fn preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, StoreError>;

    /// All known listener ids, for batch generation.
    async fn user_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Insert or replace an artifact row.
    async fn put_artifact(
        &self,
        artifact: &PodcastArtifact,
    ) -> Result<(), StoreError>;

    /// Transition an existing artifact to a new status.
    async fn set_artifact_status(
        &self,
        artifact_id: &str,
        status: PodcastStatus,
    ) -> Result<(), StoreError>;

    /// Artifacts for one listener, newest first, at most `limit`.
    async fn artifacts_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PodcastArtifact>, StoreError>;

    /// The newest completed artifact for a listener, when one exists.
    async fn latest_completed_artifact(
        &self,
        user_id: &str,
    ) -> Result<Option<PodcastArtifact>, StoreError> {
        let artifacts = self.artifacts_for_user(user_id, 25).await?;
        Ok(artifacts
            .into_iter()
            .find(|a| a.status == PodcastStatus::Completed))
    }

    /// Record on the profile that an episode was generated: the
    /// generation timestamp and the episode URL.
    async fn record_generation(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
        audio_url: &str,
    ) -> Result<(), StoreError>;
}
