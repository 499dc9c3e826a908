//! In-memory profile store, used for local runs and in tests.
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use types::{PodcastArtifact, PodcastStatus, UserPreferences};

use super::{ProfileStore, StoreError};

#[derive(Default)]
pub struct MemoryProfileStore {
    users: RwLock<HashMap<String, UserPreferences>>,
    artifacts: RwLock<Vec<PodcastArtifact>>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, preferences: UserPreferences) {
        self.users
            .write()
            .await
            .insert(preferences.user_id.clone(), preferences);
    }

    pub async fn seed_artifact(&self, artifact: PodcastArtifact) {
        self.artifacts.write().await.push(artifact);
    }
}

impl ProfileStore for MemoryProfileStore {
    async fn preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> =
            self.users.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn put_artifact(
        &self,
        artifact: &PodcastArtifact,
    ) -> Result<(), StoreError> {
        let mut artifacts = self.artifacts.write().await;
        if let Some(existing) =
            artifacts.iter_mut().find(|a| a.id == artifact.id)
        {
            *existing = artifact.clone();
        } else {
            artifacts.push(artifact.clone());
        }
        Ok(())
    }

    async fn set_artifact_status(
        &self,
        artifact_id: &str,
        status: PodcastStatus,
    ) -> Result<(), StoreError> {
        let mut artifacts = self.artifacts.write().await;
        let artifact = artifacts
            .iter_mut()
            .find(|a| a.id == artifact_id)
            .ok_or_else(|| {
                StoreError::Request(format!(
                    "no artifact with id {artifact_id}"
                ))
            })?;
        artifact.status = status;
        Ok(())
    }

    async fn artifacts_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PodcastArtifact>, StoreError> {
        let mut matching: Vec<PodcastArtifact> = self
            .artifacts
            .read()
            .await
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn record_generation(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
        audio_url: &str,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let preferences = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserPreferences {
                user_id: user_id.to_string(),
                ..UserPreferences::default()
            });
        preferences.last_podcast_at = Some(at);
        preferences.last_podcast_url = Some(audio_url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn artifact(id: &str, user_id: &str, day: u32) -> PodcastArtifact {
        PodcastArtifact {
            id: id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
            status: PodcastStatus::Completed,
            ..PodcastArtifact::default()
        }
    }

    #[tokio::test]
    async fn history_is_newest_first_and_bounded() {
        let store = MemoryProfileStore::new();
        store.seed_artifact(artifact("a", "u1", 1)).await;
        store.seed_artifact(artifact("b", "u1", 3)).await;
        store.seed_artifact(artifact("c", "u1", 2)).await;
        store.seed_artifact(artifact("d", "other", 4)).await;

        let history = store.artifacts_for_user("u1", 2).await.unwrap();
        let ids: Vec<&str> =
            history.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[tokio::test]
    async fn latest_completed_skips_other_statuses() {
        let store = MemoryProfileStore::new();
        let mut failed = artifact("newest", "u1", 5);
        failed.status = PodcastStatus::Failed;
        store.seed_artifact(failed).await;
        store.seed_artifact(artifact("older", "u1", 2)).await;

        let latest =
            store.latest_completed_artifact("u1").await.unwrap().unwrap();
        assert_eq!(latest.id, "older");
    }

    #[tokio::test]
    async fn record_generation_upserts_missing_profile() {
        let store = MemoryProfileStore::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();

        store
            .record_generation("fresh", at, "https://audio/ep.wav")
            .await
            .unwrap();

        let preferences =
            store.preferences("fresh").await.unwrap().unwrap();
        assert_eq!(preferences.last_podcast_at, Some(at));
        assert_eq!(
            preferences.last_podcast_url.as_deref(),
            Some("https://audio/ep.wav")
        );
    }
}
