//! DynamoDB-backed profile store.
//!
//! Listener profiles live in a users table keyed by `user_id`; episode
//! artifacts live in a podcasts table keyed by `id` with a
//! `user_id-index` GSI for per-listener history. Artifacts are sorted
//! newest first in memory because the index has no range key.
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use types::{PodcastArtifact, PodcastStatus, UserPreferences};

use super::{ProfileStore, StoreError};

pub struct DynamoProfileStore {
    dynamodb: aws_sdk_dynamodb::Client,
    users_table: String,
    podcasts_table: String,
}

impl DynamoProfileStore {
    #[must_use]
    pub fn new(
        dynamodb: aws_sdk_dynamodb::Client,
        users_table: String,
        podcasts_table: String,
    ) -> Self {
        Self {
            dynamodb,
            users_table,
            podcasts_table,
        }
    }
}

impl ProfileStore for DynamoProfileStore {
    async fn preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<UserPreferences>, StoreError> {
        let output = self
            .dynamodb
            .get_item()
            .table_name(&self.users_table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        output
            .item
            .map(|item| {
                from_item(item).map_err(|e| StoreError::Serde(e.to_string()))
            })
            .transpose()
    }

    async fn user_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut exclusive_start_key = None;

        loop {
            let output = self
                .dynamodb
                .scan()
                .table_name(&self.users_table)
                .projection_expression("user_id")
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?;

            for item in output.items() {
                if let Some(AttributeValue::S(id)) = item.get("user_id") {
                    ids.push(id.clone());
                }
            }

            exclusive_start_key = output.last_evaluated_key;
            if exclusive_start_key.is_none() {
                break;
            }
        }

        Ok(ids)
    }

    async fn put_artifact(
        &self,
        artifact: &PodcastArtifact,
    ) -> Result<(), StoreError> {
        let item =
            to_item(artifact).map_err(|e| StoreError::Serde(e.to_string()))?;

        self.dynamodb
            .put_item()
            .table_name(&self.podcasts_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(())
    }

    async fn set_artifact_status(
        &self,
        artifact_id: &str,
        status: PodcastStatus,
    ) -> Result<(), StoreError> {
        let status = serde_json::to_value(status)
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
            .ok_or_else(|| {
                StoreError::Serde("unserializable status".to_string())
            })?;

        self.dynamodb
            .update_item()
            .table_name(&self.podcasts_table)
            .key("id", AttributeValue::S(artifact_id.to_string()))
            .update_expression("SET #status = :status")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(
                ":status",
                AttributeValue::S(status),
            )
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(())
    }

    async fn artifacts_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PodcastArtifact>, StoreError> {
        let output = self
            .dynamodb
            .query()
            .table_name(&self.podcasts_table)
            .index_name("user_id-index")
            .key_condition_expression("user_id = :user_id")
            .expression_attribute_values(
                ":user_id",
                AttributeValue::S(user_id.to_string()),
            )
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let mut artifacts = output
            .items()
            .iter()
            .map(|item| {
                from_item(item.clone())
                    .map_err(|e| StoreError::Serde(e.to_string()))
            })
            .collect::<Result<Vec<PodcastArtifact>, _>>()?;

        artifacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        artifacts.truncate(limit);
        Ok(artifacts)
    }

    async fn record_generation(
        &self,
        user_id: &str,
        at: DateTime<Utc>,
        audio_url: &str,
    ) -> Result<(), StoreError> {
        self.dynamodb
            .update_item()
            .table_name(&self.users_table)
            .key("user_id", AttributeValue::S(user_id.to_string()))
            .update_expression(
                "SET last_podcast_at = :at, last_podcast_url = :url",
            )
            .expression_attribute_values(
                ":at",
                AttributeValue::S(at.to_rfc3339()),
            )
            .expression_attribute_values(
                ":url",
                AttributeValue::S(audio_url.to_string()),
            )
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(())
    }
}
