//! Upload of the mixed episode audio.
//!
//! The primary path is S3 under a key namespaced by owner and timestamp.
//! When the bucket is unavailable (or not configured at all) the bytes
//! are spooled to a process-lifetime temp directory and a `file://` URL
//! is returned instead; callers see both kinds as plain strings, but
//! spool URLs do not survive a restart.
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to write spool file: {0}")]
    Spool(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct UploadedAudio {
    pub url: String,
    pub durable: bool,
}

pub trait AudioStore {
    async fn upload(
        &self,
        user_id: &str,
        bytes: &[u8],
    ) -> Result<UploadedAudio, UploadError>;
}

pub struct S3AudioStore {
    s3: aws_sdk_s3::Client,
    bucket: Option<String>,
    spool: TempDir,
}

impl S3AudioStore {
    pub fn new(
        s3: aws_sdk_s3::Client,
        bucket: Option<String>,
    ) -> std::io::Result<Self> {
        Ok(Self {
            s3,
            bucket,
            spool: tempfile::tempdir()?,
        })
    }
}

impl AudioStore for S3AudioStore {
    async fn upload(
        &self,
        user_id: &str,
        bytes: &[u8],
    ) -> Result<UploadedAudio, UploadError> {
        let file_name =
            format!("podcast_{}.wav", Utc::now().timestamp_millis());

        if let Some(bucket) = &self.bucket {
            let key = format!("podcasts/{user_id}/{file_name}");
            match self
                .s3
                .put_object()
                .bucket(bucket)
                .key(&key)
                .content_type("audio/wav")
                .body(ByteStream::from(bytes.to_vec()))
                .send()
                .await
            {
                Ok(_) => {
                    tracing::info!(key, "episode audio uploaded");
                    return Ok(UploadedAudio {
                        url: format!(
                            "https://{bucket}.s3.amazonaws.com/{key}"
                        ),
                        durable: true,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "object storage upload failed, spooling locally: {e}"
                    );
                }
            }
        }

        let path = self.spool.path().join(format!("{user_id}_{file_name}"));
        tokio::fs::write(&path, bytes).await?;
        tracing::info!("episode audio spooled to {}", path.display());

        Ok(UploadedAudio {
            url: format!("file://{}", path.display()),
            durable: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_s3_client() -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version_latest()
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    #[tokio::test]
    async fn unconfigured_bucket_spools_to_a_file_url() {
        let store = S3AudioStore::new(offline_s3_client(), None).unwrap();

        let uploaded = store.upload("u1", b"episode bytes").await.unwrap();

        assert!(!uploaded.durable);
        assert!(uploaded.url.starts_with("file://"));

        let path = uploaded.url.trim_start_matches("file://");
        assert_eq!(std::fs::read(path).unwrap(), b"episode bytes");
    }

    #[tokio::test]
    async fn spool_urls_are_distinct_per_upload() {
        let store = S3AudioStore::new(offline_s3_client(), None).unwrap();

        let first = store.upload("u1", b"a").await.unwrap();
        let second = store.upload("u2", b"b").await.unwrap();

        assert_ne!(first.url, second.url);
    }
}
