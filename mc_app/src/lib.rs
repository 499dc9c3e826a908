use aws_config::{BehaviorVersion, meta::region::RegionProviderChain};
use figment::{Figment, providers::Env};
use redact::Secret;
use thiserror::Error;

pub trait ContextProvider<Config> {
    fn new(
        config: Config,
        aws_config: aws_config::SdkConfig,
    ) -> impl Future<Output = Self>;
}

/// Initialize the application context with configuration from environment
/// variables.
///
/// Sets up JSON log output first so configuration failures are visible,
/// extracts the job `Config` with figment, and loads the AWS configuration
/// through the default provider chain.
///
/// # Errors
/// If the configuration cannot be extracted from the environment variables.
pub async fn create_app_context<'a, A, Config: serde::Deserialize<'a>>()
-> Result<A, figment::Error>
where
    A: ContextProvider<Config>,
{
    // Batch jobs and scheduled triggers both land in CloudWatch, which
    // adds its own ingestion timestamp and chokes on ANSI codes.
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    let figment = Figment::new().merge(Env::raw());

    let config: Config = figment.extract()?;

    let region_provider =
        RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;

    let context = A::new(config, aws_config).await;

    Ok(context)
}

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to fetch secret: {0}")]
    Fetch(String),
    #[error("secret has no string value")]
    Empty,
}

/// Fetch a plain-string API credential from AWS Secrets Manager.
///
/// The value comes back wrapped in [`redact::Secret`] so it cannot leak
/// through Debug output or structured logs.
pub async fn fetch_api_key(
    secrets_manager: &aws_sdk_secretsmanager::Client,
    secret_id: &str,
) -> Result<Secret<String>, SecretError> {
    let secret = secrets_manager
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("failed to get secret: {:?}", e);
            SecretError::Fetch(e.to_string())
        })?;

    secret
        .secret_string
        .filter(|s| !s.is_empty())
        .map(Secret::new)
        .ok_or(SecretError::Empty)
}
