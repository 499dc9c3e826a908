use mc_app::ContextProvider;
use serde::Deserialize;
use std::path::PathBuf;
use types::MarketContext;

use crate::artifact_store::S3AudioStore;
use crate::assets::{AssetLoader, UniformRandom};
use crate::mixer::TimelineMixer;
use crate::orchestrator::PodcastOrchestrator;
use crate::profile::dynamodb::DynamoProfileStore;
use crate::profile::memory::MemoryProfileStore;
use crate::profile::ProfileStore;
use crate::script::OpenAiScriptGenerator;
use crate::telemetry::TracingTelemetry;
use crate::voice::ElevenLabsSynthesizer;

mod artifact_store;
mod assets;
mod mixer;
mod orchestrator;
mod policy;
mod profile;
mod script;
mod telemetry;
mod voice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ProfileStoreKind {
    #[default]
    Dynamodb,
    Memory,
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

#[derive(Debug, Deserialize)]
struct Config {
    users_table: String,
    podcasts_table: String,
    /// Bucket for finished episode audio; unset means spool locally.
    audio_bucket: Option<String>,
    openai_secret_arn: String,
    elevenlabs_secret_arn: Option<String>,
    #[serde(default = "default_openai_model")]
    openai_model: String,
    #[serde(default)]
    profile_store: ProfileStoreKind,
    /// Colon-separated override of the audio asset search path.
    asset_dirs: Option<String>,
    /// JSON market snapshot; unset means the built-in sample.
    market_context_json: Option<String>,
}

struct AppContext {
    config: Config,
    dynamodb: aws_sdk_dynamodb::Client,
    s3: aws_sdk_s3::Client,
    secrets_manager: aws_sdk_secretsmanager::Client,
}

impl ContextProvider<Config> for AppContext {
    async fn new(config: Config, aws_config: aws_config::SdkConfig) -> Self {
        Self {
            config,
            dynamodb: aws_sdk_dynamodb::Client::new(&aws_config),
            s3: aws_sdk_s3::Client::new(&aws_config),
            secrets_manager: aws_sdk_secretsmanager::Client::new(&aws_config),
        }
    }
}

/// Generates personalized weekly market podcasts: a script from the
/// chat model, narration from text-to-speech, a music bed mixed under
/// it, and the finished episode uploaded and recorded per listener.
///
/// Invoked either as `podcast_generator weekly` by the scheduler, or
/// with explicit user ids for ad-hoc runs.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let app = mc_app::create_app_context::<AppContext, Config>().await?;

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} weekly | <user_id> ...", args[0]);
        std::process::exit(1);
    }

    let market = market_context(&app.config);

    match app.config.profile_store {
        ProfileStoreKind::Dynamodb => {
            let profiles = DynamoProfileStore::new(
                app.dynamodb.clone(),
                app.config.users_table.clone(),
                app.config.podcasts_table.clone(),
            );
            run(&app, profiles, &args[1..], &market).await
        }
        ProfileStoreKind::Memory => {
            run(&app, MemoryProfileStore::new(), &args[1..], &market).await
        }
    }
}

async fn run<P: ProfileStore>(
    app: &AppContext,
    profiles: P,
    args: &[String],
    market: &MarketContext,
) -> Result<(), Box<dyn std::error::Error>> {
    let openai_key = match mc_app::fetch_api_key(
        &app.secrets_manager,
        &app.config.openai_secret_arn,
    )
    .await
    {
        Ok(secret) => secret.expose_secret().clone(),
        Err(e) => {
            // The script stage degrades to its canned narration, so a
            // missing model credential is not fatal to the run.
            tracing::warn!(
                "chat model credential unavailable, episodes will use the \
fallback script: {e}"
            );
            String::new()
        }
    };

    let elevenlabs_key = match &app.config.elevenlabs_secret_arn {
        Some(arn) => {
            match mc_app::fetch_api_key(&app.secrets_manager, arn).await {
                Ok(secret) => Some(secret),
                Err(e) => {
                    tracing::warn!(
                        "text-to-speech credential unavailable: {e}"
                    );
                    None
                }
            }
        }
        None => None,
    };

    let assets = match &app.config.asset_dirs {
        Some(dirs) => AssetLoader::new(
            dirs.split(':').map(PathBuf::from).collect(),
            Box::new(UniformRandom),
        ),
        None => AssetLoader::with_default_dirs(Box::new(UniformRandom)),
    };

    let orchestrator = PodcastOrchestrator::new(
        profiles,
        OpenAiScriptGenerator::new(
            openai_key,
            app.config.openai_model.clone(),
        ),
        ElevenLabsSynthesizer::new(elevenlabs_key),
        assets,
        TimelineMixer::default(),
        S3AudioStore::new(app.s3.clone(), app.config.audio_bucket.clone())?,
        TracingTelemetry,
    );

    if args.len() == 1 && args[0] == "weekly" {
        let summary = orchestrator.run_weekly_job(market).await?;
        println!(
            "weekly job finished: {} generated, {} skipped, {} errored",
            summary.generated, summary.skipped, summary.errored
        );
        return Ok(());
    }

    let mut failures = 0usize;
    for user_id in args {
        match orchestrator.generate_for_user(user_id, market).await {
            Ok(generated) => {
                for warning in &generated.warnings {
                    tracing::warn!(user_id, "{warning}");
                }
                println!(
                    "{user_id}: {} ({:.1}s) -> {}",
                    generated.artifact.title,
                    generated.artifact.duration,
                    generated.artifact.audio_url
                );
            }
            Err(e) => {
                tracing::error!(user_id, "episode generation failed: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn market_context(config: &Config) -> MarketContext {
    let Some(raw) = &config.market_context_json else {
        return MarketContext::sample();
    };

    match serde_json::from_str(raw) {
        Ok(market) => market,
        Err(e) => {
            tracing::warn!(
                "invalid market context JSON, using the sample snapshot: {e}"
            );
            MarketContext::sample()
        }
    }
}
