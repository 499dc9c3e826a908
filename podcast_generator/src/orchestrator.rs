//! End-to-end episode generation: script, narration, mix, upload, and
//! persistence, wired through the port traits so every stage is
//! swappable in tests.
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use types::{
    BatchSummary, MarketContext, PodcastArtifact, PodcastStatus,
    UserPreferences,
};
use uuid::Uuid;

use crate::artifact_store::{AudioStore, UploadError};
use crate::assets::AssetSource;
use crate::mixer::EpisodeMixer;
use crate::policy::{AccountPolicy, DemoAccountPolicy};
use crate::profile::{ProfileStore, StoreError};
use crate::script::ScriptSource;
use crate::telemetry::TelemetrySink;
use crate::voice::{VoiceError, VoiceSynth, DEFAULT_VOICE_ID};

/// Minimum days between generated episodes for one listener.
const GENERATION_INTERVAL_DAYS: i64 = 7;

/// Whether a profile is due for a fresh episode. True for first-time
/// listeners and whenever at least the full interval has elapsed since
/// the last one; the boundary itself counts as due.
fn due_for_generation(
    preferences: &UserPreferences,
    now: DateTime<Utc>,
) -> bool {
    preferences.last_podcast_at.is_none_or(|last| {
        now - last >= Duration::days(GENERATION_INTERVAL_DAYS)
    })
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no stored profile for user {0}")]
    UserNotFound(String),
    #[error("voice synthesis stage failed: {0}")]
    Voice(#[from] VoiceError),
    #[error("episode audio upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("profile store failure: {0}")]
    Store(#[from] StoreError),
}

/// A finished run. Warnings carry post-success persistence problems
/// that degraded bookkeeping without losing the episode itself.
#[derive(Debug)]
pub struct GeneratedPodcast {
    pub artifact: PodcastArtifact,
    pub warnings: Vec<String>,
}

pub struct PodcastOrchestrator<P, S, V, A, M, U, T> {
    profiles: P,
    scripts: S,
    voice: V,
    assets: A,
    mixer: M,
    audio: U,
    telemetry: T,
    policy: Box<dyn AccountPolicy>,
}

impl<P, S, V, A, M, U, T> PodcastOrchestrator<P, S, V, A, M, U, T>
where
    P: ProfileStore,
    S: ScriptSource,
    V: VoiceSynth,
    A: AssetSource,
    M: EpisodeMixer,
    U: AudioStore,
    T: TelemetrySink,
{
    pub fn new(
        profiles: P,
        scripts: S,
        voice: V,
        assets: A,
        mixer: M,
        audio: U,
        telemetry: T,
    ) -> Self {
        Self {
            profiles,
            scripts,
            voice,
            assets,
            mixer,
            audio,
            telemetry,
            policy: Box::new(DemoAccountPolicy::default()),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn AccountPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Whether a listener is due for a fresh episode. Unknown listeners
    /// are never due; generation for them is driven by account policy,
    /// not the schedule.
    pub async fn should_generate(
        &self,
        user_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .profiles
            .preferences(user_id)
            .await?
            .is_some_and(|preferences| {
                due_for_generation(&preferences, Utc::now())
            }))
    }

    /// Generate one episode for one listener.
    ///
    /// A placeholder artifact with status `generating` is written
    /// before the expensive stages, so concurrent observers see the run
    /// in flight; it is moved to `failed` on any fatal stage error.
    pub async fn generate_for_user(
        &self,
        user_id: &str,
        market: &MarketContext,
    ) -> Result<GeneratedPodcast, GenerateError> {
        if self.policy.reuse_existing_artifact(user_id) {
            if let Some(artifact) =
                self.profiles.latest_completed_artifact(user_id).await?
            {
                tracing::info!(
                    user_id,
                    artifact_id = %artifact.id,
                    "reusing existing completed episode"
                );
                return Ok(GeneratedPodcast {
                    artifact,
                    warnings: Vec::new(),
                });
            }
        }

        let preferences = match self.profiles.preferences(user_id).await? {
            Some(preferences) => preferences,
            None => self.policy.default_preferences(user_id).ok_or_else(
                || GenerateError::UserNotFound(user_id.to_string()),
            )?,
        };

        let voice_id = if preferences.preferred_voice_id.is_empty() {
            DEFAULT_VOICE_ID.to_string()
        } else {
            preferences.preferred_voice_id.clone()
        };

        let created_at = Utc::now();
        let intro_stinger = self.assets.pick_intro_stinger();
        let intro_track = self.assets.pick_intro_track();
        let outro_track = self.assets.pick_outro_track();

        let mut artifact = PodcastArtifact {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            title: format!(
                "Your Weekly Market Brief - {}",
                created_at.format("%B %-d, %Y")
            ),
            script: String::new(),
            audio_url: String::new(),
            duration: 0.0,
            created_at,
            voice_id: voice_id.clone(),
            intro_stinger: intro_stinger.clone(),
            // Both music bed candidates are part of the episode's
            // audit trail, even though only the intro track is placed.
            background_music: format!("{intro_track} + {outro_track}"),
            status: PodcastStatus::Generating,
        };
        self.profiles.put_artifact(&artifact).await?;

        let script = self.scripts.generate(&preferences, market).await;

        let narration = match self.voice.synthesize(&script, &voice_id).await
        {
            Ok(narration) => narration,
            Err(e) => {
                self.mark_failed(&artifact.id).await;
                return Err(e.into());
            }
        };

        let stinger_bytes = self.assets.load(&intro_stinger).await;
        let intro_bytes = self.assets.load(&intro_track).await;
        let outro_bytes = self.assets.load(&outro_track).await;

        let mixed = self.mixer.mix(
            &stinger_bytes,
            &narration,
            &intro_bytes,
            &outro_bytes,
        );
        let duration = self.mixer.duration_of(&mixed).unwrap_or(0.0);

        let uploaded = match self.audio.upload(user_id, &mixed).await {
            Ok(uploaded) => uploaded,
            Err(e) => {
                self.mark_failed(&artifact.id).await;
                return Err(e.into());
            }
        };

        let mut warnings = Vec::new();
        if !uploaded.durable {
            warnings.push(format!(
                "episode audio is spooled locally at {} and will not \
survive a restart",
                uploaded.url
            ));
        }

        artifact.script = script;
        artifact.audio_url.clone_from(&uploaded.url);
        artifact.duration = duration;
        artifact.status = PodcastStatus::Completed;

        if let Err(e) = self.profiles.put_artifact(&artifact).await {
            tracing::warn!(
                "episode {} generated but its record was not persisted: {e}",
                artifact.id
            );
            warnings.push(format!("episode record was not persisted: {e}"));
        }

        if let Err(e) = self
            .profiles
            .record_generation(user_id, created_at, &uploaded.url)
            .await
        {
            tracing::warn!(
                "profile bookkeeping for {user_id} was not updated: {e}"
            );
            warnings
                .push(format!("profile bookkeeping was not updated: {e}"));
        }

        self.telemetry.podcast_created(&artifact.id, user_id, duration);

        tracing::info!(
            user_id,
            artifact_id = %artifact.id,
            duration,
            "episode generated"
        );

        Ok(GeneratedPodcast { artifact, warnings })
    }

    /// One pass over every known listener: generate for those due,
    /// skip the rest. Failures are isolated per listener so one bad
    /// profile never stops the batch.
    pub async fn run_weekly_job(
        &self,
        market: &MarketContext,
    ) -> Result<BatchSummary, StoreError> {
        let user_ids = self.profiles.user_ids().await?;
        tracing::info!(users = user_ids.len(), "starting weekly episode job");

        let mut summary = BatchSummary::default();
        for user_id in user_ids {
            match self.profiles.preferences(&user_id).await {
                Ok(Some(preferences)) => {
                    if !due_for_generation(&preferences, Utc::now()) {
                        tracing::debug!(
                            user_id,
                            "episode still fresh, skipping"
                        );
                        summary.skipped += 1;
                        continue;
                    }
                }
                Ok(None) => {
                    tracing::warn!(
                        "skipping {user_id}, no stored profile"
                    );
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        "skipping {user_id}, profile lookup failed: {e}"
                    );
                    summary.skipped += 1;
                    continue;
                }
            }

            match self.generate_for_user(&user_id, market).await {
                Ok(generated) => {
                    for warning in &generated.warnings {
                        tracing::warn!(user_id, "{warning}");
                    }
                    summary.generated += 1;
                }
                Err(e) => {
                    tracing::error!(
                        user_id,
                        "episode generation failed: {e}"
                    );
                    summary.errored += 1;
                }
            }
        }

        tracing::info!(
            generated = summary.generated,
            skipped = summary.skipped,
            errored = summary.errored,
            "weekly episode job finished"
        );
        Ok(summary)
    }

    /// Recent episodes for one listener, newest first.
    pub async fn podcast_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PodcastArtifact>, StoreError> {
        self.profiles.artifacts_for_user(user_id, limit).await
    }

    async fn mark_failed(&self, artifact_id: &str) {
        if let Err(e) = self
            .profiles
            .set_artifact_status(artifact_id, PodcastStatus::Failed)
            .await
        {
            tracing::warn!(
                "failed to mark episode {artifact_id} as failed: {e}"
            );
        }
    }
}
