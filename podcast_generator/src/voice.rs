//! Speech synthesis against the ElevenLabs text-to-speech API.
//!
//! Unlike script generation there is no canned fallback audio, so every
//! failure here is fatal to the run and surfaced to the caller.
use redact::Secret;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_VOICE_ID: &str = "EozfaQ3ZX0esAp1cW5nG";

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(120);
const VOICE_MODEL_ID: &str = "eleven_monolingual_v1";

/// Output rate requested from the API; matches the mixer's working rate
/// so narration never needs resampling.
const VOICE_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Error)]
pub enum VoiceError {
    /// The API credential is missing. Operator-actionable, as opposed to
    /// the transient request failures below.
    #[error("text-to-speech API key is not configured")]
    NotConfigured,
    #[error("text-to-speech request failed with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("text-to-speech request failed: {0}")]
    Transport(String),
    #[error("failed to wrap synthesized PCM as WAV: {0}")]
    Encode(String),
}

pub trait VoiceSynth {
    async fn synthesize(
        &self,
        script: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, VoiceError>;
}

pub struct ElevenLabsSynthesizer {
    http: reqwest::Client,
    api_key: Option<Secret<String>>,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    #[must_use]
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: ELEVENLABS_BASE_URL.to_string(),
        }
    }
}

impl VoiceSynth for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        script: &str,
        voice_id: &str,
    ) -> Result<Vec<u8>, VoiceError> {
        let api_key = self.api_key.as_ref().ok_or(VoiceError::NotConfigured)?;

        tracing::info!(
            voice_id,
            script_len = script.len(),
            "synthesizing narration"
        );

        let url = format!(
            "{}/text-to-speech/{}?output_format=pcm_44100",
            self.base_url, voice_id
        );

        let response = self
            .http
            .post(&url)
            .header("xi-api-key", api_key.expose_secret().as_str())
            .timeout(SYNTHESIS_TIMEOUT)
            .json(&serde_json::json!({
                "text": script,
                "model_id": VOICE_MODEL_ID,
                "voice_settings": {
                    // Low stability and a style weight for an expressive,
                    // varied read rather than a flat one.
                    "stability": 0.3,
                    "similarity_boost": 0.7,
                    "style": 0.4,
                    "use_speaker_boost": true
                }
            }))
            .send()
            .await
            .map_err(|e| VoiceError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let pcm = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Transport(e.to_string()))?;

        tracing::info!(audio_bytes = pcm.len(), "narration synthesized");

        pcm_to_wav(&pcm, VOICE_SAMPLE_RATE)
    }
}

/// Wrap raw little-endian 16-bit mono PCM in a WAV container so every
/// buffer handed to the mixer is uniform.
fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, VoiceError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| VoiceError::Encode(e.to_string()))?;
        for pair in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|e| VoiceError::Encode(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| VoiceError::Encode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
