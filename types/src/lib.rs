use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target spoken length for a generated episode.
///
/// Roughly two, three, and five minutes of narration respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredLength {
    Short,
    Medium,
    Long,
}

impl PreferredLength {
    /// Word budget handed to the script model for this length.
    #[must_use]
    pub const fn word_target(self) -> u32 {
        match self {
            Self::Short => 300,
            Self::Medium => 450,
            Self::Long => 750,
        }
    }
}

impl Default for PreferredLength {
    fn default() -> Self {
        Self::Medium
    }
}

/// Which content sections a listener wants in their episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPreferences {
    pub include_market_analysis: bool,
    pub include_community_highlights: bool,
    pub include_educational_content: bool,
    pub include_personalized_insights: bool,
    #[serde(default)]
    pub preferred_length: PreferredLength,
}

impl Default for ContentPreferences {
    fn default() -> Self {
        Self {
            include_market_analysis: true,
            include_community_highlights: true,
            include_educational_content: true,
            include_personalized_insights: true,
            preferred_length: PreferredLength::default(),
        }
    }
}

/// Per-listener podcast profile, owned by the user profile store.
///
/// The generator treats this as read-only; only the last-generation
/// bookkeeping fields are written back after a successful run. Extra
/// fields in stored records are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserPreferences {
    pub user_id: String,

    pub email: String,

    #[serde(default)]
    pub preferred_voice_id: String,

    #[serde(default)]
    pub content: ContentPreferences,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_podcast_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_podcast_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TopPerformer {
    pub name: String,
    pub return_pct: f64,
    pub accuracy_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrendingSymbol {
    pub symbol: String,
    pub company: String,
    pub mentions: u32,
}

/// Snapshot of the community and market picture fed to the script
/// model. Every field is defaulted so a partial snapshot still
/// deserializes; the prompt builder skips whatever is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MarketContext {
    #[serde(default)]
    pub community_size: u32,

    #[serde(default)]
    pub weekly_summary: String,

    #[serde(default)]
    pub top_performers: Vec<TopPerformer>,

    #[serde(default)]
    pub trending_symbols: Vec<TrendingSymbol>,

    #[serde(default)]
    pub macro_summary: String,
}

impl MarketContext {
    /// A representative snapshot used when no live market feed is wired
    /// up (demo episodes, local runs).
    #[must_use]
    pub fn sample() -> Self {
        Self {
            community_size: 1250,
            weekly_summary: "Strong tech sector gains".to_string(),
            top_performers: vec![
                TopPerformer {
                    name: "Alex Chen".to_string(),
                    return_pct: 12.5,
                    accuracy_pct: 85.2,
                },
                TopPerformer {
                    name: "Sarah Johnson".to_string(),
                    return_pct: 9.8,
                    accuracy_pct: 78.9,
                },
            ],
            trending_symbols: vec![
                TrendingSymbol {
                    symbol: "AAPL".to_string(),
                    company: "Apple".to_string(),
                    mentions: 45,
                },
                TrendingSymbol {
                    symbol: "TSLA".to_string(),
                    company: "Tesla".to_string(),
                    mentions: 38,
                },
            ],
            macro_summary: "Rates held steady with dovish commentary"
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PodcastStatus {
    #[default]
    Generating,
    Completed,
    Failed,
}

/// Durable record of one generated episode.
///
/// Created with status `generating` when a run starts and transitioned
/// to `completed` or `failed` exactly once; never otherwise updated in
/// place. The incidental track names are embedded for auditability, the
/// audio itself lives behind `audio_url`.
///
/// `audio_url` is either a durable object-store URL or a process-scoped
/// `file://` spool URL; the latter does not survive a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PodcastArtifact {
    pub id: String,

    pub user_id: String,

    pub title: String,

    pub script: String,

    pub audio_url: String,

    /// Spoken length in seconds, measured from the mixed output.
    pub duration: f64,

    pub created_at: DateTime<Utc>,

    pub voice_id: String,

    pub intro_stinger: String,

    pub background_music: String,

    pub status: PodcastStatus,
}

/// Outcome counts for one weekly batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    pub generated: usize,
    pub skipped: usize,
    pub errored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_ignore_unknown_fields() {
        let raw = serde_json::json!({
            "user_id": "u1",
            "email": "u1@example.com",
            "preferred_voice_id": "v1",
            "display_name": "not part of the model",
            "interests": ["trading"],
        });

        let prefs: UserPreferences = serde_json::from_value(raw).unwrap();
        assert_eq!(prefs.user_id, "u1");
        assert!(prefs.content.include_market_analysis);
        assert!(prefs.last_podcast_at.is_none());
    }

    #[test]
    fn market_context_accepts_partial_snapshot() {
        let ctx: MarketContext =
            serde_json::from_value(serde_json::json!({ "community_size": 42 }))
                .unwrap();
        assert_eq!(ctx.community_size, 42);
        assert!(ctx.top_performers.is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PodcastStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
