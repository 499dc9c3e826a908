//! Narration script generation against the OpenAI chat completion API.
//!
//! Script generation is the one stage that is allowed to fail quietly:
//! any API error, timeout, or empty completion degrades to a fixed,
//! hand-written narration so a run never dies here.
use openai_dive::v1::api::Client;
use openai_dive::v1::resources::chat::{
    ChatCompletionParametersBuilder, ChatMessage, ChatMessageContent,
};
use std::time::Duration;
use tokio::time::timeout;
use types::{MarketContext, UserPreferences};

const FALLBACK_SCRIPT: &str = include_str!("fallback_script.txt");

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_COMPLETION_TOKENS: u32 = 800;
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "You're creating a personalized weekly podcast \
for a trading community member. Your style is conversational, engaging, and \
makes complex financial topics accessible, the way a skilled financial \
journalist presents market insights.

Key characteristics of your voice:
- Conversational and approachable, like talking to a friend
- Uses analogies and everyday language to explain complex concepts
- Includes subtle humor and wit
- Makes data-driven points but keeps them accessible
- Ends with actionable insights or questions for reflection
- Uses phrases like \"Here's the thing\" and \"Let me put this in perspective\"

Dynamic and emotional delivery:
- Vary your tone and pace for emphasis
- Use emotional language that conveys excitement, concern, or confidence
- Build tension and release it with insights
- Use exclamations and questions to engage listeners

Format the script for audio delivery:
- Use natural speech patterns and pauses
- Keep sentences shorter for audio consumption
- Write in natural conversational flow without production notes or \
direction cues

Structure:
1. Personal greeting and week overview
2. Market highlights with community context
3. Key insights or trends
4. Actionable takeaway or question for the week ahead
5. Sign-off with encouragement";

pub trait ScriptSource {
    /// Produce the narration for one episode. Never fails: any model
    /// problem yields the fallback narration instead.
    async fn generate(
        &self,
        preferences: &UserPreferences,
        market: &MarketContext,
    ) -> String;
}

pub struct OpenAiScriptGenerator {
    client: Client,
    model: String,
}

impl OpenAiScriptGenerator {
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(api_key),
            model,
        }
    }
}

impl ScriptSource for OpenAiScriptGenerator {
    async fn generate(
        &self,
        preferences: &UserPreferences,
        market: &MarketContext,
    ) -> String {
        let user_prompt = build_user_prompt(preferences, market);

        let parameters = match ChatCompletionParametersBuilder::default()
            .model(self.model.clone())
            .temperature(TEMPERATURE)
            .max_completion_tokens(MAX_COMPLETION_TOKENS)
            .messages(vec![
                ChatMessage::System {
                    name: None,
                    content: ChatMessageContent::Text(
                        SYSTEM_PROMPT.to_string(),
                    ),
                },
                ChatMessage::User {
                    name: None,
                    content: ChatMessageContent::Text(user_prompt),
                },
            ])
            .build()
        {
            Ok(parameters) => parameters,
            Err(e) => {
                tracing::warn!(
                    "failed to build completion parameters, using fallback script: {e}"
                );
                return FALLBACK_SCRIPT.to_string();
            }
        };

        let response = match timeout(
            COMPLETION_TIMEOUT,
            self.client.chat().create(parameters),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(
                    "script completion failed, using fallback script: {e}"
                );
                return FALLBACK_SCRIPT.to_string();
            }
            Err(_) => {
                tracing::warn!(
                    "script completion timed out after {}s, using fallback script",
                    COMPLETION_TIMEOUT.as_secs()
                );
                return FALLBACK_SCRIPT.to_string();
            }
        };

        let text = response
            .choices
            .first()
            .and_then(|choice| match &choice.message {
                ChatMessage::Assistant {
                    content: Some(ChatMessageContent::Text(text)),
                    ..
                } => Some(text.trim().to_string()),
                _ => None,
            })
            .unwrap_or_default();

        if text.is_empty() {
            tracing::warn!("completion returned no text, using fallback script");
            FALLBACK_SCRIPT.to_string()
        } else {
            text
        }
    }
}

fn build_user_prompt(
    preferences: &UserPreferences,
    market: &MarketContext,
) -> String {
    let content = &preferences.content;

    let mut sections = Vec::new();
    if content.include_market_analysis {
        sections.push("market analysis");
    }
    if content.include_community_highlights {
        sections.push("community highlights");
    }
    if content.include_educational_content {
        sections.push("educational content");
    }
    if content.include_personalized_insights {
        sections.push("personalized insights");
    }

    let mut prompt = format!(
        "Create a personalized weekly podcast script for a community member \
with these preferences:\n\n\
User Profile:\n\
- Email: {}\n\
- Requested content: {}\n\
- Target length: about {} words when read aloud\n\
- Last podcast: {}\n\n\
Market Context:\n\
- Community size: {} active members\n\
- This week's performance: {}\n",
        preferences.email,
        if sections.is_empty() {
            "a general market recap".to_string()
        } else {
            sections.join(", ")
        },
        content.preferred_length.word_target(),
        if preferences.last_podcast_at.is_some() {
            "Previous podcast available"
        } else {
            "First-time listener"
        },
        market.community_size,
        market.weekly_summary,
    );

    if !market.top_performers.is_empty() {
        prompt.push_str("- Top performers: ");
        let performers: Vec<String> = market
            .top_performers
            .iter()
            .map(|p| {
                format!(
                    "{} ({:.1}% return, {:.1}% accuracy)",
                    p.name, p.return_pct, p.accuracy_pct
                )
            })
            .collect();
        prompt.push_str(&performers.join(", "));
        prompt.push('\n');
    }

    if !market.trending_symbols.is_empty() {
        prompt.push_str("- Trending stocks: ");
        let symbols: Vec<String> = market
            .trending_symbols
            .iter()
            .map(|s| {
                format!("{} ({}), {} recommendations", s.company, s.symbol, s.mentions)
            })
            .collect();
        prompt.push_str(&symbols.join("; "));
        prompt.push('\n');
    }

    if !market.macro_summary.is_empty() {
        prompt.push_str("- Macro picture: ");
        prompt.push_str(&market.macro_summary);
        prompt.push('\n');
    }

    prompt.push_str(
        "\nCreate a conversational, engaging script that makes complex \
financial topics accessible. Make it feel personal and relevant to their \
trading journey, with specific numbers and insights valuable to someone \
actively trading and learning.\n\n\
IMPORTANT:\n\
- Always mention company names alongside ticker symbols (e.g., \"Apple \
(AAPL)\", \"Tesla (TSLA)\")\n\
- End the podcast with a mention of \"Marketcast\" to sign off\n\
- Write the script as natural spoken dialogue only. Do not include any \
production notes, direction cues, or bracketed instructions like [pause] \
or [emphasis]. The script should flow naturally as if someone is speaking \
directly to the listener.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{ContentPreferences, PreferredLength, TopPerformer};

    fn preferences() -> UserPreferences {
        UserPreferences {
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            preferred_voice_id: "v1".to_string(),
            content: ContentPreferences {
                include_market_analysis: true,
                include_community_highlights: false,
                include_educational_content: false,
                include_personalized_insights: true,
                preferred_length: PreferredLength::Short,
            },
            last_podcast_at: None,
            last_podcast_url: None,
        }
    }

    #[test]
    fn fallback_script_is_a_complete_narration() {
        assert!(FALLBACK_SCRIPT.split_whitespace().count() > 300);
        assert!(FALLBACK_SCRIPT.contains("Marketcast"));
        // No production cues in the canned text either.
        assert!(!FALLBACK_SCRIPT.contains('['));
    }

    #[test]
    fn user_prompt_reflects_inclusion_flags_and_length() {
        let prompt = build_user_prompt(&preferences(), &MarketContext::sample());

        assert!(prompt.contains("market analysis"));
        assert!(prompt.contains("personalized insights"));
        assert!(!prompt.contains("community highlights,"));
        assert!(prompt.contains("about 300 words"));
        assert!(prompt.contains("First-time listener"));
    }

    #[test]
    fn user_prompt_includes_market_numbers() {
        let market = MarketContext {
            community_size: 99,
            top_performers: vec![TopPerformer {
                name: "Dana Cruz".to_string(),
                return_pct: 4.25,
                accuracy_pct: 61.0,
            }],
            ..MarketContext::default()
        };

        let prompt = build_user_prompt(&preferences(), &market);
        assert!(prompt.contains("99 active members"));
        assert!(prompt.contains("Dana Cruz (4.2% return, 61.0% accuracy)"));
    }

    #[tokio::test]
    async fn unreachable_completion_api_degrades_to_the_fallback() {
        let mut client = Client::new("test-key".to_string());
        // Nothing listens here; the request fails immediately.
        client.set_base_url("http://127.0.0.1:1/v1");
        let generator = OpenAiScriptGenerator {
            client,
            model: "gpt-4".to_string(),
        };

        let script = generator
            .generate(&preferences(), &MarketContext::sample())
            .await;

        assert_eq!(script, FALLBACK_SCRIPT);
    }

    #[test]
    fn user_prompt_skips_empty_snapshot_sections() {
        let prompt =
            build_user_prompt(&preferences(), &MarketContext::default());
        assert!(!prompt.contains("Top performers"));
        assert!(!prompt.contains("Trending stocks"));
        assert!(!prompt.contains("Macro picture"));
    }
}
