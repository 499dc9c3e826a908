use types::UserPreferences;

use crate::voice::DEFAULT_VOICE_ID;

/// The shared sample account shown to signed-out and newly signed-up
/// listeners.
pub const DEMO_USER_ID: &str = "demo-user-123";

/// Per-account overrides of the default weekly generation schedule.
///
/// Most accounts follow the seven-day rule enforced by the scheduler;
/// named accounts (the demo account today) can instead reuse their
/// newest completed episode indefinitely, or bring built-in preferences
/// when they have no stored profile.
pub trait AccountPolicy: Send + Sync {
    /// Return the newest completed artifact instead of generating a new
    /// one, when such an artifact exists.
    fn reuse_existing_artifact(&self, user_id: &str) -> bool;

    /// Built-in preferences for accounts without a stored profile.
    fn default_preferences(&self, user_id: &str) -> Option<UserPreferences>;
}

/// No special-cased accounts; every user follows the default schedule.
pub struct NoSpecialAccounts;

impl AccountPolicy for NoSpecialAccounts {
    fn reuse_existing_artifact(&self, _user_id: &str) -> bool {
        false
    }

    fn default_preferences(&self, _user_id: &str) -> Option<UserPreferences> {
        None
    }
}

/// The production policy: the demo account generates at most one
/// episode, then always replays it.
pub struct DemoAccountPolicy {
    account_id: String,
}

impl DemoAccountPolicy {
    #[must_use]
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }
}

impl Default for DemoAccountPolicy {
    fn default() -> Self {
        Self::new(DEMO_USER_ID)
    }
}

impl AccountPolicy for DemoAccountPolicy {
    fn reuse_existing_artifact(&self, user_id: &str) -> bool {
        user_id == self.account_id
    }

    fn default_preferences(&self, user_id: &str) -> Option<UserPreferences> {
        if user_id != self.account_id {
            return None;
        }

        Some(UserPreferences {
            user_id: self.account_id.clone(),
            email: "demo@marketcast.app".to_string(),
            preferred_voice_id: DEFAULT_VOICE_ID.to_string(),
            content: types::ContentPreferences::default(),
            last_podcast_at: None,
            last_podcast_url: None,
        })
    }
}
