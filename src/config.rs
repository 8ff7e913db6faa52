use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::discord::embed::PermalinkPolicy;

/// Default X API base URL.
pub const DEFAULT_X_API_URL: &str = "https://api.x.com";

/// Default delay between a dropped stream and the next connection attempt.
pub const DEFAULT_RECONNECT_SECS: u64 = 5;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy. The struct is built
/// once and handed to each component by reference; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// App-only bearer token for the X API v2.
    pub bearer_token: String,
    /// Discord webhook that receives the notifications.
    pub webhook_url: String,
    /// Handles to follow, normalized (no `@`, deduplicated, order kept).
    pub tracked_users: Vec<String>,
    /// When set, forward this single post and exit instead of streaming.
    pub test_tweet_id: Option<String>,
    /// X API base URL (defaults to https://api.x.com).
    pub api_url: String,
    /// Fixed pause between a dropped stream and the next attempt.
    pub reconnect_delay: Duration,
    /// Where the post permalink shows up in the Discord embed.
    pub permalink_policy: PermalinkPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Never fails on missing values: call one of the `require_*` checks
    /// for the mode you are about to run.
    pub fn load() -> Result<Self> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable lookup.
    ///
    /// Only a malformed `XFORWARD_RECONNECT_SECS` or `XFORWARD_PERMALINK`
    /// is an error here.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let reconnect_secs = match lookup("XFORWARD_RECONNECT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("XFORWARD_RECONNECT_SECS must be a whole number of seconds, got {raw:?}")
            })?,
            None => DEFAULT_RECONNECT_SECS,
        };

        let permalink_policy = match lookup("XFORWARD_PERMALINK") {
            Some(raw) => raw.parse::<PermalinkPolicy>()?,
            None => PermalinkPolicy::default(),
        };

        Ok(Self {
            bearer_token: lookup("X_BEARER_TOKEN").unwrap_or_default(),
            webhook_url: lookup("DISCORD_WEBHOOK_URL").unwrap_or_default(),
            tracked_users: parse_tracked_users(&lookup("TRACKED_USERS").unwrap_or_default()),
            test_tweet_id: lookup("TEST_TWEET_ID")
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            api_url: lookup("X_API_URL").unwrap_or_else(|| DEFAULT_X_API_URL.to_string()),
            reconnect_delay: Duration::from_secs(reconnect_secs),
            permalink_policy,
        })
    }

    /// Check everything the long-running stream mode needs.
    pub fn require_stream(&self) -> Result<()> {
        self.require_send()?;
        if self.tracked_users.is_empty() {
            anyhow::bail!(
                "No TRACKED_USERS configured. Set it to a comma-separated list of handles.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check the credentials needed to fetch a single post and deliver it.
    pub fn require_send(&self) -> Result<()> {
        self.require_api()?;
        if self.webhook_url.is_empty() {
            anyhow::bail!(
                "Missing DISCORD_WEBHOOK_URL. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that the X API bearer token is configured.
    /// Call this before any operation that talks to the X API.
    pub fn require_api(&self) -> Result<()> {
        if self.bearer_token.is_empty() {
            anyhow::bail!(
                "Missing X_BEARER_TOKEN. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }
}

/// Split a comma-separated handle list into normalized handles.
///
/// Entries are trimmed, a leading `@` is dropped, empties are skipped and
/// duplicates (compared case-insensitively, as X handles are) are removed
/// keeping the first spelling.
pub fn parse_tracked_users(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split(',')
        .map(|u| u.trim().trim_start_matches('@').trim())
        .filter(|u| !u.is_empty())
        .filter(|u| seen.insert(u.to_ascii_lowercase()))
        .map(String::from)
        .collect()
}
