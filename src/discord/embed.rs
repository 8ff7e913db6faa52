// Enrichment and Discord embed formatting.
//
// A stream frame carries the post plus its own `includes` side-tables.
// We resolve the author and the first photo from those tables only (no
// cache across frames) and lay the result out as a single-embed webhook
// message.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::output::truncate_chars;
use crate::x::types::{Includes, Post, StreamFrame};

/// Display name of the webhook sender.
pub const SENDER_NAME: &str = "X Feed";

/// Icon of the webhook sender.
pub const SENDER_AVATAR_URL: &str = "https://abs.twimg.com/favicons/twitter.2.ico";

/// Embed accent color (Twitter blue).
pub const ACCENT_COLOR: u32 = 0x1DA1F2;

/// Domain used for post permalinks.
pub const PERMALINK_BASE: &str = "https://x.com";

/// Handle used when the author is missing from the frame's includes.
pub const FALLBACK_HANDLE: &str = "unknown";

/// Discord's limit on embed description length, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 4096;

/// Where the post permalink is surfaced in the embed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermalinkPolicy {
    /// Append the permalink to the description after a blank line.
    #[default]
    Body,
    /// Keep the description as the bare post text; link via the embed URL.
    LinkField,
}

impl FromStr for PermalinkPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "body" => Ok(PermalinkPolicy::Body),
            "link" | "link_field" => Ok(PermalinkPolicy::LinkField),
            other => anyhow::bail!(
                "Unknown XFORWARD_PERMALINK value {other:?} (expected \"body\" or \"link\")"
            ),
        }
    }
}

/// A post joined with its author and media, ready to format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub display_name: String,
    pub handle: String,
    pub avatar_url: Option<String>,
    pub permalink: String,
    pub text: String,
    pub image_url: Option<String>,
    pub timestamp: Option<String>,
}

impl Notification {
    /// Author line as shown in the embed, e.g. `Alice (@alice)`.
    pub fn author_line(&self) -> String {
        format!("{} (@{})", self.display_name, self.handle)
    }
}

/// Join a post with the frame's own side-tables.
pub fn enrich(post: &Post, includes: &Includes) -> Notification {
    let user = includes.users.iter().find(|u| u.id == post.author_id);

    let handle = user
        .map(|u| u.username.clone())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| FALLBACK_HANDLE.to_string());
    let display_name = user
        .and_then(|u| u.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| handle.clone());
    let avatar_url = user.and_then(|u| u.profile_image_url.clone());

    Notification {
        permalink: permalink(&handle, &post.id),
        display_name,
        handle,
        avatar_url,
        text: post.text.clone(),
        image_url: select_image(post, includes),
        timestamp: post.created_at.clone(),
    }
}

/// Canonical link to a post.
pub fn permalink(handle: &str, post_id: &str) -> String {
    format!("{PERMALINK_BASE}/{handle}/status/{post_id}")
}

/// First attached photo, preferring its full URL over the preview.
///
/// Only media listed in the post's own attachment keys count; videos and
/// GIFs are skipped.
pub fn select_image(post: &Post, includes: &Includes) -> Option<String> {
    let keys = post.media_keys();
    includes
        .media
        .iter()
        .filter(|m| keys.contains(&m.media_key))
        .filter(|m| m.kind == "photo")
        .find_map(|m| m.url.clone().or_else(|| m.preview_image_url.clone()))
}

/// Build the webhook message for a stream frame. Returns `None` for a frame
/// without a post.
pub fn format_frame(frame: &StreamFrame, policy: PermalinkPolicy) -> Option<WebhookMessage> {
    let post = frame.data.as_ref()?;
    Some(build_message(&enrich(post, &frame.includes), policy))
}

/// Lay a notification out as a single-embed webhook message.
pub fn build_message(notification: &Notification, policy: PermalinkPolicy) -> WebhookMessage {
    let (description, url) = match policy {
        PermalinkPolicy::Body => (
            description_with_link(&notification.text, &notification.permalink),
            None,
        ),
        PermalinkPolicy::LinkField => (
            truncate_chars(&notification.text, MAX_DESCRIPTION_CHARS - 3),
            Some(notification.permalink.clone()),
        ),
    };

    let embed = Embed {
        author: EmbedAuthor {
            name: notification.author_line(),
            url: Some(notification.permalink.clone()),
            icon_url: notification.avatar_url.clone(),
        },
        description,
        url,
        image: notification
            .image_url
            .clone()
            .map(|url| EmbedImage { url }),
        color: ACCENT_COLOR,
        timestamp: notification.timestamp.clone(),
    };

    WebhookMessage {
        username: SENDER_NAME.to_string(),
        avatar_url: SENDER_AVATAR_URL.to_string(),
        embeds: vec![embed],
    }
}

/// Post text plus a trailing permalink, trimmed to fit the embed limit.
/// Only the text is shortened; the link always survives.
fn description_with_link(text: &str, link: &str) -> String {
    let suffix = format!("\n\n{link}");
    let budget = MAX_DESCRIPTION_CHARS.saturating_sub(suffix.chars().count() + 3);
    format!("{}{}", truncate_chars(text, budget), suffix)
}

// --- Discord webhook payload types ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub username: String,
    pub avatar_url: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub author: EmbedAuthor,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}
