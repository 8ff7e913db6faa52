// Serde types for the X API v2 payloads this crate reads and writes.
//
// Only the fields the forwarder uses are modeled. Unknown fields are
// ignored so new API additions never break decoding.

use serde::{Deserialize, Serialize};

/// One record from the filtered stream, or the body of a single-post lookup.
///
/// `includes` holds the expansions (authors, media) for this record only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFrame {
    pub data: Option<Post>,
    #[serde(default)]
    pub includes: Includes,
}

/// A post as returned with the forwarder's field selectors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author_id: String,
    pub created_at: Option<String>,
    pub attachments: Option<Attachments>,
}

impl Post {
    /// Media keys attached to this post, empty if it has none.
    pub fn media_keys(&self) -> &[String] {
        self.attachments
            .as_ref()
            .map(|a| a.media_keys.as_slice())
            .unwrap_or_default()
    }
}

/// Media keys referenced by a post, resolved through `Includes::media`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub media_keys: Vec<String>,
}

/// Expansion side-tables scoped to a single frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub media: Vec<Media>,
}

/// An expanded author. Missing fields decode as empty so one incomplete
/// side-table entry never loses the post it belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
}

/// An expanded attachment. Only `kind == "photo"` is ever embedded.
#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub media_key: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub url: Option<String>,
    pub preview_image_url: Option<String>,
}

// -- Stream rules --

/// A rule as stored by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rule {
    pub id: String,
    pub value: String,
    pub tag: Option<String>,
}

/// A rule to be added. The API assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRule {
    pub value: String,
    pub tag: String,
}

/// Response from `GET /2/tweets/search/stream/rules`. `data` is absent
/// when no rules are installed.
#[derive(Debug, Deserialize)]
pub struct RulesResponse {
    #[serde(default)]
    pub data: Vec<Rule>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteRulesRequest<'a> {
    pub delete: DeleteIds<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteIds<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct AddRulesRequest<'a> {
    pub add: &'a [NewRule],
}
