// X API v2 client: bearer-authenticated HTTP over reqwest.
//
// A thin reqwest wrapper in the same shape as the other API clients:
// one shared `reqwest::Client`, a base URL, and one method per endpoint.
// Non-success statuses are turned into errors carrying the response body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::rules::RuleStore;
use super::types::{
    AddRulesRequest, DeleteIds, DeleteRulesRequest, NewRule, Rule, RulesResponse, StreamFrame,
};
use crate::stream::supervisor::{ChunkStream, StreamSource};

/// Field selectors shared by the stream and the single-post lookup, so a
/// looked-up post has exactly the shape of a stream frame.
pub const FIELD_PARAMS: [(&str, &str); 4] = [
    ("tweet.fields", "created_at,author_id,attachments"),
    ("expansions", "author_id,attachments.media_keys"),
    ("user.fields", "username,name,profile_image_url"),
    ("media.fields", "url,preview_image_url,type"),
];

const USER_AGENT: &str = "xforward/0.1 (stream-to-discord)";

/// Bearer-authenticated client for the X API v2.
pub struct XClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl XClient {
    /// Create a new client pointing at the given base URL.
    ///
    /// Defaults to `https://api.x.com` in production; tests pass a mock
    /// server URL.
    pub fn new(base_url: &str, bearer_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    fn stream_url(&self) -> String {
        format!("{}/2/tweets/search/stream", self.base_url)
    }

    fn rules_url(&self) -> String {
        format!("{}/2/tweets/search/stream/rules", self.base_url)
    }

    /// GET a JSON endpoint and deserialize the response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
        what: &str,
    ) -> Result<T> {
        debug!(url = url, "X API GET request");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{what} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {what} response"))
    }

    /// POST a JSON body to the rules endpoint, returning the raw response.
    async fn post_rules<B: Serialize>(&self, body: &B) -> Result<reqwest::Response> {
        self.client
            .post(self.rules_url())
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await
            .context("Stream rules request failed")
    }

    /// Fetch the currently installed stream rules.
    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        let resp: RulesResponse = self
            .get_json(&self.rules_url(), &[], "Stream rules lookup")
            .await?;
        Ok(resp.data)
    }

    /// Delete rules by id.
    ///
    /// A non-success status is logged and otherwise ignored: the following
    /// add is what decides whether the rule set is usable.
    pub async fn delete_rules(&self, ids: &[String]) -> Result<()> {
        let response = self
            .post_rules(&DeleteRulesRequest {
                delete: DeleteIds { ids },
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Deleting stream rules failed");
        }
        Ok(())
    }

    /// Add rules. Any non-success status is an error carrying the body.
    pub async fn add_rules(&self, rules: &[NewRule]) -> Result<()> {
        let response = self.post_rules(&AddRulesRequest { add: rules }).await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to set rules: {body}");
        }
        Ok(())
    }

    /// Look up a single post with the same expansions the stream uses.
    pub async fn fetch_post(&self, id: &str) -> Result<StreamFrame> {
        let url = format!("{}/2/tweets/{}", self.base_url, id);
        self.get_json(&url, &FIELD_PARAMS, "Post lookup")
            .await
            .with_context(|| format!("Failed to fetch post {id}"))
    }

    /// Open the filtered stream and return its body as a chunk stream.
    pub async fn open_stream(&self) -> Result<ChunkStream> {
        let response = self
            .client
            .get(self.stream_url())
            .bearer_auth(&self.bearer_token)
            .query(&FIELD_PARAMS)
            .send()
            .await
            .context("Stream connection failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Stream error {status}: {body}");
        }

        let chunks: ChunkStream = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map(|b| b.to_vec()).context("Stream read failed")),
        );
        Ok(chunks)
    }
}

#[async_trait]
impl RuleStore for XClient {
    async fn list_rules(&self) -> Result<Vec<Rule>> {
        XClient::list_rules(self).await
    }

    async fn delete_rules(&self, ids: &[String]) -> Result<()> {
        XClient::delete_rules(self, ids).await
    }

    async fn add_rules(&self, rules: &[NewRule]) -> Result<()> {
        XClient::add_rules(self, rules).await
    }
}

#[async_trait]
impl StreamSource for XClient {
    async fn open(&self) -> Result<ChunkStream> {
        self.open_stream().await
    }
}
