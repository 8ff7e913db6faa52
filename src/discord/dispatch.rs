// Fire-and-forget delivery of stream payloads.
//
// Each payload gets its own detached tokio task that formats and posts it.
// The read loop never waits, failures are logged and dropped, and there is
// no queue: fan-out is unbounded, so a slow webhook just means more tasks
// in flight. Completion order across posts is not guaranteed.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::embed::{build_message, enrich, Notification, PermalinkPolicy};
use super::traits::WebhookSink;
use crate::output::truncate_chars;
use crate::x::types::StreamFrame;

/// Hands stream payloads to a webhook sink.
#[derive(Clone)]
pub struct Dispatcher {
    sink: Arc<dyn WebhookSink>,
    policy: PermalinkPolicy,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn WebhookSink>, policy: PermalinkPolicy) -> Self {
        Self { sink, policy }
    }

    /// Spawn delivery of one frame and return immediately.
    ///
    /// The returned handle may be dropped; the task runs to completion on
    /// its own and never reports an error back.
    pub fn dispatch(&self, frame: StreamFrame) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.deliver(&frame).await {
                error!(error = %e, "Discord error");
            }
        })
    }

    /// Format and deliver one frame, waiting for the result.
    ///
    /// A frame without a post is skipped and reported as `Ok(None)`.
    pub async fn deliver(&self, frame: &StreamFrame) -> Result<Option<Notification>> {
        let Some(post) = frame.data.as_ref() else {
            return Ok(None);
        };

        let notification = enrich(post, &frame.includes);
        let message = build_message(&notification, self.policy);
        self.sink.deliver(&message).await?;

        info!(
            handle = %notification.handle,
            post_id = %post.id,
            lag_secs = ?stream_lag_secs(notification.timestamp.as_deref(), Utc::now()),
            "Posted: @{}: {}",
            notification.handle,
            truncate_chars(&notification.text, 50)
        );
        Ok(Some(notification))
    }
}

/// Seconds between a post's creation and `now`, if the timestamp parses.
pub fn stream_lag_secs(created_at: Option<&str>, now: DateTime<Utc>) -> Option<i64> {
    let created = DateTime::parse_from_rfc3339(created_at?).ok()?;
    Some((now - created.with_timezone(&Utc)).num_seconds())
}
