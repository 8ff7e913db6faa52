// Stream rule synchronization.
//
// The filtered stream only delivers posts matching the rules installed on
// the app. At startup we replace the whole remote rule set with one
// `from:<handle>` rule per tracked account. No diffing: read, delete
// everything, add everything. Runs once; reconnects reuse the rules.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use super::types::{NewRule, Rule};

/// The remote rule set, as seen by the synchronizer.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Read every installed rule.
    async fn list_rules(&self) -> Result<Vec<Rule>>;

    /// Delete the rules with the given ids in one request.
    async fn delete_rules(&self, ids: &[String]) -> Result<()>;

    /// Add the given rules in one request.
    async fn add_rules(&self, rules: &[NewRule]) -> Result<()>;
}

/// Build one `from:<handle>` rule per handle, tagged with the handle.
pub fn rules_for(handles: &[String]) -> Vec<NewRule> {
    handles
        .iter()
        .map(|handle| NewRule {
            value: format!("from:{handle}"),
            tag: handle.clone(),
        })
        .collect()
}

/// Replace the remote rule set with exactly the rules for `handles`.
///
/// Failing to read the current rules or to add the new ones is fatal:
/// streaming against an unknown rule set would forward the wrong accounts.
/// Returns the number of rules installed.
pub async fn sync_rules(store: &dyn RuleStore, handles: &[String]) -> Result<usize> {
    if handles.is_empty() {
        anyhow::bail!("Refusing to sync an empty rule set");
    }

    let existing = store
        .list_rules()
        .await
        .context("Failed to read existing stream rules")?;

    if !existing.is_empty() {
        let ids: Vec<String> = existing.iter().map(|r| r.id.clone()).collect();
        store.delete_rules(&ids).await?;
        info!(count = ids.len(), "Cleared {} existing rules", ids.len());
    }

    let rules = rules_for(handles);
    store.add_rules(&rules).await?;

    info!(users = %handles.join(", "), "Set rules for: {}", handles.join(", "));
    Ok(rules.len())
}
