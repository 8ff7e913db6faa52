// Status display: configuration summary and the live stream rule set.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::x::rules::{rules_for, RuleStore};
use crate::x::types::Rule;

/// How the remote rule set compares to the configured handles.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RuleDrift {
    /// Configured handles with no matching remote rule.
    pub missing: Vec<String>,
    /// Remote rule values no configured handle accounts for.
    pub extra: Vec<String>,
}

impl RuleDrift {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Compare installed rules against the rules `handles` would produce.
pub fn rule_drift(remote: &[Rule], handles: &[String]) -> RuleDrift {
    let wanted = rules_for(handles);

    let missing = wanted
        .iter()
        .filter(|w| !remote.iter().any(|r| r.value == w.value))
        .map(|w| w.tag.clone())
        .collect();
    let extra = remote
        .iter()
        .filter(|r| !wanted.iter().any(|w| w.value == r.value))
        .map(|r| r.value.clone())
        .collect();

    RuleDrift { missing, extra }
}

/// Display configuration and remote rules to the terminal.
pub async fn show(config: &Config, store: &dyn RuleStore) -> Result<()> {
    println!("API: {}", config.api_url);
    println!(
        "Reconnect delay: {}s, permalink policy: {:?}",
        config.reconnect_delay.as_secs(),
        config.permalink_policy
    );

    if config.tracked_users.is_empty() {
        println!("Tracked users: none configured");
    } else {
        println!("Tracked users: {}", config.tracked_users.join(", "));
    }

    let remote = store.list_rules().await?;
    if remote.is_empty() {
        println!("Stream rules: none installed");
    } else {
        println!("Stream rules: {} installed", remote.len());
        for rule in &remote {
            println!(
                "  {} {} {}",
                rule.id.dimmed(),
                rule.value,
                rule.tag.as_deref().unwrap_or("-").dimmed()
            );
        }
    }

    let drift = rule_drift(&remote, &config.tracked_users);
    if drift.is_clean() {
        println!("{}", "Rules match TRACKED_USERS.".green());
    } else {
        for handle in &drift.missing {
            println!("  {} no rule for @{}", "Missing:".yellow(), handle);
        }
        for value in &drift.extra {
            println!("  {} {}", "Extra:".yellow(), value);
        }
        println!(
            "{}",
            "Rules are replaced on the next `xforward` start.".dimmed()
        );
    }

    Ok(())
}
