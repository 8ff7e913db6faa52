use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use xforward::config::Config;
use xforward::discord::dispatch::Dispatcher;
use xforward::discord::embed::format_frame;
use xforward::discord::webhook::DiscordWebhook;
use xforward::stream::supervisor::{Supervisor, TokioSleeper};
use xforward::x::client::XClient;
use xforward::x::rules::sync_rules;

/// xforward: forward posts from tracked X accounts to a Discord webhook.
///
/// With no subcommand, installs one stream rule per TRACKED_USERS handle and
/// streams forever, reconnecting whenever the connection drops. If
/// TEST_TWEET_ID is set, forwards that single post instead and exits.
#[derive(Parser)]
#[command(name = "xforward", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync stream rules and forward posts until killed (the default)
    Run,

    /// Fetch one post, forward it to the webhook, and exit
    Send {
        /// The post ID to forward
        id: String,

        /// Print the webhook payload instead of posting it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show configuration and the stream rules currently installed
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("xforward=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Some(Commands::Send { id, dry_run }) => send_one(&config, &id, dry_run).await,
        Some(Commands::Status) => {
            config.require_api()?;
            let client = XClient::new(&config.api_url, &config.bearer_token)?;
            xforward::status::show(&config, &client).await
        }
        Some(Commands::Run) | None => match config.test_tweet_id.clone() {
            Some(id) => send_one(&config, &id, false).await,
            None => run_stream(&config).await,
        },
    }
}

/// Stream mode: sync rules once, then stream and reconnect forever.
async fn run_stream(config: &Config) -> Result<()> {
    config.require_stream()?;

    println!(
        "{}",
        "X Discord Forwarder - X Filtered Stream → Discord Webhook".bold()
    );
    info!(users = %config.tracked_users.join(", "), "Tracking users");

    let client = Arc::new(XClient::new(&config.api_url, &config.bearer_token)?);
    sync_rules(client.as_ref(), &config.tracked_users).await?;

    let webhook = Arc::new(DiscordWebhook::new(&config.webhook_url)?);
    let dispatcher = Dispatcher::new(webhook, config.permalink_policy);

    let mut supervisor = Supervisor::new(
        client,
        dispatcher,
        Box::new(TokioSleeper),
        config.reconnect_delay,
    );
    supervisor.run_forever().await;
    Ok(())
}

/// Test mode: forward exactly one post, then return.
async fn send_one(config: &Config, id: &str, dry_run: bool) -> Result<()> {
    config.require_send()?;

    let client = XClient::new(&config.api_url, &config.bearer_token)?;
    let frame = client.fetch_post(id).await?;

    if dry_run {
        let Some(message) = format_frame(&frame, config.permalink_policy) else {
            anyhow::bail!("Post {id} returned no data");
        };
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(());
    }

    let webhook = Arc::new(DiscordWebhook::new(&config.webhook_url)?);
    let dispatcher = Dispatcher::new(webhook, config.permalink_policy);
    match dispatcher.deliver(&frame).await? {
        Some(notification) => println!(
            "{} @{} post {} forwarded",
            "Sent:".green(),
            notification.handle,
            id
        ),
        None => anyhow::bail!("Post {id} returned no data"),
    }
    Ok(())
}
