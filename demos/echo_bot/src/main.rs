//! Echo Bot Example
//!
//! Chat with a bot in your terminal. Every event the console produces goes
//! through a single dispatcher closure:
//!
//! ```text
//! ConsoleEvent
//! ├── Private(PrivateMessageEvent)   direct channel, always addressed
//! ├── Public(PublicMessageEvent)     other channels, addressed via @mention or nickname
//! └── Notice(Event)                  e.g. entering a channel
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package echo-bot
//! cargo run --package echo-bot -- --config demos/echo_bot/consolebot.toml
//! ```
//!
//! Type `:help` for console commands, `/help` for bot commands.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use consolebot::prelude::*;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{error, info};

#[derive(Parser)]
#[command(about = "A simple echo bot for the terminal")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "production"
    #[arg(short, long)]
    profile: Option<String>,
}

const HELP_TEXT: &str = r"╭─────────────────────────────╮
│     Echo Bot - Commands     │
├─────────────────────────────┤
│ /echo <text> - Echo text    │
│ /ping        - Pong!        │
│ /time        - Local time   │
│ /info        - Message info │
│ /help        - This help    │
╰─────────────────────────────╯";

// ============================================================================
// Handlers
// ============================================================================

fn log_event(event: &ConsoleEvent) {
    match event {
        ConsoleEvent::Private(msg) => info!(
            "[Private] {} ({}): {}",
            msg.parent.parent.user.nickname,
            msg.parent.parent.user.id,
            msg.parent.get_plain_text()
        ),
        ConsoleEvent::Public(msg) => info!(
            "[{}] {} ({}): {}",
            msg.parent.parent.channel.name,
            msg.parent.parent.user.nickname,
            msg.parent.parent.user.id,
            msg.parent.get_plain_text()
        ),
        ConsoleEvent::Notice(notice) => info!("[Notice] {}", notice.description()),
    }
}

fn current_time() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| now.to_string())
}

fn info_text(event: &ConsoleEvent) -> String {
    let base = event.base();
    let kind = match event {
        ConsoleEvent::Private(_) => "Private",
        ConsoleEvent::Public(_) => "Public",
        ConsoleEvent::Notice(_) => "Notice",
    };
    format!(
        "📋 Message Info\n\
        • Type: {kind}\n\
        • From: {} ({})\n\
        • Channel: {} ({})\n\
        • Session: {}",
        base.user.nickname,
        base.user.id,
        base.channel.name,
        base.channel.id,
        event.session_id()
    )
}

/// Picks a reply for a command, if the text is one.
fn reply_for(event: &ConsoleEvent) -> Option<String> {
    let text = event.get_plain_text();
    let text = text.trim();

    if let Some(content) = text.strip_prefix("/echo ") {
        return Some(content.to_string());
    }
    match text {
        "/ping" => Some("Pong! 🏓".to_string()),
        "/time" => Some(current_time()),
        "/info" => Some(info_text(event)),
        "/help" => Some(HELP_TEXT.to_string()),
        _ => None,
    }
}

async fn handle(bot: ConsoleBot, event: ConsoleEvent) {
    log_event(&event);

    if !event.is_tome() {
        return;
    }
    if let Some(reply) = reply_for(&event)
        && let Err(e) = bot.send(&event, reply).await
    {
        error!("Failed to send reply: {:?}", e);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = ConsoleRuntime::builder().dispatcher(dispatcher_fn(handle));
    if let Some(path) = args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    runtime.run().await?;

    Ok(())
}
