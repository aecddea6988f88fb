//! CLI administration tool for mention-tracker.
//!
//! Inspects keys and payloads offline and operates on the storage tiers
//! without running the tracker process.
//!
//! # Usage
//!
//! ```bash
//! # Derive a counter key name
//! cargo run --bin admin -- key http://www.amazon.com/dp/B00ABCDEFG weekly --date 2024-03-12
//!
//! # Resolve a storefront
//! cargo run --bin admin -- store uk
//!
//! # Counters awaiting consolidation, and a one-shot flush
//! cargo run --bin admin -- pending
//! cargo run --bin admin -- consolidate --batch-size 50
//!
//! # Moderation
//! cargo run --bin admin -- banlist show
//! cargo run --bin admin -- banlist ban-user spammer42
//!
//! # Validate a queue message body
//! echo '[{"url":"http://bit.ly/a","user_id":1}]' | cargo run --bin admin -- decode
//! ```
//!
//! # Environment Variables
//!
//! Storage commands read the same variables as the tracker (see
//! `mention_tracker::config`).

use mention_tracker::config;
use mention_tracker::domain::entities::key_for_locale;
use mention_tracker::domain::frequency::build_key_name;
use mention_tracker::domain::payload::Payload;
use mention_tracker::infrastructure::Tier;
use mention_tracker::runtime;
use mention_tracker::state::AppState;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::path::PathBuf;

/// CLI tool for managing mention-tracker.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
enum Commands {
    /// Derive the key name of a counter bucket
    Key {
        /// Product URL or user id
        root: String,

        /// daily, weekly or monthly
        frequency: String,

        /// Bucket date (default: today, UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Resolve a storefront locale
    Store {
        /// Locale code (e.g. us, uk, de)
        locale: String,
    },

    /// List counters awaiting consolidation
    Pending,

    /// Run one consolidation pass now
    Consolidate {
        /// Durable writes per batch (default: CONSOLIDATION_BATCH_SIZE)
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Moderation blocklist
    Banlist {
        #[command(subcommand)]
        action: BanlistAction,
    },

    /// Validate a payload body read from a file or stdin
    Decode {
        /// File holding the body (default: stdin)
        file: Option<PathBuf>,
    },
}

/// Banlist subcommands.
#[derive(Subcommand)]
enum BanlistAction {
    /// Show banned products and users
    Show,

    /// Ban product keys
    BanProduct {
        keys: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Ban user keys
    BanUser {
        keys: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Key {
            root,
            frequency,
            date,
        } => handle_key(&root, &frequency, date)?,
        Commands::Store { locale } => handle_store(&locale)?,
        Commands::Decode { file } => handle_decode(file)?,
        Commands::Pending => handle_pending(&connect().await?).await?,
        Commands::Consolidate { batch_size } => {
            let config = config::load_from_env()?;
            let batch_size = batch_size.unwrap_or(config.consolidation_batch_size);
            handle_consolidate(&state_for(&config).await?, batch_size).await?
        }
        Commands::Banlist { action } => handle_banlist(action, &connect().await?).await?,
    }

    Ok(())
}

async fn connect() -> Result<AppState> {
    let config = config::load_from_env()?;
    state_for(&config).await
}

async fn state_for(config: &config::Config) -> Result<AppState> {
    let storage = runtime::connect_storage(config).await?;
    Ok(AppState::new(storage, config.thresholds()))
}

fn handle_key(root: &str, frequency: &str, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let key = build_key_name(root, frequency, date)?;
    println!("{}", key.bright_green());
    Ok(())
}

fn handle_store(locale: &str) -> Result<()> {
    let store = key_for_locale(locale)?;
    println!("  Locale: {}", locale.cyan());
    println!("  Store:  {}", store.root().bright_green());
    Ok(())
}

/// Decodes a body and prints a summary of its payloads.
fn handle_decode(file: Option<PathBuf>) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?,
    };

    let payloads = Payload::deserialize(&body)?;

    println!(
        "{} {} payload(s)",
        "✅ Valid body:".green().bold(),
        payloads.len().to_string().bright_white().bold()
    );
    for payload in &payloads {
        println!("  {:<20} {}", payload.user_id().cyan(), payload.url());
    }
    Ok(())
}

async fn handle_pending(state: &AppState) -> Result<()> {
    println!("{}", "⏳ Pending counters".bright_blue().bold());
    println!();

    let keys = state.counters.registry().get().await?;
    if keys.is_empty() {
        println!("{}", "  Nothing awaiting consolidation".yellow());
        return Ok(());
    }

    for key in &keys {
        println!("  {}", key);
    }
    println!();
    println!("  Total: {}", keys.len().to_string().bright_white().bold());
    Ok(())
}

async fn handle_consolidate(state: &AppState, batch_size: usize) -> Result<()> {
    println!("{}", "💾 Consolidating counters".bright_blue().bold());
    println!();

    let report = state.counters.consolidate(batch_size).await?;

    println!("  Flushed: {}", report.flushed.to_string().bright_green().bold());
    println!("  Evicted: {}", report.evicted.to_string().yellow());
    if report.failed > 0 {
        println!("  Failed:  {}", report.failed.to_string().red().bold());
    }

    let flags = state.counters.operation_flags().await?;
    if let Some(at) = flags.last_consolidation {
        println!();
        println!(
            "  Last consolidation: {}",
            at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black()
        );
    }
    Ok(())
}

/// Dispatches banlist commands.
async fn handle_banlist(action: BanlistAction, state: &AppState) -> Result<()> {
    match action {
        BanlistAction::Show => {
            println!("{}", "🚫 Banlist".bright_blue().bold());
            println!();

            let banlist = state
                .banlist
                .retrieve(Tier::Both)
                .await?
                .context("Banlist is not available")?;

            println!("  {}", "Products".bright_white().bold());
            for product in &banlist.products {
                println!("    {}", product.cyan());
            }
            println!("  {}", "Users".bright_white().bold());
            for user in &banlist.users {
                println!("    {}", user.cyan());
            }
            println!();
            println!(
                "  Total: {} product(s), {} user(s)",
                banlist.products.len().to_string().bright_white().bold(),
                banlist.users.len().to_string().bright_white().bold()
            );
        }
        BanlistAction::BanProduct { keys, yes } => {
            if confirm_ban("product", &keys, yes)? {
                let banlist = state.banlist.ban_products(keys).await?;
                println!(
                    "{} {} banned product(s)",
                    "✅ Saved:".green().bold(),
                    banlist.products.len()
                );
            }
        }
        BanlistAction::BanUser { keys, yes } => {
            if confirm_ban("user", &keys, yes)? {
                let banlist = state.banlist.ban_users(keys).await?;
                println!(
                    "{} {} banned user(s)",
                    "✅ Saved:".green().bold(),
                    banlist.users.len()
                );
            }
        }
    }

    Ok(())
}

fn confirm_ban(what: &str, keys: &[String], skip_confirm: bool) -> Result<bool> {
    if keys.is_empty() {
        anyhow::bail!("No {} keys given", what);
    }

    for key in keys {
        println!("  {} {}", what.bright_black(), key.cyan());
    }
    println!();

    if skip_confirm {
        return Ok(true);
    }

    let confirmed = Confirm::new()
        .with_prompt(format!("Ban {} {}(s)?", keys.len(), what))
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
    }
    Ok(confirmed)
}
