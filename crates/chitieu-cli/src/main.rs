use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use chitieu_core::{Bot, Dispatch};
use chitieu_gateway::{GatewayState, WebhookServer};
use chitieu_store::{SheetsConfig, SheetsStore};
use chitieu_telegram::{TelegramClient, UpdatePoller};
use config::{ChitieuConfig, Transport};

#[derive(Parser)]
#[command(name = "chitieu")]
#[command(version)]
#[command(about = "chitieu — a Telegram expense-tracking bot")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot with the configured transport
    Start,

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Config => cmd_config(&cli.config),
        Commands::Start => cmd_start(&cli.config).await,
    }
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        info!("Created default config at {}", config_path.display());
    }

    println!("chitieu initialized at {}", config_dir.display());
    println!(
        "Edit {} or export TELEGRAM_BOT_TOKEN / GOOGLE_SHEET_KEY / GOOGLE_SHEETS_TOKEN.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(custom_path: &Option<PathBuf>) -> Result<()> {
    let cfg = ChitieuConfig::load(custom_path)?;
    // Debug impls mask the secrets
    println!("{:#?}", cfg);
    Ok(())
}

async fn cmd_start(custom_path: &Option<PathBuf>) -> Result<()> {
    // A bad config must stop us here, before anything starts serving
    let cfg = ChitieuConfig::load(custom_path)?;

    let store = Arc::new(SheetsStore::new(SheetsConfig {
        spreadsheet_id: cfg.sheets.spreadsheet_id.clone(),
        access_token: cfg.sheets.access_token.clone(),
        expense_tab: cfg.sheets.expense_tab.clone(),
        config_tab: cfg.sheets.config_tab.clone(),
        limit_cell: cfg.sheets.limit_cell.clone(),
    }));
    info!("Sheets store initialized (spreadsheet: {})", cfg.sheets.spreadsheet_id);

    let bot = Arc::new(Bot::new(
        store,
        cfg.telegram.allowed_chat_ids.clone(),
        cfg.budget.fallback_monthly_limit,
    ));
    if cfg.telegram.allowed_chat_ids.is_empty() {
        warn!("No allow-list configured; any chat can use the bot");
    }

    let telegram = Arc::new(TelegramClient::new(cfg.telegram.bot_token.clone()));

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
            cancel_on_signal.cancel();
        }
    });

    println!("chitieu is running. Press Ctrl+C to stop.");

    match cfg.telegram.transport {
        Transport::Webhook => run_webhook(cfg, bot, telegram, cancel).await,
        Transport::Poll => run_poller(cfg, bot, telegram, cancel).await,
    }
}

async fn run_webhook(
    cfg: ChitieuConfig,
    bot: Arc<Bot>,
    telegram: Arc<TelegramClient>,
    cancel: CancellationToken,
) -> Result<()> {
    let state = GatewayState {
        bot,
        telegram,
        webhook_secret: cfg.telegram.webhook_secret.clone(),
    };
    let server = WebhookServer::new(cfg.telegram.bind, state);

    tokio::select! {
        result = server.run() => result,
        _ = cancel.cancelled() => {
            info!("Webhook server stopped");
            Ok(())
        }
    }
}

async fn run_poller(
    cfg: ChitieuConfig,
    bot: Arc<Bot>,
    telegram: Arc<TelegramClient>,
    cancel: CancellationToken,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let poller = UpdatePoller::new((*telegram).clone(), cfg.telegram.poll_timeout_secs);
    let poller_handle = poller.spawn(tx);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Polling loop shutting down");
                break;
            }
            msg = rx.recv() => {
                let Some(msg) = msg else {
                    warn!("Poller channel closed");
                    break;
                };
                match bot.handle(&msg).await {
                    Ok(Dispatch::Reply(text)) => telegram.notify(&msg.chat_id, &text).await,
                    // unified policy: unauthorized chats never get a reply
                    Ok(Dispatch::Forbidden) => {}
                    Err(e) => error!("Dispatch failed for chat {}: {:#}", msg.chat_id, e),
                }
            }
        }
    }

    poller_handle.abort();
    Ok(())
}
