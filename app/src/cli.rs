use clap::{Parser, Subcommand, ValueEnum};
use corelib::models::{AlertCondition, Category, NotificationDraft, Priority};
use inbox::repository::NotificationRepository;
use tracing::info;

use crate::config::{AppConfig, split_list};
use crate::prefs::{self, Theme};
use crate::runtime::Runtime;

#[derive(Debug, Parser)]
#[clap(name = "signaldesk", version)]
pub struct Cli {
    /// SQLite connection string (overrides DATABASE_URL)
    #[clap(long)]
    pub database_url: Option<String>,

    /// Notification server WebSocket URL (overrides SOCKET_URL)
    #[clap(long)]
    pub socket_url: Option<String>,

    /// Connect to the notification server
    #[clap(long)]
    pub enable_socket: bool,

    /// Authenticated user id (overrides USER_ID)
    #[clap(long)]
    pub user_id: Option<String>,

    /// Wallet addresses sent when authenticating (comma-separated)
    #[clap(long)]
    pub wallets: Option<String>,

    /// Client storage JSON file (overrides STORAGE_PATH)
    #[clap(long)]
    pub storage_path: Option<std::path::PathBuf>,

    /// Frame rate threshold for performance mode changes
    #[clap(long)]
    pub performance_threshold_fps: Option<f64>,

    /// Run animations instantly
    #[clap(long)]
    pub reduced_motion: bool,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run until interrupted
    Run,

    /// Store a notification for the configured user; it arrives back through
    /// the change feed
    Send {
        #[clap(long, default_value = "system")]
        category: Category,
        #[clap(long, default_value = "low")]
        priority: Priority,
        title: String,
        message: String,
    },

    /// Print stored notifications for the configured user, newest first
    History {
        #[clap(long, default_value_t = 1)]
        page: u32,
        #[clap(long, default_value_t = 20)]
        limit: u32,
    },

    /// Manage price alerts
    #[clap(subcommand)]
    Alert(AlertCommand),

    /// Show the theme, or set it
    Theme { value: Option<Theme> },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConditionArg {
    Above,
    Below,
}

impl From<ConditionArg> for AlertCondition {
    fn from(c: ConditionArg) -> Self {
        match c {
            ConditionArg::Above => AlertCondition::Above,
            ConditionArg::Below => AlertCondition::Below,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum AlertCommand {
    Add {
        #[clap(long, default_value = "")]
        symbol: String,
        #[clap(long, value_enum)]
        condition: ConditionArg,
        /// Target price
        target: String,
    },
    List,
    Toggle { id: String },
    Remove { id: String },
    /// Fire a test notification for an alert
    Test { id: String },
}

impl Cli {
    /// Flags win over the environment.
    pub fn apply(&self, mut cfg: AppConfig) -> AppConfig {
        if let Some(url) = &self.database_url {
            cfg.database_url = url.clone();
        }
        if let Some(url) = &self.socket_url {
            cfg.socket_url = url.clone();
        }
        if self.enable_socket {
            cfg.enable_socket = true;
        }
        if let Some(user) = &self.user_id {
            cfg.user_id = Some(user.clone());
        }
        if let Some(wallets) = &self.wallets {
            cfg.wallet_addresses = split_list(wallets);
        }
        if let Some(path) = &self.storage_path {
            cfg.storage_path = Some(path.clone());
        }
        if let Some(fps) = self.performance_threshold_fps {
            cfg.performance_threshold_fps = fps;
        }
        if self.reduced_motion {
            cfg.reduced_motion = true;
        }
        cfg
    }
}

pub async fn execute(runtime: &Runtime, cfg: &AppConfig, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run => {
            runtime.greet_first_run().await?;
            tokio::signal::ctrl_c().await?;
            info!("shutdown signal received");
        }
        Command::Send {
            category,
            priority,
            title,
            message,
        } => {
            let Some(user_id) = &cfg.user_id else {
                anyhow::bail!("`send` needs a user: set USER_ID or pass --user-id");
            };
            let draft = NotificationDraft::new(category, priority, title, message);
            let row = runtime.repository().create(user_id, &draft).await?;
            println!("stored {}", row.id);
        }
        Command::History { page, limit } => {
            let Some(user_id) = &cfg.user_id else {
                anyhow::bail!("`history` needs a user: set USER_ID or pass --user-id");
            };
            let page = runtime.repository().page(user_id, page, limit).await?;
            for row in &page.rows {
                let marker = if row.is_read { " " } else { "*" };
                println!(
                    "{marker} {} [{}] {} {}: {}",
                    row.created_at.format("%Y-%m-%d %H:%M:%S"),
                    row.priority,
                    row.category,
                    row.title,
                    row.message
                );
            }
            println!(
                "page {} of {} notification(s){}",
                page.page,
                page.total,
                if page.has_next { ", more available" } else { "" }
            );
        }
        Command::Alert(cmd) => run_alert(runtime, cmd)?,
        Command::Theme { value } => {
            let theme = match value {
                Some(theme) => {
                    prefs::save_theme(runtime.storage(), theme)?;
                    theme
                }
                None => prefs::load_theme(runtime.storage())?,
            };
            println!("{theme}");
        }
    }
    Ok(())
}

fn run_alert(runtime: &Runtime, cmd: AlertCommand) -> anyhow::Result<()> {
    let mut book = runtime.alert_book();
    match cmd {
        AlertCommand::Add {
            symbol,
            condition,
            target,
        } => {
            let alert = book.create(&symbol, condition.into(), &target)?;
            println!("{} {} {} {}", alert.id, alert.symbol, alert.condition, alert.target_price);
        }
        AlertCommand::List => {
            for alert in book.alerts() {
                let state = if alert.is_active { "active" } else { "paused" };
                println!(
                    "{} {} {} {} ({state})",
                    alert.id, alert.symbol, alert.condition, alert.target_price
                );
            }
        }
        AlertCommand::Toggle { id } => {
            let active = book.toggle(&id)?;
            println!("{id} {}", if active { "active" } else { "paused" });
        }
        AlertCommand::Remove { id } => {
            book.delete(&id)?;
        }
        AlertCommand::Test { id } => book.test_fire(&id)?,
    }
    Ok(())
}
