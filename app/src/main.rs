use app::cli::{Cli, Command, execute};
use app::config::AppConfig;
use app::runtime::{Collaborators, Runtime};
use clap::Parser;
use common::logger::{LogFormat, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = cli.apply(AppConfig::from_env()?);

    let format = if cfg.is_production {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logger("signaldesk", format);
    cfg.validate()?;

    tracing::info!("Starting SignalDesk...");

    let runtime = Runtime::start(&cfg, Collaborators::desktop()).await?;
    let command = cli.command.unwrap_or(Command::Run);
    let outcome = execute(&runtime, &cfg, command).await;

    runtime.shutdown().await;
    outcome
}
