mod config_commands;
mod dequeue_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use courier_config::CourierConfig;

#[derive(Parser)]
#[command(name = "courier", about = "Courier: Slack webhook relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file; skips discovery when set.
    #[arg(long, global = true, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    bind: Option<String>,
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the webhook relay (default).
    Serve,
    /// Pull messages off the work queue and print them as JSON lines.
    Dequeue {
        /// Stop after this many messages.
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load the explicit config file, or discover one.
fn load_config(path: Option<&Path>) -> anyhow::Result<(CourierConfig, Option<PathBuf>)> {
    match path {
        Some(path) => Ok((
            courier_config::load_config(path)?,
            Some(path.to_path_buf()),
        )),
        None => Ok(courier_config::discover_and_load()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let (mut config, config_path) = load_config(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Serve) => {
            info!(version = env!("CARGO_PKG_VERSION"), "courier starting");
            if let Some(bind) = cli.bind {
                config.server.bind = bind;
            }
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            let validation = courier_config::validate(&config);
            for d in &validation.diagnostics {
                warn!("{d}");
            }
            if validation.has_errors() {
                anyhow::bail!("invalid configuration; run `courier config check` for details");
            }
            courier_gateway::start_server(&config).await
        },
        Some(Commands::Dequeue { count }) => dequeue_commands::dequeue(&config, count).await,
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, &config, config_path)
        },
    }
}
