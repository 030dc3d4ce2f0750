use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};

use staticd::config::Config;
use staticd::server::Server;

#[derive(Parser, Debug)]
#[command(name = "staticd", version, about = "Static file HTTP server")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "STATICD_CONFIG", default_value = "./staticd.yaml")]
    config: PathBuf,

    /// Listen on this port instead of the configured one
    #[arg(short, long)]
    port: Option<u16>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Fatal startup paths, each with its own exit status.
enum StartupError {
    Config(anyhow::Error),
    Runtime(std::io::Error),
    Bind(std::io::Error),
}

impl StartupError {
    fn exit_code(&self) -> ExitCode {
        match self {
            StartupError::Config(_) => ExitCode::from(1),
            StartupError::Runtime(_) => ExitCode::from(2),
            StartupError::Bind(_) => ExitCode::from(3),
        }
    }
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(e) => {
                write!(f, "errors while parsing the configuration file: {:#}", e)
            }
            StartupError::Runtime(e) => write!(f, "error creating the event loop: {}", e),
            StartupError::Bind(e) => write!(f, "error creating a TCP socket listener: {}", e),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .init();

    match start(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}. Exiting", e);
            e.exit_code()
        }
    }
}

fn start(cli: Cli) -> Result<(), StartupError> {
    let mut cfg = Config::load(&cli.config).map_err(StartupError::Config)?;
    if let Some(port) = cli.port {
        cfg.port = port;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(serve(Arc::new(cfg)))
}

async fn serve(cfg: Arc<Config>) -> Result<(), StartupError> {
    let server = Server::bind(cfg).await.map_err(StartupError::Bind)?;

    tokio::select! {
        res = server.run() => {
            if let Err(e) = res {
                error!("Listener stopped: {:#}", e);
            }
        }

        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}
