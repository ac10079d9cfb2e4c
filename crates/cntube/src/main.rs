use anyhow::Result;
use clap::{Parser, Subcommand};
use cntube_common::{logger, AppConfig};

/// Load the nearest .env file, walking up from the working directory so the
/// binary also works when launched from a subdirectory.
fn load_dotenv() {
    let Ok(mut dir) = std::env::current_dir() else {
        dotenv::dotenv().ok();
        return;
    };

    loop {
        let candidate = dir.join(".env");
        if candidate.exists() {
            dotenv::from_path(&candidate).ok();
            return;
        }
        if !dir.pop() {
            break;
        }
    }

    dotenv::dotenv().ok();
}

#[derive(Parser)]
#[command(name = "cntube")]
#[command(about = "CNtube - video transcription and Chinese learning analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind host (overrides SERVER_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides SERVER_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Directory for per-request session files (overrides TEMP_DIR)
        #[arg(long)]
        temp_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_dotenv();

    // Bare `cntube` serves with environment defaults
    let Commands::Serve {
        host,
        port,
        temp_dir,
    } = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        temp_dir: None,
    });

    // CLI flags override the environment
    if let Some(host) = &host {
        std::env::set_var("SERVER_HOST", host);
    }
    if let Some(port) = port {
        std::env::set_var("SERVER_PORT", port.to_string());
    }
    if let Some(dir) = &temp_dir {
        std::env::set_var("TEMP_DIR", dir);
    }

    let config = AppConfig::from_env()?;
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("CNtube starting on {}", config.server_bind_address());
    tracing::info!("  Whisper model: {}", config.whisper_model);
    tracing::info!("  Analysis backend: {:?}", config.analysis_backend);
    tracing::info!("  Temp dir: {}", config.temp_dir.display());

    cntube_server::start_server(config).await?;

    Ok(())
}
