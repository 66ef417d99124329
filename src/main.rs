use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use agribot_gateway::{db, ApiServer, Config};

/// AgriBot - WhatsApp webhook gateway
#[derive(Parser)]
#[command(name = "agribot", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,agribot_gateway=info",
        1 => "info,agribot_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing::info!(
        port = cli.port,
        db_path = %config.db_path.display(),
        media_enabled = config.storage.is_some(),
        "starting agribot gateway"
    );

    let pool = db::init(&config.db_path)?;

    let server = ApiServer::new(&config, pool, cli.port);
    server.run().await?;

    Ok(())
}
