//! package-orientation - operator shell for per-package orientation overrides.
//!
//! Connects to MongoDB, loads the stored overrides into the cache and reads
//! commands from stdin until `quit`, EOF or Ctrl-C.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use package_orientation::shell::{self, Outcome};
use package_orientation::{Config, Database, PackageSettings, PackageSettingsRepository};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("package_orientation=info,mongodb=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting package-orientation...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!(
        "Per-package checks: {}",
        if config.foreground_package_check { "on" } else { "off" }
    );

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let store = Arc::new(PackageSettingsRepository::open(&db).await?);

    let settings = Arc::new(PackageSettings::new(store, config.override_switch()));
    settings.initialize()?;

    run_shell(&settings).await?;

    settings.shutdown().await;
    info!("Bye");
    Ok(())
}

/// Read commands from stdin until quit, EOF or Ctrl-C.
async fn run_shell(settings: &PackageSettings) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        };

        let Some(line) = line else {
            return Ok(());
        };

        match shell::handle_line(settings, &line).await {
            Some(Outcome::Reply(text)) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Some(Outcome::Quit) => return Ok(()),
            None => {}
        }
    }
}
