#[macro_use]
extern crate tracing;

use tracing_error::ErrorLayer;
use tracing_subscriber::{prelude::*, EnvFilter};

use strava_rename::{Config, Script};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => debug!("no .env file found"),
        Err(e) => warn!("failed to read .env file: {}", e),
    }

    let mut script = Script::new(std::io::stdout());
    if let Some(config) = script.configure(Config::from_env()) {
        script.run(&config).await;
    }
}
