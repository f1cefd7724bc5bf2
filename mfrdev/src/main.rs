mod application;
mod presentation {
    pub mod cli;
}

use mfr_core::error::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout carries stream data; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    application::run()
}
