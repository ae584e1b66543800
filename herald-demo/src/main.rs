//! Runs the herald demo against an in-memory host.

use anyhow::Result;
use tracing::info;

fn main() -> Result<()> {
    herald_demo::init_logging();

    let config = herald_demo::load_config()?;
    info!(debug = config.debug, locale = %config.default_locale, "Starting herald demo");

    herald_demo::run(config)
}
