//! Combat-book binary.
//!
//! Composition root for the session server and automated peers.
//!
//! # Usage
//!
//! ```bash
//! # Run the session server on COMBAT_BIND_ADDR
//! combat-book serve
//!
//! # In-process server plus two automated peers over TCP
//! combat-book demo [knight] [goblin]
//!
//! # Automated peer against a running server
//! combat-book host knight
//! combat-book join K7Q2ZD goblin
//! ```
//!
//! Configuration comes from the environment (and `.env`); see
//! [`runtime::RuntimeConfig::from_env`]. `RUST_LOG` overrides the log
//! filter and `LOG_DIR` adds a log file.

mod commands;
mod logging;

use anyhow::{Result, bail};
use runtime::RuntimeConfig;

use commands::Mode;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(mode) = Mode::parse(&args) else {
        bail!("{}", commands::USAGE);
    };

    let _guard = logging::setup_logging(mode.log_file_name())?;
    let config = RuntimeConfig::from_env();
    tracing::debug!(?config, "configuration loaded");

    commands::run(mode, config).await
}
