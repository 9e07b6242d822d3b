//! Library root for `rival-radar`.
//!
//! Rival-radar is a Slack competitive-intelligence bot:
//! - React to a message containing a link (or run `/analyze <url>`)
//! - The target site is scraped, or fallback intelligence is gathered
//! - An LLM writes a threat assessment against a reference product
//! - The report is posted back to the thread
//!
//! The bot integrates with Slack for chat and OpenAI for the analysis. The
//! architecture is built around extensible traits that allow for different
//! implementations of each service.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the rival-radar runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the pipeline and chat clients
/// - Starts the main event loop for processing triggers
pub async fn start(config: Config) -> Void {
    info!("Starting rival-radar ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().map_err(|_| anyhow::anyhow!("A crypto provider is already installed."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
