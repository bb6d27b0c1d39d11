//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use std::path::Path;

use serde::Serialize;
use tracing::info;
use triage_config::Config;
use triage_extract::ExtractionEngine;

mod extract;
mod info;
mod init;
mod patterns;
mod stream;
mod version;

pub use extract::{ExtractInput, ExtractStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use patterns::PatternsStrategy;
pub use stream::StreamStrategy;
pub use version::VersionStrategy;

/// Load the config named on the command line, or the default one if present.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    path.map_or_else(Config::load_or_default, Config::load_from)
}

/// Compile the matcher table the config describes.
fn build_engine(config: &Config) -> anyhow::Result<ExtractionEngine> {
    let engine = ExtractionEngine::new(&config.extraction.patterns)?;
    info!("Extraction engine ready with {} matchers", engine.matchers().len());
    Ok(engine)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

/// Core trait defining the contract for all command strategies.
///
/// # Example
/// ```rust
/// struct MyStrategy;
///
/// impl CommandStrategy for MyStrategy {
///     type Input = MyInput;
///
///     async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
///         // Command logic here
///         Ok(())
///     }
/// }
/// ```
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
