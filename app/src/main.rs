#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod command;

use command::{
    CommandStrategy, ExtractInput, ExtractStrategy, InfoStrategy, InitStrategy,
    PatternsStrategy, StreamStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Turn dictated EMS triage notes into structured report fields", long_about = None)]
struct Cli {
    /// Log matches and writes at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/triage/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from one transcript
    Extract {
        /// Transcript text; read from stdin when omitted
        text: Option<String>,

        /// Recording id to attribute predictions to
        #[arg(long)]
        source_id: Option<String>,

        /// Treat the transcript as settled
        #[arg(long = "final")]
        is_final: bool,

        /// Print the raw path to value map instead of the typed report
        #[arg(long)]
        raw: bool,
    },
    /// Apply JSON-lines transcript updates from stdin to one report
    Stream,
    /// List the matcher table
    Patterns,
    /// Show configuration
    Info,
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config;

    match cli.command {
        Commands::Extract {
            text,
            source_id,
            is_final,
            raw,
        } => {
            ExtractStrategy
                .execute(ExtractInput {
                    config_path,
                    text,
                    source_id,
                    is_final,
                    raw,
                })
                .await?;
        }
        Commands::Stream => StreamStrategy.execute(config_path).await?,
        Commands::Patterns => PatternsStrategy.execute(config_path).await?,
        Commands::Info => InfoStrategy.execute(config_path).await?,
        Commands::Init => InitStrategy.execute(()).await?,
        Commands::Version => VersionStrategy.execute(()).await?,
    }

    Ok(())
}
