use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use triage_core::{FieldTarget, Report};
use triage_extract::{ApplyOutcome, DictationSession, ExtractionEngine, SessionOptions, TranscriptUpdate};
use uuid::Uuid;

use super::{build_engine, load_config, print_json};

pub struct ExtractInput {
    pub config_path: Option<PathBuf>,
    pub text: Option<String>,
    pub source_id: Option<String>,
    pub is_final: bool,
    pub raw: bool,
}

/// Runs one transcript through a fresh session and prints the result.
///
/// With `raw` the target is a plain path to value map, which also shows
/// writes to paths the typed report does not know.
#[derive(Debug, Clone, Copy)]
pub struct ExtractStrategy;

impl super::CommandStrategy for ExtractStrategy {
    type Input = ExtractInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_config(input.config_path.as_deref())?;
        let engine = build_engine(&config)?;

        let text = match input.text {
            Some(text) => text,
            None => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                buf.trim_end().to_string()
            }
        };

        let source_id = input
            .source_id
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        let mut update = TranscriptUpdate::interim(source_id, text);
        update.is_final = input.is_final;

        let options = config.extraction.session_options();
        let pretty = config.output.pretty;
        if input.raw {
            let (fields, outcome) = run::<BTreeMap<String, String>>(&engine, options, &update);
            report_outcome(&outcome);
            print_json(&fields, pretty)
        } else {
            let (report, outcome) = run::<Report>(&engine, options, &update);
            report_outcome(&outcome);
            print_json(&report, pretty)
        }
    }
}

fn run<T: FieldTarget + Default>(
    engine: &ExtractionEngine,
    options: SessionOptions,
    update: &TranscriptUpdate,
) -> (T, ApplyOutcome) {
    let mut session: DictationSession<'_, T> = DictationSession::new(engine, options);
    let outcome = session.apply(update);
    let (target, _ledger) = session.into_parts();
    (target, outcome)
}

fn report_outcome(outcome: &ApplyOutcome) {
    info!("{} fields written", outcome.written.len());
    for failure in &outcome.failed {
        warn!("Skipped {}: {}", failure.path, failure.error);
    }
}
