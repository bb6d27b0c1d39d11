//! Long-running dictation over stdin.
//!
//! A reader task parses one `TranscriptUpdate` per line and sends it over a
//! channel. The command itself owns the session and applies updates in
//! arrival order, so a report only ever has one writer.

use std::path::PathBuf;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use triage_core::Report;
use triage_extract::{DictationSession, TranscriptUpdate};

use super::{build_engine, load_config, print_json};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct StreamStrategy;

impl super::CommandStrategy for StreamStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let config = load_config(config_path.as_deref())?;
        let engine = build_engine(&config)?;

        let (tx, mut rx) = mpsc::channel::<TranscriptUpdate>(CHANNEL_CAPACITY);
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let Some(update) = parse_update(&line) else {
                    continue;
                };
                if tx.send(update).await.is_err() {
                    break;
                }
            }
            anyhow::Ok(())
        });

        let mut session: DictationSession<'_, Report> =
            DictationSession::new(&engine, config.extraction.session_options());
        let mut applied = 0usize;
        while let Some(update) = rx.recv().await {
            debug!("Update from {} (final: {})", update.source_id, update.is_final);
            let outcome = session.apply(&update);
            applied += 1;
            print_json(&json!({ "sourceId": update.source_id, "outcome": outcome }), false)?;
        }

        reader.await??;
        info!("Stream closed after {} updates", applied);

        let (report, ledger) = session.into_parts();
        print_json(
            &json!({ "report": report, "ledger": ledger }),
            config.output.pretty,
        )
    }
}

/// Decode one input line. Blank and malformed lines yield `None`.
fn parse_update(line: &str) -> Option<TranscriptUpdate> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(update) => Some(update),
        Err(e) => {
            warn!("Skipping malformed update: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_updates() {
        let update = parse_update(r#" {"sourceId":"r1","text":"age 5","isFinal":true} "#);
        assert_eq!(update.as_ref().map(|u| u.source_id.as_str()), Some("r1"));
        assert_eq!(update.map(|u| u.is_final), Some(true));
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        assert!(parse_update("   ").is_none());
        assert!(parse_update("age 5").is_none());
        assert!(parse_update(r#"{"text":"missing id"}"#).is_none());
    }
}
