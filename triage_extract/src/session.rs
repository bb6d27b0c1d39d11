//! Host-side session that feeds recognizer output into a report.
//!
//! The engine itself is stateless. A session adds what a dictation screen
//! needs around it: number clean-up, the narrative text, provenance for every
//! write and a policy for revised interim hypotheses.
//!
//! A session is not synchronized. Updates for one report must be applied one
//! at a time by whoever owns the session.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use triage_core::{FieldPath, FieldTarget, Report};

use crate::extraction::engine::ExtractionEngine;
use crate::predictions::{PredictionLedger, PredictionStatus};
use crate::preprocess::join_split_numbers;
use crate::transcript::TranscriptUpdate;

/// Path that receives the processed transcript text.
pub const NARRATIVE_PATH: &str = "narrative.text";

/// What to do with fields an earlier hypothesis from the same source wrote
/// when a revised hypothesis no longer produces them.
///
/// Under either policy a confirmed prediction is final for its source: later
/// revisions from that source neither revert nor overwrite it. Another
/// source may still write the path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionPolicy {
    /// Leave earlier writes in place.
    #[default]
    Keep,
    /// Restore the value the field held before that source wrote it.
    Revert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Join numbers the recognizer split (`1 20` to `120`) before matching.
    pub join_split_numbers: bool,
    pub revision_policy: RevisionPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            join_split_numbers: true,
            revision_policy: RevisionPolicy::Keep,
        }
    }
}

/// A write that the target refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub path: FieldPath,
    pub error: String,
}

/// Result of applying one transcript update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    /// Paths written, in application order. A path appears once per write.
    pub written: Vec<FieldPath>,
    /// Paths restored or cleared under [`RevisionPolicy::Revert`].
    pub reverted: Vec<FieldPath>,
    pub failed: Vec<FieldFailure>,
    /// Confirmed paths a revision from the same source left untouched.
    pub kept_confirmed: Vec<FieldPath>,
    /// Sources dropped from the ledger after a final update.
    pub pruned_sources: usize,
}

/// Dictation session for one record.
pub struct DictationSession<'e, T = Report> {
    engine: &'e ExtractionEngine,
    options: SessionOptions,
    target: T,
    ledger: PredictionLedger,
    /// Narrative the record held before dictation started.
    narrative_base: Option<String>,
}

impl<'e, T: FieldTarget + Default> DictationSession<'e, T> {
    #[must_use]
    pub fn new(engine: &'e ExtractionEngine, options: SessionOptions) -> Self {
        Self::with_target(engine, options, T::default())
    }
}

impl<'e, T: FieldTarget> DictationSession<'e, T> {
    /// Start a session over an existing record.
    ///
    /// Any narrative the record already has is kept; dictated text is
    /// appended to it.
    #[must_use]
    pub fn with_target(engine: &'e ExtractionEngine, options: SessionOptions, target: T) -> Self {
        let narrative_base = target
            .read_field(&FieldPath::new(NARRATIVE_PATH))
            .filter(|text| !text.trim().is_empty());
        Self {
            engine,
            options,
            target,
            ledger: PredictionLedger::new(),
            narrative_base,
        }
    }

    #[must_use]
    pub const fn target(&self) -> &T {
        &self.target
    }

    pub const fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    #[must_use]
    pub const fn ledger(&self) -> &PredictionLedger {
        &self.ledger
    }

    pub const fn ledger_mut(&mut self) -> &mut PredictionLedger {
        &mut self.ledger
    }

    #[must_use]
    pub const fn options(&self) -> SessionOptions {
        self.options
    }

    /// Consume the session, returning the record and its ledger.
    pub fn into_parts(self) -> (T, PredictionLedger) {
        (self.target, self.ledger)
    }

    /// Apply the current transcript for one recording.
    pub fn apply(&mut self, update: &TranscriptUpdate) -> ApplyOutcome {
        let text = if self.options.join_split_numbers {
            join_split_numbers(&update.text)
        } else {
            update.text.as_str().into()
        };

        let mut outcome = ApplyOutcome::default();

        let narrative = FieldPath::new(NARRATIVE_PATH);
        let narrative_text = self
            .narrative_base
            .as_ref()
            .map_or_else(|| text.to_string(), |base| format!("{base} {text}"));
        if let Err(e) = self.target.write_field(&narrative, &narrative_text) {
            debug!("Target has no narrative field: {}", e);
        }

        let extractions = self.engine.scan(&text);
        self.ledger.add_source(update, &text);

        if self.options.revision_policy == RevisionPolicy::Revert {
            let produced: HashSet<&FieldPath> = extractions.iter().map(|e| &e.path).collect();
            self.revert_dropped(&update.source_id, &produced, &mut outcome);
        }

        for extraction in &extractions {
            let previous = match self.ledger.get(&extraction.path) {
                Some(p) if p.source_id == update.source_id => {
                    if p.status == PredictionStatus::Confirmed {
                        debug!(
                            "Keeping confirmed {} against revision of {}",
                            extraction.path, update.source_id
                        );
                        outcome.kept_confirmed.push(extraction.path.clone());
                        continue;
                    }
                    p.previous.clone()
                }
                _ => self.target.read_field(&extraction.path),
            };
            match extraction.apply(&mut self.target) {
                Ok(()) => {
                    self.ledger
                        .record(&update.source_id, extraction, previous);
                    outcome.written.push(extraction.path.clone());
                }
                Err(e) => {
                    warn!(
                        "Matcher {} could not write {}: {}",
                        extraction.matcher, extraction.path, e
                    );
                    outcome.failed.push(FieldFailure {
                        path: extraction.path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if update.is_final {
            outcome.pruned_sources = self.ledger.prune_sources();
            info!(
                "Final transcript for {}: {} fields written, {} sources pruned",
                update.source_id,
                outcome.written.len(),
                outcome.pruned_sources
            );
        }

        outcome
    }

    fn revert_dropped(
        &mut self,
        source_id: &str,
        produced: &HashSet<&FieldPath>,
        outcome: &mut ApplyOutcome,
    ) {
        for path in self.ledger.paths_from_source(source_id) {
            if produced.contains(&path) {
                continue;
            }
            let Some(prediction) = self.ledger.get(&path) else {
                continue;
            };
            if prediction.status == PredictionStatus::Confirmed {
                continue;
            }
            let previous = prediction.previous.clone();
            let restored = match previous {
                Some(value) => self.target.write_field(&path, &value),
                None => self.target.clear_field(&path),
            };
            match restored {
                Ok(()) => {
                    self.ledger.remove(&path);
                    debug!("Reverted {} after revision of {}", path, source_id);
                    outcome.reverted.push(path);
                }
                Err(e) => warn!("Could not revert {}: {}", path, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn revert() -> SessionOptions {
        SessionOptions {
            revision_policy: RevisionPolicy::Revert,
            ..SessionOptions::default()
        }
    }

    #[test]
    fn writes_narrative_and_fields() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), SessionOptions::default());
        let outcome = session.apply(&TranscriptUpdate::interim("r1", "pulse 1 10"));

        assert_eq!(session.target().last_vital.heart_rate, Some(110));
        assert_eq!(session.target().narrative.text.as_deref(), Some("pulse 110"));
        assert_eq!(outcome.written, [FieldPath::new("lastVital.heartRate")]);
    }

    #[test]
    fn keep_policy_leaves_stale_writes() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), SessionOptions::default());
        session.apply(&TranscriptUpdate::interim("r1", "patient is red"));
        let outcome = session.apply(&TranscriptUpdate::interim("r1", "patient is breathing"));

        assert!(outcome.reverted.is_empty());
        assert_eq!(session.target().patient.priority, Some(triage_core::Priority::Immediate));
    }

    #[test]
    fn revert_policy_restores_previous_value() {
        let mut report = Report::new();
        report.patient.priority = Some(triage_core::Priority::Minimal);
        let mut session = DictationSession::with_target(ExtractionEngine::shared(), revert(), report);

        session.apply(&TranscriptUpdate::interim("r1", "patient is red"));
        assert_eq!(session.target().patient.priority, Some(triage_core::Priority::Immediate));

        let outcome = session.apply(&TranscriptUpdate::interim("r1", "patient is breathing"));
        assert_eq!(outcome.reverted, [FieldPath::new("patient.priority")]);
        assert_eq!(session.target().patient.priority, Some(triage_core::Priority::Minimal));
        assert!(session.ledger().get(&FieldPath::new("patient.priority")).is_none());
    }

    #[test]
    fn revert_policy_clears_field_without_previous_value() {
        let mut session: DictationSession<'_, BTreeMap<String, String>> =
            DictationSession::new(ExtractionEngine::shared(), revert());
        session.apply(&TranscriptUpdate::interim("r1", "age 5"));
        let outcome = session.apply(&TranscriptUpdate::interim("r1", "page 5"));

        assert_eq!(outcome.reverted, [FieldPath::new("patient.age")]);
        assert!(!session.target().contains_key("patient.age"));
    }

    #[test]
    fn revert_policy_ignores_other_sources() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), revert());
        session.apply(&TranscriptUpdate::settled("r1", "age 40"));
        let outcome = session.apply(&TranscriptUpdate::interim("r2", "pulse 90"));

        assert!(outcome.reverted.is_empty());
        assert_eq!(session.target().patient.age, Some(40));
    }

    #[test]
    fn revert_policy_spares_confirmed_predictions() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), revert());
        session.apply(&TranscriptUpdate::interim("r1", "age 40"));
        assert!(session.ledger_mut().confirm(&FieldPath::new("patient.age")));

        session.apply(&TranscriptUpdate::interim("r1", "stage 4"));
        assert_eq!(session.target().patient.age, Some(40));
    }

    #[test]
    fn revision_does_not_overwrite_confirmed_value() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), SessionOptions::default());
        session.apply(&TranscriptUpdate::interim("r1", "pulse 90"));
        let path = FieldPath::new("lastVital.heartRate");
        assert!(session.ledger_mut().confirm(&path));

        let outcome = session.apply(&TranscriptUpdate::interim("r1", "pulse 98"));
        assert_eq!(outcome.kept_confirmed, [path.clone()]);
        assert!(outcome.written.is_empty());
        assert_eq!(session.target().last_vital.heart_rate, Some(90));
        assert_eq!(
            session.ledger().get(&path).map(|p| p.status),
            Some(PredictionStatus::Confirmed)
        );

        let outcome = session.apply(&TranscriptUpdate::interim("r2", "pulse 104"));
        assert_eq!(outcome.written, [path]);
        assert_eq!(session.target().last_vital.heart_rate, Some(104));
    }

    #[test]
    fn existing_narrative_is_kept_and_extended() {
        let mut report = Report::new();
        report.narrative.text = Some("Found patient on sidewalk.".to_string());
        let mut session =
            DictationSession::with_target(ExtractionEngine::shared(), SessionOptions::default(), report);

        session.apply(&TranscriptUpdate::interim("r2", "pulse"));
        session.apply(&TranscriptUpdate::settled("r2", "pulse 90"));

        assert_eq!(
            session.target().narrative.text.as_deref(),
            Some("Found patient on sidewalk. pulse 90")
        );
        assert_eq!(session.target().last_vital.heart_rate, Some(90));
    }

    #[test]
    fn blank_narrative_is_not_used_as_prefix() {
        let mut report = Report::new();
        report.narrative.text = Some("  ".to_string());
        let mut session =
            DictationSession::with_target(ExtractionEngine::shared(), SessionOptions::default(), report);
        session.apply(&TranscriptUpdate::interim("r1", "age 40"));
        assert_eq!(session.target().narrative.text.as_deref(), Some("age 40"));
    }

    #[test]
    fn final_update_prunes_superseded_sources() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), SessionOptions::default());
        session.apply(&TranscriptUpdate::settled("r1", "age 40"));
        let outcome = session.apply(&TranscriptUpdate::settled("r2", "age 41"));

        assert_eq!(outcome.pruned_sources, 1);
        assert!(session.ledger().source("r1").is_none());
        assert!(session.ledger().source("r2").is_some());
    }

    #[test]
    fn spoken_homophone_is_normalized() {
        let mut session: DictationSession<'_> =
            DictationSession::new(ExtractionEngine::shared(), SessionOptions::default());
        let outcome = session.apply(&TranscriptUpdate::interim("r1", "age to"));
        assert!(outcome.failed.is_empty());
        assert_eq!(session.target().patient.age, Some(2));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn failed_writes_are_reported() {
        let engine = ExtractionEngine::from_matchers(vec![
            crate::PatternDef::new("shoe", r"shoe size (?<patient0shoeSize>\d+)")
                .build()
                .expect("pattern should build"),
        ]);
        let mut session: DictationSession<'_> =
            DictationSession::new(&engine, SessionOptions::default());
        let outcome = session.apply(&TranscriptUpdate::settled("r1", "shoe size 11"));

        assert!(outcome.written.is_empty());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].path, FieldPath::new("patient.shoeSize"));
        assert!(session.ledger().is_empty());
        assert_eq!(outcome.pruned_sources, 1);
    }
}
