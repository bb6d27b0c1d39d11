//! Provenance for values written from dictation.
//!
//! Each field written by extraction gets a [`Prediction`] recording which
//! transcript produced it and where in that transcript the value sits, so a
//! reviewer can confirm or reject it later. Transcripts themselves are kept
//! once per source id and dropped when nothing references them any more.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use triage_core::FieldPath;

use crate::extraction::engine::{Extraction, Span};
use crate::transcript::TranscriptUpdate;

/// Review state of a predicted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    #[default]
    Unconfirmed,
    Confirmed,
    Rejected,
}

/// A field value attributed to a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub path: FieldPath,
    pub group: String,
    pub matcher: String,
    pub source_id: String,
    pub value: String,
    /// Span of the captured value in the source text.
    pub range: Span,
    /// Span of the whole phrase that matched.
    pub source_range: Span,
    pub status: PredictionStatus,
    /// Value the field held before this source first wrote it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Latest text seen for a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSource {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    pub is_final: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionLedger {
    predictions: BTreeMap<FieldPath, Prediction>,
    #[serde(rename = "_sources")]
    sources: BTreeMap<String, TranscriptSource>,
}

impl PredictionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` as the current transcript for the update's source.
    pub fn add_source(&mut self, update: &TranscriptUpdate, text: &str) {
        self.sources.insert(
            update.source_id.clone(),
            TranscriptSource {
                id: update.source_id.clone(),
                text: text.to_string(),
                metadata: update.metadata.clone(),
                is_final: update.is_final,
            },
        );
    }

    /// Record that `extraction`, taken from `source_id`, now holds its path.
    ///
    /// Replaces any earlier prediction for the same path.
    pub fn record(&mut self, source_id: &str, extraction: &Extraction, previous: Option<String>) {
        self.predictions.insert(
            extraction.path.clone(),
            Prediction {
                path: extraction.path.clone(),
                group: extraction.group.clone(),
                matcher: extraction.matcher.clone(),
                source_id: source_id.to_string(),
                value: extraction.value.clone(),
                range: extraction.range,
                source_range: extraction.match_range,
                status: PredictionStatus::Unconfirmed,
                previous,
                recorded_at: Utc::now(),
            },
        );
    }

    #[must_use]
    pub fn get(&self, path: &FieldPath) -> Option<&Prediction> {
        self.predictions.get(path)
    }

    pub fn remove(&mut self, path: &FieldPath) -> Option<Prediction> {
        self.predictions.remove(path)
    }

    pub fn predictions(&self) -> impl Iterator<Item = &Prediction> {
        self.predictions.values()
    }

    #[must_use]
    pub fn source(&self, id: &str) -> Option<&TranscriptSource> {
        self.sources.get(id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &TranscriptSource> {
        self.sources.values()
    }

    /// Paths whose current prediction came from `source_id`.
    #[must_use]
    pub fn paths_from_source(&self, source_id: &str) -> Vec<FieldPath> {
        self.predictions
            .values()
            .filter(|p| p.source_id == source_id)
            .map(|p| p.path.clone())
            .collect()
    }

    /// Drop sources no prediction refers to. Returns how many were removed.
    pub fn prune_sources(&mut self) -> usize {
        let before = self.sources.len();
        let predictions = &self.predictions;
        self.sources
            .retain(|id, _| predictions.values().any(|p| &p.source_id == id));
        before - self.sources.len()
    }

    /// Mark the prediction at `path` as confirmed. Returns false if there is none.
    pub fn confirm(&mut self, path: &FieldPath) -> bool {
        self.set_status(path, PredictionStatus::Confirmed)
    }

    /// Mark the prediction at `path` as rejected. Returns false if there is none.
    pub fn reject(&mut self, path: &FieldPath) -> bool {
        self.set_status(path, PredictionStatus::Rejected)
    }

    fn set_status(&mut self, path: &FieldPath, status: PredictionStatus) -> bool {
        self.predictions.get_mut(path).is_some_and(|p| {
            p.status = status;
            true
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extraction(path: &str, value: &str) -> Extraction {
        Extraction {
            matcher: "test".to_string(),
            group: path.replace('.', "0"),
            path: FieldPath::new(path),
            raw: value.to_string(),
            value: value.to_string(),
            range: Span { start: 0, len: value.len() },
            match_range: Span { start: 0, len: value.len() },
        }
    }

    #[test]
    fn later_record_replaces_earlier() {
        let mut ledger = PredictionLedger::new();
        ledger.record("a", &extraction("patient.age", "5"), None);
        ledger.record("b", &extraction("patient.age", "6"), Some("5".to_string()));

        let prediction = ledger.get(&FieldPath::new("patient.age"));
        assert_eq!(prediction.map(|p| p.source_id.as_str()), Some("b"));
        assert_eq!(prediction.map(|p| p.value.as_str()), Some("6"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn prune_drops_unreferenced_sources() {
        let mut ledger = PredictionLedger::new();
        ledger.add_source(&TranscriptUpdate::interim("a", "age 5"), "age 5");
        ledger.add_source(&TranscriptUpdate::settled("b", "age 6"), "age 6");
        ledger.record("a", &extraction("patient.age", "5"), None);
        ledger.record("b", &extraction("patient.age", "6"), None);

        assert_eq!(ledger.prune_sources(), 1);
        assert!(ledger.source("a").is_none());
        assert!(ledger.source("b").is_some_and(|s| s.is_final));
    }

    #[test]
    fn status_changes_require_a_prediction() {
        let mut ledger = PredictionLedger::new();
        let path = FieldPath::new("patient.gender");
        assert!(!ledger.confirm(&path));

        ledger.record("a", &extraction("patient.gender", "9906003"), None);
        assert!(ledger.confirm(&path));
        assert_eq!(
            ledger.get(&path).map(|p| p.status),
            Some(PredictionStatus::Confirmed)
        );
        assert!(ledger.reject(&path));
        assert_eq!(
            ledger.get(&path).map(|p| p.status),
            Some(PredictionStatus::Rejected)
        );
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn serializes_sources_under_reserved_key() {
        let mut ledger = PredictionLedger::new();
        ledger.add_source(&TranscriptUpdate::interim("a", "age 5"), "age 5");
        ledger.record("a", &extraction("patient.age", "5"), None);

        let json = serde_json::to_value(&ledger).expect("ledger should serialize");
        assert_eq!(json["_sources"]["a"]["text"], "age 5");
        assert_eq!(json["predictions"]["patient.age"]["status"], "unconfirmed");
    }
}
