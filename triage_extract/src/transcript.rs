//! Transcript updates delivered by the speech recognizer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The complete current hypothesis for one recording.
///
/// `text` is the whole transcript so far, not a delta. `metadata` is carried
/// through to the prediction ledger untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptUpdate {
    pub source_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Settled transcription; interim hypotheses may still be revised.
    #[serde(default)]
    pub is_final: bool,
}

impl TranscriptUpdate {
    /// An interim (still revisable) hypothesis.
    #[must_use]
    pub fn interim(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            metadata: Map::new(),
            is_final: false,
        }
    }

    /// A settled transcription.
    #[must_use]
    pub fn settled(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            is_final: true,
            ..Self::interim(source_id, text)
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
