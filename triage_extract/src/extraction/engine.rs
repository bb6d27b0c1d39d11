//! Extraction engine for populating a report from transcript text.
//!
//! Every matcher is tried against the whole text on every call. Each matcher
//! contributes at most its first match, and every named group that took part
//! in that match becomes one field write. Writes are applied in table order,
//! so the last matcher to address a path wins.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use triage_core::{FieldError, FieldPath, FieldTarget};

use crate::extraction::patterns::{BuildError, Matcher, PatternDef, default_patterns};

/// Configuration for the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Start from the built-in matcher table.
    #[serde(default = "default_include_defaults")]
    pub include_defaults: bool,

    /// Extra matchers evaluated after the built-in table.
    #[serde(default)]
    pub custom_patterns: Vec<PatternDef>,
}

const fn default_include_defaults() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl ExtractionConfig {
    /// Definitions in evaluation order.
    #[must_use]
    pub fn pattern_defs(&self) -> Vec<PatternDef> {
        let mut defs = if self.include_defaults {
            default_patterns()
        } else {
            Vec::new()
        };
        defs.extend(self.custom_patterns.iter().cloned());
        defs
    }
}

/// Byte range within the transcript text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl From<regex::Match<'_>> for Span {
    fn from(m: regex::Match<'_>) -> Self {
        Self {
            start: m.start(),
            len: m.len(),
        }
    }
}

/// One resolved field write produced by a matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    /// Name of the matcher that produced this write.
    pub matcher: String,
    /// Capture group the value came from.
    pub group: String,
    pub path: FieldPath,
    /// Substring exactly as captured.
    pub raw: String,
    /// Value after normalization.
    pub value: String,
    /// Span of the capture group.
    pub range: Span,
    /// Span of the whole match.
    pub match_range: Span,
}

impl Extraction {
    /// Write this extraction into `target`.
    ///
    /// # Errors
    /// Propagates the target's own write failure.
    pub fn apply<T: FieldTarget + ?Sized>(&self, target: &mut T) -> Result<(), FieldError> {
        target.write_field(&self.path, &self.value)
    }
}

/// Extraction engine over an ordered, immutable matcher table.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    matchers: Vec<Matcher>,
}

static DEFAULT_ENGINE: Lazy<ExtractionEngine> = Lazy::new(|| {
    ExtractionEngine::with_defaults()
        .unwrap_or_else(|e| panic!("built-in matcher table failed to compile: {e}"))
});

impl ExtractionEngine {
    /// Create an engine from configuration.
    ///
    /// # Errors
    /// Returns an error if any pattern fails to compile.
    pub fn new(config: &ExtractionConfig) -> Result<Self, BuildError> {
        let matchers = config
            .pattern_defs()
            .iter()
            .map(PatternDef::build)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Compiled {} matchers", matchers.len());
        Ok(Self { matchers })
    }

    /// Create an engine with the built-in matcher table.
    ///
    /// # Errors
    /// Returns an error if default pattern compilation fails.
    pub fn with_defaults() -> Result<Self, BuildError> {
        Self::new(&ExtractionConfig::default())
    }

    /// Create an engine from already compiled matchers, in evaluation order.
    #[must_use]
    pub const fn from_matchers(matchers: Vec<Matcher>) -> Self {
        Self { matchers }
    }

    /// Process-wide engine over the built-in table, compiled on first use.
    ///
    /// # Panics
    /// Panics if the built-in table does not compile.
    #[must_use]
    pub fn shared() -> &'static Self {
        &DEFAULT_ENGINE
    }

    #[must_use]
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Run every matcher against `text` and collect the writes it implies,
    /// in application order, without touching any record.
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<Extraction> {
        let mut extractions = Vec::new();
        if text.trim().is_empty() {
            return extractions;
        }

        for matcher in &self.matchers {
            let Some(caps) = matcher.regex().captures(text) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };

            for (group, path) in matcher.groups().iter().zip(matcher.paths()) {
                // Groups inside an optional quantifier may not have participated.
                let Some(m) = caps.name(group) else {
                    continue;
                };
                let raw = m.as_str();
                let value = matcher.normalize(group, raw);
                debug!(
                    "Matcher {} set {} = {:?} (captured {:?})",
                    matcher.name(),
                    path,
                    value,
                    raw
                );
                extractions.push(Extraction {
                    matcher: matcher.name().to_string(),
                    group: group.clone(),
                    path: path.clone(),
                    raw: raw.to_string(),
                    value: value.to_string(),
                    range: m.into(),
                    match_range: whole.into(),
                });
            }
        }

        extractions
    }

    /// Populate `target` from `text`.
    ///
    /// Failed writes are logged and skipped; the pass always runs to the end.
    pub fn extract<T: FieldTarget + ?Sized>(&self, text: &str, target: &mut T) {
        for extraction in self.scan(text) {
            if let Err(e) = extraction.apply(target) {
                warn!(
                    "Matcher {} could not write {}: {}",
                    extraction.matcher, extraction.path, e
                );
            }
        }
    }
}
