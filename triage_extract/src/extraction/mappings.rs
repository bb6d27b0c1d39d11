//! Normalization tables from dictated tokens to canonical field values.
//!
//! Speech recognition hands back colloquial or misheard words ("read" for
//! "red", "to" for "two"). Each table maps the lowercased token to the value
//! the report expects. Tokens missing from a table pass through unchanged.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use triage_core::{AgeUnits, Gender, MentalStatus, Perfusion, Priority};

/// A lowercase-token to canonical-value lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct NormalizationTable {
    entries: HashMap<String, String>,
}

impl From<HashMap<String, String>> for NormalizationTable {
    fn from(entries: HashMap<String, String>) -> Self {
        Self::from_pairs(entries)
    }
}

impl From<NormalizationTable> for HashMap<String, String> {
    fn from(table: NormalizationTable) -> Self {
        table.entries
    }
}

impl NormalizationTable {
    /// Build a table from `(token, value)` pairs. Tokens are stored lowercased.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Canonical value for `raw`, compared case-insensitively.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.entries.get(&raw.to_lowercase()).map(String::as_str)
    }

    /// Canonical value for `raw`, or `raw` itself when the table has no entry.
    #[must_use]
    pub fn normalize<'a>(&'a self, raw: &'a str) -> &'a str {
        self.lookup(raw).unwrap_or(raw)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Regex alternation for a count: digits or a spoken single digit.
///
/// Includes the homophones `to` and `too`, which recognizers emit for "two".
pub const PATTERN_NUMBERS: &str = r"[0-9]+|one|to|too|two|three|four|five|six|seven|eight|nine";

pub static NUMBERS: Lazy<NormalizationTable> = Lazy::new(|| {
    NormalizationTable::from_pairs([
        ("one", "1"),
        ("to", "2"),
        ("too", "2"),
        ("two", "2"),
        ("three", "3"),
        ("four", "4"),
        ("five", "5"),
        ("six", "6"),
        ("seven", "7"),
        ("eight", "8"),
        ("nine", "9"),
    ])
});

pub static AGE_UNITS: Lazy<NormalizationTable> = Lazy::new(|| {
    NormalizationTable::from_pairs([
        ("year", AgeUnits::Years.code()),
        ("years", AgeUnits::Years.code()),
        ("month", AgeUnits::Months.code()),
        ("months", AgeUnits::Months.code()),
        ("day", AgeUnits::Days.code()),
        ("days", AgeUnits::Days.code()),
        ("hour", AgeUnits::Hours.code()),
        ("hours", AgeUnits::Hours.code()),
        ("minute", AgeUnits::Minutes.code()),
        ("minutes", AgeUnits::Minutes.code()),
    ])
});

pub static GENDER: Lazy<NormalizationTable> = Lazy::new(|| {
    NormalizationTable::from_pairs([
        ("male", Gender::Male.code()),
        ("female", Gender::Female.code()),
        ("trans male", Gender::TransMale.code()),
        ("trans female", Gender::TransFemale.code()),
        ("transgender male", Gender::TransMale.code()),
        ("transgender female", Gender::TransFemale.code()),
    ])
});

pub static TRIAGE_MENTAL_STATUS: Lazy<NormalizationTable> = Lazy::new(|| {
    NormalizationTable::from_pairs([
        ("responsive", MentalStatus::AbleToComply.code()),
        ("can", MentalStatus::AbleToComply.code()),
        ("unresponsive", MentalStatus::UnableToComply.code()),
        ("not responsive", MentalStatus::UnableToComply.code()),
        ("non-responsive", MentalStatus::UnableToComply.code()),
        ("nonresponsive", MentalStatus::UnableToComply.code()),
        ("can't", MentalStatus::UnableToComply.code()),
        ("can’t", MentalStatus::UnableToComply.code()),
        ("unable to", MentalStatus::UnableToComply.code()),
        ("confused", MentalStatus::DifficultyComplying.code()),
    ])
});

pub static TRIAGE_PERFUSION: Lazy<NormalizationTable> = Lazy::new(|| {
    NormalizationTable::from_pairs([
        ("absent", Perfusion::RadialPulseAbsent.code()),
        ("no", Perfusion::RadialPulseAbsent.code()),
        ("present", Perfusion::RadialPulsePresent.code()),
        ("presents", Perfusion::RadialPulsePresent.code()),
        ("got", Perfusion::RadialPulsePresent.code()),
        ("has", Perfusion::RadialPulsePresent.code()),
        ("have", Perfusion::RadialPulsePresent.code()),
    ])
});

pub static PRIORITY: Lazy<NormalizationTable> = Lazy::new(|| {
    NormalizationTable::from_pairs([
        ("read", Priority::Immediate.code()),
        ("red", Priority::Immediate.code()),
        ("immediate", Priority::Immediate.code()),
        ("yellow", Priority::Delayed.code()),
        ("delayed", Priority::Delayed.code()),
        ("expectant", Priority::Expectant.code()),
        ("minimal", Priority::Minimal.code()),
        ("green", Priority::Minimal.code()),
        ("black", Priority::Dead.code()),
        ("dead", Priority::Dead.code()),
        ("deceased", Priority::Dead.code()),
    ])
});
