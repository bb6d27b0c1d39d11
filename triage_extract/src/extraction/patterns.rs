//! Matcher definitions and the default matcher table.
//!
//! A matcher is a case-insensitive regex whose named capture groups double as
//! field paths (see [`FieldPath::from_group_name`]). Group names are discovered
//! by scanning the pattern source and cross-checked against the compiled regex
//! so a pattern can never silently lose a group.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use triage_core::FieldPath;

use crate::extraction::mappings::{
    AGE_UNITS, GENDER, NUMBERS, NormalizationTable, PATTERN_NUMBERS, PRIORITY,
    TRIAGE_MENTAL_STATUS, TRIAGE_PERFUSION,
};

/// Error type for matcher construction.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The regex pattern does not compile.
    #[error("invalid regex in matcher {name}: {source}")]
    Regex {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Group names scanned from the pattern text disagree with the compiled regex.
    #[error("matcher {name}: scanned groups {scanned:?} do not match compiled groups {compiled:?}")]
    GroupMismatch {
        name: String,
        scanned: Vec<String>,
        compiled: Vec<String>,
    },
}

/// Finds `(?<name>` and `(?P<name>` openings in pattern source text.
static GROUP_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\?P?<([A-Za-z_][A-Za-z0-9_]*)>")
        .unwrap_or_else(|e| panic!("group name pattern is invalid: {e}"))
});

/// Named capture groups in `pattern`, in order of first appearance.
#[must_use]
pub fn scan_group_names(pattern: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in GROUP_NAME.captures_iter(pattern) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Serializable definition of a single matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternDef {
    /// Human-readable name, used in logs and listings.
    pub name: String,

    /// Regex with named capture groups; matched case-insensitively.
    pub pattern: String,

    /// Per-group normalization tables, keyed by capture-group name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mappings: BTreeMap<String, NormalizationTable>,
}

impl PatternDef {
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            mappings: BTreeMap::new(),
        }
    }

    /// Attach a normalization table to a capture group.
    #[must_use]
    pub fn with_mapping(mut self, group: impl Into<String>, table: &NormalizationTable) -> Self {
        self.mappings.insert(group.into(), table.clone());
        self
    }

    /// Compile into a [`Matcher`].
    ///
    /// # Errors
    /// Returns an error if the regex is invalid or its groups cannot be discovered.
    pub fn build(&self) -> Result<Matcher, BuildError> {
        Matcher::new(&self.name, &self.pattern, self.mappings.clone())
    }
}

/// A compiled matcher.
#[derive(Debug, Clone)]
pub struct Matcher {
    name: String,
    regex: Regex,
    groups: Vec<String>,
    paths: Vec<FieldPath>,
    mappings: BTreeMap<String, NormalizationTable>,
}

impl Matcher {
    /// Compile `pattern` case-insensitively and discover its named groups.
    ///
    /// A mapping for a group the pattern does not define is kept but never
    /// consulted; it is reported with a warning.
    ///
    /// # Errors
    /// Returns [`BuildError::Regex`] for an invalid pattern and
    /// [`BuildError::GroupMismatch`] when scanning the source finds different
    /// groups than the regex engine compiled.
    pub fn new(
        name: &str,
        pattern: &str,
        mappings: BTreeMap<String, NormalizationTable>,
    ) -> Result<Self, BuildError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| BuildError::Regex {
                name: name.to_string(),
                source,
            })?;

        let groups = scan_group_names(pattern);
        let compiled: Vec<String> = regex
            .capture_names()
            .flatten()
            .map(ToString::to_string)
            .collect();
        if groups != compiled {
            return Err(BuildError::GroupMismatch {
                name: name.to_string(),
                scanned: groups,
                compiled,
            });
        }

        for group in mappings.keys() {
            if !groups.contains(group) {
                warn!(
                    "Matcher {} has a mapping for unknown group {}; it will never apply",
                    name, group
                );
            }
        }

        let paths = groups.iter().map(|g| FieldPath::from_group_name(g)).collect();

        Ok(Self {
            name: name.to_string(),
            regex,
            groups,
            paths,
            mappings,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Capture-group names in order of first appearance.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Field paths, parallel to [`Self::groups`].
    #[must_use]
    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    #[must_use]
    pub fn mapping(&self, group: &str) -> Option<&NormalizationTable> {
        self.mappings.get(group)
    }

    /// Resolve a captured substring through the group's table, if any.
    #[must_use]
    pub fn normalize<'a>(&'a self, group: &str, raw: &'a str) -> &'a str {
        self.mapping(group).map_or(raw, |table| table.normalize(raw))
    }
}

/// Default matcher table.
///
/// Order is precedence: when two matchers write the same path in one pass,
/// the later one wins.
#[must_use]
pub fn default_patterns() -> Vec<PatternDef> {
    let mut patterns = Vec::new();
    patterns.extend(patient_patterns());
    patterns.extend(priority_patterns());
    patterns.extend(rate_patterns());
    patterns.extend(triage_patterns());
    patterns.extend(vital_sign_patterns());
    patterns
}

fn numbers(group: &str) -> String {
    format!(r"(?<{group}>{PATTERN_NUMBERS})\b")
}

/// Name, age and gender.
fn patient_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "full_name",
            r"(?:^|[.,;!?] ?|(?:patient(?:s|'s)?|his|her|their) )name(?: is)? (?<patient0firstName>[^ .,]+)(?: (?<patient0lastName>[^ .,]+))?",
        ),
        PatternDef::new(
            "first_name",
            r"first name(?: is)? (?<patient0firstName>[^ .,]+)",
        ),
        PatternDef::new(
            "last_name",
            r"last name(?: is)? (?<patient0lastName>[^ .,]+)",
        ),
        PatternDef::new("age", format!(r"\bage(?: is)? {}", numbers("patient0age")))
            .with_mapping("patient0age", &NUMBERS),
        PatternDef::new(
            "age_with_units",
            format!(
                r"\b{}(?: |-)(?<patient0ageUnits>years?|months?|days?|hours?|minutes?)(?: |-)old",
                numbers("patient0age")
            ),
        )
        .with_mapping("patient0age", &NUMBERS)
        .with_mapping("patient0ageUnits", &AGE_UNITS),
        PatternDef::new(
            "gender",
            r"(?:gender (?:is )?)?\b(?<patient0gender>male|female|trans(?:gender)? male|trans(?:gender)? female)\b",
        )
        .with_mapping("patient0gender", &GENDER),
    ]
}

const PRIORITY_WORDS: &str =
    "read|red|immediate|yellow|delayed|expectant|deceased|dead|minimal|green|black";

/// "patient is red", "priority immediate", "yellow priority".
fn priority_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "priority_is",
            format!(r"(?:patient|priority) (?:is )?(?<patient0priority>{PRIORITY_WORDS})\b"),
        )
        .with_mapping("patient0priority", &PRIORITY),
        PatternDef::new(
            "priority_suffix",
            format!(r"\b(?<patient0priority>{PRIORITY_WORDS}) priority"),
        )
        .with_mapping("patient0priority", &PRIORITY),
    ]
}

/// Respiratory and heart rate.
fn rate_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "respiratory_rate",
            format!(
                r"(?:respiratory rate|respirations?)[,.]? (?:is |of )?{}",
                numbers("lastVital0respiratoryRate")
            ),
        )
        .with_mapping("lastVital0respiratoryRate", &NUMBERS),
        PatternDef::new(
            "heart_rate",
            format!(
                r"(?:pulse(?: rate)?|heart rate)[,.]? (?:is |of )?{}",
                numbers("lastVital0heartRate")
            ),
        )
        .with_mapping("lastVital0heartRate", &NUMBERS),
    ]
}

/// Mental status, perfusion and capillary refill.
fn triage_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "mental_status",
            r"(?:^| )(?<patient0triageMentalStatus>responsive|unresponsive|not responsive|non-responsive|nonresponsive|confused)(?: to commands?)?",
        )
        .with_mapping("patient0triageMentalStatus", &TRIAGE_MENTAL_STATUS),
        PatternDef::new(
            "follow_commands",
            r"\b(?<patient0triageMentalStatus>can|can't|can’t|unable to) follow commands?",
        )
        .with_mapping("patient0triageMentalStatus", &TRIAGE_MENTAL_STATUS),
        PatternDef::new(
            "perfusion",
            r"(?:radial |radio )?pulses? (?:is |are )?(?<patient0triagePerfusion>absent|presents?)\b",
        )
        .with_mapping("patient0triagePerfusion", &TRIAGE_PERFUSION),
        PatternDef::new(
            "has_pulse",
            r"\b(?<patient0triagePerfusion>no|got|has|have) (?:a )?(?:radial |radio )?pulse",
        )
        .with_mapping("patient0triagePerfusion", &TRIAGE_PERFUSION),
        PatternDef::new(
            "capillary_refill",
            format!(
                r"(?:capri|temp refill|tap refill|cap(?:illary)? refill)(?: time)? (?:is )?(?:less than )?{}",
                numbers("patient0capillaryRefill")
            ),
        )
        .with_mapping("patient0capillaryRefill", &NUMBERS),
    ]
}

/// Blood pressure and Glasgow coma score.
fn vital_sign_patterns() -> Vec<PatternDef> {
    vec![
        PatternDef::new(
            "blood_pressure",
            r"(?:blood pressure|\bbp)[,.]? (?:is |of )?(?<lastVital0bloodPressure>[0-9]+(?: ?/ ?| over )[0-9]+)",
        ),
        PatternDef::new(
            "glasgow_coma_score",
            format!(
                r"(?:total )?(?:glasgow coma scale|gcs|score)(?: score)? (?:is |of )?{}",
                numbers("lastVital0totalGlasgowComaScore")
            ),
        )
        .with_mapping("lastVital0totalGlasgowComaScore", &NUMBERS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_finds_groups_in_order() {
        let groups = scan_group_names(r"(?<a0b>x)(?:y(?P<c>z))?(?<a0b2>w)");
        assert_eq!(groups, ["a0b", "c", "a0b2"]);
    }

    #[test]
    fn scan_ignores_non_capturing_groups() {
        assert!(scan_group_names(r"(?:abc)(?i)(def)").is_empty());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn build_derives_paths() {
        let matcher = PatternDef::new("t", r"age (?<patient0age>\d+)")
            .build()
            .expect("valid pattern should build");
        assert_eq!(matcher.groups(), ["patient0age"]);
        assert_eq!(matcher.paths()[0].as_str(), "patient.age");
    }

    #[test]
    fn invalid_regex_fails_construction() {
        let result = PatternDef::new("broken", r"(?<patient0age>\d+").build();
        assert!(matches!(result, Err(BuildError::Regex { ref name, .. }) if name == "broken"));
    }

    #[test]
    fn escaped_group_syntax_is_caught() {
        // The scan sees a group in the escaped text that the regex never compiles.
        let result = PatternDef::new("escaped", r"\(?<fake>x\)").build();
        assert!(matches!(result, Err(BuildError::GroupMismatch { .. })));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn mapping_for_unknown_group_is_kept_but_unused() {
        let matcher = PatternDef::new("t", r"(?<patient0gender>male)")
            .with_mapping("patient0sex", &GENDER)
            .build()
            .expect("orphan mapping is not fatal");
        assert_eq!(matcher.normalize("patient0gender", "male"), "male");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let matchers: Vec<_> = default_patterns()
            .iter()
            .filter_map(|def| def.build().ok())
            .collect();
        let gender = matchers.iter().find(|m| m.name() == "gender");
        assert!(gender.is_some_and(|m| m.regex().is_match("GENDER IS FEMALE")));
    }

    #[test]
    fn default_table_builds() {
        let defs = default_patterns();
        assert_eq!(defs.len(), 17);
        for def in &defs {
            assert!(def.build().is_ok(), "default matcher {} must build", def.name);
        }
    }

    #[test]
    fn default_mappings_name_real_groups() {
        for def in default_patterns() {
            let groups = scan_group_names(&def.pattern);
            for group in def.mappings.keys() {
                assert!(groups.contains(group), "{}: {group}", def.name);
            }
        }
    }
}
