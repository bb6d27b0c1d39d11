//! Field paths and the write contract for extraction targets.
//!
//! Regex group names cannot contain dots, so nested paths are spelled with the
//! digit `0` as the separator: the group `patient0firstName` addresses
//! `patient.firstName`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator used inside capture-group names in place of `.`.
pub const GROUP_PATH_SEPARATOR: char = '0';

/// A dotted address into a structured record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a path from its dotted form.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Translate a capture-group name into a path by replacing every `0` with `.`.
    #[must_use]
    pub fn from_group_name(group: &str) -> Self {
        Self(group.replace(GROUP_PATH_SEPARATOR, "."))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Failure to apply a field write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field path: {0}")]
    UnknownPath(String),

    #[error("invalid value {value:?} for field {path}")]
    InvalidValue { path: String, value: String },
}

/// A record that accepts string writes addressed by field path.
///
/// Values arrive as strings (canonical codes or raw dictated text); each
/// implementation decides how to parse them into its own field types.
pub trait FieldTarget {
    /// Write `value` at `path`, overwriting whatever is there.
    ///
    /// # Errors
    /// Returns [`FieldError::UnknownPath`] when the record has no such field and
    /// [`FieldError::InvalidValue`] when the value cannot be stored in it.
    fn write_field(&mut self, path: &FieldPath, value: &str) -> Result<(), FieldError>;

    /// Current value at `path` rendered as a string, if set.
    fn read_field(&self, path: &FieldPath) -> Option<String>;

    /// Remove any value at `path`.
    ///
    /// # Errors
    /// Returns [`FieldError::UnknownPath`] when the record has no such field.
    fn clear_field(&mut self, path: &FieldPath) -> Result<(), FieldError>;
}

/// Untyped recorder: every path is addressable and values are stored verbatim.
impl FieldTarget for BTreeMap<String, String> {
    fn write_field(&mut self, path: &FieldPath, value: &str) -> Result<(), FieldError> {
        self.insert(path.as_str().to_string(), value.to_string());
        Ok(())
    }

    fn read_field(&self, path: &FieldPath) -> Option<String> {
        self.get(path.as_str()).cloned()
    }

    fn clear_field(&mut self, path: &FieldPath) -> Result<(), FieldError> {
        self.remove(path.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_name_translates_to_dotted_path() {
        assert_eq!(
            FieldPath::from_group_name("patient0ageUnits").as_str(),
            "patient.ageUnits"
        );
        assert_eq!(
            FieldPath::from_group_name("lastVital0heartRate").as_str(),
            "lastVital.heartRate"
        );
    }

    #[test]
    fn every_zero_becomes_a_separator() {
        let path = FieldPath::from_group_name("a0b0c");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn group_without_zero_is_unchanged() {
        assert_eq!(FieldPath::from_group_name("narrative").as_str(), "narrative");
    }

    #[test]
    fn map_target_round_trips() {
        let mut map = BTreeMap::new();
        let path = FieldPath::new("patient.firstName");
        assert_eq!(map.write_field(&path, "John"), Ok(()));
        assert_eq!(map.read_field(&path).as_deref(), Some("John"));
        assert_eq!(map.clear_field(&path), Ok(()));
        assert_eq!(map.read_field(&path), None);
    }
}
