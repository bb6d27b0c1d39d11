//! The field report populated from dictation.
//!
//! `Report` implements [`FieldTarget`] through a table of accessors keyed by
//! dotted path, built once on first use. Each accessor parses the incoming
//! string into the field's own type.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::codes::{AgeUnits, Gender, MentalStatus, Perfusion, Priority};
use crate::field::{FieldError, FieldPath, FieldTarget};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_units: Option<AgeUnits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage_mental_status: Option<MentalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage_perfusion: Option<Perfusion>,
    /// Capillary refill time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capillary_refill: Option<u32>,
}

/// Most recent set of vital signs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vital {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp_systolic: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bp_diastolic: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_glasgow_coma_score: Option<u32>,
}

impl Vital {
    /// Blood pressure rendered as `systolic/diastolic`, if both are known.
    #[must_use]
    pub fn blood_pressure(&self) -> Option<String> {
        match (self.bp_systolic, self.bp_diastolic) {
            (Some(sys), Some(dia)) => Some(format!("{sys}/{dia}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub patient: Patient,
    #[serde(default)]
    pub last_vital: Vital,
    #[serde(default)]
    pub narrative: Narrative,
}

type Getter = fn(&Report) -> Option<String>;
type Setter = fn(&mut Report, &str) -> Option<()>;
type Clearer = fn(&mut Report);

struct Accessor {
    get: Getter,
    set: Setter,
    clear: Clearer,
}

static BLOOD_PRESSURE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^\s*([0-9]+)\s*(?:/|over)\s*([0-9]+)\s*$")
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("blood pressure pattern is invalid: {e}"))
});

fn parse_count(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

fn parse_blood_pressure(value: &str) -> Option<(u32, u32)> {
    let caps = BLOOD_PRESSURE.captures(value)?;
    Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

static ACCESSORS: Lazy<HashMap<&'static str, Accessor>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Accessor> = HashMap::new();

    table.insert(
        "patient.firstName",
        Accessor {
            get: |r| r.patient.first_name.clone(),
            set: |r, v| {
                r.patient.first_name = Some(non_empty(v)?);
                Some(())
            },
            clear: |r| r.patient.first_name = None,
        },
    );
    table.insert(
        "patient.lastName",
        Accessor {
            get: |r| r.patient.last_name.clone(),
            set: |r, v| {
                r.patient.last_name = Some(non_empty(v)?);
                Some(())
            },
            clear: |r| r.patient.last_name = None,
        },
    );
    table.insert(
        "patient.age",
        Accessor {
            get: |r| r.patient.age.map(|v| v.to_string()),
            set: |r, v| {
                r.patient.age = Some(parse_count(v)?);
                Some(())
            },
            clear: |r| r.patient.age = None,
        },
    );
    table.insert(
        "patient.ageUnits",
        Accessor {
            get: |r| r.patient.age_units.map(String::from),
            set: |r, v| {
                r.patient.age_units = Some(v.parse().ok()?);
                Some(())
            },
            clear: |r| r.patient.age_units = None,
        },
    );
    table.insert(
        "patient.gender",
        Accessor {
            get: |r| r.patient.gender.map(String::from),
            set: |r, v| {
                r.patient.gender = Some(v.parse().ok()?);
                Some(())
            },
            clear: |r| r.patient.gender = None,
        },
    );
    table.insert(
        "patient.priority",
        Accessor {
            get: |r| r.patient.priority.map(String::from),
            set: |r, v| {
                r.patient.priority = Some(v.parse().ok()?);
                Some(())
            },
            clear: |r| r.patient.priority = None,
        },
    );
    table.insert(
        "patient.triageMentalStatus",
        Accessor {
            get: |r| r.patient.triage_mental_status.map(String::from),
            set: |r, v| {
                r.patient.triage_mental_status = Some(v.parse().ok()?);
                Some(())
            },
            clear: |r| r.patient.triage_mental_status = None,
        },
    );
    table.insert(
        "patient.triagePerfusion",
        Accessor {
            get: |r| r.patient.triage_perfusion.map(String::from),
            set: |r, v| {
                r.patient.triage_perfusion = Some(v.parse().ok()?);
                Some(())
            },
            clear: |r| r.patient.triage_perfusion = None,
        },
    );
    table.insert(
        "patient.capillaryRefill",
        Accessor {
            get: |r| r.patient.capillary_refill.map(|v| v.to_string()),
            set: |r, v| {
                r.patient.capillary_refill = Some(parse_count(v)?);
                Some(())
            },
            clear: |r| r.patient.capillary_refill = None,
        },
    );
    table.insert(
        "lastVital.respiratoryRate",
        Accessor {
            get: |r| r.last_vital.respiratory_rate.map(|v| v.to_string()),
            set: |r, v| {
                r.last_vital.respiratory_rate = Some(parse_count(v)?);
                Some(())
            },
            clear: |r| r.last_vital.respiratory_rate = None,
        },
    );
    table.insert(
        "lastVital.heartRate",
        Accessor {
            get: |r| r.last_vital.heart_rate.map(|v| v.to_string()),
            set: |r, v| {
                r.last_vital.heart_rate = Some(parse_count(v)?);
                Some(())
            },
            clear: |r| r.last_vital.heart_rate = None,
        },
    );
    table.insert(
        "lastVital.bloodPressure",
        Accessor {
            get: |r| r.last_vital.blood_pressure(),
            set: |r, v| {
                let (sys, dia) = parse_blood_pressure(v)?;
                r.last_vital.bp_systolic = Some(sys);
                r.last_vital.bp_diastolic = Some(dia);
                Some(())
            },
            clear: |r| {
                r.last_vital.bp_systolic = None;
                r.last_vital.bp_diastolic = None;
            },
        },
    );
    table.insert(
        "lastVital.totalGlasgowComaScore",
        Accessor {
            get: |r| r.last_vital.total_glasgow_coma_score.map(|v| v.to_string()),
            set: |r, v| {
                r.last_vital.total_glasgow_coma_score = Some(parse_count(v)?);
                Some(())
            },
            clear: |r| r.last_vital.total_glasgow_coma_score = None,
        },
    );
    table.insert(
        "narrative.text",
        Accessor {
            get: |r| r.narrative.text.clone(),
            set: |r, v| {
                r.narrative.text = Some(v.to_string());
                Some(())
            },
            clear: |r| r.narrative.text = None,
        },
    );

    table
});

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path this record can address, sorted.
    #[must_use]
    pub fn field_paths() -> Vec<&'static str> {
        let mut paths: Vec<_> = ACCESSORS.keys().copied().collect();
        paths.sort_unstable();
        paths
    }

    /// Whether `path` names a field of the report.
    #[must_use]
    pub fn supports(path: &FieldPath) -> bool {
        ACCESSORS.contains_key(path.as_str())
    }

    fn accessor(path: &FieldPath) -> Result<&'static Accessor, FieldError> {
        ACCESSORS
            .get(path.as_str())
            .ok_or_else(|| FieldError::UnknownPath(path.to_string()))
    }
}

impl FieldTarget for Report {
    fn write_field(&mut self, path: &FieldPath, value: &str) -> Result<(), FieldError> {
        let accessor = Self::accessor(path)?;
        (accessor.set)(self, value).ok_or_else(|| FieldError::InvalidValue {
            path: path.to_string(),
            value: value.to_string(),
        })?;
        trace!("Set {} = {:?}", path, value);
        Ok(())
    }

    fn read_field(&self, path: &FieldPath) -> Option<String> {
        ACCESSORS.get(path.as_str()).and_then(|a| (a.get)(self))
    }

    fn clear_field(&mut self, path: &FieldPath) -> Result<(), FieldError> {
        (Self::accessor(path)?.clear)(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> FieldPath {
        FieldPath::new(p)
    }

    #[test]
    fn writes_names_verbatim() {
        let mut report = Report::new();
        assert_eq!(report.write_field(&path("patient.firstName"), "John"), Ok(()));
        assert_eq!(report.patient.first_name.as_deref(), Some("John"));
    }

    #[test]
    fn writes_coded_fields() {
        let mut report = Report::new();
        assert_eq!(report.write_field(&path("patient.gender"), "9906003"), Ok(()));
        assert_eq!(report.write_field(&path("patient.priority"), "0"), Ok(()));
        assert_eq!(
            report.write_field(&path("patient.ageUnits"), AgeUnits::Years.code()),
            Ok(())
        );
        assert_eq!(report.patient.gender, Some(Gender::Male));
        assert_eq!(report.patient.priority, Some(Priority::Immediate));
        assert_eq!(report.patient.age_units, Some(AgeUnits::Years));
    }

    #[test]
    fn blood_pressure_accepts_slash_and_over() {
        let mut report = Report::new();
        let bp = path("lastVital.bloodPressure");

        assert_eq!(report.write_field(&bp, "120 over 80"), Ok(()));
        assert_eq!(report.last_vital.bp_systolic, Some(120));
        assert_eq!(report.last_vital.bp_diastolic, Some(80));

        assert_eq!(report.write_field(&bp, "140/90"), Ok(()));
        assert_eq!(report.read_field(&bp).as_deref(), Some("140/90"));
    }

    #[test]
    fn unknown_path_is_rejected() {
        let mut report = Report::new();
        assert_eq!(
            report.write_field(&path("patient.shoeSize"), "11"),
            Err(FieldError::UnknownPath("patient.shoeSize".to_string()))
        );
    }

    #[test]
    fn unparsable_value_is_rejected_and_leaves_field_untouched() {
        let mut report = Report::new();
        report.patient.age = Some(40);
        assert_eq!(
            report.write_field(&path("patient.age"), "forty"),
            Err(FieldError::InvalidValue {
                path: "patient.age".to_string(),
                value: "forty".to_string(),
            })
        );
        assert_eq!(report.patient.age, Some(40));
    }

    #[test]
    fn clear_removes_value() {
        let mut report = Report::new();
        let bp = path("lastVital.bloodPressure");
        assert_eq!(report.write_field(&bp, "120/80"), Ok(()));
        assert_eq!(report.clear_field(&bp), Ok(()));
        assert_eq!(report.read_field(&bp), None);
        assert_eq!(report.last_vital.bp_systolic, None);
    }

    #[test]
    fn field_paths_are_listed() {
        let paths = Report::field_paths();
        assert!(paths.contains(&"patient.ageUnits"));
        assert!(paths.contains(&"lastVital.totalGlasgowComaScore"));
        assert!(Report::supports(&path("narrative.text")));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn serializes_with_codes_and_camel_case() {
        let mut report = Report::new();
        report.patient.gender = Some(Gender::Female);
        report.last_vital.heart_rate = Some(88);

        let json = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(json["patient"]["gender"], "9906001");
        assert_eq!(json["lastVital"]["heartRate"], 88);
        assert!(json["patient"].get("firstName").is_none());
    }
}
