//! Canonical code sets for triage fields.
//!
//! Age units and gender use NEMSIS v3 codes (ePatient.16, ePatient.13). Triage
//! mental status and perfusion follow the SALT/START vocabulary used by the
//! field report, and priority is the numeric triage category.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Error returned when a string is not a known code for a code set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {set} code: {code}")]
pub struct UnknownCode {
    pub set: &'static str,
    pub code: String,
}

impl UnknownCode {
    fn new(set: &'static str, code: &str) -> Self {
        Self {
            set,
            code: code.to_string(),
        }
    }
}

/// Units of `patient.age` (NEMSIS ePatient.16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AgeUnits {
    Days,
    Hours,
    Minutes,
    Months,
    Years,
}

impl AgeUnits {
    pub const ALL: [Self; 5] = [
        Self::Days,
        Self::Hours,
        Self::Minutes,
        Self::Months,
        Self::Years,
    ];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Days => "2516001",
            Self::Hours => "2516003",
            Self::Minutes => "2516005",
            Self::Months => "2516007",
            Self::Years => "2516009",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Months => "months",
            Self::Years => "years",
        }
    }
}

/// Patient gender (NEMSIS ePatient.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Gender {
    Female,
    Male,
    /// Transgender male (female-to-male).
    TransMale,
    /// Transgender female (male-to-female).
    TransFemale,
    Unknown,
}

impl Gender {
    pub const ALL: [Self; 5] = [
        Self::Female,
        Self::Male,
        Self::TransMale,
        Self::TransFemale,
        Self::Unknown,
    ];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Female => "9906001",
            Self::Male => "9906003",
            Self::Unknown => "9906005",
            Self::TransMale => "9906007",
            Self::TransFemale => "9906009",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::TransMale => "trans_male",
            Self::TransFemale => "trans_female",
            Self::Unknown => "unknown",
        }
    }
}

/// Ability to follow commands during triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MentalStatus {
    AbleToComply,
    DifficultyComplying,
    UnableToComply,
}

impl MentalStatus {
    pub const ALL: [Self; 3] = [
        Self::AbleToComply,
        Self::DifficultyComplying,
        Self::UnableToComply,
    ];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AbleToComply => "ABLE_TO_COMPLY",
            Self::DifficultyComplying => "DIFFICULTY_COMPLYING",
            Self::UnableToComply => "UNABLE_TO_COMPLY",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AbleToComply => "able_to_comply",
            Self::DifficultyComplying => "difficulty_complying",
            Self::UnableToComply => "unable_to_comply",
        }
    }
}

/// Radial pulse check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Perfusion {
    RadialPulseAbsent,
    RadialPulsePresent,
}

impl Perfusion {
    pub const ALL: [Self; 2] = [Self::RadialPulseAbsent, Self::RadialPulsePresent];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::RadialPulseAbsent => "RADIAL_PULSE_ABSENT",
            Self::RadialPulsePresent => "RADIAL_PULSE_PRESENT",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RadialPulseAbsent => "radial_pulse_absent",
            Self::RadialPulsePresent => "radial_pulse_present",
        }
    }
}

/// Triage category. The code is the numeric category used on tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[repr(u8)]
pub enum Priority {
    /// Red.
    Immediate = 0,
    /// Yellow.
    Delayed = 1,
    /// Green.
    Minimal = 2,
    Expectant = 3,
    /// Black.
    Dead = 4,
}

impl Priority {
    pub const ALL: [Self; 5] = [
        Self::Immediate,
        Self::Delayed,
        Self::Minimal,
        Self::Expectant,
        Self::Dead,
    ];

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Immediate => "0",
            Self::Delayed => "1",
            Self::Minimal => "2",
            Self::Expectant => "3",
            Self::Dead => "4",
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Delayed => "delayed",
            Self::Minimal => "minimal",
            Self::Expectant => "expectant",
            Self::Dead => "dead",
        }
    }
}

/// Implements code/name parsing and the `String` conversions serde uses.
///
/// Parsing accepts either the canonical code or the snake-case name, ignoring
/// ASCII case for the latter.
macro_rules! code_set {
    ($ty:ident, $set:literal) => {
        impl FromStr for $ty {
            type Err = UnknownCode;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .into_iter()
                    .find(|v| v.code() == s || v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownCode::new($set, s))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.code().to_string()
            }
        }

        impl TryFrom<String> for $ty {
            type Error = UnknownCode;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

code_set!(AgeUnits, "age units");
code_set!(Gender, "gender");
code_set!(MentalStatus, "mental status");
code_set!(Perfusion, "perfusion");
code_set!(Priority, "priority");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("2516009".parse::<AgeUnits>(), Ok(AgeUnits::Years));
        assert_eq!("Years".parse::<AgeUnits>(), Ok(AgeUnits::Years));
        assert_eq!("9906003".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("0".parse::<Priority>(), Ok(Priority::Immediate));
        assert_eq!(
            "RADIAL_PULSE_PRESENT".parse::<Perfusion>(),
            Ok(Perfusion::RadialPulsePresent)
        );
        assert_eq!(
            "unable_to_comply".parse::<MentalStatus>(),
            Ok(MentalStatus::UnableToComply)
        );
    }

    #[test]
    fn rejects_unknown_code() {
        assert_eq!(
            "purple".parse::<Priority>(),
            Err(UnknownCode {
                set: "priority",
                code: "purple".to_string(),
            })
        );
    }

    #[test]
    fn codes_are_unique_within_a_set() {
        let mut codes: Vec<_> = Gender::ALL.iter().map(Gender::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), Gender::ALL.len());
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn serializes_as_code() {
        let json = serde_json::to_string(&Priority::Delayed).expect("priority should serialize");
        assert_eq!(json, "\"1\"");
        let back: Priority = serde_json::from_str("\"4\"").expect("code should deserialize");
        assert_eq!(back, Priority::Dead);
    }
}
