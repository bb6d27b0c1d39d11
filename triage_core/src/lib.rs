#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

pub mod codes;
pub mod field;
pub mod report;

pub use codes::{AgeUnits, Gender, MentalStatus, Perfusion, Priority, UnknownCode};
pub use field::{FieldError, FieldPath, FieldTarget, GROUP_PATH_SEPARATOR};
pub use report::{Narrative, Patient, Report, Vital};
