#![warn(
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

pub mod extraction;
pub mod predictions;
pub mod preprocess;
pub mod session;
pub mod transcript;

pub use extraction::engine::{Extraction, ExtractionConfig, ExtractionEngine, Span};
pub use extraction::mappings::NormalizationTable;
pub use extraction::patterns::{BuildError, Matcher, PatternDef, default_patterns};
pub use predictions::{Prediction, PredictionLedger, PredictionStatus, TranscriptSource};
pub use preprocess::join_split_numbers;
pub use session::{ApplyOutcome, DictationSession, FieldFailure, RevisionPolicy, SessionOptions};
pub use transcript::TranscriptUpdate;
