//! Attendance determination.
//!
//! Turns per-speaker speech analytics and an invited participant list into
//! one attendance row per person. Everything in here is pure and
//! deterministic; the webhook layer owns I/O, timestamps and failures.

mod normalize;
mod resolver;
mod scorer;
mod types;

pub use normalize::normalize;
pub use resolver::{resolve, FALLBACK_REASON, PARTICIPANT_ONLY_REASON};
pub use scorer::{format_number, score, ActivityScore, NO_SPEECH_REASON};
pub use types::{AttendanceRow, SpeakerMetric, ThresholdConfig, UNKNOWN_SPEAKER};
