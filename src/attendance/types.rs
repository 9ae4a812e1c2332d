use serde::{Deserialize, Serialize};

use super::normalize::normalize;

/// Display label for a speaker with neither a name nor an email.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Speech analytics for one person who spoke in a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerMetric {
    pub display_name: String,
    pub name_key: Option<String>,
    pub email_key: Option<String>,
    pub word_count: u64,
    pub duration_sec: Option<f64>,
    pub question_count: u64,
}

impl SpeakerMetric {
    /// Build a metric from loosely-typed provider fields.
    ///
    /// Blank name/email become `None` keys. Negative or non-finite numbers
    /// degrade to 0 (or unknown for the duration).
    pub fn from_parts(
        name: Option<&str>,
        email: Option<&str>,
        word_count: Option<f64>,
        duration_sec: Option<f64>,
        question_count: Option<f64>,
    ) -> Self {
        let name = name.map(str::trim).filter(|s| !s.is_empty());
        let email = email.map(str::trim).filter(|s| !s.is_empty());

        let display_name = name.or(email).unwrap_or(UNKNOWN_SPEAKER).to_string();

        Self {
            display_name,
            name_key: name.map(normalize),
            email_key: email.map(normalize),
            word_count: to_count(word_count),
            duration_sec: duration_sec.filter(|d| d.is_finite() && *d >= 0.0),
            question_count: to_count(question_count),
        }
    }

    /// Spoken seconds, with unknown treated as 0.
    pub fn duration_or_zero(&self) -> f64 {
        self.duration_sec.unwrap_or(0.0)
    }
}

fn to_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.floor() as u64,
        _ => 0,
    }
}

/// Activity thresholds. Meeting any one of them marks a speaker as active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub min_words: f64,
    pub min_duration_sec: f64,
    pub min_questions: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_words: 20.0,
            min_duration_sec: 60.0,
            min_questions: 1.0,
        }
    }
}

/// One attendance verdict for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub person: String,
    pub attended: bool,
    pub confidence: f64,
    pub reason: String,
}
