use serde::{Deserialize, Serialize};

use super::types::{SpeakerMetric, ThresholdConfig};

pub const NO_SPEECH_REASON: &str = "No detectable speech";

const WORD_WEIGHT: f64 = 0.4;
const DURATION_WEIGHT: f64 = 0.4;
const QUESTION_WEIGHT: f64 = 0.2;

const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 1.0;

/// Verdict for a single speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub attended: bool,
    pub confidence: f64,
    pub reason: String,
}

/// Score one speaker against the thresholds.
///
/// `attended` is an OR over the three signals. `confidence` is a weighted sum
/// of per-signal ratios (each capped at twice its threshold), clamped to
/// `[0.1, 1.0]`.
pub fn score(metric: &SpeakerMetric, thresholds: &ThresholdConfig) -> ActivityScore {
    let words = metric.word_count as f64;
    let duration = metric.duration_or_zero();
    let questions = metric.question_count as f64;

    let attended = words >= thresholds.min_words
        || duration >= thresholds.min_duration_sec
        || questions >= thresholds.min_questions;

    let raw = ratio(words, thresholds.min_words) * WORD_WEIGHT
        + ratio(duration, thresholds.min_duration_sec) * DURATION_WEIGHT
        + ratio(questions, thresholds.min_questions) * QUESTION_WEIGHT;
    let confidence = raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

    ActivityScore {
        attended,
        confidence,
        reason: reason(words, duration, questions),
    }
}

/// `value / (2 * threshold)`, capped at 1.
///
/// A zero (or negative) threshold saturates the signal as soon as anything
/// was measured, and contributes nothing otherwise.
fn ratio(value: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return if value > 0.0 { 1.0 } else { 0.0 };
    }
    (value / (2.0 * threshold)).min(1.0)
}

fn reason(words: f64, duration: f64, questions: f64) -> String {
    let mut parts = Vec::new();
    if words > 0.0 {
        parts.push(format!("{} words", format_number(words)));
    }
    if duration > 0.0 {
        parts.push(format!("{}s spoken", format_number(duration)));
    }
    if questions > 0.0 {
        parts.push(format!("{} questions", format_number(questions)));
    }

    if parts.is_empty() {
        NO_SPEECH_REASON.to_string()
    } else {
        parts.join("; ")
    }
}

/// Whole numbers print without a fraction, everything else in shortest form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}
