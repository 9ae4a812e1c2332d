use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::normalize::normalize;
use super::scorer::score;
use super::types::{AttendanceRow, SpeakerMetric, ThresholdConfig};

pub const PARTICIPANT_ONLY_REASON: &str =
    "Present in participant list but no speech/activity detected";
pub const FALLBACK_REASON: &str = "Analytics unavailable; cannot confirm activity";

const PARTICIPANT_ONLY_CONFIDENCE: f64 = 0.5;
const FALLBACK_CONFIDENCE: f64 = 0.4;

/// Merge speaker analytics with the invited participant list.
///
/// Output order: one row per speaker in analytics order, then one row per
/// participant not matched to a speaker, in participant order. With no
/// analytics at all every participant gets a low-confidence fallback row.
pub fn resolve(
    speakers: &[SpeakerMetric],
    participants: &[String],
    thresholds: &ThresholdConfig,
) -> Vec<AttendanceRow> {
    if speakers.is_empty() {
        return fallback_rows(participants);
    }

    let index = build_index(speakers);
    let mut rows = Vec::with_capacity(speakers.len() + participants.len());

    // Known limitation: speakers are deduplicated on display name, not on a
    // normalized key, so two different "Unknown" speakers collapse into one
    // row. Existing sheets depend on these row counts; keep it.
    let mut emitted_names: HashSet<&str> = HashSet::new();
    for metric in speakers {
        if !emitted_names.insert(metric.display_name.as_str()) {
            debug!("Skipping duplicate speaker row for {}", metric.display_name);
            continue;
        }
        let verdict = score(metric, thresholds);
        rows.push(AttendanceRow {
            person: metric.display_name.clone(),
            attended: verdict.attended,
            confidence: verdict.confidence,
            reason: verdict.reason,
        });
    }

    let mut seen = SeenParticipants::default();
    for participant in participants {
        let key = normalize(participant);
        if index.contains_key(key.as_str()) || !seen.first_sighting(participant, key) {
            continue;
        }
        rows.push(AttendanceRow {
            person: participant.clone(),
            attended: false,
            confidence: PARTICIPANT_ONLY_CONFIDENCE,
            reason: PARTICIPANT_ONLY_REASON.to_string(),
        });
    }

    rows
}

/// Map every non-empty name key and email key to the index of its speaker.
fn build_index(speakers: &[SpeakerMetric]) -> HashMap<&str, usize> {
    let mut index = HashMap::new();
    for (position, metric) in speakers.iter().enumerate() {
        for key in [&metric.name_key, &metric.email_key].into_iter().flatten() {
            if !key.is_empty() {
                index.insert(key.as_str(), position);
            }
        }
    }
    index
}

/// Participants already given a row.
///
/// Blank identifiers have no lookup key, so they are told apart by their raw text.
#[derive(Default)]
struct SeenParticipants<'a> {
    keys: HashSet<String>,
    blanks: HashSet<&'a str>,
}

impl<'a> SeenParticipants<'a> {
    fn first_sighting(&mut self, raw: &'a str, key: String) -> bool {
        if key.is_empty() {
            self.blanks.insert(raw)
        } else {
            self.keys.insert(key)
        }
    }
}

fn fallback_rows(participants: &[String]) -> Vec<AttendanceRow> {
    let mut seen = SeenParticipants::default();
    participants
        .iter()
        .filter(|&p| seen.first_sighting(p, normalize(p)))
        .map(|p| AttendanceRow {
            person: p.clone(),
            attended: false,
            confidence: FALLBACK_CONFIDENCE,
            reason: FALLBACK_REASON.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker(name: &str, email: &str, words: f64, secs: f64, questions: f64) -> SpeakerMetric {
        SpeakerMetric::from_parts(
            Some(name),
            Some(email),
            Some(words),
            Some(secs),
            Some(questions),
        )
    }

    fn people(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_speaker_rows_then_participant_rows() {
        let speakers = vec![
            speaker("Zed", "", 100.0, 300.0, 0.0),
            speaker("Amy", "amy@co.com", 0.0, 0.0, 0.0),
        ];
        let rows = resolve(
            &speakers,
            &people(&["carl@co.com", "AMY@co.com ", "bea@co.com"]),
            &ThresholdConfig::default(),
        );

        let persons: Vec<&str> = rows.iter().map(|r| r.person.as_str()).collect();
        assert_eq!(persons, vec!["Zed", "Amy", "carl@co.com", "bea@co.com"]);
        assert!(rows[0].attended);
        assert!(!rows[1].attended);
        assert_eq!(rows[2].reason, PARTICIPANT_ONLY_REASON);
        assert_eq!(rows[2].confidence, 0.5);
    }

    #[test]
    fn test_participant_matched_by_name_key() {
        let speakers = vec![speaker("alice@co.com", "", 30.0, 0.0, 0.0)];
        let rows = resolve(&speakers, &people(&["Alice@Co.com"]), &ThresholdConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].person, "alice@co.com");
    }

    #[test]
    fn test_unknown_speakers_collapse() {
        let speakers = vec![
            SpeakerMetric::from_parts(Some(""), Some(""), Some(5.0), None, None),
            SpeakerMetric::from_parts(None, None, Some(500.0), None, None),
        ];
        let rows = resolve(&speakers, &[], &ThresholdConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].person, "Unknown");
        // first occurrence wins
        assert!(!rows[0].attended);
    }

    #[test]
    fn test_duplicate_participants() {
        let speakers = vec![speaker("Amy", "", 1.0, 0.0, 0.0)];
        let rows = resolve(
            &speakers,
            &people(&["bob@co.com", "BOB@co.com"]),
            &ThresholdConfig::default(),
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].person, "bob@co.com");
    }

    #[test]
    fn test_blank_participant_still_gets_a_row() {
        let speakers = vec![speaker("Amy", "", 1.0, 0.0, 0.0)];
        let rows = resolve(
            &speakers,
            &people(&["bob@co.com", " ", "", " "]),
            &ThresholdConfig::default(),
        );

        let persons: Vec<&str> = rows.iter().map(|r| r.person.as_str()).collect();
        assert_eq!(persons, vec!["Amy", "bob@co.com", " ", ""]);
        assert_eq!(rows[2].reason, PARTICIPANT_ONLY_REASON);
        assert!(!rows[2].attended);
    }

    #[test]
    fn test_blank_participant_without_analytics() {
        let rows = resolve(&[], &people(&[" "]), &ThresholdConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].person, " ");
        assert_eq!(rows[0].confidence, 0.4);
        assert_eq!(rows[0].reason, FALLBACK_REASON);

        let rows = resolve(&[], &people(&[""]), &ThresholdConfig::default());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_fallback_without_analytics() {
        let rows = resolve(&[], &people(&["x@co.com", "y@co.com"]), &ThresholdConfig::default());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| !r.attended));
        assert!(rows.iter().all(|r| r.confidence == 0.4));
        assert!(rows.iter().all(|r| r.reason == FALLBACK_REASON));
    }

    #[test]
    fn test_empty_inputs_empty_output() {
        assert!(resolve(&[], &[], &ThresholdConfig::default()).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let speakers = vec![
            speaker("Amy", "amy@co.com", 10.0, 70.0, 0.0),
            speaker("Bo", "", 0.0, 0.0, 2.0),
        ];
        let participants = people(&["amy@co.com", "cy@co.com"]);
        let t = ThresholdConfig::default();
        assert_eq!(resolve(&speakers, &participants, &t), resolve(&speakers, &participants, &t));
    }
}
