use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{MeetingData, MeetingMetadata, TranscriptSource};
use crate::attendance::{format_number, normalize, SpeakerMetric};

const TRANSCRIPT_QUERY: &str = r#"query Transcript($transcriptId: String!) {
  transcript(id: $transcriptId) {
    id
    title
    date
    duration
    transcript_url
    participants
    meeting_attendees { displayName email name }
    analytics { speakers { name duration word_count questions } }
  }
}"#;

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    #[serde(rename = "transcriptId")]
    transcript_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    transcript: Option<Transcript>,
}

#[derive(Debug, Deserialize)]
struct Transcript {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    date: Value,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
    transcript_url: Option<String>,
    participants: Option<Vec<String>>,
    meeting_attendees: Option<Vec<Attendee>>,
    analytics: Option<Analytics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attendee {
    display_name: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Analytics {
    speakers: Option<Vec<SpeakerStats>>,
}

#[derive(Debug, Deserialize)]
struct SpeakerStats {
    name: Option<String>,
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    word_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    questions: Option<f64>,
}

/// Accept numbers or numeric strings; anything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Fetches speaker analytics from the Fireflies GraphQL API.
pub struct FirefliesSource {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl FirefliesSource {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        info!("Initialized Fireflies source with API URL: {}", api_url);

        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl TranscriptSource for FirefliesSource {
    fn name(&self) -> &'static str {
        "Fireflies API"
    }

    async fn fetch(&self, transcript_id: &str) -> Result<Option<MeetingData>> {
        debug!("Fetching transcript analytics for {}", transcript_id);

        let request = GraphqlRequest {
            query: TRANSCRIPT_QUERY,
            variables: Variables { transcript_id },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to query transcript provider")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read provider response body")?;

        if !status.is_success() {
            error!(
                "Transcript query failed with status {}: {}",
                status, response_text
            );
            return Err(anyhow::anyhow!(
                "Transcript query failed with status {}: {}",
                status,
                response_text
            ));
        }

        parse_response(transcript_id, &response_text)
    }
}

/// Turn a raw GraphQL response body into meeting data.
fn parse_response(transcript_id: &str, body: &str) -> Result<Option<MeetingData>> {
    let response: GraphqlResponse =
        serde_json::from_str(body).context("Failed to parse provider response")?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(anyhow::anyhow!(
            "Transcript provider error: {}",
            messages.join("; ")
        ));
    }

    let Some(transcript) = response.data.and_then(|d| d.transcript) else {
        debug!("Transcript {} not available yet", transcript_id);
        return Ok(None);
    };

    let Some(speaker_stats) = transcript.analytics.as_ref().and_then(|a| a.speakers.as_ref()) else {
        debug!("Analytics for {} not available yet", transcript_id);
        return Ok(None);
    };

    let attendees = transcript.meeting_attendees.as_deref().unwrap_or_default();
    let speakers = speaker_stats
        .iter()
        .map(|s| {
            let email = s
                .email
                .clone()
                .or_else(|| s.name.as_deref().and_then(|n| attendee_email(attendees, n)));
            SpeakerMetric::from_parts(
                s.name.as_deref(),
                email.as_deref(),
                s.word_count,
                s.duration,
                s.questions,
            )
        })
        .collect();

    let metadata = MeetingMetadata {
        id: transcript
            .id
            .clone()
            .unwrap_or_else(|| transcript_id.to_string()),
        title: transcript.title.clone().unwrap_or_default(),
        date: render_date(&transcript.date),
        duration: transcript.duration.map(format_number).unwrap_or_default(),
        transcript_url: transcript.transcript_url.clone().unwrap_or_default(),
    };

    Ok(Some(MeetingData {
        metadata,
        speakers,
        participants: split_participants(transcript.participants.unwrap_or_default()),
    }))
}

/// Email of the attendee whose display name or name matches the speaker.
fn attendee_email(attendees: &[Attendee], speaker_name: &str) -> Option<String> {
    let key = normalize(speaker_name);
    if key.is_empty() {
        return None;
    }
    attendees
        .iter()
        .find(|a| {
            [&a.display_name, &a.name]
                .into_iter()
                .flatten()
                .any(|n| normalize(n) == key)
        })
        .and_then(|a| a.email.clone())
        .filter(|e| !e.trim().is_empty())
}

/// The provider sometimes packs several addresses into one comma-separated entry.
fn split_participants(raw: Vec<String>) -> Vec<String> {
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Dates arrive as epoch milliseconds; strings pass through.
fn render_date(value: &Value) -> String {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(|ms| chrono::DateTime::from_timestamp_millis(ms as i64))
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}
