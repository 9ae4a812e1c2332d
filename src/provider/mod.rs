//! Transcript analytics sources.
//!
//! A source answers one question per webhook event: given a meeting
//! identifier, what did each speaker do and who was invited? `Ok(None)`
//! means the provider has not finished processing the meeting yet.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::attendance::SpeakerMetric;

pub mod fireflies;

pub use fireflies::FirefliesSource;

/// Event-level metadata, already rendered for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingMetadata {
    pub id: String,
    pub title: String,
    pub date: String,
    pub duration: String,
    pub transcript_url: String,
}

/// Everything the attendance resolver needs for one meeting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingData {
    pub metadata: MeetingMetadata,
    pub speakers: Vec<SpeakerMetric>,
    pub participants: Vec<String>,
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, transcript_id: &str) -> Result<Option<MeetingData>>;
}
