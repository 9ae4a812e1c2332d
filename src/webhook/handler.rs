use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::attendance::{resolve, ThresholdConfig};
use crate::provider::TranscriptSource;
use crate::sheets::{format_rows, RowSink};

/// What happened to one transcript notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// The provider has not finished the analytics; the provider re-delivers later.
    NotReady,
    Recorded { rows: usize },
}

/// Fetches analytics for a meeting, resolves attendance and appends the rows.
#[derive(Clone)]
pub struct EventHandler {
    source: Arc<dyn TranscriptSource>,
    sink: Arc<dyn RowSink>,
    thresholds: ThresholdConfig,
}

impl EventHandler {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        sink: Arc<dyn RowSink>,
        thresholds: ThresholdConfig,
    ) -> Self {
        Self {
            source,
            sink,
            thresholds,
        }
    }

    pub async fn handle(&self, transcript_id: &str) -> Result<EventOutcome> {
        info!(
            "Handling transcript {} via {}",
            transcript_id,
            self.source.name()
        );

        let Some(meeting) = self.source.fetch(transcript_id).await? else {
            info!("Transcript {} not ready yet, acknowledging", transcript_id);
            return Ok(EventOutcome::NotReady);
        };

        let attendance = resolve(&meeting.speakers, &meeting.participants, &self.thresholds);
        if attendance.is_empty() {
            warn!(
                "Transcript {} has no speakers and no participants",
                transcript_id
            );
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let cells = format_rows(&meeting.metadata, &attendance, &timestamp);
        self.sink.append_rows(&cells).await?;

        info!(
            "Recorded {} attendance rows for transcript {} to {}",
            cells.len(),
            transcript_id,
            self.sink.name()
        );
        Ok(EventOutcome::Recorded { rows: cells.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::SpeakerMetric;
    use crate::provider::{MeetingData, MeetingMetadata};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct StaticSource(Option<MeetingData>);

    #[async_trait]
    impl TranscriptSource for StaticSource {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(&self, _transcript_id: &str) -> Result<Option<MeetingData>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl RowSink for MemorySink {
        fn name(&self) -> &'static str {
            "memory"
        }

        async fn append_rows(&self, rows: &[Vec<String>]) -> Result<()> {
            if self.fail {
                anyhow::bail!("sink unavailable");
            }
            self.rows.lock().await.extend_from_slice(rows);
            Ok(())
        }
    }

    fn meeting() -> MeetingData {
        MeetingData {
            metadata: MeetingMetadata {
                id: "t1".to_string(),
                title: "Planning".to_string(),
                ..Default::default()
            },
            speakers: vec![SpeakerMetric::from_parts(
                Some("Alice"),
                Some("alice@co.com"),
                Some(50.0),
                Some(200.0),
                Some(3.0),
            )],
            participants: vec!["alice@co.com".to_string(), "bob@co.com".to_string()],
        }
    }

    #[tokio::test]
    async fn test_records_rows() {
        let sink = Arc::new(MemorySink::default());
        let handler = EventHandler::new(
            Arc::new(StaticSource(Some(meeting()))),
            sink.clone(),
            ThresholdConfig::default(),
        );

        let outcome = handler.handle("t1").await.unwrap();
        assert_eq!(outcome, EventOutcome::Recorded { rows: 2 });

        let rows = sink.rows.lock().await;
        assert_eq!(rows[0][1], "t1");
        assert_eq!(rows[0][2], "Planning");
        assert_eq!(rows[0][6], "Alice");
        assert_eq!(rows[0][7], "TRUE");
        assert_eq!(rows[1][6], "bob@co.com");
        assert_eq!(rows[1][8], "0.50");
    }

    #[tokio::test]
    async fn test_not_ready_skips_sink() {
        let sink = Arc::new(MemorySink::default());
        let handler = EventHandler::new(
            Arc::new(StaticSource(None)),
            sink.clone(),
            ThresholdConfig::default(),
        );

        assert_eq!(handler.handle("t1").await.unwrap(), EventOutcome::NotReady);
        assert!(sink.rows.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_propagates() {
        let sink = Arc::new(MemorySink {
            fail: true,
            ..Default::default()
        });
        let handler = EventHandler::new(
            Arc::new(StaticSource(Some(meeting()))),
            sink,
            ThresholdConfig::default(),
        );

        assert!(handler.handle("t1").await.is_err());
    }
}
