//! Spreadsheet output.
//!
//! Attendance rows are prefixed with meeting metadata and appended to a
//! spreadsheet, one line per person.

use anyhow::Result;
use async_trait::async_trait;

use crate::attendance::AttendanceRow;
use crate::provider::MeetingMetadata;

pub mod google;

pub use google::GoogleSheetsSink;

#[async_trait]
pub trait RowSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<()>;
}

/// Render attendance rows as spreadsheet cells.
pub fn format_rows(
    meta: &MeetingMetadata,
    rows: &[AttendanceRow],
    timestamp: &str,
) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                timestamp.to_string(),
                meta.id.clone(),
                meta.title.clone(),
                meta.date.clone(),
                meta.duration.clone(),
                meta.transcript_url.clone(),
                row.person.clone(),
                if row.attended { "TRUE" } else { "FALSE" }.to_string(),
                format!("{:.2}", row.confidence),
                row.reason.clone(),
            ]
        })
        .collect()
}
