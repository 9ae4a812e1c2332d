use crate::api::ApiServer;
use crate::config::Config;
use crate::provider::{FirefliesSource, TranscriptSource};
use crate::sheets::{google::ServiceAccountKey, GoogleSheetsSink, RowSink};
use crate::webhook::EventHandler;
use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub async fn run_service(config: Config) -> Result<()> {
    info!("Starting Rollcall service");

    let source = build_source(&config)?;
    let sink = build_sink(&config)?;

    info!(
        "Thresholds: {} words, {}s spoken, {} questions",
        config.thresholds.min_words,
        config.thresholds.min_duration_sec,
        config.thresholds.min_questions
    );

    let handler = EventHandler::new(source, sink, config.thresholds);
    ApiServer::new(handler, &config.server).start().await
}

fn build_source(config: &Config) -> Result<Arc<dyn TranscriptSource>> {
    if config.provider.api_key.is_empty() {
        bail!("No transcript provider API key configured (provider.api_key)");
    }

    let source = FirefliesSource::new(
        config.provider.api_url.clone(),
        config.provider.api_key.clone(),
        Duration::from_secs(config.provider.request_timeout_seconds),
    )?;
    Ok(Arc::new(source))
}

fn build_sink(config: &Config) -> Result<Arc<dyn RowSink>> {
    let sheet = &config.sheet;
    if sheet.spreadsheet_id.is_empty() {
        bail!("No spreadsheet configured (sheet.spreadsheet_id)");
    }
    if sheet.credentials_path.is_empty() {
        bail!("No service account key configured (sheet.credentials_path)");
    }

    let key = ServiceAccountKey::from_file(Path::new(&sheet.credentials_path))?;
    Ok(Arc::new(GoogleSheetsSink::new(
        key,
        sheet.token_url.clone(),
        sheet.api_base_url.clone(),
        sheet.spreadsheet_id.clone(),
        sheet.range.clone(),
    )))
}
