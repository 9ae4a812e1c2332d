use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::RowSink;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;
/// Upper bound on a token lifetime reported by the token endpoint.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// The fields of a service-account key file this sink uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read service account key {:?}", path))?;
        serde_json::from_str(&content).context("Failed to parse service account key")
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn new(value: String, now: DateTime<Utc>, expires_in: i64) -> Self {
        let lifetime = expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS);
        Self {
            value,
            expires_at: now + ChronoDuration::seconds(lifetime),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    values: &'a [Vec<String>],
}

/// Appends rows to a Google Sheet using a service account.
pub struct GoogleSheetsSink {
    client: reqwest::Client,
    key: ServiceAccountKey,
    token_url: String,
    api_base_url: String,
    spreadsheet_id: String,
    range: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsSink {
    pub fn new(
        key: ServiceAccountKey,
        token_url: String,
        api_base_url: String,
        spreadsheet_id: String,
        range: String,
    ) -> Self {
        // the key file's own token endpoint wins over the configured default
        let token_url = key.token_uri.clone().unwrap_or(token_url);

        info!(
            "Initialized Google Sheets sink for spreadsheet {} ({})",
            spreadsheet_id, range
        );

        Self {
            client: reqwest::Client::new(),
            key,
            token_url,
            api_base_url,
            spreadsheet_id,
            range,
            token: Mutex::new(None),
        }
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.token_url,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Invalid service account private key")?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .context("Failed to sign token assertion")
    }

    /// Current bearer token, exchanging a fresh assertion when the cached one is stale.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        debug!("Requesting new access token for {}", self.key.client_email);

        let assertion = self.signed_assertion(now)?;
        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Failed to request access token")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read token response body")?;

        if !status.is_success() {
            error!("Token exchange failed with status {}: {}", status, response_text);
            return Err(anyhow::anyhow!(
                "Token exchange failed with status {}",
                status
            ));
        }

        let token: TokenResponse =
            serde_json::from_str(&response_text).context("Failed to parse token response")?;

        let fresh = CachedToken::new(token.access_token, now, token.expires_in);
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn append_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.api_base_url.trim_end_matches('/'),
            self.spreadsheet_id,
            self.range
        )
    }
}

#[async_trait]
impl RowSink for GoogleSheetsSink {
    fn name(&self) -> &'static str {
        "Google Sheets"
    }

    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            debug!("No rows to append");
            return Ok(());
        }

        let token = self.access_token().await?;

        let response = self
            .client
            .post(self.append_url())
            .bearer_auth(token)
            .json(&AppendRequest { values: rows })
            .send()
            .await
            .context("Failed to append rows to spreadsheet")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Sheet append failed with status {}: {}", status, body);
            return Err(anyhow::anyhow!(
                "Sheet append failed with status {}: {}",
                status,
                body
            ));
        }

        info!("Appended {} rows to spreadsheet {}", rows.len(), self.spreadsheet_id);
        Ok(())
    }
}
