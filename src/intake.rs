//! Intake webhook sink.
//!
//! Ships a captured posting to the automation backend (`{base}job-intake`)
//! as `{ url, rawHtml, metadata, capturedAt }`. Despite its name the
//! `rawHtml` key carries the page's visible text, which is what the intake
//! flow parses.

use crate::core::config::IntakeConfig;
use crate::types::PostingRecord;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use url::Url;

pub const INTAKE_PATH: &str = "job-intake";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakePayload<'a> {
    pub url: &'a str,
    #[serde(rename = "rawHtml")]
    pub page_text: &'a str,
    pub metadata: &'a PostingRecord,
    pub captured_at: String,
}

impl<'a> IntakePayload<'a> {
    pub fn new(url: &'a str, page_text: &'a str, metadata: &'a PostingRecord) -> Self {
        Self {
            url,
            page_text,
            metadata,
            captured_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Join the intake path onto the configured webhook base.
pub fn intake_endpoint(base: &str) -> Result<Url> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let base = Url::parse(&base).with_context(|| format!("invalid webhook base url {:?}", base))?;
    base.join(INTAKE_PATH)
        .with_context(|| format!("cannot join {:?} onto {}", INTAKE_PATH, base))
}

pub struct IntakeClient {
    client: Client,
    endpoint: Url,
}

impl IntakeClient {
    pub fn new(endpoint: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(cfg: &IntakeConfig) -> Result<Self> {
        Self::new(intake_endpoint(&cfg.resolve_webhook_base_url())?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn send(&self, url: &str, page_text: &str, record: &PostingRecord) -> Result<()> {
        let payload = IntakePayload::new(url, page_text, record);
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("intake webhook unreachable at {}", self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!(
                "intake webhook returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ));
        }
        info!("posting {:?} sent to {}", record.title, self.endpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_missing_trailing_slash() {
        assert_eq!(
            intake_endpoint("http://localhost:5678/webhook").unwrap().as_str(),
            "http://localhost:5678/webhook/job-intake"
        );
        assert_eq!(
            intake_endpoint("http://localhost:5678/webhook/").unwrap().as_str(),
            "http://localhost:5678/webhook/job-intake"
        );
    }

    #[test]
    fn bad_base_is_an_error() {
        assert!(intake_endpoint("not a url").is_err());
    }

    #[test]
    fn payload_shape_matches_webhook_contract() {
        let record = PostingRecord {
            title: "Engineer".to_string(),
            ..Default::default()
        };
        let text = crate::extraction::page_text(
            "<html><body><h1>Engineer</h1><script>x()</script><p>Remote</p></body></html>",
        );
        let payload = IntakePayload::new("https://jobs.example/1", &text, &record);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["url"], "https://jobs.example/1");
        assert_eq!(json["rawHtml"], "Engineer Remote");
        assert_eq!(json["metadata"]["title"], "Engineer");
        assert!(json["capturedAt"].as_str().is_some());
    }
}
