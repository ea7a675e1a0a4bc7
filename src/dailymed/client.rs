// src/dailymed/client.rs
use std::time::Duration;

use reqwest::header;

use crate::dailymed::models::{SplListResponse, SplSummary};
use crate::label::{parse_label, LabeledTree};
use crate::utils::config::AppConfig;
use crate::utils::error::DailyMedError;
use crate::utils::text::{is_valid_ndc, is_valid_set_id};

/// Thin client for the subset of the DailyMed v2 API this tool consumes.
pub struct DailyMedClient {
    http: reqwest::Client,
    base_url: String,
    request_delay: Duration,
}

impl DailyMedClient {
    /// Creates a reqwest client configured for DailyMed interaction.
    pub fn new(config: &AppConfig) -> Result<Self, DailyMedError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Lists the SPL documents registered for an NDC, newest version first.
    pub async fn find_set_ids_by_ndc(&self, ndc: &str) -> Result<Vec<SplSummary>, DailyMedError> {
        let ndc = ndc.trim();
        if !is_valid_ndc(ndc) {
            return Err(DailyMedError::InvalidIdentifier(format!("NDC '{}'", ndc)));
        }

        let url = format!("{}/spls.json", self.base_url);
        tracing::info!("Looking up SPL set ids for NDC {}", ndc);
        self.pause().await;

        let response = self.http.get(&url)
            .query(&[("ndc", ndc)])
            .header(header::ACCEPT, "application/json")
            .send()
            .await?; // Propagates reqwest::Error as DailyMedError::Network
        let response = check_status(response, &url)?;

        let listing: SplListResponse = response
            .json()
            .await
            .map_err(|e| DailyMedError::Parse(e.to_string()))?;

        let mut spls = listing.data;
        if spls.is_empty() {
            return Err(DailyMedError::NoLabelsForNdc(ndc.to_string()));
        }
        spls.sort_by(|a, b| b.spl_version.unwrap_or(0).cmp(&a.spl_version.unwrap_or(0)));

        tracing::debug!("Found {} SPL documents for NDC {}", spls.len(), ndc);
        Ok(spls)
    }

    /// Downloads the raw SPL XML of a label.
    pub async fn download_label_xml(&self, set_id: &str) -> Result<String, DailyMedError> {
        let set_id = set_id.trim();
        if !is_valid_set_id(set_id) {
            return Err(DailyMedError::InvalidIdentifier(format!("set id '{}'", set_id)));
        }

        let url = format!("{}/spls/{}.xml", self.base_url, set_id);
        tracing::info!("Downloading label from: {}", url);
        self.pause().await;

        let response = self.http.get(&url)
            .header(header::ACCEPT, "application/xml,text/xml,*/*")
            .send()
            .await?;
        let response = check_status(response, &url)?;

        let body = response.text().await?;
        tracing::debug!("Successfully downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }

    /// Downloads and parses a label into a [`LabeledTree`].
    pub async fn fetch_label(&self, set_id: &str) -> Result<LabeledTree, DailyMedError> {
        self.fetch_label_with(set_id, |_| {}).await
    }

    /// Like [`fetch_label`](Self::fetch_label), but hands the raw markup to
    /// `on_download` before parsing, so it is seen even when parsing fails.
    pub async fn fetch_label_with<F>(&self, set_id: &str, on_download: F) -> Result<LabeledTree, DailyMedError>
    where
        F: FnOnce(&str),
    {
        let xml = self.download_label_xml(set_id).await?;
        on_download(&xml);
        Ok(parse_label(&xml)?)
    }

    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

/// Maps non-success statuses onto [`DailyMedError`].
fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response, DailyMedError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::error!("HTTP error status: {} for URL: {}", status, url);
    match status {
        reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("Received {} - backing off is advised.", status);
            Err(DailyMedError::RateLimited)
        }
        reqwest::StatusCode::NOT_FOUND => Err(DailyMedError::LabelNotFound(url.to_string())),
        _ => Err(DailyMedError::Http(status)),
    }
}
