// src/dailymed/models.rs
use serde::{Deserialize, Serialize};

/// Response of the SPL listing endpoint.
/// Example: https://dailymed.nlm.nih.gov/dailymed/services/v2/spls.json?ndc=0573-0150-20
#[derive(Debug, Deserialize)]
pub struct SplListResponse {
    #[serde(default)]
    pub metadata: Option<ListMetadata>,
    #[serde(default)]
    pub data: Vec<SplSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ListMetadata {
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub db_published_date: Option<String>,
}

/// One SPL document version known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SplSummary {
    pub setid: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub spl_version: Option<u32>,
    #[serde(default)]
    pub published_date: Option<String>,
}

impl SplSummary {
    /// Public page for a human to review the label.
    pub fn label_page_url(&self) -> String {
        format!(
            "https://dailymed.nlm.nih.gov/dailymed/drugInfo.cfm?setid={}",
            self.setid
        )
    }
}
