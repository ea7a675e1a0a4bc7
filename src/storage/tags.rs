// src/storage/tags.rs
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::StorageError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HalalStatus {
    Halal,
    #[serde(rename = "Non-Halal")]
    NonHalal,
    #[default]
    Unknown,
}

impl fmt::Display for HalalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HalalStatus::Halal => "Halal",
            HalalStatus::NonHalal => "Non-Halal",
            HalalStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

impl FromStr for HalalStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "halal" => Ok(HalalStatus::Halal),
            "nonhalal" | "haram" => Ok(HalalStatus::NonHalal),
            "unknown" | "" => Ok(HalalStatus::Unknown),
            _ => Err(StorageError::InvalidStatus(s.to_string())),
        }
    }
}

/// Curated halal tag for one label document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalalTag {
    pub status: HalalStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub reviewed_on: Option<DateTime<Utc>>,
}

/// Key-value store of halal tags keyed by document id.
pub trait TagStore {
    /// Returns the stored tag, or `(Unknown, "")` when none exists.
    fn get(&self, id: &str) -> Result<HalalTag, StorageError>;

    /// Inserts or replaces the tag for `id`.
    fn set(&mut self, id: &str, status: HalalStatus, notes: &str) -> Result<(), StorageError>;
}

/// [`TagStore`] persisted as a single JSON object, rewritten on every `set`.
pub struct JsonTagStore {
    path: PathBuf,
    tags: BTreeMap<String, HalalTag>,
}

impl JsonTagStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let tags: BTreeMap<String, HalalTag> = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Loaded {} halal tags from {}", tags.len(), path.display());
        Ok(Self { path, tags })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let body = serde_json::to_string_pretty(&self.tags)?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

impl TagStore for JsonTagStore {
    fn get(&self, id: &str) -> Result<HalalTag, StorageError> {
        Ok(self.tags.get(id.trim()).cloned().unwrap_or_default())
    }

    fn set(&mut self, id: &str, status: HalalStatus, notes: &str) -> Result<(), StorageError> {
        let tag = HalalTag {
            status,
            notes: notes.to_string(),
            reviewed_on: Some(Utc::now()),
        };
        self.tags.insert(id.trim().to_string(), tag);
        self.persist()?;
        tracing::info!("Tagged {} as {}", id.trim(), status);
        Ok(())
    }
}
