// src/storage/catalog.rs
//! Local product catalog: NDC-keyed product records with optional halal
//! review data, searchable by code or name.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::storage::tags::HalalStatus;
use crate::utils::error::StorageError;
use crate::utils::text::LikePattern;

pub const SEARCH_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub ndc: String,
    pub proprietary_name: Option<String>,
    pub nonproprietary_name: Option<String>,
    pub labeler_name: Option<String>,
    pub dosage_form: Option<String>,
    pub route: Option<String>,
    pub marketing_status: Option<String>,
    pub package_description: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalalInfo {
    pub halal_status: HalalStatus,
    pub ethanol_pct: Option<f64>,
    pub gelatin_source: Option<String>,
    pub glycerin_source: Option<String>,
    pub stearate_source: Option<String>,
    #[serde(default)]
    pub shellac: bool,
    pub notes: Option<String>,
    pub evidence_url: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_on: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogEntry {
    product: Product,
    #[serde(default)]
    halal: Option<HalalInfo>,
}

/// A product joined with the columns of its halal review, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRow {
    pub ndc: String,
    pub proprietary_name: Option<String>,
    pub nonproprietary_name: Option<String>,
    pub labeler_name: Option<String>,
    pub dosage_form: Option<String>,
    pub route: Option<String>,
    pub marketing_status: Option<String>,
    pub halal_status: Option<HalalStatus>,
    pub ethanol_pct: Option<f64>,
    pub gelatin_source: Option<String>,
    pub notes: Option<String>,
}

impl SearchRow {
    fn from_entry(entry: &CatalogEntry) -> Self {
        let p = &entry.product;
        let h = entry.halal.as_ref();
        Self {
            ndc: p.ndc.clone(),
            proprietary_name: p.proprietary_name.clone(),
            nonproprietary_name: p.nonproprietary_name.clone(),
            labeler_name: p.labeler_name.clone(),
            dosage_form: p.dosage_form.clone(),
            route: p.route.clone(),
            marketing_status: p.marketing_status.clone(),
            halal_status: h.map(|h| h.halal_status),
            ethanol_pct: h.and_then(|h| h.ethanol_pct),
            gelatin_source: h.and_then(|h| h.gelatin_source.clone()),
            notes: h.and_then(|h| h.notes.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

pub struct ProductCatalog {
    path: PathBuf,
    entries: BTreeMap<String, CatalogEntry>,
}

impl ProductCatalog {
    /// Opens the catalog file, starting empty if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, CatalogEntry> = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Loaded catalog with {} products from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self) -> Result<(), StorageError> {
        let body = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, body)?;
        tracing::info!("Saved {} products to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    /// Inserts or replaces a product by NDC. Halal info already attached to
    /// the NDC is kept.
    pub fn upsert_product(&mut self, mut product: Product) -> Upsert {
        product.ndc = product.ndc.trim().to_string();
        if product.last_updated.is_none() {
            product.last_updated = Some(Utc::now().to_rfc3339());
        }

        match self.entries.get_mut(&product.ndc) {
            Some(entry) => {
                entry.product = product;
                Upsert::Updated
            }
            None => {
                self.entries.insert(product.ndc.clone(), CatalogEntry { product, halal: None });
                Upsert::Inserted
            }
        }
    }

    pub fn set_halal_info(&mut self, ndc: &str, info: HalalInfo) -> Result<(), StorageError> {
        let entry = self
            .entries
            .get_mut(ndc.trim())
            .ok_or_else(|| StorageError::UnknownProduct(ndc.to_string()))?;
        entry.halal = Some(info);
        Ok(())
    }

    pub fn halal_info(&self, ndc: &str) -> Option<&HalalInfo> {
        self.entries.get(ndc.trim()).and_then(|e| e.halal.as_ref())
    }

    /// Case-insensitive `LIKE '%query%'` search over NDC, brand and generic
    /// name, ordered by brand name and capped at [`SEARCH_LIMIT`].
    pub fn search(&self, query: &str) -> Vec<SearchRow> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let pattern = LikePattern::new(query);
        let field_matches = |field: &Option<String>| field.as_deref().map_or(false, |v| pattern.is_match(v));

        let mut hits: Vec<&CatalogEntry> = self
            .entries
            .values()
            .filter(|e| {
                pattern.is_match(&e.product.ndc)
                    || field_matches(&e.product.proprietary_name)
                    || field_matches(&e.product.nonproprietary_name)
            })
            .collect();

        hits.sort_by(|a, b| {
            a.product
                .proprietary_name
                .cmp(&b.product.proprietary_name)
                .then_with(|| a.product.ndc.cmp(&b.product.ndc))
        });

        let rows: Vec<SearchRow> = hits.into_iter().take(SEARCH_LIMIT).map(SearchRow::from_entry).collect();
        tracing::debug!("Search '{}' matched {} products", query, rows.len());
        rows
    }

    /// Imports products from CSV. Columns are matched by header name; `ndc` is
    /// required, product columns are optional, and any halal column present on
    /// a row attaches a [`HalalInfo`] to that product.
    pub fn import_csv<R: Read>(&mut self, reader: R) -> Result<ImportSummary, StorageError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: HashMap<String, usize> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase().replace(' ', "_"), i))
            .collect();

        if !columns.contains_key("ndc") {
            return Err(StorageError::MissingColumn("ndc".to_string()));
        }

        let mut summary = ImportSummary::default();
        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let field = |name: &str| -> Option<String> {
                columns
                    .get(name)
                    .and_then(|&i| record.get(i))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };

            let Some(ndc) = field("ndc") else {
                tracing::warn!("Skipping CSV row {}: empty ndc", line + 2);
                summary.skipped += 1;
                continue;
            };

            let halal = match halal_info_from_row(&field) {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!("Skipping CSV row {} ({}): {}", line + 2, ndc, e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let product = Product {
                ndc: ndc.clone(),
                proprietary_name: field("proprietary_name"),
                nonproprietary_name: field("nonproprietary_name"),
                labeler_name: field("labeler_name"),
                dosage_form: field("dosage_form"),
                route: field("route"),
                marketing_status: field("marketing_status"),
                package_description: field("package_description"),
                last_updated: field("last_updated"),
            };

            match self.upsert_product(product) {
                Upsert::Inserted => summary.inserted += 1,
                Upsert::Updated => summary.updated += 1,
            }
            if let Some(info) = halal {
                self.set_halal_info(&ndc, info)?;
            }
        }

        tracing::info!(
            "CSV import: {} inserted, {} updated, {} skipped",
            summary.inserted, summary.updated, summary.skipped
        );
        Ok(summary)
    }
}

const HALAL_COLUMNS: &[&str] = &[
    "halal_status",
    "ethanol_pct",
    "gelatin_source",
    "glycerin_source",
    "stearate_source",
    "shellac",
    "notes",
    "evidence_url",
    "reviewed_by",
    "reviewed_on",
];

fn halal_info_from_row<F>(field: &F) -> Result<Option<HalalInfo>, StorageError>
where
    F: Fn(&str) -> Option<String>,
{
    if HALAL_COLUMNS.iter().all(|c| field(c).is_none()) {
        return Ok(None);
    }

    let halal_status = match field("halal_status") {
        Some(raw) => raw.parse()?,
        None => HalalStatus::Unknown,
    };

    let ethanol_pct = match field("ethanol_pct") {
        Some(raw) => Some(raw.parse::<f64>().map_err(|_| {
            StorageError::SerializationError(format!("ethanol_pct '{}' is not a number", raw))
        })?),
        None => None,
    };

    let shellac = field("shellac")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y"))
        .unwrap_or(false);

    Ok(Some(HalalInfo {
        halal_status,
        ethanol_pct,
        gelatin_source: field("gelatin_source"),
        glycerin_source: field("glycerin_source"),
        stearate_source: field("stearate_source"),
        shellac,
        notes: field("notes"),
        evidence_url: field("evidence_url"),
        reviewed_by: field("reviewed_by"),
        reviewed_on: field("reviewed_on"),
    }))
}

/// Writes rows as CSV with a header line.
pub fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), StorageError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
ndc,proprietary_name,nonproprietary_name,labeler_name,dosage_form,route,halal_status,ethanol_pct,gelatin_source,notes
0573-0150-20,Advil,Ibuprofen,Haleon,TABLET,ORAL,,,,
50580-449-02,Tylenol,Acetaminophen,Kenvue,CAPSULE,ORAL,Non-Halal,,porcine,gelatin capsule shell
0280-2000-10,Bayer Aspirin,Aspirin,Bayer,TABLET,ORAL,Halal,0,,
,Orphan,Nothing,Nobody,,,,,,
";

    fn catalog_with_sample() -> (tempfile::TempDir, ProductCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path().join("catalog.json")).unwrap();
        let summary = catalog.import_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(summary, ImportSummary { inserted: 3, updated: 0, skipped: 1 });
        (dir, catalog)
    }

    #[test]
    fn test_search_matches_ndc_brand_and_generic() {
        let (_dir, catalog) = catalog_with_sample();

        let by_generic = catalog.search("ibuprofen");
        assert_eq!(by_generic.len(), 1);
        assert_eq!(by_generic[0].proprietary_name.as_deref(), Some("Advil"));
        assert_eq!(by_generic[0].halal_status, None);

        assert_eq!(catalog.search("50580").len(), 1);
        assert_eq!(catalog.search("ASPIRIN")[0].halal_status, Some(HalalStatus::Halal));
        assert!(catalog.search("   ").is_empty());
    }

    #[test]
    fn test_search_orders_by_brand_name() {
        let (_dir, catalog) = catalog_with_sample();
        let names: Vec<_> = catalog
            .search("0")
            .into_iter()
            .filter_map(|r| r.proprietary_name)
            .collect();
        assert_eq!(names, vec!["Advil", "Bayer Aspirin", "Tylenol"]);
    }

    #[test]
    fn test_search_treats_percent_and_underscore_as_wildcards() {
        let (_dir, catalog) = catalog_with_sample();

        let hits = catalog.search("a_v");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].proprietary_name.as_deref(), Some("Advil"));

        assert_eq!(catalog.search("%vil")[0].ndc, "0573-0150-20");
        assert_eq!(catalog.search("0573-0150-__").len(), 1);
    }

    #[test]
    fn test_import_attaches_halal_columns() {
        let (_dir, catalog) = catalog_with_sample();
        let info = catalog.halal_info("50580-449-02").expect("halal info");
        assert_eq!(info.halal_status, HalalStatus::NonHalal);
        assert_eq!(info.gelatin_source.as_deref(), Some("porcine"));
        assert_eq!(info.notes.as_deref(), Some("gelatin capsule shell"));
        assert!(catalog.halal_info("0573-0150-20").is_none());
    }

    #[test]
    fn test_upsert_keeps_halal_info_and_persists() {
        let (dir, mut catalog) = catalog_with_sample();
        let outcome = catalog.upsert_product(Product {
            ndc: "50580-449-02".to_string(),
            proprietary_name: Some("Tylenol Extra Strength".to_string()),
            ..Default::default()
        });
        assert_eq!(outcome, Upsert::Updated);
        catalog.save().unwrap();

        let reopened = ProductCatalog::open(dir.path().join("catalog.json")).unwrap();
        assert_eq!(reopened.len(), 3);
        let row = &reopened.search("extra strength")[0];
        assert_eq!(row.halal_status, Some(HalalStatus::NonHalal));
    }

    #[test]
    fn test_import_requires_ndc_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path().join("catalog.json")).unwrap();
        let err = catalog.import_csv("name,route\nAdvil,ORAL\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StorageError::MissingColumn(c) if c == "ndc"));
    }

    #[test]
    fn test_bad_halal_status_row_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path().join("catalog.json")).unwrap();
        let summary = catalog
            .import_csv("ndc,halal_status\n0573-0150-20,probably\n0280-2000-10,Halal\n".as_bytes())
            .unwrap();
        assert_eq!(summary, ImportSummary { inserted: 1, updated: 0, skipped: 1 });
    }

    #[test]
    fn test_set_halal_info_unknown_product() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = ProductCatalog::open(dir.path().join("catalog.json")).unwrap();
        let err = catalog.set_halal_info("0000-0000-00", HalalInfo::default()).unwrap_err();
        assert!(matches!(err, StorageError::UnknownProduct(_)));
    }

    #[test]
    fn test_write_csv_search_rows() {
        let (_dir, catalog) = catalog_with_sample();
        let mut out = Vec::new();
        write_csv(&mut out, &catalog.search("tylenol")).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("ndc,proprietary_name,nonproprietary_name"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("50580-449-02,Tylenol,Acetaminophen"));
        assert!(row.contains("Non-Halal"));
    }
}
