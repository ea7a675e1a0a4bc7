// src/storage/mod.rs
pub mod catalog;
pub mod tags;

use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::{IngredientRecord, IngredientSet};
use crate::label::LabeledTree;
use crate::utils::error::StorageError;

pub use catalog::{ProductCatalog, SearchRow};
pub use tags::{HalalStatus, HalalTag, JsonTagStore, TagStore};

const CATALOG_FILE: &str = "catalog.json";
const TAGS_FILE: &str = "halal_tags.json";

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Opens the data directory, creating it on first use.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, StorageError> {
        let base_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        tracing::debug!("Using data directory {}", base_dir.display());
        Ok(Self { base_dir })
    }

    pub fn open_catalog(&self) -> Result<ProductCatalog, StorageError> {
        ProductCatalog::open(self.base_dir.join(CATALOG_FILE))
    }

    pub fn open_tag_store(&self) -> Result<JsonTagStore, StorageError> {
        JsonTagStore::open(self.base_dir.join(TAGS_FILE))
    }

    /// Directory holding everything saved for one label: /base_dir/labels/<set_id>/
    fn label_dir(&self, set_id: &str) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join("labels").join(set_id);
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir)?;
        }
        Ok(target_dir)
    }

    /// Saves the flattened ingredient row as a one-record CSV file
    pub fn save_ingredient_export(&self, record: &IngredientRecord) -> Result<PathBuf, StorageError> {
        let file_path = self.label_dir(&record.set_id)?.join("ingredients.csv");
        let file = fs::File::create(&file_path)?;
        catalog::write_csv(file, std::slice::from_ref(record))?;

        tracing::info!("Saved ingredients to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the extraction in JSON format
    pub fn save_ingredient_metadata(
        &self,
        record: &IngredientRecord,
        label: &LabeledTree,
        ingredients: &IngredientSet,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.label_dir(&record.set_id)?.join("ingredients_meta.json");

        let metadata = serde_json::json!({
            "set_id": record.set_id,
            "title": label.title,
            "version": label.version,
            "effective_time": label.effective_time,
            "active_count": ingredients.active.len(),
            "inactive_count": ingredients.inactive.len(),
            "ingredients": ingredients,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)?;
        fs::write(&file_path, metadata_str)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Keeps the downloaded SPL markup for debugging
    pub fn save_raw_label(&self, set_id: &str, xml: &str) -> Result<PathBuf, StorageError> {
        let file_path = self.label_dir(set_id)?.join("label.xml");
        fs::write(&file_path, xml)?;
        tracing::info!("Saved raw label to {}", file_path.display());
        Ok(file_path)
    }

    /// Dumps the parsed section tree next to the raw markup.
    pub fn save_label_tree(&self, set_id: &str, label: &LabeledTree) -> Result<PathBuf, StorageError> {
        let file_path = self.label_dir(set_id)?.join("label_tree.json");
        fs::write(&file_path, serde_json::to_string_pretty(label)?)?;
        tracing::info!("Saved parsed label tree to {}", file_path.display());
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("data");
        StorageManager::new(&base).unwrap();
        assert!(base.is_dir());
    }

    #[test]
    fn test_save_ingredient_export_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let set = IngredientSet {
            active: vec!["Aspirin 325 mg".to_string()],
            inactive: vec!["Starch".to_string(), "Talc".to_string()],
        };
        let label = LabeledTree {
            set_id: Some("set-1".to_string()),
            title: Some("Aspirin".to_string()),
            ..Default::default()
        };
        let record = set.to_record("set-1", "Aspirin");

        let csv_path = storage.save_ingredient_export(&record).unwrap();
        let csv_text = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(
            csv_text,
            "set_id,title,active_ingredients,inactive_ingredients\nset-1,Aspirin,Aspirin 325 mg,Starch; Talc\n"
        );

        let meta_path = storage.save_ingredient_metadata(&record, &label, &set).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&fs::read_to_string(meta_path).unwrap()).unwrap();
        assert_eq!(meta["set_id"], "set-1");
        assert_eq!(meta["inactive_count"], 2);
        assert_eq!(meta["ingredients"]["inactive"][1], "Talc");
    }

    #[test]
    fn test_save_label_tree_dumps_sections() {
        use crate::label::{Node, Section};

        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let label = LabeledTree::new(vec![Node::Section(Section {
            title: Some("Inactive ingredients".to_string()),
            code: None,
            children: vec![Node::Paragraph("Water".to_string())],
        })]);

        let path = storage.save_label_tree("set-1", &label).unwrap();
        let dumped: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        let section = &dumped["children"][0]["section"];
        assert_eq!(section["title"], "Inactive ingredients");
        assert_eq!(section["children"][0]["paragraph"], "Water");
    }

    #[test]
    fn test_stores_open_inside_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();

        let mut tags = storage.open_tag_store().unwrap();
        tags.set("set-1", HalalStatus::Halal, "").unwrap();
        assert!(dir.path().join(TAGS_FILE).exists());

        let catalog = storage.open_catalog().unwrap();
        assert!(catalog.is_empty());
    }
}
