// src/extractors/ingredients.rs

// --- Imports ---
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::label::tree::{items_in, paragraphs_in, LabeledTree, Node, Section};
use crate::utils::error::ExtractError;
use crate::utils::text::normalize_whitespace;

/// Delimiter used when an ingredient list is flattened into one column.
pub const EXPORT_DELIMITER: &str = "; ";

// --- Target Sections ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSection {
    Active,
    Inactive,
}

impl TargetSection {
    pub const ALL: [TargetSection; 2] = [TargetSection::Active, TargetSection::Inactive];

    pub fn label(self) -> &'static str {
        match self {
            TargetSection::Active => "ACTIVE INGREDIENT",
            TargetSection::Inactive => "INACTIVE INGREDIENT",
        }
    }

    fn from_normalized(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

/// What to do when a document has two sections with the same target label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateSectionPolicy {
    /// The later section in document order replaces the earlier one.
    #[default]
    LastWins,
    Reject,
}

// --- Data Structures ---
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngredientSet {
    pub active: Vec<String>,
    pub inactive: Vec<String>,
}

/// One flat row per document, lists joined by [`EXPORT_DELIMITER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientRecord {
    pub set_id: String,
    pub title: String,
    pub active_ingredients: String,
    pub inactive_ingredients: String,
}

impl IngredientSet {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.inactive.is_empty()
    }

    pub fn to_record(&self, set_id: &str, title: &str) -> IngredientRecord {
        IngredientRecord {
            set_id: set_id.to_string(),
            title: title.to_string(),
            active_ingredients: self.active.join(EXPORT_DELIMITER),
            inactive_ingredients: self.inactive.join(EXPORT_DELIMITER),
        }
    }
}

// --- Main Extractor Structure ---
#[derive(Debug, Clone, Default)]
pub struct IngredientExtractor {
    policy: DuplicateSectionPolicy,
}

impl IngredientExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicateSectionPolicy) -> Self {
        Self { policy }
    }

    /// Extracts the active and inactive ingredient lists from a label.
    /// Missing sections produce empty lists; only [`DuplicateSectionPolicy::Reject`]
    /// can fail.
    pub fn extract(&self, document: &LabeledTree) -> Result<IngredientSet, ExtractError> {
        let (matched, duplicates) = match_sections(document);

        if let Some(target) = duplicates.first() {
            tracing::debug!("Section '{}' matched more than once", target.label());
            if self.policy == DuplicateSectionPolicy::Reject {
                return Err(ExtractError::DuplicateSection(target.label().to_string()));
            }
        }

        let set = ingredients_from(&matched);
        tracing::info!(
            "Extracted {} active and {} inactive ingredients from {}",
            set.active.len(),
            set.inactive.len(),
            document.set_id.as_deref().unwrap_or("<unidentified label>")
        );
        Ok(set)
    }
}

/// Infallible extraction with last-match-wins semantics.
pub fn extract(document: &LabeledTree) -> IngredientSet {
    let (matched, _) = match_sections(document);
    ingredients_from(&matched)
}

/// Maps each target to the last matching section, and records every target
/// that was matched more than once.
fn match_sections(document: &LabeledTree) -> (HashMap<TargetSection, &Section>, Vec<TargetSection>) {
    let mut matched = HashMap::new();
    let mut duplicates = Vec::new();

    for section in document.sections() {
        let label = normalize_label(section.effective_label());
        let Some(target) = TargetSection::from_normalized(&label) else {
            continue;
        };
        if matched.insert(target, section).is_some() && !duplicates.contains(&target) {
            duplicates.push(target);
        }
    }
    (matched, duplicates)
}

fn ingredients_from(matched: &HashMap<TargetSection, &Section>) -> IngredientSet {
    let items_for = |target: TargetSection| {
        matched
            .get(&target)
            .map(|section| extract_section_items(&section.children))
            .unwrap_or_default()
    };

    IngredientSet {
        active: items_for(TargetSection::Active),
        inactive: items_for(TargetSection::Inactive),
    }
}

/// Uppercases, trims, and singularizes a trailing "INGREDIENTS".
pub fn normalize_label(label: &str) -> String {
    let upper = label.trim().to_uppercase();
    match upper.strip_suffix("INGREDIENTS") {
        Some(stem) => format!("{}INGREDIENT", stem),
        None => upper,
    }
}

/// List items first; raw paragraphs only when no item has any text.
fn extract_section_items(body: &[Node]) -> Vec<String> {
    let from_items: Vec<String> = items_in(body)
        .into_iter()
        .map(|item| item.paragraphs().collect::<Vec<_>>().join(" "))
        .collect();

    let candidates = dedup_normalized(from_items);
    if !candidates.is_empty() {
        return candidates;
    }

    tracing::debug!("No non-empty list items in section, falling back to paragraphs");
    dedup_normalized(paragraphs_in(body))
}

/// Normalizes whitespace, drops empties and keeps the first occurrence of each string.
fn dedup_normalized<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|c| normalize_whitespace(c.as_ref()))
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
