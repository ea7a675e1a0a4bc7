// src/extractors/mod.rs
pub mod ingredients;

// Re-export key extraction types for convenience
pub use ingredients::{
    extract,
    DuplicateSectionPolicy,
    IngredientExtractor,
    IngredientRecord,
    IngredientSet,
};
