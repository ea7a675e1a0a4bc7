//! NDC product lookup with curated halal tags, and ingredient extraction
//! from DailyMed SPL labels.

pub mod dailymed;
pub mod extractors;
pub mod label;
pub mod storage;
pub mod utils;
