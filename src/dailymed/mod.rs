// src/dailymed/mod.rs
pub mod client;
pub mod models;

pub use client::DailyMedClient;
pub use models::SplSummary;
