//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod engine;
pub mod fundamentals;
pub mod history;
pub mod log;

// Re-export main types for cleaner imports
pub use engine::{EngineError, FinancialInputs, RatingPolicy, ScoringPolicy, ValuationResult};
pub use fundamentals::FundamentalsProvider;
