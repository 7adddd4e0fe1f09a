pub mod yahoo_finance;

// Re-export the cache for providers to share
pub use crate::core::cache::SymbolCache;
