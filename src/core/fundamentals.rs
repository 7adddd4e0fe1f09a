//! Data source boundary: anything that can produce a financial statement
//! snapshot for a ticker symbol.

use crate::core::engine::FinancialInputs;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Fetches the latest statement figures for a symbol. Providers map
    /// missing line items to `None`; only transport or parse failures error.
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FinancialInputs>;
}
