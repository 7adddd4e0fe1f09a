use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::SymbolCache;
use crate::core::engine::FinancialInputs;
use crate::core::fundamentals::FundamentalsProvider;

const QUOTE_SUMMARY_MODULES: &str =
    "incomeStatementHistory,balanceSheetHistory,defaultKeyStatistics,financialData";

// YahooFundamentalsProvider implementation for FundamentalsProvider
pub struct YahooFundamentalsProvider {
    base_url: String,
    cache: Arc<SymbolCache<FinancialInputs>>,
}

impl YahooFundamentalsProvider {
    pub fn new(base_url: &str, cache: Arc<SymbolCache<FinancialInputs>>) -> Self {
        YahooFundamentalsProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryResponse {
    #[serde(alias = "quoteSummary")]
    quote_summary: QuoteSummaryResult,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryResult {
    result: Vec<QuoteSummaryItem>,
}

#[derive(Deserialize, Debug)]
struct QuoteSummaryItem {
    #[serde(alias = "incomeStatementHistory")]
    income_statement_history: Option<IncomeStatementHistory>,
    #[serde(alias = "balanceSheetHistory")]
    balance_sheet_history: Option<BalanceSheetHistory>,
    #[serde(alias = "defaultKeyStatistics")]
    key_statistics: Option<KeyStatistics>,
    #[serde(alias = "financialData")]
    financial_data: Option<FinancialData>,
}

#[derive(Deserialize, Debug)]
struct IncomeStatementHistory {
    #[serde(alias = "incomeStatementHistory")]
    statements: Vec<IncomeStatement>,
}

#[derive(Deserialize, Debug, Default)]
struct IncomeStatement {
    #[serde(alias = "totalRevenue")]
    total_revenue: Option<RawValue>,
    #[serde(alias = "costOfRevenue")]
    cost_of_revenue: Option<RawValue>,
    #[serde(alias = "netIncome")]
    net_income: Option<RawValue>,
    #[serde(alias = "sellingGeneralAdministrative")]
    selling_general_administrative: Option<RawValue>,
    #[serde(alias = "operatingIncome")]
    operating_income: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct BalanceSheetHistory {
    #[serde(alias = "balanceSheetStatements")]
    statements: Vec<BalanceSheet>,
}

#[derive(Deserialize, Debug, Default)]
struct BalanceSheet {
    #[serde(alias = "totalAssets")]
    total_assets: Option<RawValue>,
    #[serde(alias = "totalLiab")]
    total_liabilities: Option<RawValue>,
    #[serde(alias = "totalStockholderEquity")]
    total_stockholder_equity: Option<RawValue>,
    cash: Option<RawValue>,
    inventory: Option<RawValue>,
    #[serde(alias = "totalCurrentAssets")]
    total_current_assets: Option<RawValue>,
    #[serde(alias = "totalCurrentLiabilities")]
    total_current_liabilities: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct KeyStatistics {
    #[serde(alias = "trailingEps")]
    trailing_eps: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct FinancialData {
    #[serde(alias = "currentPrice")]
    current_price: Option<RawValue>,
    #[serde(alias = "totalDebt")]
    total_debt: Option<RawValue>,
}

// Yahoo wraps every numeric as {"raw": ..., "fmt": "..."}; only raw matters.
#[derive(Deserialize, Debug)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

fn to_inputs(item: &QuoteSummaryItem) -> FinancialInputs {
    let income = item
        .income_statement_history
        .as_ref()
        .and_then(|h| h.statements.first());
    let balance = item
        .balance_sheet_history
        .as_ref()
        .and_then(|h| h.statements.first());

    FinancialInputs {
        revenue: income.and_then(|s| raw(&s.total_revenue)),
        cost_of_goods_sold: income.and_then(|s| raw(&s.cost_of_revenue)),
        net_income: income.and_then(|s| raw(&s.net_income)),
        sga_expense: income.and_then(|s| raw(&s.selling_general_administrative)),
        operating_income: income.and_then(|s| raw(&s.operating_income)),
        shareholder_equity: balance.and_then(|s| raw(&s.total_stockholder_equity)),
        total_assets: balance.and_then(|s| raw(&s.total_assets)),
        total_liabilities: balance.and_then(|s| raw(&s.total_liabilities)),
        cash_and_equivalents: balance.and_then(|s| raw(&s.cash)),
        current_assets: balance.and_then(|s| raw(&s.total_current_assets)),
        inventory: balance.and_then(|s| raw(&s.inventory)),
        current_liabilities: balance.and_then(|s| raw(&s.total_current_liabilities)),
        total_debt: item
            .financial_data
            .as_ref()
            .and_then(|f| raw(&f.total_debt)),
        stock_price: item
            .financial_data
            .as_ref()
            .and_then(|f| raw(&f.current_price)),
        earnings_per_share: item
            .key_statistics
            .as_ref()
            .and_then(|k| raw(&k.trailing_eps)),
        // Yahoo does not expose a tax rate; the engine applies its default.
        effective_tax_rate: None,
    }
}

#[async_trait]
impl FundamentalsProvider for YahooFundamentalsProvider {
    #[instrument(
        name = "YahooFundamentalsFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<FinancialInputs> {
        if let Some(cached) = self.cache.get(symbol).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/v10/finance/quoteSummary/{}?modules={}",
            self.base_url, symbol, QUOTE_SUMMARY_MODULES
        );
        debug!("Requesting fundamentals from {}", url);

        let client = reqwest::Client::builder().user_agent("ival/1.0").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: QuoteSummaryResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .quote_summary
            .result
            .first()
            .ok_or_else(|| anyhow!("No fundamentals found for symbol: {}", symbol))?;

        let inputs = to_inputs(item);
        self.cache.put(symbol, inputs.clone()).await;

        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(symbol: &str, mock_response: &str) -> wiremock::MockServer {
        let mock_server = wiremock::MockServer::start().await;
        let request_path = format!("/v10/finance/quoteSummary/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn full_response() -> &'static str {
        r#"{
            "quoteSummary": {
                "result": [{
                    "incomeStatementHistory": {
                        "incomeStatementHistory": [{
                            "totalRevenue": {"raw": 1000.0, "fmt": "1k"},
                            "costOfRevenue": {"raw": 550.0},
                            "netIncome": {"raw": 200.0},
                            "sellingGeneralAdministrative": {"raw": 100.0},
                            "operatingIncome": {"raw": 250.0}
                        }]
                    },
                    "balanceSheetHistory": {
                        "balanceSheetStatements": [{
                            "totalAssets": {"raw": 2000.0},
                            "totalLiab": {"raw": 800.0},
                            "totalStockholderEquity": {"raw": 500.0},
                            "cash": {"raw": 400.0},
                            "inventory": {"raw": 100.0},
                            "totalCurrentAssets": {"raw": 500.0},
                            "totalCurrentLiabilities": {"raw": 200.0}
                        }]
                    },
                    "defaultKeyStatistics": {
                        "trailingEps": {"raw": 5.0}
                    },
                    "financialData": {
                        "currentPrice": {"raw": 50.0},
                        "totalDebt": {"raw": 300.0}
                    }
                }],
                "error": null
            }
        }"#
    }

    #[tokio::test]
    async fn test_successful_fundamentals_fetch() {
        let mock_server = create_mock_server("AAPL", full_response()).await;
        let cache = Arc::new(SymbolCache::new());

        let provider = YahooFundamentalsProvider::new(&mock_server.uri(), cache);
        let inputs = provider.fetch_fundamentals("AAPL").await.unwrap();

        assert_eq!(inputs.revenue, Some(1000.0));
        assert_eq!(inputs.cost_of_goods_sold, Some(550.0));
        assert_eq!(inputs.net_income, Some(200.0));
        assert_eq!(inputs.sga_expense, Some(100.0));
        assert_eq!(inputs.operating_income, Some(250.0));
        assert_eq!(inputs.shareholder_equity, Some(500.0));
        assert_eq!(inputs.total_assets, Some(2000.0));
        assert_eq!(inputs.total_liabilities, Some(800.0));
        assert_eq!(inputs.cash_and_equivalents, Some(400.0));
        assert_eq!(inputs.current_assets, Some(500.0));
        assert_eq!(inputs.inventory, Some(100.0));
        assert_eq!(inputs.current_liabilities, Some(200.0));
        assert_eq!(inputs.total_debt, Some(300.0));
        assert_eq!(inputs.stock_price, Some(50.0));
        assert_eq!(inputs.earnings_per_share, Some(5.0));
        assert_eq!(inputs.effective_tax_rate, None);
    }

    #[tokio::test]
    async fn test_missing_modules_map_to_absent_fields() {
        let mock_response = r#"{
            "quoteSummary": {
                "result": [{
                    "financialData": {
                        "currentPrice": {"raw": 50.0}
                    }
                }],
                "error": null
            }
        }"#;

        let mock_server = create_mock_server("AAPL", mock_response).await;
        let cache = Arc::new(SymbolCache::new());

        let provider = YahooFundamentalsProvider::new(&mock_server.uri(), cache);
        let inputs = provider.fetch_fundamentals("AAPL").await.unwrap();

        assert_eq!(inputs.stock_price, Some(50.0));
        assert_eq!(inputs.revenue, None);
        assert_eq!(inputs.earnings_per_share, None);
        assert_eq!(inputs.total_debt, None);
        assert_eq!(inputs.current_assets, None);
        assert_eq!(inputs.current_liabilities, None);
    }

    #[tokio::test]
    async fn test_no_fundamentals_data() {
        let mock_response = r#"{"quoteSummary": {"result": [], "error": null}}"#;
        let mock_server = create_mock_server("INVALID", mock_response).await;
        let cache = Arc::new(SymbolCache::new());

        let provider = YahooFundamentalsProvider::new(&mock_server.uri(), cache);
        let result = provider.fetch_fundamentals("INVALID").await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "No fundamentals found for symbol: INVALID"
        );
    }

    #[tokio::test]
    async fn test_http_error_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let cache = Arc::new(SymbolCache::new());
        let provider = YahooFundamentalsProvider::new(&mock_server.uri(), cache);

        let result = provider.fetch_fundamentals("AAPL").await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for symbol: AAPL"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_response = r#"{"quoteSummary": {"results": []}}"#;
        let mock_server = create_mock_server("AAPL", mock_response).await;
        let cache = Arc::new(SymbolCache::new());

        let provider = YahooFundamentalsProvider::new(&mock_server.uri(), cache);
        let result = provider.fetch_fundamentals("AAPL").await;
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for AAPL")
        );
    }

    #[tokio::test]
    async fn test_cached_fetch_skips_network() {
        let cache = Arc::new(SymbolCache::new());
        cache
            .put(
                "AAPL",
                FinancialInputs {
                    stock_price: Some(123.0),
                    ..Default::default()
                },
            )
            .await;

        // Point at a server with no mounted routes; a network hit would 404.
        let mock_server = MockServer::start().await;
        let provider = YahooFundamentalsProvider::new(&mock_server.uri(), cache);

        let inputs = provider.fetch_fundamentals("AAPL").await.unwrap();
        assert_eq!(inputs.stock_price, Some(123.0));
    }
}
