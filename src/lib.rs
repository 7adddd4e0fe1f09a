pub mod cli;
pub mod core;
pub mod providers;

use crate::core::cache::SymbolCache;
use crate::core::config::AppConfig;
use crate::core::engine::FinancialInputs;
use crate::core::history::HistoryStore;
use anyhow::{Result, anyhow};
use providers::yahoo_finance::YahooFundamentalsProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Commands the application can execute after configuration is loaded.
pub enum AppCommand {
    Screen { universe: String },
    Score { symbol: String },
    History { clear: bool },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Intrinsic value screener starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let fundamentals_cache = Arc::new(SymbolCache::<FinancialInputs>::new());
    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    let provider = YahooFundamentalsProvider::new(base_url, Arc::clone(&fundamentals_cache));

    // History persistence is best effort: a broken data dir downgrades to a
    // warning instead of blocking the screen output.
    let history = match config
        .default_data_path()
        .and_then(|path| HistoryStore::open(&path))
    {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "Evaluation history is unavailable");
            None
        }
    };

    let scoring_policy = config.policy.scoring_policy();
    let rating_policy = config.policy.rating;

    match command {
        AppCommand::Screen { universe } => {
            let universe = config
                .universe(&universe)
                .ok_or_else(|| anyhow!("Universe '{}' not found in configuration", universe))?;
            cli::screen::run(
                universe,
                &provider,
                &scoring_policy,
                rating_policy,
                history.as_ref(),
            )
            .await
        }
        AppCommand::Score { symbol } => {
            cli::score::run(
                &symbol,
                &provider,
                &scoring_policy,
                rating_policy,
                history.as_ref(),
            )
            .await
        }
        AppCommand::History { clear } => {
            let store =
                history.ok_or_else(|| anyhow!("Evaluation history store could not be opened"))?;
            cli::history::run(&store, clear)
        }
    }
}
