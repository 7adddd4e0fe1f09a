//! Deterministic scoring engine: maps one company's financial statement
//! snapshot to an intrinsic-value estimate, a margin of safety, and a
//! composite rating. Pure and stateless; safe to call concurrently.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One company's financial statement figures for a single evaluation.
///
/// Every field is optional: data sources routinely omit line items, and a
/// missing value is not the same as a reported zero. The distinction is kept
/// all the way through scoring and serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputs {
    pub revenue: Option<f64>,
    pub cost_of_goods_sold: Option<f64>,
    pub net_income: Option<f64>,
    pub shareholder_equity: Option<f64>,
    pub sga_expense: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub current_assets: Option<f64>,
    pub inventory: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub operating_income: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub stock_price: Option<f64>,
    pub effective_tax_rate: Option<f64>,
}

/// Policy constants for the valuation formulas. These are assumptions, not
/// market data, so they live in configuration rather than in the input record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Assumed annual earnings growth, in percent.
    pub expected_growth_rate: f64,
    /// AAA corporate bond yield used by the Graham formula, in percent.
    pub corporate_bond_yield: f64,
    /// Tax rate applied when the statements do not report one.
    pub default_tax_rate: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        ScoringPolicy {
            expected_growth_rate: 8.0,
            corporate_bond_yield: 4.6,
            default_tax_rate: 0.21,
        }
    }
}

/// How the final rating combines the normalized margin of safety with the
/// quality/safety fraction. Both formulas exist in deployed versions of the
/// screener and produce different scales, so the choice is explicit and the
/// result records which one applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatingPolicy {
    /// `(normalized + x) * 50`, a 0-100 scale. Used by the batch screen.
    #[default]
    WeightedHundred,
    /// `normalized * 0.5 + x * 0.5`, a 0-1 scale.
    HalfHalf,
}

/// The engine's sole output: intrinsic value, margin of safety, the rating,
/// and the disclosed intermediate ratios. `None` means the ratio was not
/// computable from the supplied fields, which is distinct from a value of 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub intrinsic_value: f64,
    pub margin_of_safety: Option<f64>,
    pub rating: f64,
    pub rating_policy: RatingPolicy,
    pub gross_profit_margin: f64,
    pub return_on_equity: f64,
    pub roic: f64,
    pub sga_to_revenue: Option<f64>,
    pub debt_to_equity: f64,
    pub current_ratio: f64,
    pub cash_ratio: f64,
    pub quick_ratio: Option<f64>,
    pub roa: Option<f64>,
}

/// The only failure the engine surfaces. Missing fields are handled by
/// documented fallbacks and never error; a non-finite value means the record
/// itself is malformed and the caller gets the offending field name back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("financial input field '{field}' is not a finite number")]
    NonFiniteField { field: &'static str },
}

impl FinancialInputs {
    /// Rejects records carrying NaN or infinite values. A `None` field is
    /// always acceptable.
    pub fn validate(&self) -> Result<(), EngineError> {
        let fields: [(&'static str, Option<f64>); 16] = [
            ("revenue", self.revenue),
            ("cost_of_goods_sold", self.cost_of_goods_sold),
            ("net_income", self.net_income),
            ("shareholder_equity", self.shareholder_equity),
            ("sga_expense", self.sga_expense),
            ("total_debt", self.total_debt),
            ("total_assets", self.total_assets),
            ("total_liabilities", self.total_liabilities),
            ("cash_and_equivalents", self.cash_and_equivalents),
            ("current_assets", self.current_assets),
            ("inventory", self.inventory),
            ("current_liabilities", self.current_liabilities),
            ("operating_income", self.operating_income),
            ("earnings_per_share", self.earnings_per_share),
            ("stock_price", self.stock_price),
            ("effective_tax_rate", self.effective_tax_rate),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(EngineError::NonFiniteField { field });
                }
            }
        }
        Ok(())
    }
}

/// Evaluates one company. Deterministic: identical inputs produce
/// bit-identical results.
pub fn evaluate(
    inputs: &FinancialInputs,
    policy: &ScoringPolicy,
    rating_policy: RatingPolicy,
) -> Result<ValuationResult, EngineError> {
    inputs.validate()?;

    let revenue = inputs.revenue.unwrap_or(0.0);
    let cogs = inputs.cost_of_goods_sold.unwrap_or(0.0);
    let net_income = inputs.net_income.unwrap_or(0.0);
    let equity = inputs.shareholder_equity.unwrap_or(0.0);
    let total_debt = inputs.total_debt.unwrap_or(0.0);
    let total_assets = inputs.total_assets.unwrap_or(0.0);
    let total_liabilities = inputs.total_liabilities.unwrap_or(0.0);
    let cash = inputs.cash_and_equivalents.unwrap_or(0.0);
    let operating_income = inputs.operating_income.unwrap_or(0.0);
    let stock_price = inputs.stock_price.unwrap_or(0.0);
    let tax_rate = inputs.effective_tax_rate.unwrap_or(policy.default_tax_rate);

    let gross_profit_margin = if revenue != 0.0 {
        ((revenue - cogs) / revenue) * 100.0
    } else {
        0.0
    };

    let return_on_equity = if equity != 0.0 {
        (net_income / equity) * 100.0
    } else {
        0.0
    };

    let nopat = operating_income * (1.0 - tax_rate);
    let invested_capital = total_assets - total_liabilities - cash;
    let roic = if invested_capital != 0.0 {
        (nopat / invested_capital) * 100.0
    } else {
        0.0
    };

    let sga_to_revenue = match inputs.sga_expense {
        Some(sga) if revenue != 0.0 => Some((sga / revenue) * 100.0),
        _ => None,
    };

    let debt_to_equity = if equity != 0.0 {
        total_debt / equity
    } else {
        0.0
    };

    // The original screener fed total assets and total liabilities into the
    // current and cash ratios instead of the current-period line items. That
    // quirk is preserved; only the quick ratio uses the true current figures.
    let current_ratio = if total_liabilities != 0.0 {
        total_assets / total_liabilities
    } else {
        0.0
    };
    let cash_ratio = if total_liabilities != 0.0 {
        cash / total_liabilities
    } else {
        0.0
    };

    let quick_ratio = match (
        inputs.current_assets,
        inputs.inventory,
        inputs.current_liabilities,
    ) {
        (Some(ca), Some(inv), Some(cl)) if cl != 0.0 => Some((ca - inv) / cl),
        _ => None,
    };

    let roa = match (inputs.net_income, inputs.total_assets) {
        (Some(ni), Some(ta)) if ta != 0.0 => Some((ni / ta) * 100.0),
        _ => None,
    };

    let mut quality = 0.0;
    if gross_profit_margin > 40.0 {
        quality += 1.0;
    }
    if return_on_equity > 20.0 {
        quality += 1.0;
    }
    if roic > 30.0 {
        quality += 1.0;
    }
    if let Some(sga) = sga_to_revenue {
        if sga < 30.0 {
            quality += 1.0;
        }
    }

    let mut leverage_reward = 0.0;
    if debt_to_equity < 0.8 {
        leverage_reward += 1.0;
    }

    let mut liquidity_count = 0u8;
    if current_ratio > 1.5 {
        liquidity_count += 1;
    }
    if cash_ratio > 1.0 {
        liquidity_count += 1;
    }
    if let Some(qr) = quick_ratio {
        if qr > 1.0 {
            liquidity_count += 1;
        }
    }
    leverage_reward += match liquidity_count {
        3 => 1.0,
        2 => 0.5,
        1 => 0.25,
        _ => 0.0,
    };

    if let Some(roa) = roa {
        if roa > 10.0 {
            leverage_reward += 1.0;
        }
    }

    // The divisor is 8 even though the checks can only sum to 6. The original
    // shipped with this under-normalization and downstream thresholds were
    // tuned against it, so it stays.
    let x = (quality + leverage_reward) / 8.0;

    // Graham earnings-multiple formula: eps * (8.5 + 2g) * 4.4 / Y.
    let intrinsic_value = match inputs.earnings_per_share {
        Some(eps) => {
            eps * (8.5 + 2.0 * policy.expected_growth_rate) * 4.4 / policy.corporate_bond_yield
        }
        None => 0.0,
    };

    let margin_of_safety = if intrinsic_value > 0.0 {
        Some((intrinsic_value - stock_price) / intrinsic_value)
    } else {
        None
    };

    let normalized = match margin_of_safety {
        None => 0.0,
        Some(mos) if mos >= 0.4 => 1.0,
        Some(mos) if mos <= 0.0 => 0.0,
        Some(mos) => mos / 0.4,
    };

    let rating = match rating_policy {
        RatingPolicy::WeightedHundred => (normalized + x) * 50.0,
        RatingPolicy::HalfHalf => normalized * 0.5 + x * 0.5,
    };

    Ok(ValuationResult {
        intrinsic_value,
        margin_of_safety,
        rating,
        rating_policy,
        gross_profit_margin,
        return_on_equity,
        roic,
        sga_to_revenue,
        debt_to_equity,
        current_ratio,
        cash_ratio,
        quick_ratio,
        roa,
    })
}
