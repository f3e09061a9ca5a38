use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::MarketDataError;
use crate::market::volatility::realized_volatility;

/// Output of the external price model. Treated as an opaque oracle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceForecast {
    /// Predicted next close.
    pub predicted_price: f64,
    /// `(predicted - current) / current` as reported by the model.
    pub expected_return: f64,
    /// Validation RMSE of the model that produced this forecast.
    pub rmse: f64,
}

/// Everything the keeper needs from the market side for one cycle:
/// the forecast plus the recent close series it was made from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalInput {
    pub forecast: PriceForecast,
    /// Oldest first.
    pub closes: Vec<f64>,
}

impl SignalInput {
    /// Latest observed close.
    pub fn current_price(&self) -> Result<f64, MarketDataError> {
        self.closes.last().copied().ok_or(MarketDataError::EmptySeries)
    }

    pub fn realized_volatility(&self, window: usize) -> Result<f64, MarketDataError> {
        realized_volatility(&self.closes, window)
    }
}

/// Read a `SignalInput` JSON file written by the forecasting job.
pub async fn load_signal(path: &Path) -> anyhow::Result<SignalInput> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read signal file {}", path.display()))?;

    serde_json::from_str(&raw).with_context(|| format!("malformed signal file {}", path.display()))
}
