use crate::error::MarketDataError;

/// Realized volatility over the last `window` log returns of `closes`.
///
/// Sample standard deviation (n - 1) of the returns, scaled by `sqrt(window)`.
/// With fewer than two returns available the estimate is `0.0`.
pub fn realized_volatility(closes: &[f64], window: usize) -> Result<f64, MarketDataError> {
    if window == 0 {
        return Err(MarketDataError::EmptyWindow);
    }

    if let Some((index, &value)) = closes
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
        return Err(MarketDataError::InvalidPrice { index, value });
    }

    let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let tail = &returns[returns.len().saturating_sub(window)..];

    if tail.len() < 2 {
        return Ok(0.0);
    }

    let n = tail.len() as f64;
    let mean = tail.iter().sum::<f64>() / n;
    let var = tail.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok(var.sqrt() * (window as f64).sqrt())
}
