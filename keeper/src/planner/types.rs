use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Denominator for `spread`: a spread of `FEE_BASE` is 100%.
/// Shared with the call encoder, which transmits spread in the same unit.
pub const FEE_BASE: u128 = 1_000_000;

/// Last-known on-chain configuration of one trading pair.
///
/// Multipliers are 18-decimal fixed point. Targets are in each token's
/// smallest unit. The engine trusts these values (non-negative by type,
/// `spread <= FEE_BASE` checked by the reader) and never re-validates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    /// Curvature / liquidity-concentration parameter (unitless).
    pub concentration: u128,
    pub mult_x: u128,
    pub mult_y: u128,
    /// Fee spread in parts-per-`FEE_BASE`.
    pub spread: u128,
    pub target_x: u128,
    pub target_y: u128,
}

/// New reserve targets. Both sides always travel together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebalance {
    pub target_x: u128,
    pub target_y: u128,
}

/// Sparse set of parameter updates derived from one snapshot.
///
/// `mult_x`, `mult_y` and `concentration` are always transmitted, even when
/// equal to the snapshot. `spread` and `rebalance` are present only when they
/// must change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveUpdatePlan {
    pub mult_x: u128,
    pub mult_y: u128,
    pub concentration: u128,
    pub spread: Option<u128>,
    pub rebalance: Option<Rebalance>,
}

impl CurveUpdatePlan {
    pub fn target_x(&self) -> Option<u128> {
        self.rebalance.map(|r| r.target_x)
    }

    pub fn target_y(&self) -> Option<u128> {
        self.rebalance.map(|r| r.target_y)
    }
}

/// Tuning for a single `SignalEngine`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Minimum fractional price deviation that moves `mult_y` and targets.
    pub price_tolerance: f64,

    /// Realized volatility above which the curve is widened and spread raised.
    pub volatility_threshold: f64,

    /// Multiplier applied to `concentration` under high volatility
    /// (lower concentration = wider curve).
    pub concentration_widen_factor: f64,

    /// Added to `spread` under high volatility, capped at `FEE_BASE`.
    pub spread_step: u128,

    /// Inclusive `(lower, upper)` clamp applied to `concentration` on every plan.
    pub concentration_bounds: (u128, u128),
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            price_tolerance: 0.001,
            volatility_threshold: 0.02,
            concentration_widen_factor: 0.5,
            spread_step: 500,
            concentration_bounds: (1_000_000, 200_000_000),
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let floats = [
            ("price_tolerance", self.price_tolerance),
            ("volatility_threshold", self.volatility_threshold),
            ("concentration_widen_factor", self.concentration_widen_factor),
        ];

        for (name, v) in floats {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite non-negative number, got {v}"
                )));
            }
        }

        let (lower, upper) = self.concentration_bounds;
        if lower > upper {
            return Err(ConfigError::Invalid(format!(
                "concentration bounds are inverted: lower {lower} > upper {upper}"
            )));
        }

        Ok(())
    }
}
