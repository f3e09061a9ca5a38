use std::str::FromStr;

use crate::error::ConfigError;
use crate::planner::types::SignalConfig;

pub const ENV_PRICE_TOLERANCE: &str = "KEEPER_PRICE_TOLERANCE";
pub const ENV_VOLATILITY_THRESHOLD: &str = "KEEPER_VOLATILITY_THRESHOLD";
pub const ENV_WIDEN_FACTOR: &str = "KEEPER_WIDEN_FACTOR";
pub const ENV_SPREAD_STEP: &str = "KEEPER_SPREAD_STEP";
pub const ENV_CONCENTRATION_MIN: &str = "KEEPER_CONCENTRATION_MIN";
pub const ENV_CONCENTRATION_MAX: &str = "KEEPER_CONCENTRATION_MAX";
pub const ENV_VOLATILITY_WINDOW: &str = "KEEPER_VOLATILITY_WINDOW";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    // =========================
    // Signal engine
    // =========================
    /// Thresholds and bounds for the signal engine.
    ///
    /// One engine is built from this per process. Every field falls back to
    /// `SignalConfig::default()` when its variable is unset.
    pub signal: SignalConfig,

    // =========================
    // Market inputs
    // =========================
    /// Number of trailing log returns used for realized volatility.
    ///
    /// With hourly closes the default of 24 covers one day and the estimate
    /// is scaled to that horizon.
    pub volatility_window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            signal: SignalConfig::default(),
            volatility_window: 24,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let d = &defaults.signal;

        let signal = SignalConfig {
            price_tolerance: parse_or(&lookup, ENV_PRICE_TOLERANCE, d.price_tolerance)?,
            volatility_threshold: parse_or(&lookup, ENV_VOLATILITY_THRESHOLD, d.volatility_threshold)?,
            concentration_widen_factor: parse_or(&lookup, ENV_WIDEN_FACTOR, d.concentration_widen_factor)?,
            spread_step: parse_or(&lookup, ENV_SPREAD_STEP, d.spread_step)?,
            concentration_bounds: (
                parse_or(&lookup, ENV_CONCENTRATION_MIN, d.concentration_bounds.0)?,
                parse_or(&lookup, ENV_CONCENTRATION_MAX, d.concentration_bounds.1)?,
            ),
        };
        signal.validate()?;

        let volatility_window = parse_or(&lookup, ENV_VOLATILITY_WINDOW, defaults.volatility_window)?;
        if volatility_window == 0 {
            return Err(ConfigError::Invalid(format!(
                "{ENV_VOLATILITY_WINDOW} must be at least 1"
            )));
        }

        Ok(Self {
            signal,
            volatility_window,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Parse {
            key: key.to_string(),
            value: raw,
        }),
    }
}
