use thiserror::Error;

/// The only failure the signal engine can report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to parse {key}={value:?}")]
    Parse { key: String, value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("close price at index {index} is not a positive finite number: {value}")]
    InvalidPrice { index: usize, value: f64 },

    #[error("volatility window must be at least one return")]
    EmptyWindow,

    #[error("close series is empty")]
    EmptySeries,
}
