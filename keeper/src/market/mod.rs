pub mod forecast;
pub mod volatility;

pub use forecast::{PriceForecast, SignalInput, load_signal};
pub use volatility::realized_volatility;
