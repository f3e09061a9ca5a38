pub mod signal;
pub mod types;

pub use signal::SignalEngine;
pub use types::{CurveSnapshot, CurveUpdatePlan, FEE_BASE, Rebalance, SignalConfig};
