use tracing::{Span, debug, field, instrument};

use crate::error::SignalError;
use crate::planner::types::{CurveSnapshot, CurveUpdatePlan, FEE_BASE, Rebalance, SignalConfig};

/// Turns a price forecast and realized volatility into a curve update plan.
///
/// Holds only its configuration, so one engine can serve many pairs and
/// threads. Each call is a pure function of its arguments.
#[derive(Clone, Debug, Default)]
pub struct SignalEngine {
    config: SignalConfig,
}

impl SignalEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Derive the parameter update for `snapshot`.
    ///
    /// Two independent triggers:
    /// - price deviation above `price_tolerance` rescales `mult_y` and `target_y`
    /// - volatility above `volatility_threshold` widens `concentration` and raises `spread`
    ///
    /// Both comparisons are strict. `concentration` is clamped into bounds on
    /// every path. Fails when a price is non-positive, an input is not finite, or a
    /// scaled value would not fit in a `u128`.
    #[instrument(
        target = "planner",
        skip(self, snapshot),
        fields(price_ratio = field::Empty, deviation = field::Empty)
    )]
    pub fn build_plan(
        &self,
        snapshot: &CurveSnapshot,
        predicted_price: f64,
        current_price: f64,
        realized_volatility: f64,
    ) -> Result<CurveUpdatePlan, SignalError> {
        check_inputs(predicted_price, current_price, realized_volatility)?;

        let cfg = &self.config;

        let price_ratio = predicted_price / current_price;
        let deviation = (price_ratio - 1.0).abs();
        let price_moved = deviation > cfg.price_tolerance;

        let span = Span::current();
        span.record("price_ratio", price_ratio);
        span.record("deviation", deviation);

        // mult_x is never touched by this engine.
        let mult_x = snapshot.mult_x;

        let mult_y = if price_moved {
            let scaled = scale("mult_y", snapshot.mult_y, price_ratio)?.max(1);
            debug!(old = %snapshot.mult_y, new = %scaled, "price deviation above tolerance; rescaling mult_y");
            scaled
        } else {
            snapshot.mult_y
        };

        let (lower, upper) = cfg.concentration_bounds;

        let (concentration, spread) = if realized_volatility > cfg.volatility_threshold {
            let widened = scale("concentration", snapshot.concentration, cfg.concentration_widen_factor)?;
            let concentration = clamp(widened, lower, upper);
            let spread = snapshot.spread.saturating_add(cfg.spread_step).min(FEE_BASE);

            debug!(
                realized_volatility,
                threshold = cfg.volatility_threshold,
                widened = %widened,
                concentration = %concentration,
                spread = %spread,
                "high volatility; widening curve"
            );

            (concentration, Some(spread))
        } else {
            (clamp(snapshot.concentration, lower, upper), None)
        };

        let mut target_y = snapshot.target_y;
        if price_moved && snapshot.target_y > 0 {
            target_y = scale("target_y", snapshot.target_y, price_ratio)?;
        }
        let target_x = snapshot.target_x;

        let rebalance = (target_x != snapshot.target_x || target_y != snapshot.target_y).then(|| {
            debug!(target_x = %target_x, target_y = %target_y, "rebalance targets moved");
            Rebalance { target_x, target_y }
        });

        Ok(CurveUpdatePlan {
            mult_x,
            mult_y,
            concentration,
            spread,
            rebalance,
        })
    }
}

fn check_inputs(
    predicted_price: f64,
    current_price: f64,
    realized_volatility: f64,
) -> Result<(), SignalError> {
    let inputs = [
        ("predicted_price", predicted_price),
        ("current_price", current_price),
        ("realized_volatility", realized_volatility),
    ];

    for (name, v) in inputs {
        if !v.is_finite() {
            return Err(SignalError::InvalidInput(format!("{name} must be finite, got {v}")));
        }
    }

    if current_price <= 0.0 {
        return Err(SignalError::InvalidInput(format!(
            "current_price must be positive, got {current_price}"
        )));
    }

    Ok(())
}

/// `value * factor` in f64, truncated toward zero. Negative products become 0.
///
/// Products of 2^128 or more have no `u128` representation and are rejected
/// instead of saturating.
fn scale(field: &'static str, value: u128, factor: f64) -> Result<u128, SignalError> {
    let product = value as f64 * factor;
    // u128::MAX rounds up to exactly 2^128 as f64
    if product >= u128::MAX as f64 {
        return Err(SignalError::InvalidInput(format!(
            "{field} {value} scaled by {factor} overflows u128"
        )));
    }
    Ok(product as u128)
}

/// Does not panic on inverted bounds, unlike `Ord::clamp`; the lower bound wins.
fn clamp(value: u128, lower: u128, upper: u128) -> u128 {
    value.min(upper).max(lower)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_snapshot() -> impl Strategy<Value = CurveSnapshot> {
        (
            0..=1_000_000_000u128,
            0..=10u128.pow(24),
            0..=10u128.pow(24),
            0..=FEE_BASE,
            0..=10u128.pow(24),
            0..=10u128.pow(24),
        )
            .prop_map(
                |(concentration, mult_x, mult_y, spread, target_x, target_y)| CurveSnapshot {
                    concentration,
                    mult_x,
                    mult_y,
                    spread,
                    target_x,
                    target_y,
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]
        #[test]
        fn plan_invariants_hold(
            snap in arb_snapshot(),
            current in 0.0001..100_000.0f64,
            predicted in 0.0..200_000.0f64,
            vol in 0.0..1.0f64,
        ) {
            let engine = SignalEngine::default();
            let (lower, upper) = engine.config().concentration_bounds;

            let plan = engine.build_plan(&snap, predicted, current, vol).unwrap();

            // mult_x always passes through
            prop_assert_eq!(plan.mult_x, snap.mult_x);

            // concentration always inside bounds
            prop_assert!(plan.concentration >= lower && plan.concentration <= upper);

            // spread only under high volatility, never above FEE_BASE
            match plan.spread {
                Some(s) => {
                    prop_assert!(vol > engine.config().volatility_threshold);
                    prop_assert!(s <= FEE_BASE);
                }
                None => prop_assert!(vol <= engine.config().volatility_threshold),
            }

            // a rescaled multiplier is never zero
            let deviation = (predicted / current - 1.0).abs();
            if deviation > engine.config().price_tolerance {
                prop_assert!(plan.mult_y >= 1);
            } else {
                prop_assert_eq!(plan.mult_y, snap.mult_y);
                prop_assert!(plan.rebalance.is_none());
            }

            // rebalance only when a target actually differs; target_x is carried
            if let Some(r) = plan.rebalance {
                prop_assert_eq!(r.target_x, snap.target_x);
                prop_assert_ne!(r.target_y, snap.target_y);
            }
            prop_assert_eq!(plan.target_x().is_some(), plan.target_y().is_some());
        }

        #[test]
        fn non_positive_price_always_rejected(
            snap in arb_snapshot(),
            current in -100_000.0..=0.0f64,
            predicted in 0.0..200_000.0f64,
        ) {
            let err = SignalEngine::default().build_plan(&snap, predicted, current, 0.0);
            prop_assert!(matches!(err, Err(SignalError::InvalidInput(_))));
        }
    }
}
