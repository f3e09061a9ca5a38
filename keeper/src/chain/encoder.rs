use alloy_primitives::U256;
use alloy_sol_types::{SolCall, sol};
use tracing::debug;

use crate::chain::types::{CurveCall, EncodedCall, PairId};
use crate::planner::types::CurveUpdatePlan;

sol! {
    function updateCurveParams(bytes32 pairId, uint256 newMultX, uint256 newMultY, uint256 newConcentration);
    function setSpread(bytes32 pairId, uint256 newSpread);
    function rebalanceLiquidity(bytes32 pairId, uint256 newTargetX, uint256 newTargetY);
}

/// Calls needed to apply `plan`, in the order they must land on chain:
/// curve parameters, then spread (if any), then rebalance (if any).
///
/// Contract state changes are sequential and not replay-safe, so callers
/// must submit in exactly this order.
pub fn plan_calls(plan: &CurveUpdatePlan) -> Vec<CurveCall> {
    let mut calls = Vec::with_capacity(3);

    calls.push(CurveCall::UpdateCurveParams {
        mult_x: plan.mult_x,
        mult_y: plan.mult_y,
        concentration: plan.concentration,
    });

    if let Some(spread) = plan.spread {
        calls.push(CurveCall::SetSpread { spread });
    }

    if let Some(r) = plan.rebalance {
        calls.push(CurveCall::RebalanceLiquidity {
            target_x: r.target_x,
            target_y: r.target_y,
        });
    }

    calls
}

/// `plan_calls` plus ABI call data for each call.
pub fn encode_calls(pair: &PairId, plan: &CurveUpdatePlan) -> Vec<EncodedCall> {
    let encoded: Vec<EncodedCall> = plan_calls(plan)
        .into_iter()
        .map(|call| EncodedCall {
            data: abi_encode(pair, &call).into(),
            call,
        })
        .collect();

    debug!(
        pair_id = %pair,
        call_count = encoded.len(),
        "plan encoded"
    );

    encoded
}

fn abi_encode(pair: &PairId, call: &CurveCall) -> Vec<u8> {
    let pair_id = pair.as_b256();

    match *call {
        CurveCall::UpdateCurveParams {
            mult_x,
            mult_y,
            concentration,
        } => updateCurveParamsCall {
            pairId: pair_id,
            newMultX: U256::from(mult_x),
            newMultY: U256::from(mult_y),
            newConcentration: U256::from(concentration),
        }
        .abi_encode(),
        CurveCall::SetSpread { spread } => setSpreadCall {
            pairId: pair_id,
            newSpread: U256::from(spread),
        }
        .abi_encode(),
        CurveCall::RebalanceLiquidity { target_x, target_y } => rebalanceLiquidityCall {
            pairId: pair_id,
            newTargetX: U256::from(target_x),
            newTargetY: U256::from(target_y),
        }
        .abi_encode(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::types::Rebalance;
    use alloy_primitives::keccak256;

    fn plan(spread: Option<u128>, rebalance: Option<Rebalance>) -> CurveUpdatePlan {
        CurveUpdatePlan {
            mult_x: 1,
            mult_y: 2,
            concentration: 3,
            spread,
            rebalance,
        }
    }

    fn selector(signature: &str) -> [u8; 4] {
        let h = keccak256(signature.as_bytes());
        [h[0], h[1], h[2], h[3]]
    }

    /// Low 16 bytes of the 32-byte ABI word at `index` (after the selector).
    fn word_u128(data: &[u8], index: usize) -> u128 {
        let start = 4 + index * 32;
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&data[start + 16..start + 32]);
        assert!(data[start..start + 16].iter().all(|&b| b == 0));
        u128::from_be_bytes(buf)
    }

    #[test]
    fn minimal_plan_yields_single_update() {
        let calls = plan_calls(&plan(None, None));
        assert_eq!(
            calls,
            vec![CurveCall::UpdateCurveParams {
                mult_x: 1,
                mult_y: 2,
                concentration: 3
            }]
        );
    }

    #[test]
    fn full_plan_keeps_update_spread_rebalance_order() {
        let calls = plan_calls(&plan(
            Some(500),
            Some(Rebalance {
                target_x: 10,
                target_y: 20,
            }),
        ));

        let methods: Vec<_> = calls.iter().map(|c| c.method()).collect();
        assert_eq!(
            methods,
            vec!["updateCurveParams", "setSpread", "rebalanceLiquidity"]
        );
    }

    #[test]
    fn rebalance_without_spread_skips_set_spread() {
        let calls = plan_calls(&plan(
            None,
            Some(Rebalance {
                target_x: 10,
                target_y: 20,
            }),
        ));

        let methods: Vec<_> = calls.iter().map(|c| c.method()).collect();
        assert_eq!(methods, vec!["updateCurveParams", "rebalanceLiquidity"]);
    }

    #[test]
    fn selectors_match_contract_signatures() {
        assert_eq!(
            updateCurveParamsCall::SELECTOR,
            selector("updateCurveParams(bytes32,uint256,uint256,uint256)")
        );
        assert_eq!(
            setSpreadCall::SELECTOR,
            selector("setSpread(bytes32,uint256)")
        );
        assert_eq!(
            rebalanceLiquidityCall::SELECTOR,
            selector("rebalanceLiquidity(bytes32,uint256,uint256)")
        );
    }

    #[test]
    fn call_data_carries_pair_and_values() {
        let pair = PairId::from_label("WETH/USDC");
        let big = 100 * 1_000_000_000_000_000_000u128;

        let encoded = encode_calls(
            &pair,
            &plan(
                Some(1_500),
                Some(Rebalance {
                    target_x: big,
                    target_y: 142_800_000_000,
                }),
            ),
        );
        assert_eq!(encoded.len(), 3);

        let update = &encoded[0].data;
        assert_eq!(update.len(), 4 + 4 * 32);
        assert_eq!(update[..4], selector("updateCurveParams(bytes32,uint256,uint256,uint256)"));
        assert_eq!(&update[4..36], pair.as_b256().as_slice());
        assert_eq!(word_u128(update, 1), 1);
        assert_eq!(word_u128(update, 2), 2);
        assert_eq!(word_u128(update, 3), 3);

        let spread = &encoded[1].data;
        assert_eq!(spread.len(), 4 + 2 * 32);
        assert_eq!(word_u128(spread, 1), 1_500);

        let rebalance = &encoded[2].data;
        assert_eq!(rebalance.len(), 4 + 3 * 32);
        assert_eq!(word_u128(rebalance, 1), big);
        assert_eq!(word_u128(rebalance, 2), 142_800_000_000);
    }
}
