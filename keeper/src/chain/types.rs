use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, Bytes, keccak256};
use serde::Serialize;

use crate::error::ConfigError;

/// On-chain pair identifier (`bytes32`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PairId(B256);

impl PairId {
    pub fn new(id: B256) -> Self {
        Self(id)
    }

    /// `keccak256(label)`, e.g. for `"WETH/USDC"`.
    pub fn from_label(label: &str) -> Self {
        Self(keccak256(label.as_bytes()))
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

/// `0x`-prefixed input is read as 32 bytes of hex; anything else is hashed as a label.
impl FromStr for PairId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::Invalid("pair id is empty".into()));
        }

        if s.starts_with("0x") || s.starts_with("0X") {
            return B256::from_str(s).map(Self).map_err(|_| ConfigError::Parse {
                key: "pair_id".into(),
                value: s.to_string(),
            });
        }

        Ok(Self::from_label(s))
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One contract call derived from a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveCall {
    /// `updateCurveParams(pairId, multX, multY, concentration)`; always sent first.
    UpdateCurveParams {
        mult_x: u128,
        mult_y: u128,
        concentration: u128,
    },
    /// `setSpread(pairId, spread)`, spread in parts-per-`FEE_BASE`.
    SetSpread { spread: u128 },
    /// `rebalanceLiquidity(pairId, targetX, targetY)`.
    RebalanceLiquidity { target_x: u128, target_y: u128 },
}

impl CurveCall {
    /// Contract function name.
    pub fn method(&self) -> &'static str {
        match self {
            CurveCall::UpdateCurveParams { .. } => "updateCurveParams",
            CurveCall::SetSpread { .. } => "setSpread",
            CurveCall::RebalanceLiquidity { .. } => "rebalanceLiquidity",
        }
    }
}

/// A call together with its ABI call data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EncodedCall {
    pub call: CurveCall,
    pub data: Bytes,
}
