//! Submission seam for encoded curve calls.
//!
//! Signing, nonce handling and broadcasting live behind `CallSubmitter`.
//! This module only guarantees ordering: calls go out one at a time, in
//! encoder order, and the first failure stops the sequence.

use std::time::Duration;

use alloy_primitives::keccak256;
use async_trait::async_trait;
use common::logger::warn_if_slow;
use thiserror::Error;
use tracing::{error, info};

use crate::chain::types::{EncodedCall, PairId};

/// Abstraction over the transaction layer.
///
/// Returns a transaction id for the submitted call.
#[async_trait]
pub trait CallSubmitter: Send + Sync {
    async fn submit(&self, pair: &PairId, call: &EncodedCall) -> anyhow::Result<String>;
}

#[derive(Error, Debug)]
#[error("{method} (call {index}) failed after {} submitted: {source}", .submitted.len())]
pub struct SubmitError {
    /// Position of the failing call in the submitted sequence.
    pub index: usize,
    pub method: &'static str,
    /// Transaction ids of the calls that went out before the failure.
    pub submitted: Vec<String>,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

const SLOW_SUBMIT: Duration = Duration::from_secs(5);

/// Submit `calls` strictly in order, stopping at the first failure.
pub async fn execute_calls<S: CallSubmitter + ?Sized>(
    submitter: &S,
    pair: &PairId,
    calls: &[EncodedCall],
) -> Result<Vec<String>, SubmitError> {
    let mut tx_ids = Vec::with_capacity(calls.len());

    for (index, call) in calls.iter().enumerate() {
        let method = call.call.method();

        match warn_if_slow(method, SLOW_SUBMIT, submitter.submit(pair, call)).await {
            Ok(tx_id) => {
                info!(%pair, method, %tx_id, "call submitted");
                tx_ids.push(tx_id);
            }
            Err(e) => {
                error!(%pair, method, index, error = ?e, "call submission failed; remaining calls dropped");
                return Err(SubmitError {
                    index,
                    method,
                    submitted: tx_ids,
                    source: e.into(),
                });
            }
        }
    }

    Ok(tx_ids)
}

/// Writes each call to the log instead of broadcasting it.
///
/// The returned id is the keccak hash of the call data, so identical calls
/// map to identical ids.
#[derive(Clone, Debug, Default)]
pub struct LogSubmitter;

#[async_trait]
impl CallSubmitter for LogSubmitter {
    async fn submit(&self, pair: &PairId, call: &EncodedCall) -> anyhow::Result<String> {
        info!(
            %pair,
            method = call.call.method(),
            data = %call.data,
            "call recorded (not broadcast)"
        );
        Ok(keccak256(&call.data).to_string())
    }
}
