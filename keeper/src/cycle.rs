//! One keeper update cycle, and the loop that repeats it.
//!
//! Data flow per cycle:
//! snapshot + signal → SignalEngine → plan → encoder → submitter
//!
//! A cycle either submits the complete ordered call sequence for a valid plan
//! or submits nothing. Any failure before submission aborts the cycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::logger::{TraceId, child_span, cycle_span};
use serde::Serialize;
use thiserror::Error;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, field, info, warn};

use crate::chain::encoder::encode_calls;
use crate::chain::reader::SnapshotReader;
use crate::chain::submitter::{CallSubmitter, SubmitError, execute_calls};
use crate::chain::types::{EncodedCall, PairId};
use crate::error::{MarketDataError, SignalError};
use crate::market::forecast::SignalInput;
use crate::metrics::counters::Counters;
use crate::planner::signal::SignalEngine;
use crate::planner::types::{CurveSnapshot, CurveUpdatePlan};

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("snapshot unavailable: {0:#}")]
    Snapshot(anyhow::Error),

    #[error("market signal unusable: {0}")]
    Market(#[from] MarketDataError),

    #[error("plan rejected: {0}")]
    Plan(#[from] SignalError),

    #[error("submission aborted: {0}")]
    Submit(#[from] SubmitError),
}

/// What a cycle decided and, unless dry-run, what it sent.
#[derive(Clone, Debug, Serialize)]
pub struct CycleReport {
    pub trace_id: String,
    pub started_at: DateTime<Utc>,
    pub pair: PairId,
    pub dry_run: bool,

    pub current_price: f64,
    pub predicted_price: f64,
    pub expected_return: f64,
    pub model_rmse: f64,
    pub realized_volatility: f64,

    pub snapshot: CurveSnapshot,
    pub plan: CurveUpdatePlan,
    pub calls: Vec<EncodedCall>,

    /// Empty in dry-run mode.
    pub tx_ids: Vec<String>,
}

pub struct UpdateCycle<R: ?Sized, S: ?Sized> {
    engine: SignalEngine,
    reader: Arc<R>,
    submitter: Arc<S>,
    pair: PairId,
    volatility_window: usize,
    dry_run: bool,
    counters: Counters,
}

impl<R, S> UpdateCycle<R, S>
where
    R: SnapshotReader + ?Sized,
    S: CallSubmitter + ?Sized,
{
    pub fn new(
        engine: SignalEngine,
        reader: Arc<R>,
        submitter: Arc<S>,
        pair: PairId,
        volatility_window: usize,
        dry_run: bool,
        counters: Counters,
    ) -> Self {
        Self {
            engine,
            reader,
            submitter,
            pair,
            volatility_window,
            dry_run,
            counters,
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Run a single cycle against `signal`.
    ///
    /// Invariants:
    /// - nothing is submitted unless a complete plan was built
    /// - calls are submitted sequentially in encoder order
    /// - no retries; the next cycle re-fetches everything
    pub async fn run_once(&self, signal: &SignalInput) -> Result<CycleReport, CycleError> {
        let trace_id = TraceId::new();
        let span = cycle_span("update_cycle", &trace_id);
        span.record("pair_id", field::display(&self.pair));

        Counters::incr(&self.counters.cycles_started);

        let out = self.run_inner(&trace_id, signal).instrument(span).await;

        if let Err(e) = &out {
            Counters::incr(&self.counters.cycles_failed);
            let reason = match e {
                CycleError::Snapshot(_) => &self.counters.snapshot_failures,
                CycleError::Market(_) => &self.counters.signal_failures,
                CycleError::Plan(_) => &self.counters.plans_rejected,
                CycleError::Submit(_) => &self.counters.submit_failures,
            };
            Counters::incr(reason);
        }

        out
    }

    async fn run_inner(
        &self,
        trace_id: &TraceId,
        signal: &SignalInput,
    ) -> Result<CycleReport, CycleError> {
        let started_at = Utc::now();

        let snapshot = self
            .reader
            .fetch_snapshot(&self.pair)
            .await
            .map_err(CycleError::Snapshot)?;

        let current_price = signal.current_price()?;
        let realized_volatility = signal.realized_volatility(self.volatility_window)?;
        let forecast = signal.forecast;

        let plan = self.engine.build_plan(
            &snapshot,
            forecast.predicted_price,
            current_price,
            realized_volatility,
        )?;

        if plan.spread.is_some() {
            Counters::incr(&self.counters.spreads_planned);
        }
        if plan.rebalance.is_some() {
            Counters::incr(&self.counters.rebalances_planned);
        }

        let calls = encode_calls(&self.pair, &plan);

        info!(
            current_price,
            predicted_price = forecast.predicted_price,
            realized_volatility,
            mult_y = %plan.mult_y,
            concentration = %plan.concentration,
            spread = ?plan.spread,
            rebalance = plan.rebalance.is_some(),
            call_count = calls.len(),
            "curve update planned"
        );

        let tx_ids = if self.dry_run {
            info!("dry run; nothing submitted");
            Vec::new()
        } else {
            let ids = execute_calls(&*self.submitter, &self.pair, &calls)
                .instrument(child_span("submit_calls"))
                .await?;
            Counters::add(&self.counters.calls_submitted, ids.len() as u64);
            ids
        };

        Ok(CycleReport {
            trace_id: trace_id.to_string(),
            started_at,
            pair: self.pair,
            dry_run: self.dry_run,
            current_price,
            predicted_price: forecast.predicted_price,
            expected_return: forecast.expected_return,
            model_rmse: forecast.rmse,
            realized_volatility,
            snapshot,
            plan,
            calls,
            tx_ids,
        })
    }

    /// Repeat `run_once` every `every` until `shutdown` resolves.
    ///
    /// `load_signal` is called at the start of each tick so every cycle sees
    /// a fresh forecast. A failed cycle is logged and counted; the loop keeps
    /// running. Missed ticks are skipped rather than bunched.
    pub async fn run_periodic<F, Fut, D>(&self, every: Duration, mut load_signal: F, shutdown: D)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<SignalInput>>,
        D: Future<Output = ()>,
    {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            pair_id = %self.pair,
            every_ms = every.as_millis() as u64,
            dry_run = self.dry_run,
            "keeper loop started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            let signal = match load_signal().await {
                Ok(s) => s,
                Err(e) => {
                    Counters::incr(&self.counters.signal_failures);
                    warn!(error = ?e, "signal unavailable; skipping cycle");
                    continue;
                }
            };

            match self.run_once(&signal).await {
                Ok(report) => info!(
                    trace_id = %report.trace_id,
                    tx_count = report.tx_ids.len(),
                    "cycle complete"
                ),
                Err(e) => error!(error = %e, "cycle aborted; no further calls sent"),
            }

            let c = self.counters.snapshot();
            info!(
                cycles_started = c.cycles_started,
                cycles_failed = c.cycles_failed,
                plans_rejected = c.plans_rejected,
                calls_submitted = c.calls_submitted,
                "keeper counters"
            );
        }

        info!(pair_id = %self.pair, "keeper loop stopped");
    }
}
