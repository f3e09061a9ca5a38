use std::future::Future;
use std::time::{Duration, Instant};

/// Awaits `fut`, warning under the `performance` target if it outran `budget`.
pub async fn warn_if_slow<F: Future>(op: &'static str, budget: Duration, fut: F) -> F::Output {
    let started = Instant::now();
    let output = fut.await;
    over_budget(op, budget, started.elapsed());
    output
}

fn over_budget(op: &'static str, budget: Duration, elapsed: Duration) -> bool {
    if elapsed <= budget {
        return false;
    }
    tracing::warn!(
        target: "performance",
        op,
        elapsed_ms = elapsed.as_millis() as u64,
        budget_ms = budget.as_millis() as u64,
        "operation exceeded its time budget"
    );
    true
}
