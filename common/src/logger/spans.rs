use tracing::{Span, field};

use super::TraceId;

/// Root span for one keeper update cycle.
///
/// `pair_id` is left empty so the cycle can record it once the pair is resolved.
pub fn cycle_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "cycle",
        name = %name,
        trace_id = %trace_id,
        pair_id = field::Empty
    )
}

/// Child span; inherits the trace id from the enclosing cycle span.
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name)
}
