mod init;
mod perf;
mod spans;
mod trace_id;

pub use init::init_logger;
pub use perf::warn_if_slow;
pub use spans::{child_span, cycle_span};
pub use trace_id::TraceId;
