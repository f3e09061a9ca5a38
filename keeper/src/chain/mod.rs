//! Boundary with the AMM contract.
//!
//! Reading the live curve and broadcasting transactions are external
//! concerns; this module fixes the contracts those collaborators must
//! honour and encodes plans into the exact contract calls they carry.

pub mod encoder;
pub mod reader;
pub mod submitter;
pub mod types;

pub use encoder::{encode_calls, plan_calls};
pub use reader::{JsonSnapshotReader, SnapshotReader};
pub use submitter::{CallSubmitter, LogSubmitter, SubmitError, execute_calls};
pub use types::{CurveCall, EncodedCall, PairId};
