//! Reconciliation of ledger lines against external statements.

pub mod matcher;
pub mod types;

pub use matcher::{DEFAULT_TOLERANCE_DAYS, Matcher};
pub use types::{
    ExternalLine, MatchOutcome, MatchedPair, ReconcileInput, Reconciliation, UnmatchedExternal,
};
