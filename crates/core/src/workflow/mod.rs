//! Journal entry workflow.
//!
//! This module implements the entry lifecycle state machine and
//! reversal entry creation.
//!
//! # Modules
//!
//! - `service` - State transition guards and transitions
//! - `reversal` - Reversing entry creation

pub mod reversal;
pub mod service;

#[cfg(test)]
mod reversal_props;

pub use reversal::{REVERSAL_REFERENCE_PREFIX, ReversalService};
pub use service::WorkflowService;
