//! Chart of accounts.
//!
//! - Account types and their normal balance side
//! - Registry validation rules
//! - Hierarchy navigation and roll-up

pub mod registry;
pub mod tree;
pub mod types;

pub use registry::AccountRegistry;
pub use tree::AccountTree;
pub use types::{Account, AccountType, CreateAccountInput, resolve_normal_side};
