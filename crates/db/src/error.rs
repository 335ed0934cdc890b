//! Translation of database failures into ledger errors.

use sea_orm::{DbErr, RuntimeErr};
use sqlx::error::{DatabaseError, ErrorKind};
use tally_core::LedgerError;

/// Unique constraint on `accounts.code`.
pub const ACCOUNT_CODE_CONSTRAINT: &str = "uq_accounts_code";

/// Unique constraint on `ledger_lines (entry_id, line_no)`.
pub const LEDGER_LINE_CONSTRAINT: &str = "uq_ledger_lines_entry_line";

/// SQLSTATE codes for serialization failure and deadlock.
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// A stored row that cannot be turned back into a domain value.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Line number outside the supported range.
    #[error("line number {0} is out of range")]
    LineNumber(i64),

    /// JSON column did not match the expected shape.
    #[error("invalid {column} payload: {source}")]
    Json {
        /// Column name.
        column: &'static str,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
}

impl From<MappingError> for LedgerError {
    fn from(err: MappingError) -> Self {
        Self::Storage(err.to_string())
    }
}

fn database_error(err: &DbErr) -> Option<&dyn DatabaseError> {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return None,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e.as_database_error(),
        _ => None,
    }
}

/// Name of the unique constraint violated by `err`, if any.
pub fn unique_violation(err: &DbErr) -> Option<String> {
    let db = database_error(err)?;
    if matches!(db.kind(), ErrorKind::UniqueViolation) {
        db.constraint().map(ToString::to_string)
    } else {
        None
    }
}

/// Returns true for serialization failures and deadlocks.
pub fn is_retryable(err: &DbErr) -> bool {
    database_error(err)
        .and_then(|db| db.code())
        .is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code.as_ref()))
}

/// Maps any database failure to a ledger error.
pub fn storage_error(err: DbErr) -> LedgerError {
    if is_retryable(&err) {
        LedgerError::ConcurrentModification
    } else {
        LedgerError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_map_to_storage() {
        let err = storage_error(DbErr::Custom("boom".into()));
        assert!(matches!(err, LedgerError::Storage(msg) if msg.contains("boom")));
    }

    #[test]
    fn test_non_sqlx_errors_have_no_constraint() {
        assert_eq!(unique_violation(&DbErr::RecordNotInserted), None);
        assert!(!is_retryable(&DbErr::Custom("x".into())));
        assert!(!is_retryable(&DbErr::Conn(RuntimeErr::Internal("down".into()))));
    }

    #[test]
    fn test_mapping_error_is_storage() {
        let err: LedgerError = MappingError::LineNumber(-1).into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
