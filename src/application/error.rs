use thiserror::Error;

/// Faults the ledger store can raise.
///
/// Storage failures and corrupt rows are distinct kinds: a stored
/// category that no longer decodes must surface as corruption, never
/// be reclassified into a default. The store performs no retries and
/// no recovery; every fault propagates once to the caller.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage failure while {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Corrupt ledger data: {detail}")]
    Corrupt { detail: String },
}

impl LedgerError {
    /// Wrap a database error with the operation that failed.
    pub(crate) fn storage(op: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Storage { op, source }
    }
}
