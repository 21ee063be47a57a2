use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation Error: {0}")]
    Validation(String),
    #[error("Ledger Error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Division by zero")]
    DivideByZero,
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Payment Error: {0}")]
    Payment(String),
    #[error("Store Error: {0}")]
    Store(String),
    #[error("Encoding Error: {0}")]
    Encoding(String),
    #[error(transparent)]
    Ed(#[from] ed::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures of a ledger mutation which was well-formed but can not be applied
/// to the current state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Candidate does not exist")]
    UnknownCandidate,
    #[error("Public key is already registered by another owner")]
    DuplicatePubKey,
    #[error("Delegator has no bond with this candidate")]
    NoSuchBond,
    #[error("Insufficient bond tokens")]
    InsufficientBondTokens,
    #[error("Sender is not the candidate owner")]
    NotOwner,
}

/// A result type bound to the standard error type.
pub type Result<T> = std::result::Result<T, Error>;
