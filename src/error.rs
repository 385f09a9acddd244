use sled::transaction::TransactionError;

use crate::sequence::Purpose;

#[derive(thiserror::Error, Debug)]
pub enum SequenceError {
    #[error("A {purpose} sequence already exists for party \"{party_id}\"")]
    DuplicateSequence { party_id: String, purpose: Purpose },
    #[error("{reason}")]
    NumberGenerationFailed { reason: String },
    #[error("Timed out waiting for the {purpose} sequence lock of party \"{party_id}\"")]
    LockTimeout { party_id: String, purpose: Purpose },
    #[error("Sequence prefix must not be blank")]
    InvalidPrefix,
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Permission group \"{0}\" is already registered")]
    DuplicateGroup(String),
    #[error("Invalid permission group key \"{0}\"")]
    InvalidKey(String),
    #[error("Invalid permission name \"{member}\" in group \"{key}\"")]
    InvalidMember { key: String, member: String },
    #[error("Permission name \"{member}\" is listed twice in group \"{key}\"")]
    DuplicateMember { key: String, member: String },
}

#[derive(thiserror::Error, Debug)]
pub enum AuthorizationError {
    #[error("Role \"{0}\" already exists")]
    DuplicateRole(String),
    #[error("Permission \"{0}\" already exists")]
    DuplicatePermission(String),
    #[error("Unknown role \"{0}\"")]
    UnknownRole(String),
    #[error("Unknown permission \"{0}\"")]
    UnknownPermission(String),
    #[error("\"{assignee}\" is not assigned to \"{target}\"")]
    NotAssigned { assignee: String, target: String },
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Rejected key component for a composite storage key.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Key component must not be empty")]
    Empty,
    #[error("Key component \"{0}\" contains a NUL byte")]
    ContainsNul(String),
}

impl From<TransactionError<SequenceError>> for SequenceError {
    fn from(value: TransactionError<SequenceError>) -> Self {
        match value {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => SequenceError::Storage(err),
        }
    }
}

impl From<TransactionError<AuthorizationError>> for AuthorizationError {
    fn from(value: TransactionError<AuthorizationError>) -> Self {
        match value {
            TransactionError::Abort(err) => err,
            TransactionError::Storage(err) => AuthorizationError::Storage(err),
        }
    }
}
