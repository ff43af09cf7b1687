use std::fmt;

use porthole_query::{InvalidIdError, QueryFormatError};

#[derive(Debug)]
pub enum DbError {
    /// Could not establish or resolve a database handle. Not retried
    /// automatically; a later call may retry by re-resolving a handle.
    Connection(String),
    /// A supplied id or filter value is not a coercible identifier.
    InvalidId(String),
    /// Query text was malformed or not a top-level JSON object.
    InvalidQuery(String),
    /// The storage engine rejected an otherwise well-formed query.
    QueryFailed(String),
    /// The storage engine accepted the call but did not acknowledge it.
    NotAcknowledged(String),
    /// Any other driver-level fault (network loss, auth failure, ...).
    Driver(mongodb::error::Error),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Connection(msg) => write!(f, "connection failure: {msg}"),
            DbError::InvalidId(id) => write!(f, "invalid identifier: {id}"),
            DbError::InvalidQuery(msg) => write!(f, "invalid query format: {msg}"),
            DbError::QueryFailed(msg) => write!(f, "query execution failed: {msg}"),
            DbError::NotAcknowledged(op) => write!(f, "operation not acknowledged: {op}"),
            DbError::Driver(e) => write!(f, "driver error: {e}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<mongodb::error::Error> for DbError {
    fn from(e: mongodb::error::Error) -> Self {
        DbError::Driver(e)
    }
}

impl From<InvalidIdError> for DbError {
    fn from(e: InvalidIdError) -> Self {
        DbError::InvalidId(e.0)
    }
}

impl From<QueryFormatError> for DbError {
    fn from(e: QueryFormatError) -> Self {
        DbError::InvalidQuery(e.0)
    }
}
