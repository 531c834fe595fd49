//! Error types for the Helvetia SQL layer

use thiserror::Error;

/// MySQL server error numbers the seeding tools care about.
pub mod codes {
    pub const DUPLICATE_ENTRY: u16 = 1062;
    pub const LOCK_WAIT_TIMEOUT: u16 = 1205;
    pub const DEADLOCK: u16 = 1213;
    pub const TOO_MANY_CONCURRENT_TRX: u16 = 1637;
    pub const SERVER_GONE: u16 = 2006;
    pub const SERVER_LOST: u16 = 2013;
}

/// Coarse classification used by retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lock or transaction conflict; safe to retry after a pause
    Transient,
    /// Uniqueness or other constraint violation
    Constraint,
    /// Session could not be established or was lost
    Connection,
    /// Anything else
    Other,
}

/// Errors that can occur when talking to the store
#[derive(Error, Debug)]
pub enum SqlError {
    /// Error reported by the server
    #[error("Database error {}: {message}", .number.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string()))]
    Database {
        number: Option<u16>,
        message: String,
    },

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement text could not be understood (embedded mode)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Column value could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Statement referenced a table that does not exist (embedded mode)
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Transport error from the MySQL driver
    #[error("Driver error: {0}")]
    Driver(#[from] sqlx::Error),
}

impl SqlError {
    /// Build a server error carrying a MySQL error number
    pub fn server(number: u16, message: impl Into<String>) -> Self {
        SqlError::Database {
            number: Some(number),
            message: message.into(),
        }
    }

    /// Server error number, when one is known
    pub fn number(&self) -> Option<u16> {
        match self {
            SqlError::Database { number, .. } => *number,
            SqlError::Driver(sqlx::Error::Database(db)) => db
                .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                .map(|e| e.number()),
            _ => None,
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqlError::Connection(_) => return ErrorKind::Connection,
            SqlError::Driver(sqlx::Error::Io(_))
            | SqlError::Driver(sqlx::Error::PoolTimedOut)
            | SqlError::Driver(sqlx::Error::PoolClosed)
            | SqlError::Driver(sqlx::Error::Tls(_)) => return ErrorKind::Connection,
            _ => {}
        }

        match self.number() {
            Some(codes::LOCK_WAIT_TIMEOUT)
            | Some(codes::DEADLOCK)
            | Some(codes::TOO_MANY_CONCURRENT_TRX) => ErrorKind::Transient,
            Some(codes::DUPLICATE_ENTRY) => ErrorKind::Constraint,
            Some(codes::SERVER_GONE) | Some(codes::SERVER_LOST) => ErrorKind::Connection,
            _ => ErrorKind::Other,
        }
    }

    /// Whether a retry after backoff may succeed
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

pub type SqlResult<T> = Result<T, SqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_by_number() {
        assert_eq!(SqlError::server(1213, "deadlock").kind(), ErrorKind::Transient);
        assert_eq!(SqlError::server(1205, "lock wait").kind(), ErrorKind::Transient);
        assert_eq!(SqlError::server(1062, "dup").kind(), ErrorKind::Constraint);
        assert_eq!(SqlError::server(2013, "lost").kind(), ErrorKind::Connection);
        assert_eq!(SqlError::server(1146, "no such table").kind(), ErrorKind::Other);
    }

    #[test]
    fn test_message_text_does_not_make_transient() {
        let err = SqlError::Database {
            number: None,
            message: "row in use by another transaction".to_string(),
        };
        assert!(!err.is_transient());
        assert_eq!(SqlError::Connection("refused".into()).kind(), ErrorKind::Connection);
    }
}
