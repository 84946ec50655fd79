use thiserror::Error;

/// Errors raised by clock operations
///
/// All of these are sequencing errors in the caller; none are worth retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Clock is not initialized")]
    UninitializedClock,

    #[error("Operation '{operation}' requires simulation mode")]
    InvalidModeOperation { operation: &'static str },

    #[error("Clock has been shut down")]
    ShutDown,
}

pub type ClockResult<T> = std::result::Result<T, ClockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClockError::UninitializedClock.to_string(),
            "Clock is not initialized"
        );
        assert_eq!(
            ClockError::InvalidModeOperation { operation: "advance" }.to_string(),
            "Operation 'advance' requires simulation mode"
        );
    }
}
