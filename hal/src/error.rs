//! Common error types for HAL operations

use core::fmt;

/// HAL operation errors
///
/// Every fallible driver operation returns one of these on failure. The
/// success case is `Ok`, so together they form the five-way status taxonomy
/// that [`Status`] exposes as a flat enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Unclassified failure reported by the vendor layer
    Error,
    /// Peripheral refused the request because it is still working
    Busy,
    /// The caller's time budget ran out before the hardware was ready
    Timeout,
    /// Identifier out of range or malformed configuration, detected before
    /// any hardware access
    InvalidParam,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "hardware error"),
            Self::Busy => write!(f, "peripheral busy"),
            Self::Timeout => write!(f, "operation timeout"),
            Self::InvalidParam => write!(f, "invalid parameter"),
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for HalError {}

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

/// Flat status code, the C-style view of a [`HalResult<()>`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Operation completed as requested
    Ok = 0,
    /// See [`HalError::Error`]
    Error = 1,
    /// See [`HalError::Busy`]
    Busy = 2,
    /// See [`HalError::Timeout`]
    Timeout = 3,
    /// See [`HalError::InvalidParam`]
    InvalidParam = 4,
}

impl Status {
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Converts back into a `Result`, so `?` can be used on a status code.
    pub const fn into_result(self) -> HalResult<()> {
        match self {
            Status::Ok => Ok(()),
            Status::Error => Err(HalError::Error),
            Status::Busy => Err(HalError::Busy),
            Status::Timeout => Err(HalError::Timeout),
            Status::InvalidParam => Err(HalError::InvalidParam),
        }
    }
}

impl From<HalError> for Status {
    fn from(err: HalError) -> Self {
        match err {
            HalError::Error => Status::Error,
            HalError::Busy => Status::Busy,
            HalError::Timeout => Status::Timeout,
            HalError::InvalidParam => Status::InvalidParam,
        }
    }
}

impl<T> From<HalResult<T>> for Status {
    fn from(result: HalResult<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(err) => err.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.into_result() {
            Ok(()) => write!(f, "ok"),
            Err(err) => fmt::Display::fmt(&err, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_result() {
        for status in [
            Status::Ok,
            Status::Error,
            Status::Busy,
            Status::Timeout,
            Status::InvalidParam,
        ] {
            assert_eq!(Status::from(status.into_result()), status);
        }
    }

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(Status::Ok as u8, 0);
        assert_eq!(Status::InvalidParam as u8, 4);
        assert!(Status::Ok.is_ok());
        assert!(!Status::Timeout.is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(std::format!("{}", HalError::Timeout), "operation timeout");
        assert_eq!(std::format!("{}", Status::Ok), "ok");
    }
}
