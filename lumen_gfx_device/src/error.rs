//! Error types for the Lumen graphics device
//!
//! Only construction and explicit resource creation report errors. Steady
//! state per-frame operations never fail with an `Error`: they return a
//! boolean or skip the work and log a diagnostic.

use std::fmt;

/// Result type for device operations
pub type Result<T> = std::result::Result<T, Error>;

/// Graphics device errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// No compatible native context could be obtained (fatal)
    InitializationFailed(String),

    /// The native context is lost; GPU objects cannot be created until it is restored
    ContextLost,

    /// A native object could not be created
    BackendError(String),

    /// A resource is unusable (wrong device, destroyed, missing data)
    InvalidResource(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ContextLost => write!(f, "Graphics context lost"),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and return `Err(Error::BackendError(..))` from the enclosing function
#[macro_export]
macro_rules! gfx_bail {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::gfx_error!($source, "{}", message);
        return Err($crate::lumen::Error::BackendError(message));
    }};
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
