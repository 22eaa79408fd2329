//! Error type shared by the panel driver, the framebuffer packer and the touch reader

pub use display_interface::DisplayError;

/// Errors surfaced by every driver operation.
///
/// Nothing in the driver retries: the first failure aborts the running
/// command sequence and is returned unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Operation attempted before `init`, or `init` while already initialised
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Caller contract violation (line ids, buffer sizes, dimensions)
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The bus transport reported a failure
    #[error("bus error: {0:?}")]
    Bus(DisplayError),

    /// The busy line stayed high past the configured timeout
    #[error("timed out waiting for the busy line")]
    Timeout,

    /// The touch controller's I2C transfer failed
    #[error("i2c error: {0:?}")]
    I2c(embedded_hal::i2c::ErrorKind),
}

impl From<DisplayError> for Error {
    fn from(err: DisplayError) -> Self {
        Error::Bus(err)
    }
}

/// Result alias used across the crate
pub type Result<T, E = Error> = core::result::Result<T, E>;
