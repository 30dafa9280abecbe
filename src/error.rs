use thiserror::Error;

/// Errors surfaced at the host-facing entry-point boundary.
///
/// Everything here is a programmer error: a caller handed the core a buffer
/// of the wrong length. These are not recoverable and are not expected to
/// occur once a caller's wiring is correct; the core still reports them
/// instead of panicking so embedding code can choose how to fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{field} must be {expected} bytes, got {actual}")]
    InvalidBufferLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = core::result::Result<T, CoreError>;
