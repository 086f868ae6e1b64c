use thiserror::Error;

/// Authenticated decryption failed.
///
/// Whatever was decrypted has already been erased by the time this is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("authentication tag mismatch")]
pub struct MacError;

/// A buffer passed to [`crate::prf_short`] was longer than the 16 bytes it handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PrfShortError {
    #[error("input of {0} bytes is longer than 16 bytes")]
    InputTooLong(usize),
    #[error("output of {0} bytes is longer than 16 bytes")]
    OutputTooLong(usize),
}
