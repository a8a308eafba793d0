//! Errors surfaced by neighborhood resolution.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// A coordinate was missing, non-numeric, or not finite.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// The boundary dataset could not be read or parsed.
    #[error("boundary data unavailable: {0}")]
    DataUnavailable(String),
}

impl ResolveError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, ResolveError::InvalidCoordinate(_))
    }
}
