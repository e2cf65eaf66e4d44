//! Error type for the STARFM fusor.

use thiserror::Error;

/// Errors raised validating [`crate::options::StarfmOptions`] or running
/// [`crate::starfm::Starfm::predict`].
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated from a `starfusion-core` image operation.
    #[error(transparent)]
    Core(#[from] starfusion_core::error::Error),
}

/// Result type for the STARFM fusor.
pub type Result<T> = std::result::Result<T, Error>;
