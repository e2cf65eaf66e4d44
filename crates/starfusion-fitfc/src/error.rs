//! Error type for the FitFC fusor.

use thiserror::Error;

/// Errors raised validating [`crate::options::FitfcOptions`] or running
/// [`crate::fitfc::Fitfc::predict`].
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated from a `starfusion-core` image operation, or from a
    /// `starfusion-math` resampling call (which itself returns
    /// `starfusion_core::error::Error`).
    #[error(transparent)]
    Core(#[from] starfusion_core::error::Error),
}

/// Result type for the FitFC fusor.
pub type Result<T> = std::result::Result<T, Error>;
