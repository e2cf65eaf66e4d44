//! Error type for the STAARCH change-detection driver.

use thiserror::Error;

/// Errors raised validating [`crate::options::StaarchOptions`] or running
/// [`crate::staarch::Staarch::predict`].
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated from a `starfusion-core` image operation.
    #[error(transparent)]
    Core(#[from] starfusion_core::error::Error),

    /// Propagated from a `starfusion-color` tasseled-cap or index call.
    #[error(transparent)]
    Color(#[from] starfusion_color::error::Error),

    /// Propagated from the STARFM sub-fusor's own `predict` call.
    #[error(transparent)]
    Starfm(#[from] starfusion_starfm::error::Error),
}

/// Result type for the STAARCH driver.
pub type Result<T> = std::result::Result<T, Error>;
