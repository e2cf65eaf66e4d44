//! Error type for color-space conversions and index math.

use thiserror::Error;

/// Errors raised while converting or recombining image bands.
#[derive(Debug, Error)]
pub enum Error {
    /// Propagated from a `starfusion-core` image operation.
    #[error(transparent)]
    Core(#[from] starfusion_core::error::Error),

    /// The source image does not have the channel count a mapping
    /// requires (e.g. 3 for RGB↔Lab, 6 for the Landsat tasseled cap).
    #[error("{mapping} requires {expected} channel(s), got {actual}")]
    ChannelMismatch {
        /// Name of the requested mapping.
        mapping: &'static str,
        /// Channel count the mapping requires.
        expected: usize,
        /// Channel count the source image actually has.
        actual: usize,
    },
}

/// Result type for color operations.
pub type Result<T> = std::result::Result<T, Error>;
