//! Error taxonomy shared by the image core and, via re-export, every fusor crate.
//!
//! The variants mirror the error kinds a caller must distinguish: bad option
//! combinations, geometry mismatches, base-type/channel mismatches, missing
//! `(tag, date)` lookups, and programming-defect "this should never happen"
//! cases. I/O and raster-format errors are defined in `starfusion-io` and
//! wrapped into a fusor's own error type via `#[from]`, not duplicated here.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by `starfusion-core` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A bad option combination or malformed argument (same high/low tag,
    /// negative sizes, missing required field, unsupported channel count,
    /// a zero divisor in a scalar-per-channel divide).
    #[error("invalid argument: {detail}")]
    InvalidArgument {
        /// Human-readable explanation.
        detail: String,
    },

    /// A geometry mismatch: image vs. image, image vs. mask, or an image
    /// smaller than an algorithm's required footprint.
    #[error("size error: {detail}")]
    SizeError {
        /// Human-readable explanation.
        detail: String,
    },

    /// A base-type or channel-count mismatch between operands.
    #[error("image type error: {detail}")]
    ImageTypeError {
        /// Human-readable explanation.
        detail: String,
    },

    /// A required `(tag, date)` pair was absent from a `MultiResImage`.
    #[error("not found: no image for tag {tag:?} at date {date}")]
    NotFound {
        /// Resolution tag that was looked up.
        tag: String,
        /// Date that was looked up.
        date: i64,
    },

    /// A precondition failure that indicates a programming defect rather
    /// than bad input (e.g. a fusor invoked without its `MultiResImage` set).
    #[error("logic error: {detail}")]
    Logic {
        /// Human-readable explanation.
        detail: String,
    },
}

impl Error {
    /// Shorthand constructor for [`Error::InvalidArgument`].
    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Error::InvalidArgument {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`Error::SizeError`].
    pub fn size(detail: impl Into<String>) -> Self {
        Error::SizeError {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`Error::ImageTypeError`].
    pub fn image_type(detail: impl Into<String>) -> Self {
        Error::ImageTypeError {
            detail: detail.into(),
        }
    }

    /// Shorthand constructor for [`Error::Logic`].
    pub fn logic(detail: impl Into<String>) -> Self {
        Error::Logic {
            detail: detail.into(),
        }
    }
}
