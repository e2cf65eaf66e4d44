//! FitFC: local linear regression plus residual upsampling and a
//! spectral k-nearest-neighbor spatial filter, spec.md §4.3.
//!
//! # Modules
//!
//! - [`options`] — [`options::FitfcOptions`].
//! - [`integral`] — [`integral::RegressionSums`], the sliding-sum machinery
//!   the local regression is built on.
//! - [`fitfc`] — [`fitfc::Fitfc`], the fusor itself.
//! - [`error`] — the crate's [`Error`] type, wrapping `starfusion-core`'s.

pub mod error;
pub mod fitfc;
pub mod integral;
pub mod options;

pub use error::{Error, Result};
pub use fitfc::Fitfc;
pub use options::FitfcOptions;
