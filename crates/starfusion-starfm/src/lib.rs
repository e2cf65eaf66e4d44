//! STARFM: moving-window weighted-voting spatiotemporal fusion from one
//! or two high/low pair dates.
//!
//! # Modules
//!
//! - [`options`] — [`options::StarfmOptions`] and [`options::TempDiffWeighting`].
//! - [`starfm`] — [`starfm::Starfm`], the fusor itself.
//! - [`error`] — the crate's [`Error`] type, wrapping `starfusion-core`'s.

pub mod error;
pub mod options;
pub mod starfm;

pub use error::{Error, Result};
pub use options::{StarfmOptions, TempDiffWeighting};
pub use starfm::Starfm;
