//! Typed multi-band raster image core shared by the starfusion fusors.
//!
//! This crate has no opinion on satellite missions, bands, or file
//! formats — it provides the storage, addressing, arithmetic, and
//! statistics building blocks that `starfusion-color`, `starfusion-io`,
//! and the three fusor crates (`starfusion-starfm`, `starfusion-fitfc`,
//! `starfusion-staarch`) share.
//!
//! # Modules
//!
//! - [`image`] — [`image::Image`], the dense typed pixel buffer, plus its
//!   [`image::Crop`] / [`image::CropMut`] views.
//! - [`pixelbase`] — [`pixelbase::Sample`], the runtime pixel-base tag
//!   `Image` is built on.
//! - [`rect`] — [`rect::Rect`], used for crops, prediction areas, and
//!   sample windows.
//! - [`stats`] — whole-image statistics (extrema, mean, histograms).
//! - [`range`] — [`range::Interval`] / [`range::IntervalSet`] and
//!   [`range::ValueSet`], plus the range- and set-based mask
//!   constructors built on them.
//! - [`multires`] — [`multires::MultiResImage`], the `(tag, date) ->
//!   Image` container every fusor reads from.
//! - [`geoinfo`] — [`geoinfo::GeoInfo`], per-file geospatial metadata.
//! - [`options`] — [`options::OneOrPerChannel`], the broadcasting
//!   scalar-or-per-channel option shape.
//! - [`error`] — the shared [`error::Error`] taxonomy.

pub mod error;
pub mod geoinfo;
pub mod image;
pub mod multires;
pub mod options;
pub mod pixelbase;
pub mod range;
pub mod rect;
pub mod stats;

/// Re-exports of the types most callers need, for `use
/// starfusion_core::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geoinfo::GeoInfo;
    pub use crate::image::{mask_is_valid, Crop, CropMut, Image};
    pub use crate::multires::MultiResImage;
    pub use crate::options::OneOrPerChannel;
    pub use crate::pixelbase::{BaseType, Sample};
    pub use crate::range::{Interval, IntervalSet, ValueSet};
    pub use crate::rect::Rect;
}
