//! Resampling and small linear-algebra helpers shared by the starfusion
//! fusors.
//!
//! This crate has two jobs: resampling an [`starfusion_core::image::Image`]
//! between resolutions ([`resize`]), and the scalar interpolation
//! primitives that resampling is built from ([`interp`]). Neither depends
//! on satellite-specific concepts (bands, dates, masks beyond the
//! broadcast rule already in `starfusion-core`); `starfusion-color` and
//! the fusor crates are the callers.

pub mod interp;
pub mod resize;

pub use interp::{clamp, lerp, remap};
pub use resize::{area_average, bicubic};
