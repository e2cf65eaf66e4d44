//! Color-space conversions and vegetation/build-up/tasseled-cap index
//! math shared by the image core's `convert_color` operation and by the
//! STAARCH change-detection driver.
//!
//! # Modules
//!
//! - [`rgb`] — per-pixel RGB↔Gray/YCbCr/XYZ/Lab/Luv/HSV/HLS functions.
//! - [`index`] — normalized difference and build-up index.
//! - [`tasseled_cap`] — the Landsat/MODIS brightness/greenness/wetness
//!   transform.
//! - [`mapping`] — [`mapping::ColorMapping`] and
//!   [`mapping::convert_color`], the whole-image dispatcher over all of
//!   the above.

pub mod error;
pub mod index;
pub mod mapping;
pub mod rgb;
pub mod tasseled_cap;

pub use error::{Error, Result};
pub use mapping::{convert_color, ColorMapping};
pub use tasseled_cap::{Sensor, TasseledCapInput};
