//! [`ColorMapping`] and [`convert_color`]: the single dispatcher every
//! conversion in this crate goes through when operating on a whole
//! [`starfusion_core::image::Image`] rather than one pixel's bands.

use starfusion_core::image::Image;
use starfusion_core::pixelbase::BaseType;

use crate::error::{Error, Result};
use crate::index::{bu, center_for_base, ndi};
use crate::rgb;
use crate::tasseled_cap::{tasseled_cap, Sensor, TasseledCapInput};

/// A color-space or index conversion `convert_color` can apply to an
/// image's channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMapping {
    /// 3-channel RGB to 1-channel gray (Rec. 601 luma).
    RgbToGray,
    /// 1-channel gray to 3-channel RGB (broadcast).
    GrayToRgb,
    /// 3-channel RGB to YCbCr (BT.601).
    RgbToYCbCr,
    /// YCbCr (BT.601) to RGB.
    YCbCrToRgb,
    /// RGB to CIE XYZ (D65).
    RgbToXyz,
    /// CIE XYZ (D65) to RGB.
    XyzToRgb,
    /// RGB to CIE L*a*b* (D65).
    RgbToLab,
    /// CIE L*a*b* (D65) to RGB.
    LabToRgb,
    /// RGB to CIE L*u*v* (D65).
    RgbToLuv,
    /// CIE L*u*v* (D65) to RGB.
    LuvToRgb,
    /// RGB to HSV.
    RgbToHsv,
    /// HSV to RGB.
    HsvToRgb,
    /// RGB to HLS.
    RgbToHls,
    /// HLS to RGB.
    HlsToRgb,
    /// 2-channel `(Pos, Neg)` to 1-channel normalized difference index.
    PosNegToNdi,
    /// 3-channel `(Red, NIR, SWIR)` to 1-channel build-up index.
    RedNirSwirToBu,
    /// Sensor reflectance bands to 3-channel tasseled cap
    /// (brightness, greenness, wetness).
    TasseledCap(Sensor, TasseledCapInput),
}

impl ColorMapping {
    fn input_channels(self) -> usize {
        match self {
            ColorMapping::GrayToRgb => 1,
            ColorMapping::PosNegToNdi => 2,
            ColorMapping::RedNirSwirToBu => 3,
            ColorMapping::TasseledCap(sensor, _) => sensor.band_count(),
            _ => 3,
        }
    }

    fn output_channels(self) -> usize {
        match self {
            ColorMapping::RgbToGray | ColorMapping::PosNegToNdi | ColorMapping::RedNirSwirToBu => 1,
            ColorMapping::TasseledCap(..) => 3,
            _ => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ColorMapping::RgbToGray => "RgbToGray",
            ColorMapping::GrayToRgb => "GrayToRgb",
            ColorMapping::RgbToYCbCr => "RgbToYCbCr",
            ColorMapping::YCbCrToRgb => "YCbCrToRgb",
            ColorMapping::RgbToXyz => "RgbToXyz",
            ColorMapping::XyzToRgb => "XyzToRgb",
            ColorMapping::RgbToLab => "RgbToLab",
            ColorMapping::LabToRgb => "LabToRgb",
            ColorMapping::RgbToLuv => "RgbToLuv",
            ColorMapping::LuvToRgb => "LuvToRgb",
            ColorMapping::RgbToHsv => "RgbToHsv",
            ColorMapping::HsvToRgb => "HsvToRgb",
            ColorMapping::RgbToHls => "RgbToHls",
            ColorMapping::HlsToRgb => "HlsToRgb",
            ColorMapping::PosNegToNdi => "PosNegToNdi",
            ColorMapping::RedNirSwirToBu => "RedNirSwirToBu",
            ColorMapping::TasseledCap(..) => "TasseledCap",
        }
    }

    fn apply(self, bands: &[f64], result_type: BaseType) -> Result<Vec<f64>> {
        let out = match self {
            ColorMapping::RgbToGray => vec![rgb::rgb_to_gray([bands[0], bands[1], bands[2]])],
            ColorMapping::GrayToRgb => rgb::gray_to_rgb(bands[0]).to_vec(),
            ColorMapping::RgbToYCbCr => rgb::rgb_to_ycbcr([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::YCbCrToRgb => rgb::ycbcr_to_rgb([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::RgbToXyz => rgb::rgb_to_xyz([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::XyzToRgb => rgb::xyz_to_rgb([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::RgbToLab => rgb::rgb_to_lab([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::LabToRgb => rgb::lab_to_rgb([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::RgbToLuv => rgb::rgb_to_luv([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::LuvToRgb => rgb::luv_to_rgb([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::RgbToHsv => rgb::rgb_to_hsv([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::HsvToRgb => rgb::hsv_to_rgb([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::RgbToHls => rgb::rgb_to_hls([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::HlsToRgb => rgb::hls_to_rgb([bands[0], bands[1], bands[2]]).to_vec(),
            ColorMapping::PosNegToNdi => vec![center_for_base(ndi(bands[0], bands[1]), result_type)],
            ColorMapping::RedNirSwirToBu => {
                vec![center_for_base(bu(bands[0], bands[1], bands[2]), result_type)]
            }
            ColorMapping::TasseledCap(sensor, input) => tasseled_cap(sensor, input, bands)?.to_vec(),
        };
        Ok(out)
    }
}

/// Converts every pixel of `image` through `mapping`, producing a new
/// image with `mapping`'s output channel count and base type
/// `result_type`.
///
/// Returns [`Error::ChannelMismatch`] if `image.channels()` does not
/// match the channel count `mapping` requires.
pub fn convert_color(image: &Image, mapping: ColorMapping, result_type: BaseType) -> Result<Image> {
    let expected = mapping.input_channels();
    if image.channels() != expected {
        return Err(Error::ChannelMismatch {
            mapping: mapping.name(),
            expected,
            actual: image.channels(),
        });
    }
    let mut out = Image::new(image.width(), image.height(), mapping.output_channels(), result_type)
        .map_err(Error::Core)?;
    let mut bands = vec![0.0; expected];
    for y in 0..image.height() {
        for x in 0..image.width() {
            image.get_pixel(x, y, &mut bands);
            let converted = mapping.apply(&bands, result_type)?;
            out.set_pixel(x, y, &converted);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rgb_image(r: f64, g: f64, b: f64) -> Image {
        let mut img = Image::new(2, 2, 3, BaseType::F64).unwrap();
        img.fill(&[r, g, b], None).unwrap();
        img
    }

    #[test]
    fn rgb_to_gray_and_back_channel_counts() {
        let img = rgb_image(0.2, 0.5, 0.9);
        let gray = convert_color(&img, ColorMapping::RgbToGray, BaseType::F64).unwrap();
        assert_eq!(gray.channels(), 1);
        let back = convert_color(&gray, ColorMapping::GrayToRgb, BaseType::F64).unwrap();
        assert_eq!(back.channels(), 3);
    }

    #[test]
    fn ycbcr_roundtrip_within_tolerance() {
        let img = rgb_image(0.2, 0.5, 0.9);
        let ycbcr = convert_color(&img, ColorMapping::RgbToYCbCr, BaseType::F64).unwrap();
        let back = convert_color(&ycbcr, ColorMapping::YCbCrToRgb, BaseType::F64).unwrap();
        assert_relative_eq!(back.get(0, 0, 0), 0.2, epsilon = 1e-6);
        assert_relative_eq!(back.get(0, 0, 1), 0.5, epsilon = 1e-6);
        assert_relative_eq!(back.get(0, 0, 2), 0.9, epsilon = 1e-6);
    }

    #[test]
    fn xyz_roundtrip_within_tolerance() {
        let img = rgb_image(0.2, 0.5, 0.9);
        let xyz = convert_color(&img, ColorMapping::RgbToXyz, BaseType::F64).unwrap();
        let back = convert_color(&xyz, ColorMapping::XyzToRgb, BaseType::F64).unwrap();
        assert_relative_eq!(back.get(0, 0, 0), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn lab_roundtrip_within_tolerance() {
        let img = rgb_image(0.2, 0.5, 0.9);
        let lab = convert_color(&img, ColorMapping::RgbToLab, BaseType::F64).unwrap();
        let back = convert_color(&lab, ColorMapping::LabToRgb, BaseType::F64).unwrap();
        assert_relative_eq!(back.get(0, 0, 0), 0.2, epsilon = 1e-4);
    }

    #[test]
    fn wrong_channel_count_is_mismatch() {
        let img = Image::new(2, 2, 2, BaseType::F64).unwrap();
        let err = convert_color(&img, ColorMapping::RgbToGray, BaseType::F64);
        assert!(matches!(err, Err(Error::ChannelMismatch { .. })));
    }

    #[test]
    fn ndi_centers_to_zero_one_for_u8_destination() {
        let mut img = Image::new(1, 1, 2, BaseType::F64).unwrap();
        img.set_pixel(0, 0, &[10.0, 0.0]);
        let out = convert_color(&img, ColorMapping::PosNegToNdi, BaseType::U8).unwrap();
        assert_eq!(out.get(0, 0, 0), 1.0);
    }
}
