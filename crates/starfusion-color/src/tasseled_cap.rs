//! Tasseled-cap transform: a fixed linear recombination of reflectance
//! bands into (brightness, greenness, wetness).
//!
//! Coefficients are published for surface-reflectance-scaled input.
//! Raw at-sensor digital numbers need radiometric correction before
//! calling in; [`TasseledCapInput`] makes the caller state which one
//! they're providing, and only the reflectance tables are populated.

use crate::error::{Error, Result};

/// Which radiometric scaling the caller's bands are in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasseledCapInput {
    /// Surface reflectance, the scaling the coefficient tables below
    /// were published against.
    Reflectance,
    /// Raw at-sensor digital numbers. Not supported by this port — see
    /// the module docs.
    DigitalNumber,
}

/// Sensor whose band set and coefficients to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    /// Landsat TM/ETM+, 6 reflective bands: blue, green, red, NIR, SWIR1,
    /// SWIR2 (thermal excluded).
    Landsat,
    /// MODIS, 7 land bands.
    Modis,
}

impl Sensor {
    /// Number of bands this sensor's tasseled-cap table expects.
    pub fn band_count(self) -> usize {
        match self {
            Sensor::Landsat => 6,
            Sensor::Modis => 7,
        }
    }
}

/// Crist (1985) Landsat TM reflectance tasseled-cap coefficients, band
/// order [blue, green, red, NIR, SWIR1, SWIR2].
const LANDSAT_COEFFS: [[f64; 6]; 3] = [
    [0.2043, 0.4158, 0.5524, 0.5741, 0.3124, 0.2303],
    [-0.1603, -0.2819, -0.4934, 0.7940, -0.0002, -0.1446],
    [0.0315, 0.2021, 0.3102, 0.1594, -0.6806, -0.6109],
];

/// Lobser & Cohen (2007) MODIS NBAR reflectance tasseled-cap
/// coefficients, band order [1..7].
const MODIS_COEFFS: [[f64; 7]; 3] = [
    [0.4395, 0.5945, 0.2460, 0.3918, 0.3506, 0.2136, 0.2678],
    [-0.4064, 0.5129, -0.2744, -0.2893, 0.4882, -0.0036, -0.4169],
    [0.1147, 0.2489, 0.2408, 0.3132, -0.3122, -0.6416, -0.5087],
];

/// Applies the tasseled-cap transform to one pixel's bands, returning
/// `[brightness, greenness, wetness]`.
///
/// `bands.len()` must equal `sensor.band_count()`. Returns
/// [`Error::ChannelMismatch`] otherwise, and propagates `input ==
/// DigitalNumber` as the same error since this port has no DN-scaled
/// coefficient table.
pub fn tasseled_cap(sensor: Sensor, input: TasseledCapInput, bands: &[f64]) -> Result<[f64; 3]> {
    if input == TasseledCapInput::DigitalNumber {
        return Err(Error::ChannelMismatch {
            mapping: "tasseled_cap(DigitalNumber)",
            expected: sensor.band_count(),
            actual: bands.len(),
        });
    }
    if bands.len() != sensor.band_count() {
        return Err(Error::ChannelMismatch {
            mapping: "tasseled_cap",
            expected: sensor.band_count(),
            actual: bands.len(),
        });
    }
    let out = match sensor {
        Sensor::Landsat => apply(&LANDSAT_COEFFS, bands),
        Sensor::Modis => apply(&MODIS_COEFFS, bands),
    };
    Ok(out)
}

fn apply<const N: usize>(coeffs: &[[f64; N]; 3], bands: &[f64]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, coeff_row) in coeffs.iter().enumerate() {
        out[row] = coeff_row.iter().zip(bands).map(|(c, b)| c * b).sum();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn landsat_brightness_of_zero_reflectance_is_zero() {
        let out = tasseled_cap(Sensor::Landsat, TasseledCapInput::Reflectance, &[0.0; 6]).unwrap();
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], 0.0);
    }

    #[test]
    fn modis_wrong_band_count_is_channel_mismatch() {
        let err = tasseled_cap(Sensor::Modis, TasseledCapInput::Reflectance, &[0.1; 6]);
        assert!(matches!(err, Err(Error::ChannelMismatch { .. })));
    }

    #[test]
    fn digital_number_input_is_unsupported() {
        let err = tasseled_cap(Sensor::Landsat, TasseledCapInput::DigitalNumber, &[0.1; 6]);
        assert!(err.is_err());
    }

    #[test]
    fn landsat_known_brightness_coefficient() {
        let mut bands = [0.0; 6];
        bands[0] = 1.0;
        let out = tasseled_cap(Sensor::Landsat, TasseledCapInput::Reflectance, &bands).unwrap();
        assert_relative_eq!(out[0], 0.2043);
    }
}
