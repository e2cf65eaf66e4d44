//! [`FitfcOptions`]: the option set spec.md §4.3 lists, plus the
//! `processOptions`-style [`FitfcOptions::validate`] that runs once
//! before any pixel work begins.

use starfusion_core::error::{Error, Result};
use starfusion_core::rect::Rect;

/// FitFC's options, see spec.md §4.3.
#[derive(Debug, Clone)]
pub struct FitfcOptions {
    /// Resolution tag of the high-spatial-resolution series.
    pub high_tag: String,
    /// Resolution tag of the low-spatial-resolution series.
    pub low_tag: String,
    /// The single pair date.
    pub pair_date: i64,
    /// Odd side length of the regression and spatial-filter window.
    pub win_size: u32,
    /// Candidate count retained by the spatial filter; clamped to
    /// `win_size * win_size` (with a warning) if larger.
    pub number_neighbors: u32,
    /// Integer upscaling ratio applied to the residual image.
    pub resolution_factor: u32,
    /// Sub-region to predict; empty means the full image.
    pub prediction_area: Rect,
}

impl Default for FitfcOptions {
    fn default() -> Self {
        FitfcOptions {
            high_tag: "high".to_string(),
            low_tag: "low".to_string(),
            pair_date: 0,
            win_size: 3,
            number_neighbors: 1,
            resolution_factor: 1,
            prediction_area: Rect::default(),
        }
    }
}

impl FitfcOptions {
    /// Validates the option combination, the way `processOptions` does in
    /// spec.md §3/§7: every invalid combination is caught here, before
    /// `predict` touches any image. `number_neighbors` above
    /// `win_size * win_size` is clamped rather than rejected — spec.md
    /// §4.3 says to "clamp and warn", not fail.
    pub fn validate(&self) -> Result<()> {
        if self.high_tag == self.low_tag {
            return Err(Error::invalid_argument(
                "FitFC: high_tag and low_tag must be distinct",
            ));
        }
        if self.win_size == 0 || self.win_size % 2 == 0 {
            return Err(Error::invalid_argument(format!(
                "FitFC: win_size must be a positive odd integer, got {}",
                self.win_size
            )));
        }
        if self.number_neighbors == 0 {
            return Err(Error::invalid_argument(
                "FitFC: number_neighbors must be positive",
            ));
        }
        if self.resolution_factor == 0 {
            return Err(Error::invalid_argument(
                "FitFC: resolution_factor must be positive",
            ));
        }
        Ok(())
    }

    /// `number_neighbors` clamped to the window's candidate count,
    /// emitting the spec's required warning when clamping occurs.
    pub fn clamped_number_neighbors(&self) -> u32 {
        let max = self.win_size * self.win_size;
        if self.number_neighbors > max {
            tracing::warn!(
                requested = self.number_neighbors,
                window_capacity = max,
                "FitFC: number_neighbors exceeds win_size^2, clamping"
            );
            max
        } else {
            self.number_neighbors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_tag_is_invalid_argument() {
        let opts = FitfcOptions {
            low_tag: "high".to_string(),
            ..FitfcOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn even_win_size_is_invalid_argument() {
        let opts = FitfcOptions {
            win_size: 4,
            ..FitfcOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn zero_resolution_factor_is_invalid_argument() {
        let opts = FitfcOptions {
            resolution_factor: 0,
            ..FitfcOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn default_options_are_valid() {
        let opts = FitfcOptions::default();
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn number_neighbors_clamps_to_window_capacity() {
        let opts = FitfcOptions {
            win_size: 3,
            number_neighbors: 100,
            ..FitfcOptions::default()
        };
        assert_eq!(opts.clamped_number_neighbors(), 9);
    }
}
