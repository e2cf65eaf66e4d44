//! FitFC end-to-end scenarios from spec's §8 seed tests.

use approx::assert_relative_eq;
use starfusion_core::image::Image;
use starfusion_core::multires::MultiResImage;
use starfusion_core::pixelbase::BaseType;
use starfusion_fitfc::{Fitfc, FitfcOptions};

fn uniform(w: u32, h: u32, c: usize, v: f64) -> Image {
    let mut img = Image::new(w, h, c, BaseType::U16).unwrap();
    img.fill(&vec![v; c], None).unwrap();
    img
}

/// Seed test 3: constant images everywhere, `resolution_factor = 1`,
/// `win_size = 5`, `number_neighbors = 5` — expected output is uniform
/// at the shared constant value.
#[test]
fn seed_constant_image() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(8, 8, 1, 200.0));
    images.set("low", 1, uniform(8, 8, 1, 200.0));
    images.set("low", 2, uniform(8, 8, 1, 200.0));

    let fitfc = Fitfc::new(FitfcOptions {
        win_size: 5,
        number_neighbors: 5,
        resolution_factor: 1,
        pair_date: 1,
        ..FitfcOptions::default()
    })
    .unwrap();

    let out = fitfc.predict(&images, 2, None, None).unwrap();
    for y in 0..8 {
        for x in 0..8 {
            assert_relative_eq!(out.get(x, y, 0), 200.0, epsilon = 1e-6);
        }
    }
}

/// Seed test 4: `l_1 = 0`, `l_t = 10` uniform, `h_1 = 50` uniform — a
/// constant `l_1` makes the regression determinant zero, so the fallback
/// model `a=1, b=0` applies and the expected output is `h_1 + (l_t −
/// l_1) = 60` everywhere.
#[test]
fn seed_linear_model_degenerate_fallback() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(8, 8, 1, 50.0));
    images.set("low", 1, uniform(8, 8, 1, 0.0));
    images.set("low", 2, uniform(8, 8, 1, 10.0));

    let fitfc = Fitfc::new(FitfcOptions {
        win_size: 5,
        number_neighbors: 9,
        resolution_factor: 1,
        pair_date: 1,
        ..FitfcOptions::default()
    })
    .unwrap();

    let out = fitfc.predict(&images, 2, None, None).unwrap();
    for y in 0..8 {
        for x in 0..8 {
            assert_relative_eq!(out.get(x, y, 0), 60.0, epsilon = 1e-6);
        }
    }
}

/// A `resolution_factor` that does not evenly divide the image is
/// handled via edge-padding rather than rejected, and leaves a uniform
/// residual unchanged.
#[test]
fn resolution_factor_not_dividing_image_still_predicts() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(7, 7, 1, 80.0));
    images.set("low", 1, uniform(7, 7, 1, 20.0));
    images.set("low", 2, uniform(7, 7, 1, 30.0));

    let fitfc = Fitfc::new(FitfcOptions {
        win_size: 3,
        number_neighbors: 3,
        resolution_factor: 3,
        pair_date: 1,
        ..FitfcOptions::default()
    })
    .unwrap();

    let out = fitfc.predict(&images, 2, None, None).unwrap();
    for y in 0..7 {
        for x in 0..7 {
            assert_relative_eq!(out.get(x, y, 0), 90.0, epsilon = 1e-6);
        }
    }
}
