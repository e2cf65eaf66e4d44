//! STARFM end-to-end scenarios from spec's §8 seed tests.

use approx::assert_relative_eq;
use starfusion_core::image::Image;
use starfusion_core::multires::MultiResImage;
use starfusion_core::pixelbase::BaseType;
use starfusion_starfm::{Starfm, StarfmOptions};

fn uniform(w: u32, h: u32, c: usize, v: f64) -> Image {
    let mut img = Image::new(w, h, c, BaseType::U8).unwrap();
    img.fill(&vec![v; c], None).unwrap();
    img
}

/// Seed test 1: single-pair identity, `h_1 = l_1 = l_t` uniform,
/// `do_copy_on_zero_diff = true` — every output pixel copies straight
/// through.
#[test]
fn seed_single_pair_identity() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(10, 10, 1, 100.0));
    images.set("low", 1, uniform(10, 10, 1, 100.0));
    images.set("low", 2, uniform(10, 10, 1, 100.0));

    let starfm = Starfm::new(StarfmOptions {
        win_size: 5,
        number_classes: 4,
        do_copy_on_zero_diff: true,
        date_1: 1,
        ..StarfmOptions::default()
    })
    .unwrap();

    let out = starfm.predict(&images, 2, None, None).unwrap();
    for y in 0..10 {
        for x in 0..10 {
            assert_relative_eq!(out.get(x, y, 0), 100.0);
        }
    }
}

/// Seed test 2: double-pair center copy — `h_1=l_1=50`, `h_3=l_3=150`,
/// `l_t=100`. Local prediction `lv = h_k + (l_t - l_k)` evaluates to
/// `100` on both sides, so both the weighted average and the
/// no-candidate fallback converge on `100`.
#[test]
fn seed_double_pair_center_copy() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(6, 6, 1, 50.0));
    images.set("low", 1, uniform(6, 6, 1, 50.0));
    images.set("high", 3, uniform(6, 6, 1, 150.0));
    images.set("low", 3, uniform(6, 6, 1, 150.0));
    images.set("low", 2, uniform(6, 6, 1, 100.0));

    let starfm = Starfm::new(StarfmOptions {
        win_size: 3,
        number_classes: 4,
        date_1: 1,
        date_3: Some(3),
        do_copy_on_zero_diff: false,
        ..StarfmOptions::default()
    })
    .unwrap();

    let out = starfm.predict(&images, 2, None, None).unwrap();
    for y in 0..6 {
        for x in 0..6 {
            assert_relative_eq!(out.get(x, y, 0), 100.0, epsilon = 1.0);
        }
    }
}

/// Boundary behavior: when a mask rejects every window candidate, STARFM
/// falls back to the mean of the pair-center `lv` values rather than
/// producing a NaN or zero.
#[test]
fn no_accepted_candidate_falls_back_to_center_mean() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(5, 5, 1, 10.0));
    images.set("low", 1, uniform(5, 5, 1, 20.0));
    images.set("low", 2, uniform(5, 5, 1, 30.0));

    // Mask invalidates every pixel so no window candidate can pass.
    let mask = Image::new(5, 5, 1, BaseType::U8).unwrap();

    let starfm = Starfm::new(StarfmOptions {
        win_size: 3,
        number_classes: 4,
        date_1: 1,
        do_copy_on_zero_diff: false,
        ..StarfmOptions::default()
    })
    .unwrap();

    let out = starfm.predict(&images, 2, Some(&mask), None).unwrap();
    // lv = h + (l_t - l_1) = 10 + (30 - 20) = 20 everywhere.
    for y in 0..5 {
        for x in 0..5 {
            assert_relative_eq!(out.get(x, y, 0), 20.0);
        }
    }
}

/// A `predict_mask` restricts which output pixels are computed; pixels
/// outside it are left at their zero-initialized value, the way
/// STAARCH's three partial STARFM calls scatter disjoint regions back
/// into one output image.
#[test]
fn predict_mask_restricts_output_region() {
    let mut images = MultiResImage::new();
    images.set("high", 1, uniform(4, 4, 1, 5.0));
    images.set("low", 1, uniform(4, 4, 1, 5.0));
    images.set("low", 2, uniform(4, 4, 1, 5.0));

    let mut predict_mask = Image::new(4, 4, 1, BaseType::U8).unwrap();
    predict_mask.set(0, 0, 0, 255.0);

    let starfm = Starfm::new(StarfmOptions {
        win_size: 3,
        date_1: 1,
        do_copy_on_zero_diff: true,
        ..StarfmOptions::default()
    })
    .unwrap();

    let out = starfm.predict(&images, 2, None, Some(&predict_mask)).unwrap();
    assert_relative_eq!(out.get(0, 0, 0), 5.0);
    assert_relative_eq!(out.get(1, 1, 0), 0.0);
}
