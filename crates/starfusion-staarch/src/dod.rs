//! Step 2 of the STAARCH algorithm: the low-resolution-side
//! date-of-disturbance (DoD) assignment (spec.md §4.4 step 2).

use crate::options::MovingAverageAlignment;

/// One time-ordered low-res image's standardized DI, flattened
/// row-major, plus its per-pixel validity.
pub struct DiSample {
    pub date: i64,
    pub di: Vec<f64>,
    pub valid: Vec<bool>,
}

/// Sentinel DoD value for a pixel never assigned a disturbance date —
/// the "int-max" sentinel spec.md's Testable Properties require (spec.md
/// §8: "pixels outside the change mask carry the sentinel int-max
/// value"). spec.md §6 describes the DoD raster as `i32`-per-pixel;
/// `dod`/`DiSample::date` are carried as `i64` throughout this crate so a
/// date (an arbitrary signed calendar scalar, spec.md §3) never narrows,
/// so the sentinel is `i32::MAX` widened into that `i64` domain rather
/// than a fresh `i64`-sized sentinel.
pub const NEVER_DISTURBED: i64 = i32::MAX as i64;

/// Smooths a time-ordered DI series with a moving average of `width`,
/// aligned per `alignment`. `width == 2` under [`MovingAverageAlignment::Center`]
/// is a literal no-op per spec.md §4.4 step 2b, returning the input
/// unchanged rather than an ill-defined symmetric window.
pub fn moving_average(series: &[DiSample], width: u32, alignment: MovingAverageAlignment) -> Vec<Vec<f64>> {
    if width == 2 && alignment == MovingAverageAlignment::Center {
        return series.iter().map(|s| s.di.clone()).collect();
    }
    let width = width.max(1) as usize;
    let len = series.len();
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        let (lo, hi) = window_bounds(i, len, width, alignment);
        let pixel_count = series[i].di.len();
        let mut smoothed = vec![0.0; pixel_count];
        for p in 0..pixel_count {
            let mut sum = 0.0;
            let mut count = 0u32;
            for s in series.iter().take(hi + 1).skip(lo) {
                if s.valid[p] {
                    sum += s.di[p];
                    count += 1;
                }
            }
            smoothed[p] = if count > 0 { sum / count as f64 } else { series[i].di[p] };
        }
        out.push(smoothed);
    }
    out
}

fn window_bounds(i: usize, len: usize, width: usize, alignment: MovingAverageAlignment) -> (usize, usize) {
    match alignment {
        MovingAverageAlignment::Left => (i.saturating_sub(width - 1), i),
        MovingAverageAlignment::Right => (i, (i + width - 1).min(len - 1)),
        MovingAverageAlignment::Center => {
            let half = width / 2;
            (i.saturating_sub(half), (i + (width - 1 - half)).min(len - 1))
        }
    }
}

/// Step 2c-d: per-pixel time-ordered threshold crossing. `change_mask`
/// gates which pixels are candidates at all; `smoothed` is the moving
/// average from [`moving_average`], one entry per date in `series`'s
/// order.
pub fn assign_dod(
    series: &[DiSample],
    smoothed: &[Vec<f64>],
    change_mask: &[bool],
    low_res_di_ratio: f64,
) -> Vec<i64> {
    let pixel_count = change_mask.len();
    let mut dod = vec![NEVER_DISTURBED; pixel_count];
    if series.is_empty() {
        return dod;
    }

    for p in 0..pixel_count {
        if !change_mask[p] {
            continue;
        }
        let mut min_v = f64::INFINITY;
        let mut max_v = f64::NEG_INFINITY;
        let mut any_valid = false;
        for s in series {
            if s.valid[p] {
                any_valid = true;
                min_v = min_v.min(s.di[p]);
                max_v = max_v.max(s.di[p]);
            }
        }
        if !any_valid {
            continue;
        }
        let threshold = min_v + (max_v - min_v) * low_res_di_ratio;

        for (t, s) in series.iter().enumerate() {
            if !s.valid[p] {
                continue;
            }
            if smoothed[t][p] > threshold {
                dod[p] = s.date;
                break;
            }
        }
    }
    dod
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(date: i64, di: f64, len: usize) -> DiSample {
        DiSample { date, di: vec![di; len], valid: vec![true; len] }
    }

    #[test]
    fn width_two_center_is_no_op() {
        let series = vec![sample(1, 1.0, 1), sample(2, 5.0, 1)];
        let smoothed = moving_average(&series, 2, MovingAverageAlignment::Center);
        assert_eq!(smoothed[0][0], 1.0);
        assert_eq!(smoothed[1][0], 5.0);
    }

    #[test]
    fn left_alignment_trails_the_date() {
        let series = vec![sample(1, 0.0, 1), sample(2, 10.0, 1), sample(3, 20.0, 1)];
        let smoothed = moving_average(&series, 2, MovingAverageAlignment::Left);
        // index 2's window is [1,2] -> (10+20)/2 = 15
        assert_eq!(smoothed[2][0], 15.0);
        // index 0's window clips to itself alone.
        assert_eq!(smoothed[0][0], 0.0);
    }

    #[test]
    fn dod_assigns_first_crossing_date() {
        let series = vec![
            DiSample { date: 10, di: vec![0.0], valid: vec![true] },
            DiSample { date: 20, di: vec![1.0], valid: vec![true] },
            DiSample { date: 30, di: vec![2.0], valid: vec![true] },
        ];
        let smoothed: Vec<Vec<f64>> = series.iter().map(|s| s.di.clone()).collect();
        let change_mask = vec![true];
        let dod = assign_dod(&series, &smoothed, &change_mask, 0.5);
        // min=0, max=2, threshold=1.0; first value strictly greater is date 30 (value 2.0
        // at index 2, since index 1's value 1.0 is not > 1.0).
        assert_eq!(dod[0], 30);
    }

    #[test]
    fn pixel_outside_change_mask_is_never_disturbed() {
        let series = vec![sample(1, 0.0, 1), sample(2, 100.0, 1)];
        let smoothed: Vec<Vec<f64>> = series.iter().map(|s| s.di.clone()).collect();
        let change_mask = vec![false];
        let dod = assign_dod(&series, &smoothed, &change_mask, 0.5);
        assert_eq!(dod[0], NEVER_DISTURBED);
    }
}
