//! 2-D prefix-sum (integral image) tables backing FitFC's sliding-window
//! regression sums `Σx, Σy, Σxx, Σxy, n`.
//!
//! A single [`IntegralTable`] answers any axis-aligned rectangle's sum in
//! O(1) after an O(`width*height`) build pass, generalizing the fixed
//! box-kernel convolution a windowed filter normally does into the four
//! running moments the regression needs plus a valid-pixel count.

/// A summed-area table over one scalar field.
pub struct IntegralTable {
    /// `(width + 1) * (height + 1)` prefix sums, row-major.
    prefix: Vec<f64>,
    width: u32,
    height: u32,
}

impl IntegralTable {
    /// Builds a prefix-sum table from `value(x, y)` sampled over the full
    /// `width x height` grid.
    pub fn build(width: u32, height: u32, mut value: impl FnMut(u32, u32) -> f64) -> IntegralTable {
        let stride = width as usize + 1;
        let mut prefix = vec![0.0; stride * (height as usize + 1)];
        for y in 0..height {
            for x in 0..width {
                let v = value(x, y);
                let above = prefix[(y as usize) * stride + (x as usize + 1)];
                let left = prefix[(y as usize + 1) * stride + x as usize];
                let above_left = prefix[(y as usize) * stride + x as usize];
                prefix[(y as usize + 1) * stride + (x as usize + 1)] = v + above + left - above_left;
            }
        }
        IntegralTable { prefix, width, height }
    }

    /// Sum over the inclusive rectangle `[x0, x1] x [y0, y1]`, clamped to
    /// the table's bounds. Returns `0.0` for a fully out-of-range
    /// rectangle.
    pub fn window_sum(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> f64 {
        let stride = self.width as usize + 1;
        let x0 = x0.clamp(0, self.width as i64) as usize;
        let y0 = y0.clamp(0, self.height as i64) as usize;
        let x1 = (x1 + 1).clamp(0, self.width as i64) as usize;
        let y1 = (y1 + 1).clamp(0, self.height as i64) as usize;
        if x1 <= x0 || y1 <= y0 {
            return 0.0;
        }
        self.prefix[y1 * stride + x1] - self.prefix[y0 * stride + x1]
            - self.prefix[y1 * stride + x0] + self.prefix[y0 * stride + x0]
    }
}

/// The five running sums a local regression needs over one window,
/// queried together since they always share the same rectangle.
pub struct RegressionSums {
    sum_x: IntegralTable,
    sum_y: IntegralTable,
    sum_xx: IntegralTable,
    sum_xy: IntegralTable,
    count: IntegralTable,
}

impl RegressionSums {
    /// Builds the five tables for one channel from `x(pix) = l_1`,
    /// `y(pix) = l_t`, gated by `valid(pix)`.
    pub fn build(
        width: u32,
        height: u32,
        mut x: impl FnMut(u32, u32) -> f64,
        mut y: impl FnMut(u32, u32) -> f64,
        mut valid: impl FnMut(u32, u32) -> bool,
    ) -> RegressionSums {
        // Cache per-pixel values once; the five closures below would
        // otherwise each re-invoke `x`/`y`/`valid`.
        let mut xs = vec![0.0; (width as usize) * (height as usize)];
        let mut ys = vec![0.0; (width as usize) * (height as usize)];
        let mut vs = vec![false; (width as usize) * (height as usize)];
        for yy in 0..height {
            for xx in 0..width {
                let idx = yy as usize * width as usize + xx as usize;
                xs[idx] = x(xx, yy);
                ys[idx] = y(xx, yy);
                vs[idx] = valid(xx, yy);
            }
        }
        let at = |buf: &[f64], xx: u32, yy: u32| -> f64 {
            let idx = yy as usize * width as usize + xx as usize;
            if vs[idx] { buf[idx] } else { 0.0 }
        };

        let sum_x = IntegralTable::build(width, height, |xx, yy| at(&xs, xx, yy));
        let sum_y = IntegralTable::build(width, height, |xx, yy| at(&ys, xx, yy));
        let sum_xx = IntegralTable::build(width, height, |xx, yy| {
            let idx = yy as usize * width as usize + xx as usize;
            if vs[idx] { xs[idx] * xs[idx] } else { 0.0 }
        });
        let sum_xy = IntegralTable::build(width, height, |xx, yy| {
            let idx = yy as usize * width as usize + xx as usize;
            if vs[idx] { xs[idx] * ys[idx] } else { 0.0 }
        });
        let count = IntegralTable::build(width, height, |xx, yy| {
            let idx = yy as usize * width as usize + xx as usize;
            if vs[idx] { 1.0 } else { 0.0 }
        });

        RegressionSums { sum_x, sum_y, sum_xx, sum_xy, count }
    }

    /// The five sums over the inclusive window `[x0,x1] x [y0,y1]`:
    /// `(Σx, Σy, Σxx, Σxy, n)`.
    pub fn window(&self, x0: i64, y0: i64, x1: i64, y1: i64) -> (f64, f64, f64, f64, f64) {
        (
            self.sum_x.window_sum(x0, y0, x1, y1),
            self.sum_y.window_sum(x0, y0, x1, y1),
            self.sum_xx.window_sum(x0, y0, x1, y1),
            self.sum_xy.window_sum(x0, y0, x1, y1),
            self.count.window_sum(x0, y0, x1, y1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn full_window_sum_matches_brute_force() {
        let table = IntegralTable::build(4, 3, |x, y| (x + y * 4) as f64);
        let expected: f64 = (0..3).flat_map(|y| (0..4).map(move |x| (x + y * 4) as f64)).sum();
        assert_relative_eq!(table.window_sum(0, 0, 3, 2), expected);
    }

    #[test]
    fn sub_window_sum_matches_brute_force() {
        let table = IntegralTable::build(5, 5, |x, y| (x * y) as f64);
        let expected: f64 = (1..=3).flat_map(|y| (1..=3).map(move |x: i64| (x * y) as f64)).sum();
        assert_relative_eq!(table.window_sum(1, 1, 3, 3), expected);
    }

    #[test]
    fn out_of_range_window_is_zero() {
        let table = IntegralTable::build(3, 3, |_, _| 1.0);
        assert_relative_eq!(table.window_sum(10, 10, 12, 12), 0.0);
    }

    #[test]
    fn regression_sums_respect_validity_mask() {
        let sums = RegressionSums::build(
            2,
            2,
            |_, _| 1.0,
            |_, _| 2.0,
            |x, y| !(x == 0 && y == 0),
        );
        let (sx, sy, _, _, n) = sums.window(0, 0, 1, 1);
        assert_relative_eq!(n, 3.0);
        assert_relative_eq!(sx, 3.0);
        assert_relative_eq!(sy, 6.0);
    }
}
