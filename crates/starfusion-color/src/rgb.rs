//! Per-pixel RGB color-space conversions.
//!
//! Every function takes and returns a plain `[f64; 3]` triplet so the
//! dispatcher in [`crate::mapping`] can apply them uniformly regardless
//! of the image's base type. Inputs are treated as linear values (no
//! gamma/transfer-function step): bands are satellite reflectance
//! values, not display-referred RGB.

/// Rec. 601 luma coefficients.
const REC601: [f64; 3] = [0.299, 0.587, 0.114];

/// RGB to single-channel gray via Rec. 601 luma weights.
pub fn rgb_to_gray(rgb: [f64; 3]) -> f64 {
    rgb[0] * REC601[0] + rgb[1] * REC601[1] + rgb[2] * REC601[2]
}

/// Gray to RGB by broadcasting the scalar to all three channels.
pub fn gray_to_rgb(gray: f64) -> [f64; 3] {
    [gray, gray, gray]
}

/// RGB to YCbCr (ITU-R BT.601, unscaled: Cb/Cr centered on 0).
pub fn rgb_to_ycbcr(rgb: [f64; 3]) -> [f64; 3] {
    let y = rgb_to_gray(rgb);
    let cb = 0.5 * (rgb[2] - y) / (1.0 - REC601[2]);
    let cr = 0.5 * (rgb[0] - y) / (1.0 - REC601[0]);
    [y, cb, cr]
}

/// YCbCr (BT.601, Cb/Cr centered on 0) back to RGB.
pub fn ycbcr_to_rgb(ycbcr: [f64; 3]) -> [f64; 3] {
    let [y, cb, cr] = ycbcr;
    let r = y + 2.0 * cr * (1.0 - REC601[0]);
    let b = y + 2.0 * cb * (1.0 - REC601[2]);
    let g = (y - REC601[0] * r - REC601[2] * b) / REC601[1];
    [r, g, b]
}

/// sRGB primaries RGB-to-XYZ matrix (D65 white point), row-major.
const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

/// Inverse of [`RGB_TO_XYZ`].
const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

fn mat_vec(m: [[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// RGB to CIE XYZ (D65).
pub fn rgb_to_xyz(rgb: [f64; 3]) -> [f64; 3] {
    mat_vec(RGB_TO_XYZ, rgb)
}

/// CIE XYZ (D65) back to RGB.
pub fn xyz_to_rgb(xyz: [f64; 3]) -> [f64; 3] {
    mat_vec(XYZ_TO_RGB, xyz)
}

/// D65 reference white in XYZ.
const D65_WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];

fn lab_f(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// RGB to CIE L*a*b* (D65 reference white, via [`rgb_to_xyz`]).
pub fn rgb_to_lab(rgb: [f64; 3]) -> [f64; 3] {
    let xyz = rgb_to_xyz(rgb);
    let fx = lab_f(xyz[0] / D65_WHITE[0]);
    let fy = lab_f(xyz[1] / D65_WHITE[1]);
    let fz = lab_f(xyz[2] / D65_WHITE[2]);
    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let b = 200.0 * (fy - fz);
    [l, a, b]
}

/// CIE L*a*b* (D65 reference white) back to RGB.
pub fn lab_to_rgb(lab: [f64; 3]) -> [f64; 3] {
    let [l, a, b] = lab;
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    let xyz = [
        lab_f_inv(fx) * D65_WHITE[0],
        lab_f_inv(fy) * D65_WHITE[1],
        lab_f_inv(fz) * D65_WHITE[2],
    ];
    xyz_to_rgb(xyz)
}

fn uv_prime(xyz: [f64; 3]) -> (f64, f64) {
    let denom = xyz[0] + 15.0 * xyz[1] + 3.0 * xyz[2];
    if denom.abs() < 1e-12 {
        (0.0, 0.0)
    } else {
        (4.0 * xyz[0] / denom, 9.0 * xyz[1] / denom)
    }
}

/// RGB to CIE L*u*v* (D65 reference white, via [`rgb_to_xyz`]).
pub fn rgb_to_luv(rgb: [f64; 3]) -> [f64; 3] {
    let xyz = rgb_to_xyz(rgb);
    let (u_p, v_p) = uv_prime(xyz);
    let (u_p_n, v_p_n) = uv_prime(D65_WHITE);
    const DELTA: f64 = 6.0 / 29.0;
    let yr = xyz[1] / D65_WHITE[1];
    let l = if yr > DELTA.powi(3) {
        116.0 * yr.cbrt() - 16.0
    } else {
        (29.0 / 3.0f64).powi(3) * yr
    };
    let u = 13.0 * l * (u_p - u_p_n);
    let v = 13.0 * l * (v_p - v_p_n);
    [l, u, v]
}

/// CIE L*u*v* (D65 reference white) back to RGB.
pub fn luv_to_rgb(luv: [f64; 3]) -> [f64; 3] {
    let [l, u, v] = luv;
    if l.abs() < 1e-12 {
        return [0.0, 0.0, 0.0];
    }
    let (u_p_n, v_p_n) = uv_prime(D65_WHITE);
    let u_p = u / (13.0 * l) + u_p_n;
    let v_p = v / (13.0 * l) + v_p_n;
    let y = if l > 8.0 {
        D65_WHITE[1] * ((l + 16.0) / 116.0).powi(3)
    } else {
        D65_WHITE[1] * l * (3.0 / 29.0f64).powi(3)
    };
    let x = y * 9.0 * u_p / (4.0 * v_p);
    let z = y * (12.0 - 3.0 * u_p - 20.0 * v_p) / (4.0 * v_p);
    xyz_to_rgb([x, y, z])
}

/// RGB to HSV (`h` in `[0, 360)`, `s` and `v` in `[0, 1]`).
pub fn rgb_to_hsv(rgb: [f64; 3]) -> [f64; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let h = hue(r, g, b, max, delta);
    let s = if max.abs() < 1e-12 { 0.0 } else { delta / max };
    [h, s, max]
}

/// HSV (`h` in `[0, 360)`, `s`/`v` in `[0, 1]`) back to RGB.
pub fn hsv_to_rgb(hsv: [f64; 3]) -> [f64; 3] {
    let [h, s, v] = hsv;
    let c = v * s;
    let (r1, g1, b1) = hue_to_rgb_prime(h, c);
    let m = v - c;
    [r1 + m, g1 + m, b1 + m]
}

/// RGB to HLS (`h` in `[0, 360)`, `l` and `s` in `[0, 1]`).
pub fn rgb_to_hls(rgb: [f64; 3]) -> [f64; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let h = hue(r, g, b, max, delta);
    let l = (max + min) / 2.0;
    let s = if delta.abs() < 1e-12 {
        0.0
    } else {
        delta / (1.0 - (2.0 * l - 1.0).abs())
    };
    [h, l, s]
}

/// HLS (`h` in `[0, 360)`, `l`/`s` in `[0, 1]`) back to RGB.
pub fn hls_to_rgb(hls: [f64; 3]) -> [f64; 3] {
    let [h, l, s] = hls;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let (r1, g1, b1) = hue_to_rgb_prime(h, c);
    let m = l - c / 2.0;
    [r1 + m, g1 + m, b1 + m]
}

fn hue(r: f64, g: f64, b: f64, max: f64, delta: f64) -> f64 {
    if delta.abs() < 1e-12 {
        return 0.0;
    }
    let h = if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

fn hue_to_rgb_prime(h: f64, c: f64) -> (f64, f64, f64) {
    let h_prime = h / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    match h_prime as i64 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ycbcr_roundtrip() {
        let rgb = [0.2, 0.6, 0.4];
        let back = ycbcr_to_rgb(rgb_to_ycbcr(rgb));
        assert_relative_eq!(back[0], rgb[0], epsilon = 1e-9);
        assert_relative_eq!(back[1], rgb[1], epsilon = 1e-9);
        assert_relative_eq!(back[2], rgb[2], epsilon = 1e-9);
    }

    #[test]
    fn xyz_roundtrip() {
        let rgb = [0.2, 0.6, 0.4];
        let back = xyz_to_rgb(rgb_to_xyz(rgb));
        assert_relative_eq!(back[0], rgb[0], epsilon = 1e-9);
        assert_relative_eq!(back[1], rgb[1], epsilon = 1e-9);
        assert_relative_eq!(back[2], rgb[2], epsilon = 1e-9);
    }

    #[test]
    fn lab_roundtrip() {
        let rgb = [0.2, 0.6, 0.4];
        let back = lab_to_rgb(rgb_to_lab(rgb));
        assert_relative_eq!(back[0], rgb[0], epsilon = 1e-4);
        assert_relative_eq!(back[1], rgb[1], epsilon = 1e-4);
        assert_relative_eq!(back[2], rgb[2], epsilon = 1e-4);
    }

    #[test]
    fn luv_roundtrip() {
        let rgb = [0.2, 0.6, 0.4];
        let back = luv_to_rgb(rgb_to_luv(rgb));
        assert_relative_eq!(back[0], rgb[0], epsilon = 1e-4);
        assert_relative_eq!(back[1], rgb[1], epsilon = 1e-4);
        assert_relative_eq!(back[2], rgb[2], epsilon = 1e-4);
    }

    #[test]
    fn hsv_roundtrip() {
        let rgb = [0.8, 0.3, 0.1];
        let back = hsv_to_rgb(rgb_to_hsv(rgb));
        assert_relative_eq!(back[0], rgb[0], epsilon = 1e-9);
        assert_relative_eq!(back[1], rgb[1], epsilon = 1e-9);
        assert_relative_eq!(back[2], rgb[2], epsilon = 1e-9);
    }

    #[test]
    fn hls_roundtrip() {
        let rgb = [0.8, 0.3, 0.1];
        let back = hls_to_rgb(rgb_to_hls(rgb));
        assert_relative_eq!(back[0], rgb[0], epsilon = 1e-9);
        assert_relative_eq!(back[1], rgb[1], epsilon = 1e-9);
        assert_relative_eq!(back[2], rgb[2], epsilon = 1e-9);
    }

    #[test]
    fn gray_of_white_is_one() {
        assert_relative_eq!(rgb_to_gray([1.0, 1.0, 1.0]), 1.0);
    }
}
