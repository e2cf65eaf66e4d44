//! The dense multi-band raster buffer: [`Image`], plus the borrowed
//! [`Crop`] / [`CropMut`] views returned by [`Image::crop`] and
//! [`Image::crop_mut`].
//!
//! Storage is runtime-typed and channel-counted rather than fixed by a
//! compile-time generic, and cloning is an unconditional eager deep copy:
//! `clone_owned` (and the `Clone` impl) always allocate independently.
//! [`Image::share`] exposes cheap `Arc`-backed handle duplication for
//! callers that explicitly want it. The owning/non-owning split mirrors
//! how the reference raster library models shared views with a single
//! reference-counted buffer plus sub-rect: here the two are kept
//! explicitly distinct types, with `clone()` as the one place that
//! crosses from borrowed to owned.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pixelbase::{BaseType, BinOp, Sample};
use crate::rect::Rect;

/// A dense 2-D buffer of pixels with a runtime-typed base and channel
/// count.
///
/// Storage is row-major, channel-interleaved: `[c0,c1,...,c0,c1,...]`.
/// `data` is wrapped in an `Arc` so that [`Image::share`] is a zero-copy
/// handle duplication; [`Image::clone_owned`] always breaks sharing by
/// deep-copying, so cloning never aliases.
#[derive(Debug)]
pub struct Image {
    data: Arc<Sample>,
    width: u32,
    height: u32,
    channels: usize,
}

impl Clone for Image {
    /// Deep-copies the backing buffer: `self` and the clone never alias,
    /// even though both originated from the same storage. Use
    /// [`Image::share`] for a cheap aliasing handle instead.
    fn clone(&self) -> Image {
        self.clone_owned()
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
            && self.channels == other.channels && *self.data == *other.data
    }
}

impl Image {
    /// Creates a new zero-filled image.
    pub fn new(width: u32, height: u32, channels: usize, base: BaseType) -> Result<Image> {
        if channels == 0 || channels > 4 {
            return Err(Error::invalid_argument(format!(
                "channels must be in 1..=4, got {channels}"
            )));
        }
        let len = width as usize * height as usize * channels;
        Ok(Image {
            data: Arc::new(Sample::zeroed(base, len)),
            width,
            height,
            channels,
        })
    }

    /// Builds an image from a pre-populated [`Sample`] buffer. The buffer's
    /// length must equal `width * height * channels`.
    pub fn from_sample(width: u32, height: u32, channels: usize, data: Sample) -> Result<Image> {
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(Error::size(format!(
                "expected {expected} samples for {width}x{height}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Image {
            data: Arc::new(data),
            width,
            height,
            channels,
        })
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Base element type.
    #[inline]
    pub fn base_type(&self) -> BaseType {
        self.data.base_type()
    }

    /// `true` if `width == 0 || height == 0`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bounds rectangle `(0, 0, width, height)`.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Raw sample buffer.
    #[inline]
    pub fn data(&self) -> &Sample {
        &self.data
    }

    /// Flat index of channel `c` at `(x, y)`.
    #[inline]
    fn index(&self, x: u32, y: u32, c: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels + c
    }

    /// Reads channel `c` at `(x, y)` widened to `f64`.
    #[inline]
    pub fn get(&self, x: u32, y: u32, c: usize) -> f64 {
        debug_assert!(x < self.width && y < self.height && c < self.channels);
        self.data.get_f64(self.index(x, y, c))
    }

    /// Reads every channel at `(x, y)` into `out`, widened to `f64`.
    pub fn get_pixel(&self, x: u32, y: u32, out: &mut [f64]) {
        debug_assert!(out.len() >= self.channels);
        for c in 0..self.channels {
            out[c] = self.get(x, y, c);
        }
    }

    /// Writes channel `c` at `(x, y)`, saturating to the base type.
    ///
    /// Copy-on-write: if this image's storage is shared with another
    /// `Image` (e.g. through [`Image::share`]), the write clones the
    /// backing buffer first so the sibling is unaffected.
    pub fn set(&mut self, x: u32, y: u32, c: usize, value: f64) {
        debug_assert!(x < self.width && y < self.height && c < self.channels);
        let idx = self.index(x, y, c);
        Arc::make_mut(&mut self.data).set_saturating_f64(idx, value);
    }

    /// Writes every channel at `(x, y)` from `values`.
    pub fn set_pixel(&mut self, x: u32, y: u32, values: &[f64]) {
        debug_assert!(values.len() >= self.channels);
        for (c, v) in values.iter().enumerate().take(self.channels) {
            self.set(x, y, c, *v);
        }
    }

    /// Eagerly allocates an independent copy. Mutating the result never
    /// affects `self`.
    pub fn clone_owned(&self) -> Image {
        Image {
            data: Arc::new((*self.data).clone()),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Cheap reference-counted handle duplication. Mutating either handle
    /// through [`Image::set`] triggers copy-on-write, so callers that want
    /// true aliasing should use [`Image::crop_mut`] instead.
    pub fn share(&self) -> Image {
        Image {
            data: Arc::clone(&self.data),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Materializes an owned copy of a sub-rectangle, failing with
    /// [`Error::SizeError`] if `rect` extends past the image extent.
    pub fn clone_rect(&self, rect: Rect) -> Result<Image> {
        let view = self.crop(rect)?;
        let mut out = Image::new(rect.width, rect.height, self.channels, self.base_type())?;
        let mut px = vec![0.0f64; self.channels];
        for y in 0..rect.height {
            for x in 0..rect.width {
                view.get_pixel(x, y, &mut px);
                out.set_pixel(x, y, &px);
            }
        }
        Ok(out)
    }

    /// Owned clone of a region anchored at a (possibly fractional)
    /// top-left offset. When both fractional parts of `top_left` are
    /// zero this is equivalent to [`Image::clone_rect`] on the integer
    /// rect; otherwise each output pixel is bilinearly interpolated from
    /// the four neighbors of `top_left + (x, y)`.
    pub fn clone_resampled(&self, top_left: (f64, f64), size: (u32, u32)) -> Result<Image> {
        let (ox, oy) = top_left;
        let (w, h) = size;
        if ox.fract() == 0.0 && oy.fract() == 0.0 {
            return self.clone_rect(Rect::new(ox as u32, oy as u32, w, h));
        }
        let mut out = Image::new(w, h, self.channels, self.base_type())?;
        let mut px = vec![0.0f64; self.channels];
        for y in 0..h {
            for x in 0..w {
                let sx = ox + x as f64;
                let sy = oy + y as f64;
                self.bilinear_at(sx, sy, &mut px);
                out.set_pixel(x, y, &px);
            }
        }
        Ok(out)
    }

    fn bilinear_at(&self, sx: f64, sy: f64, out: &mut [f64]) {
        let x0 = sx.floor();
        let y0 = sy.floor();
        let tx = sx - x0;
        let ty = sy - y0;
        let x0c = clamp_coord(x0 as i64, self.width);
        let x1c = clamp_coord(x0 as i64 + 1, self.width);
        let y0c = clamp_coord(y0 as i64, self.height);
        let y1c = clamp_coord(y0 as i64 + 1, self.height);
        let mut p00 = vec![0.0f64; self.channels];
        let mut p10 = vec![0.0f64; self.channels];
        let mut p01 = vec![0.0f64; self.channels];
        let mut p11 = vec![0.0f64; self.channels];
        self.get_pixel(x0c, y0c, &mut p00);
        self.get_pixel(x1c, y0c, &mut p10);
        self.get_pixel(x0c, y1c, &mut p01);
        self.get_pixel(x1c, y1c, &mut p11);
        for c in 0..self.channels {
            let top = p00[c] * (1.0 - tx) + p10[c] * tx;
            let bot = p01[c] * (1.0 - tx) + p11[c] * tx;
            out[c] = top * (1.0 - ty) + bot * ty;
        }
    }

    /// Borrows a read-only, zero-copy view of a sub-rectangle. The
    /// returned [`Crop`] addresses directly into `self`'s buffer; no
    /// pixels are copied. Use [`Crop::uncrop`] to widen the view back to
    /// the full image and [`Crop::adjust_crop_borders`] to grow or shrink
    /// it in place.
    ///
    /// Fails with [`Error::SizeError`] if `rect` doesn't fit within the
    /// image extent.
    pub fn crop(&self, rect: Rect) -> Result<Crop<'_>> {
        if !rect.fits_within(self.width, self.height) || rect.is_empty() {
            return Err(Error::size(format!(
                "crop rect {rect:?} does not fit within {}x{}",
                self.width, self.height
            )));
        }
        Ok(Crop { image: self, rect })
    }

    /// Borrows a read-write, zero-copy view of a sub-rectangle. Writes
    /// through the returned [`CropMut`] mutate `self` directly.
    ///
    /// Fails with [`Error::SizeError`] if `rect` doesn't fit within the
    /// image extent.
    pub fn crop_mut(&mut self, rect: Rect) -> Result<CropMut<'_>> {
        if !rect.fits_within(self.width, self.height) || rect.is_empty() {
            return Err(Error::size(format!(
                "crop rect {rect:?} does not fit within {}x{}",
                self.width, self.height
            )));
        }
        Ok(CropMut { image: self, rect })
    }

    /// Converts every sample to `target`, saturating.
    pub fn convert_to(&self, target: BaseType) -> Image {
        Image {
            data: Arc::new(self.data.convert_to(target)),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    fn require_same_shape(&self, other: &Image) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::size(format!(
                "shape mismatch: {}x{} vs {}x{}",
                self.width, self.height, other.width, other.height
            )));
        }
        if self.channels != other.channels {
            return Err(Error::image_type(format!(
                "channel mismatch: {} vs {}",
                self.channels, other.channels
            )));
        }
        if self.base_type() != other.base_type() {
            return Err(Error::image_type(format!(
                "base type mismatch: {} vs {}",
                self.base_type(),
                other.base_type()
            )));
        }
        Ok(())
    }

    fn binary(&self, other: &Image, op: BinOp) -> Result<Image> {
        self.require_same_shape(other)?;
        let data = self.data.binary_op(&other.data, op);
        Image::from_sample(self.width, self.height, self.channels, data)
    }

    /// Elementwise `self + other`.
    pub fn add(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::Add)
    }

    /// Elementwise `self - other`.
    pub fn subtract(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::Sub)
    }

    /// Elementwise `self * other`.
    pub fn multiply(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::Mul)
    }

    /// Elementwise `self / other`.
    pub fn divide(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::Div)
    }

    /// Elementwise `|self - other|`.
    pub fn absdiff(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::AbsDiff)
    }

    /// Elementwise `min(self, other)`.
    pub fn minimum(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::Min)
    }

    /// Elementwise `max(self, other)`.
    pub fn maximum(&self, other: &Image) -> Result<Image> {
        self.binary(other, BinOp::Max)
    }

    /// Absolute value.
    pub fn abs(&self) -> Image {
        Image {
            data: Arc::new(self.data.abs()),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Elementwise op against a per-channel scalar. `scalars` broadcasts a
    /// single value over every channel, or supplies one value per channel.
    /// `mask`, if given, gates which pixels the op is applied to (using
    /// the standard channel-broadcast rule, see [`mask_is_valid`]);
    /// unmasked-out pixels keep their original value.
    fn scalar(&self, scalars: &[f64], op: BinOp, mask: Option<&Image>) -> Result<Image> {
        if scalars.len() != 1 && scalars.len() != self.channels {
            return Err(Error::invalid_argument(format!(
                "expected 1 or {} scalars, got {}",
                self.channels,
                scalars.len()
            )));
        }
        if op == BinOp::Div && scalars.iter().any(|&s| s == 0.0) {
            return Err(Error::invalid_argument("divide by zero scalar"));
        }
        let mut out = self.clone_owned();
        let mut px = vec![0.0f64; self.channels];
        for y in 0..self.height {
            for x in 0..self.width {
                self.get_pixel(x, y, &mut px);
                for c in 0..self.channels {
                    if mask.map(|m| mask_is_valid(m, x, y, c)).unwrap_or(true) {
                        let s = if scalars.len() == 1 { scalars[0] } else { scalars[c] };
                        px[c] = op.apply_scalar(px[c], s);
                    }
                }
                out.set_pixel(x, y, &px);
            }
        }
        Ok(out)
    }

    /// `self op scalars` (per-channel scalar), see [`Image::scalar`].
    pub fn add_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::Add, None)
    }
    /// See [`Image::add_scalar`].
    pub fn subtract_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::Sub, None)
    }
    /// See [`Image::add_scalar`].
    pub fn multiply_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::Mul, None)
    }
    /// See [`Image::add_scalar`]. Fails with [`Error::InvalidArgument`] if
    /// any scalar is zero.
    pub fn divide_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::Div, None)
    }

    /// `self op scalars`, restricted to pixels `mask` marks valid — the
    /// third `(image, scalar-per-channel, mask)` overload spec.md's
    /// arithmetic bullet requires alongside the unmasked form. Pixels the
    /// mask excludes pass through unchanged.
    pub fn add_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::Add, Some(mask))
    }
    /// See [`Image::add_scalar_masked`].
    pub fn subtract_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::Sub, Some(mask))
    }
    /// See [`Image::add_scalar_masked`].
    pub fn multiply_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::Mul, Some(mask))
    }
    /// See [`Image::add_scalar_masked`]. Fails with
    /// [`Error::InvalidArgument`] if any scalar is zero.
    pub fn divide_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::Div, Some(mask))
    }

    /// `|self - scalars|` (per-channel scalar), see [`Image::scalar`].
    pub fn absdiff_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::AbsDiff, None)
    }
    /// See [`Image::absdiff_scalar`], restricted to pixels `mask` marks
    /// valid.
    pub fn absdiff_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::AbsDiff, Some(mask))
    }

    /// `min(self, scalars)` (per-channel scalar), see [`Image::scalar`].
    pub fn minimum_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::Min, None)
    }
    /// See [`Image::minimum_scalar`], restricted to pixels `mask` marks
    /// valid.
    pub fn minimum_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::Min, Some(mask))
    }

    /// `max(self, scalars)` (per-channel scalar), see [`Image::scalar`].
    pub fn maximum_scalar(&self, scalars: &[f64]) -> Result<Image> {
        self.scalar(scalars, BinOp::Max, None)
    }
    /// See [`Image::maximum_scalar`], restricted to pixels `mask` marks
    /// valid.
    pub fn maximum_scalar_masked(&self, scalars: &[f64], mask: &Image) -> Result<Image> {
        self.scalar(scalars, BinOp::Max, Some(mask))
    }

    /// Bitwise AND; requires a matching base type.
    pub fn bitwise_and(&self, other: &Image) -> Result<Image> {
        self.require_same_shape(other)?;
        let data = self
            .data
            .bitwise_and(&other.data)
            .ok_or_else(|| Error::image_type("bitwise and requires a matching integer base type"))?;
        Image::from_sample(self.width, self.height, self.channels, data)
    }

    /// Bitwise OR, see [`Image::bitwise_and`].
    pub fn bitwise_or(&self, other: &Image) -> Result<Image> {
        self.require_same_shape(other)?;
        let data = self
            .data
            .bitwise_or(&other.data)
            .ok_or_else(|| Error::image_type("bitwise or requires a matching integer base type"))?;
        Image::from_sample(self.width, self.height, self.channels, data)
    }

    /// Bitwise XOR, see [`Image::bitwise_and`].
    pub fn bitwise_xor(&self, other: &Image) -> Result<Image> {
        self.require_same_shape(other)?;
        let data = self
            .data
            .bitwise_xor(&other.data)
            .ok_or_else(|| Error::image_type("bitwise xor requires a matching integer base type"))?;
        Image::from_sample(self.width, self.height, self.channels, data)
    }

    /// Bitwise NOT.
    pub fn bitwise_not(&self) -> Result<Image> {
        let data = self
            .data
            .bitwise_not()
            .ok_or_else(|| Error::image_type("bitwise not requires an integer base type"))?;
        Image::from_sample(self.width, self.height, self.channels, data)
    }

    /// Splits a multi-channel image into single-channel images. With
    /// `channels` unset, splits every channel; otherwise only the
    /// requested channel indices.
    pub fn split(&self, channels: Option<&[usize]>) -> Result<Vec<Image>> {
        let indices: Vec<usize> = match channels {
            Some(cs) => cs.to_vec(),
            None => (0..self.channels).collect(),
        };
        let mut out = Vec::with_capacity(indices.len());
        for &c in &indices {
            if c >= self.channels {
                return Err(Error::invalid_argument(format!(
                    "channel index {c} out of range for {}-channel image",
                    self.channels
                )));
            }
            let mut plane = Image::new(self.width, self.height, 1, self.base_type())?;
            for y in 0..self.height {
                for x in 0..self.width {
                    plane.set(x, y, 0, self.get(x, y, c));
                }
            }
            out.push(plane);
        }
        Ok(out)
    }

    /// Merges single-channel images (or images of equal size/base type)
    /// into one multi-channel image, in the order given.
    pub fn merge(images: &[Image]) -> Result<Image> {
        if images.is_empty() {
            return Err(Error::invalid_argument("merge requires at least one image"));
        }
        let first = &images[0];
        let (w, h, base) = (first.width, first.height, first.base_type());
        let mut total_channels = 0usize;
        for img in images {
            if img.width != w || img.height != h {
                return Err(Error::size("merge requires identically-sized images"));
            }
            if img.base_type() != base {
                return Err(Error::image_type("merge requires a matching base type"));
            }
            total_channels += img.channels;
        }
        if total_channels == 0 || total_channels > 4 {
            return Err(Error::invalid_argument(format!(
                "merged channel count must be in 1..=4, got {total_channels}"
            )));
        }
        let mut out = Image::new(w, h, total_channels, base)?;
        for y in 0..h {
            for x in 0..w {
                let mut c_out = 0;
                for img in images {
                    for c in 0..img.channels {
                        out.set(x, y, c_out, img.get(x, y, c));
                        c_out += 1;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Copies every pixel value from `src` into `self`, optionally gated
    /// by `mask` using the standard channel-broadcast rule (1-channel mask
    /// gates all data channels; N-channel mask gates channel-for-channel).
    ///
    /// `mask` is a plain `Image` of base [`BaseType::U8`] (see
    /// [`mask_is_valid`]), not a distinct type: a mask is typed data like
    /// any other image.
    pub fn copy_values_from(&mut self, src: &Image, mask: Option<&Image>) -> Result<()> {
        self.require_same_shape(src)?;
        let mut px = vec![0.0f64; self.channels];
        for y in 0..self.height {
            for x in 0..self.width {
                src.get_pixel(x, y, &mut px);
                for c in 0..self.channels {
                    if mask.map(|m| mask_is_valid(m, x, y, c)).unwrap_or(true) {
                        self.set(x, y, c, px[c]);
                    }
                }
            }
        }
        Ok(())
    }

    /// Sets every (optionally masked) pixel to `value`.
    pub fn fill(&mut self, value: &[f64], mask: Option<&Image>) -> Result<()> {
        if value.len() != self.channels {
            return Err(Error::invalid_argument(format!(
                "expected {} values, got {}",
                self.channels,
                value.len()
            )));
        }
        for y in 0..self.height {
            for x in 0..self.width {
                for c in 0..self.channels {
                    if mask.map(|m| mask_is_valid(m, x, y, c)).unwrap_or(true) {
                        self.set(x, y, c, value[c]);
                    }
                }
            }
        }
        Ok(())
    }
}

impl BinOp {
    #[inline]
    fn apply_scalar(self, a: f64, b: f64) -> f64 {
        match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::AbsDiff => (a - b).abs(),
            BinOp::Min => a.min(b),
            BinOp::Max => a.max(b),
        }
    }
}

#[inline]
fn clamp_coord(v: i64, extent: u32) -> u32 {
    v.clamp(0, extent as i64 - 1) as u32
}

/// Tests a mask image at `(x, y)` for channel `c` of a `channels`-wide
/// data image, applying the standard broadcast rule: a 1-channel mask
/// gates every data channel, an N-channel mask gates channel `c`
/// directly. A non-zero mask sample marks the location valid.
///
/// Masks carry no separate type (they are plain [`Image`]s of base
/// [`BaseType::U8`]); this free function is the one place the
/// broadcast rule is implemented, shared by every mask-consuming op.
pub fn mask_is_valid(mask: &Image, x: u32, y: u32, c: usize) -> bool {
    let mask_channel = if mask.channels() == 1 { 0 } else { c };
    mask.get(x, y, mask_channel) != 0.0
}

/// Grows or shrinks a `rect` by `(top, bottom, left, right)` pixels,
/// bounding the result within `(0, 0, parent_width, parent_height)`.
/// Shared by [`Crop::adjust_crop_borders`] and
/// [`CropMut::adjust_crop_borders`].
fn adjust_borders(
    rect: Rect,
    top: i64,
    bottom: i64,
    left: i64,
    right: i64,
    parent_width: u32,
    parent_height: u32,
) -> Result<Rect> {
    let new_x = rect.x as i64 - left;
    let new_y = rect.y as i64 - top;
    let new_w = rect.width as i64 + left + right;
    let new_h = rect.height as i64 + top + bottom;
    if new_w <= 0 || new_h <= 0 {
        return Err(Error::size(
            "adjust_crop_borders would produce a zero or negative size",
        ));
    }
    if new_x < 0 || new_y < 0 || new_x + new_w > parent_width as i64 || new_y + new_h > parent_height as i64 {
        return Err(Error::size(
            "adjust_crop_borders would extend outside the parent extent",
        ));
    }
    Ok(Rect::new(new_x as u32, new_y as u32, new_w as u32, new_h as u32))
}

/// A borrowed, read-only, zero-copy view of a sub-rectangle of an
/// [`Image`]. Coordinates passed to its accessors are relative to the
/// view, not the parent.
#[derive(Debug, Clone, Copy)]
pub struct Crop<'a> {
    image: &'a Image,
    rect: Rect,
}

impl<'a> Crop<'a> {
    /// Width of the view.
    #[inline]
    pub fn width(&self) -> u32 {
        self.rect.width
    }

    /// Height of the view.
    #[inline]
    pub fn height(&self) -> u32 {
        self.rect.height
    }

    /// Channels per pixel, inherited from the parent image.
    #[inline]
    pub fn channels(&self) -> usize {
        self.image.channels
    }

    /// Reads channel `c` at view-relative `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32, c: usize) -> f64 {
        self.image.get(self.rect.x + x, self.rect.y + y, c)
    }

    /// Reads every channel at view-relative `(x, y)` into `out`.
    pub fn get_pixel(&self, x: u32, y: u32, out: &mut [f64]) {
        self.image.get_pixel(self.rect.x + x, self.rect.y + y, out);
    }

    /// The offset of this view within the parent image.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Widens the view back to the full parent image extent.
    pub fn uncrop(&self) -> Crop<'a> {
        Crop {
            image: self.image,
            rect: self.image.bounds(),
        }
    }

    /// Grows or shrinks this view's borders, bounded by the parent
    /// image's full extent. Fails with [`Error::SizeError`] if the
    /// adjustment would produce a zero or negative size, or would extend
    /// outside the parent.
    pub fn adjust_crop_borders(&self, top: i64, bottom: i64, left: i64, right: i64) -> Result<Crop<'a>> {
        let rect = adjust_borders(self.rect, top, bottom, left, right, self.image.width, self.image.height)?;
        Ok(Crop { image: self.image, rect })
    }
}

/// A borrowed, read-write, zero-copy view of a sub-rectangle of an
/// [`Image`]. Writes through this view mutate the parent image directly.
#[derive(Debug)]
pub struct CropMut<'a> {
    image: &'a mut Image,
    rect: Rect,
}

impl<'a> CropMut<'a> {
    /// Width of the view.
    #[inline]
    pub fn width(&self) -> u32 {
        self.rect.width
    }

    /// Height of the view.
    #[inline]
    pub fn height(&self) -> u32 {
        self.rect.height
    }

    /// Channels per pixel, inherited from the parent image.
    #[inline]
    pub fn channels(&self) -> usize {
        self.image.channels
    }

    /// Reads channel `c` at view-relative `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32, c: usize) -> f64 {
        self.image.get(self.rect.x + x, self.rect.y + y, c)
    }

    /// Reads every channel at view-relative `(x, y)` into `out`.
    pub fn get_pixel(&self, x: u32, y: u32, out: &mut [f64]) {
        self.image.get_pixel(self.rect.x + x, self.rect.y + y, out);
    }

    /// Writes channel `c` at view-relative `(x, y)` into the parent image.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, c: usize, value: f64) {
        self.image.set(self.rect.x + x, self.rect.y + y, c, value);
    }

    /// Writes every channel at view-relative `(x, y)` into the parent
    /// image.
    pub fn set_pixel(&mut self, x: u32, y: u32, values: &[f64]) {
        self.image.set_pixel(self.rect.x + x, self.rect.y + y, values);
    }

    /// The offset of this view within the parent image.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Widens the view back to the full parent image extent, consuming
    /// and reusing the same mutable borrow.
    pub fn uncrop(self) -> CropMut<'a> {
        let rect = self.image.bounds();
        CropMut { image: self.image, rect }
    }

    /// Grows or shrinks this view's borders, bounded by the parent
    /// image's full extent, consuming and reusing the same mutable
    /// borrow. Fails with [`Error::SizeError`] if the adjustment would
    /// produce a zero or negative size, or would extend outside the
    /// parent.
    pub fn adjust_crop_borders(self, top: i64, bottom: i64, left: i64, right: i64) -> Result<CropMut<'a>> {
        let rect = adjust_borders(self.rect, top, bottom, left, right, self.image.width, self.image.height)?;
        Ok(CropMut { image: self.image, rect })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(w: u32, h: u32, c: usize, v: f64) -> Image {
        let mut img = Image::new(w, h, c, BaseType::U8).unwrap();
        img.fill(&vec![v; c], None).unwrap();
        img
    }

    #[test]
    fn add_then_subtract_is_identity_up_to_saturation() {
        let a = filled(4, 4, 1, 100.0);
        let b = filled(4, 4, 1, 50.0);
        let result = a.add(&b).unwrap().subtract(&b).unwrap();
        assert_eq!(result, a);
    }

    #[test]
    fn clone_owned_does_not_alias() {
        let a = filled(4, 4, 1, 10.0);
        let mut b = a.clone_owned();
        b.set(0, 0, 0, 200.0);
        assert_eq!(a.get(0, 0, 0), 10.0);
        assert_eq!(b.get(0, 0, 0), 200.0);
    }

    #[test]
    fn clone_rect_out_of_bounds_is_size_error() {
        let a = filled(4, 4, 1, 1.0);
        let err = a.clone_rect(Rect::new(2, 2, 4, 4));
        assert!(matches!(err, Err(Error::SizeError { .. })));
    }

    #[test]
    fn merge_split_roundtrip() {
        let mut a = Image::new(2, 2, 1, BaseType::U8).unwrap();
        let mut b = Image::new(2, 2, 1, BaseType::U8).unwrap();
        a.fill(&[10.0], None).unwrap();
        b.fill(&[20.0], None).unwrap();
        let merged = Image::merge(&[a.clone(), b.clone()]).unwrap();
        let parts = merged.split(None).unwrap();
        assert_eq!(parts[0], a);
        assert_eq!(parts[1], b);
    }

    #[test]
    fn divide_scalar_zero_is_invalid_argument() {
        let a = filled(2, 2, 1, 10.0);
        let err = a.divide_scalar(&[0.0]);
        assert!(matches!(err, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn add_scalar_masked_leaves_unmasked_pixels_untouched() {
        let a = filled(2, 2, 1, 10.0);
        let mut mask = Image::new(2, 2, 1, BaseType::U8).unwrap();
        mask.set(0, 0, 0, 255.0);
        let out = a.add_scalar_masked(&[5.0], &mask).unwrap();
        assert_eq!(out.get(0, 0, 0), 15.0);
        assert_eq!(out.get(1, 0, 0), 10.0);
        assert_eq!(out.get(1, 1, 0), 10.0);
    }

    #[test]
    fn crop_mut_write_mutates_parent() {
        let mut a = filled(4, 4, 1, 0.0);
        {
            let mut view = a.crop_mut(Rect::new(1, 1, 2, 2)).unwrap();
            view.set(0, 0, 0, 200.0);
        }
        assert_eq!(a.get(1, 1, 0), 200.0);
        assert_eq!(a.get(0, 0, 0), 0.0);
    }

    #[test]
    fn crop_uncrop_widens_to_full_image() {
        let a = filled(4, 4, 1, 5.0);
        let narrow = a.crop(Rect::new(1, 1, 1, 1)).unwrap();
        let wide = narrow.uncrop();
        assert_eq!(wide.width(), 4);
        assert_eq!(wide.height(), 4);
    }

    #[test]
    fn adjust_crop_borders_to_zero_size_fails() {
        let a = filled(4, 4, 1, 1.0);
        let view = a.crop(Rect::new(1, 1, 2, 2)).unwrap();
        let err = view.adjust_crop_borders(0, -2, 0, 0);
        assert!(matches!(err, Err(Error::SizeError { .. })));
    }

    #[test]
    fn adjust_crop_borders_grows_symmetrically() {
        let a = filled(10, 10, 1, 1.0);
        let view = a.crop(Rect::new(5, 5, 2, 2)).unwrap();
        let grown = view.adjust_crop_borders(2, 2, 2, 2).unwrap();
        assert_eq!(grown.rect(), Rect::new(3, 3, 6, 6));
    }

    #[test]
    fn clone_resampled_integer_offset_matches_clone_rect() {
        let a = filled(4, 4, 1, 7.0);
        let cropped = a.clone_rect(Rect::new(1, 1, 2, 2)).unwrap();
        let resampled = a.clone_resampled((1.0, 1.0), (2, 2)).unwrap();
        assert_eq!(cropped, resampled);
    }
}
