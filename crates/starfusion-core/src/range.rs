//! Numeric intervals and interval sets, and the per-channel range-based
//! mask constructors built on top of them.
//!
//! Generalizes a single open scalar range into closed/open interval
//! endpoints and unions of several intervals per channel.

use crate::error::{Error, Result};
use crate::image::Image;
use crate::pixelbase::BaseType;

/// A single interval `[lower, upper]` with independently open or closed
/// endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Whether `lower` itself is included.
    pub lower_closed: bool,
    /// Whether `upper` itself is included.
    pub upper_closed: bool,
}

impl Interval {
    /// A closed interval `[lower, upper]`.
    pub const fn closed(lower: f64, upper: f64) -> Interval {
        Interval {
            lower,
            upper,
            lower_closed: true,
            upper_closed: true,
        }
    }

    /// An open interval `(lower, upper)`.
    pub const fn open(lower: f64, upper: f64) -> Interval {
        Interval {
            lower,
            upper,
            lower_closed: false,
            upper_closed: false,
        }
    }

    /// Whether `v` lies within the interval, honoring open/closed
    /// endpoints exactly (no discretization — see [`Interval::contains_typed`]
    /// for the integer/float-specific behavior range masks need).
    pub fn contains(&self, v: f64) -> bool {
        let above_lower = if self.lower_closed { v >= self.lower } else { v > self.lower };
        let below_upper = if self.upper_closed { v <= self.upper } else { v < self.upper };
        above_lower && below_upper
    }

    /// Membership test honoring the integer vs. float discretization
    /// rule used by range-mask construction: for an integer base type,
    /// an open bound is discretized to the nearest interior integer
    /// (`ceil` for an open lower bound, `floor` for an open upper bound)
    /// before testing; for a float base type, open bounds are treated as
    /// closed, and `warn_float_open` is set to `true` so the caller can
    /// surface a one-time diagnostic.
    pub fn contains_typed(&self, v: f64, base: BaseType, warn_float_open: &mut bool) -> bool {
        if base.is_float() {
            if !self.lower_closed || !self.upper_closed {
                *warn_float_open = true;
            }
            return v >= self.lower && v <= self.upper;
        }
        let lower = if self.lower_closed { self.lower } else { self.lower.ceil() + 1.0 };
        let upper = if self.upper_closed { self.upper } else { self.upper.floor() - 1.0 };
        v >= lower && v <= upper
    }
}

/// A set of intervals for one channel, combined with logical OR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalSet(Vec<Interval>);

impl IntervalSet {
    /// An empty set (matches nothing).
    pub fn new() -> IntervalSet {
        IntervalSet(Vec::new())
    }

    /// Builds a set from intervals, in the order given.
    pub fn from_intervals(intervals: impl IntoIterator<Item = Interval>) -> IntervalSet {
        IntervalSet(intervals.into_iter().collect())
    }

    /// `true` if `v` lies in any member interval.
    pub fn contains(&self, v: f64) -> bool {
        self.0.iter().any(|iv| iv.contains(v))
    }

    /// `true` if `v` lies in any member interval, using the integer/float
    /// discretization rule from [`Interval::contains_typed`].
    pub fn contains_typed(&self, v: f64, base: BaseType, warn_float_open: &mut bool) -> bool {
        self.0.iter().any(|iv| iv.contains_typed(v, base, warn_float_open))
    }

    /// Union with `other`, simply concatenating member intervals (no
    /// interval merging — evaluation is the same either way since
    /// membership is OR across all members).
    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        let mut combined = self.0.clone();
        combined.extend(other.0.iter().copied());
        IntervalSet(combined)
    }

    /// Set difference: every point in `self` that is not in `other`,
    /// represented as a same-semantics predicate rather than a literal
    /// interval decomposition.
    pub fn difference(&self, other: &IntervalSet) -> IntervalSet {
        IntervalSet(
            self.0
                .iter()
                .copied()
                .filter(|iv| !other.contains(iv.lower) || !other.contains(iv.upper))
                .collect(),
        )
    }

    /// Member intervals.
    pub fn intervals(&self) -> &[Interval] {
        &self.0
    }
}

/// Builds a single-channel `u8` mask by testing every channel of `image`
/// against `ranges[c]` and combining channels with logical AND when
/// `and_accumulate` is `true` (a pixel is valid only if every channel
/// falls in its range), or OR when `false` (valid if any channel does).
///
/// `ranges` must have one entry per channel of `image`.
pub fn create_single_channel_mask_from_range(
    image: &Image,
    ranges: &[IntervalSet],
    and_accumulate: bool,
) -> Result<Image> {
    if ranges.len() != image.channels() {
        return Err(Error::invalid_argument(format!(
            "expected {} ranges, got {}",
            image.channels(),
            ranges.len()
        )));
    }
    let mut mask = Image::new(image.width(), image.height(), 1, BaseType::U8)?;
    let base = image.base_type();
    let mut warned = false;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let mut valid = and_accumulate;
            for (c, range) in ranges.iter().enumerate() {
                let v = image.get(x, y, c);
                let hit = range.contains_typed(v, base, &mut warned);
                valid = if and_accumulate { valid && hit } else { valid || hit };
            }
            mask.set(x, y, 0, if valid { 255.0 } else { 0.0 });
        }
    }
    if warned {
        tracing::warn!("range mask: open interval bound on a float channel treated as closed");
    }
    Ok(mask)
}

/// Builds a mask with the same channel count as `image`, testing each
/// channel independently against its own `ranges[c]` (no cross-channel
/// accumulation — channel `c` of the mask reflects only channel `c` of
/// `image`).
pub fn create_multi_channel_mask_from_range(
    image: &Image,
    ranges: &[IntervalSet],
) -> Result<Image> {
    if ranges.len() != image.channels() {
        return Err(Error::invalid_argument(format!(
            "expected {} ranges, got {}",
            image.channels(),
            ranges.len()
        )));
    }
    let mut mask = Image::new(image.width(), image.height(), image.channels(), BaseType::U8)?;
    let base = image.base_type();
    let mut warned = false;
    for y in 0..image.height() {
        for x in 0..image.width() {
            for (c, range) in ranges.iter().enumerate() {
                let v = image.get(x, y, c);
                let hit = range.contains_typed(v, base, &mut warned);
                mask.set(x, y, c, if hit { 255.0 } else { 0.0 });
            }
        }
    }
    if warned {
        tracing::warn!("range mask: open interval bound on a float channel treated as closed");
    }
    Ok(mask)
}

/// A set of discrete scalar values for one channel, tested by exact
/// equality — the set-based analogue of [`IntervalSet`], for masks built
/// from an enumerated list of valid values (e.g. explicit land-cover
/// class codes) rather than a continuous range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet(Vec<f64>);

impl ValueSet {
    /// An empty set (matches nothing).
    pub fn new() -> ValueSet {
        ValueSet(Vec::new())
    }

    /// Builds a set from values, in the order given.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> ValueSet {
        ValueSet(values.into_iter().collect())
    }

    /// `true` if `v` exactly equals any member value.
    pub fn contains(&self, v: f64) -> bool {
        self.0.iter().any(|&s| s == v)
    }

    /// Member values.
    pub fn values(&self) -> &[f64] {
        &self.0
    }
}

/// Set-based analogue of [`create_single_channel_mask_from_range`]:
/// builds a single-channel `u8` mask by testing every channel of `image`
/// for membership in `sets[c]`, combining channels with logical AND when
/// `and_accumulate` is `true`, or OR when `false`.
///
/// `sets` must have one entry per channel of `image`.
pub fn create_single_channel_mask_from_set(
    image: &Image,
    sets: &[ValueSet],
    and_accumulate: bool,
) -> Result<Image> {
    if sets.len() != image.channels() {
        return Err(Error::invalid_argument(format!(
            "expected {} sets, got {}",
            image.channels(),
            sets.len()
        )));
    }
    let mut mask = Image::new(image.width(), image.height(), 1, BaseType::U8)?;
    for y in 0..image.height() {
        for x in 0..image.width() {
            let mut valid = and_accumulate;
            for (c, set) in sets.iter().enumerate() {
                let hit = set.contains(image.get(x, y, c));
                valid = if and_accumulate { valid && hit } else { valid || hit };
            }
            mask.set(x, y, 0, if valid { 255.0 } else { 0.0 });
        }
    }
    Ok(mask)
}

/// Set-based analogue of [`create_multi_channel_mask_from_range`]: builds
/// a mask with the same channel count as `image`, testing each channel
/// independently for membership in its own `sets[c]`.
pub fn create_multi_channel_mask_from_set(image: &Image, sets: &[ValueSet]) -> Result<Image> {
    if sets.len() != image.channels() {
        return Err(Error::invalid_argument(format!(
            "expected {} sets, got {}",
            image.channels(),
            sets.len()
        )));
    }
    let mut mask = Image::new(image.width(), image.height(), image.channels(), BaseType::U8)?;
    for y in 0..image.height() {
        for x in 0..image.width() {
            for (c, set) in sets.iter().enumerate() {
                let hit = set.contains(image.get(x, y, c));
                mask.set(x, y, c, if hit { 255.0 } else { 0.0 });
            }
        }
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_open_interval_discretizes_to_interior_bounds() {
        let mut image = Image::new(16, 16, 1, BaseType::U8).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                let v = ((y * 16 + x) % 256) as f64;
                image.set(x, y, 0, v);
            }
        }
        let ranges = vec![IntervalSet::from_intervals([Interval::open(10.0, 250.0)])];
        let mask = create_single_channel_mask_from_range(&image, &ranges, true).unwrap();
        let mut count = 0;
        for y in 0..16 {
            for x in 0..16 {
                if mask.get(x, y, 0) != 0.0 {
                    count += 1;
                }
            }
        }
        assert_eq!(count, 239);
    }

    #[test]
    fn union_is_commutative_for_membership() {
        let a = IntervalSet::from_intervals([Interval::closed(0.0, 5.0)]);
        let b = IntervalSet::from_intervals([Interval::closed(10.0, 15.0)]);
        let u = a.union(&b);
        assert!(u.contains(3.0));
        assert!(u.contains(12.0));
        assert!(!u.contains(7.0));
    }

    #[test]
    fn float_open_interval_is_treated_as_closed() {
        let mut warned = false;
        let iv = Interval::open(0.0, 1.0);
        assert!(iv.contains_typed(1.0, BaseType::F32, &mut warned));
        assert!(warned);
    }

    #[test]
    fn single_channel_set_mask_matches_only_listed_values() {
        let mut image = Image::new(4, 1, 1, BaseType::U8).unwrap();
        image.set(0, 0, 0, 1.0);
        image.set(1, 0, 0, 2.0);
        image.set(2, 0, 0, 3.0);
        image.set(3, 0, 0, 4.0);
        let sets = vec![ValueSet::from_values([1.0, 3.0])];
        let mask = create_single_channel_mask_from_set(&image, &sets, true).unwrap();
        assert_eq!(mask.get(0, 0, 0), 255.0);
        assert_eq!(mask.get(1, 0, 0), 0.0);
        assert_eq!(mask.get(2, 0, 0), 255.0);
        assert_eq!(mask.get(3, 0, 0), 0.0);
    }

    #[test]
    fn multi_channel_set_mask_gates_each_channel_independently() {
        let mut image = Image::new(1, 1, 2, BaseType::U8).unwrap();
        image.set(0, 0, 0, 1.0);
        image.set(0, 0, 1, 9.0);
        let sets = vec![ValueSet::from_values([1.0]), ValueSet::from_values([2.0])];
        let mask = create_multi_channel_mask_from_set(&image, &sets).unwrap();
        assert_eq!(mask.get(0, 0, 0), 255.0);
        assert_eq!(mask.get(0, 0, 1), 0.0);
    }
}
