//! [`MultiResImage`]: the `(resolution tag, date) -> Image` container
//! every fusor reads its inputs from.

use std::collections::BTreeMap;

use crate::image::Image;

/// A mapping from `(resolution tag, date)` to an owned [`Image`].
///
/// Resolution tags are short caller-chosen strings (`"high"`, `"low"`, or
/// anything else); dates are signed integers (day-of-year, or any
/// calendar scalar the caller picks a consistent ordering for). Insertion
/// order is irrelevant — lookups are always by exact `(tag, date)`.
/// Fusors hold a non-owning reference to a `MultiResImage`; the caller
/// owns it and must keep it alive across a `predict` call.
#[derive(Debug, Default)]
pub struct MultiResImage {
    entries: BTreeMap<(String, i64), Image>,
}

impl MultiResImage {
    /// An empty container.
    pub fn new() -> MultiResImage {
        MultiResImage { entries: BTreeMap::new() }
    }

    /// `true` if an image is present at `(tag, date)`.
    pub fn has(&self, tag: &str, date: i64) -> bool {
        self.entries.contains_key(&(tag.to_string(), date))
    }

    /// The image at `(tag, date)`, if present.
    pub fn get(&self, tag: &str, date: i64) -> Option<&Image> {
        self.entries.get(&(tag.to_string(), date))
    }

    /// Inserts or replaces the image at `(tag, date)`, returning any
    /// previous value.
    pub fn set(&mut self, tag: impl Into<String>, date: i64, image: Image) -> Option<Image> {
        self.entries.insert((tag.into(), date), image)
    }

    /// Removes every entry at `date`, across all tags, returning the
    /// removed entries as `(tag, image)` pairs.
    pub fn remove(&mut self, date: i64) -> Vec<(String, Image)> {
        let keys: Vec<(String, i64)> = self
            .entries
            .keys()
            .filter(|(_, d)| *d == date)
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|k| {
                let tag = k.0.clone();
                self.entries.remove(&k).map(|img| (tag, img))
            })
            .collect()
    }

    /// Sorted list of dates present for `tag`.
    pub fn dates(&self, tag: &str) -> Vec<i64> {
        self.entries
            .keys()
            .filter(|(t, _)| t == tag)
            .map(|(_, d)| *d)
            .collect()
    }

    /// Any one image in the container, with no ordering guarantee beyond
    /// determinism for a given set of entries (first in key order: tag,
    /// then date). Useful for probing a representative shape/base type
    /// before any `(tag, date)` is known ahead of time.
    pub fn get_any(&self) -> Option<&Image> {
        self.entries.values().next()
    }

    /// Number of `(tag, date)` entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the container holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelbase::BaseType;

    fn img() -> Image {
        Image::new(2, 2, 1, BaseType::U8).unwrap()
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut m = MultiResImage::new();
        m.set("high", 10, img());
        assert!(m.has("high", 10));
        assert!(!m.has("high", 11));
        assert!(m.get("high", 10).is_some());
    }

    #[test]
    fn dates_are_sorted_per_tag() {
        let mut m = MultiResImage::new();
        m.set("low", 30, img());
        m.set("low", 10, img());
        m.set("low", 20, img());
        m.set("high", 5, img());
        assert_eq!(m.dates("low"), vec![10, 20, 30]);
    }

    #[test]
    fn remove_clears_all_tags_at_a_date() {
        let mut m = MultiResImage::new();
        m.set("high", 10, img());
        m.set("low", 10, img());
        m.set("low", 20, img());
        let removed = m.remove(10);
        assert_eq!(removed.len(), 2);
        assert!(!m.has("high", 10));
        assert!(!m.has("low", 10));
        assert!(m.has("low", 20));
    }
}
