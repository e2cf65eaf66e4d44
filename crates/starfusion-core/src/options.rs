//! [`OneOrPerChannel`]: the broadcasting scalar-or-per-channel parameter
//! shape shared by every fusor's options record.

use crate::error::{Error, Result};

/// Either a single value broadcast over every channel, or one value per
/// channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrPerChannel<T> {
    /// Broadcasts over every channel.
    One(T),
    /// One entry per channel, checked against the data's channel count at
    /// the point of use.
    PerChannel(Vec<T>),
}

impl<T: Copy> OneOrPerChannel<T> {
    /// Resolves to an owned `Vec<T>` of length `channels`, broadcasting a
    /// single value or validating that a per-channel vector matches.
    pub fn resolve(&self, channels: usize) -> Result<Vec<T>> {
        match self {
            OneOrPerChannel::One(v) => Ok(vec![*v; channels]),
            OneOrPerChannel::PerChannel(vs) => {
                if vs.len() != channels {
                    return Err(Error::invalid_argument(format!(
                        "expected 1 or {channels} values, got {}",
                        vs.len()
                    )));
                }
                Ok(vs.clone())
            }
        }
    }
}

impl<T> From<T> for OneOrPerChannel<T> {
    fn from(v: T) -> Self {
        OneOrPerChannel::One(v)
    }
}

impl<T> From<Vec<T>> for OneOrPerChannel<T> {
    fn from(vs: Vec<T>) -> Self {
        OneOrPerChannel::PerChannel(vs)
    }
}
