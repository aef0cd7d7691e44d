//! Range-matching predicates shared by both tree shapes.

use std::cmp::Ordering;
use std::iter;

use crate::error::{Error, Result};
use crate::record::RangeRecord;

/// Keys are non-empty strings of ASCII decimal digits.
#[inline]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Whether `key`, right-padded with `'0'` to the boundary width, lies within
/// `[low_bin, high_bin]`. Keys wider than the boundaries never match.
pub fn is_in_range<R: RangeRecord + ?Sized>(key: &str, record: &R) -> bool {
    let low = record.low_bin();
    if key.len() > low.len() {
        return false;
    }
    let high = record.high_bin();
    let padded = key.bytes().chain(iter::repeat(b'0')).take(low.len());
    low.bytes().cmp(padded.clone()) != Ordering::Greater
        && padded.cmp(high.bytes()) != Ordering::Greater
}

/// Whether `key` is a textual prefix of either boundary.
pub fn is_prefix<R: RangeRecord + ?Sized>(key: &str, record: &R) -> bool {
    let low = record.low_bin();
    if key.len() > low.len() {
        return false;
    }
    low.starts_with(key) || record.high_bin().starts_with(key)
}

/// Zero-padded decimal rendering of `value` at `width` digits.
#[inline]
pub fn left_pad(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

/// Sampling strides must be powers of ten: a sampled key then differs from
/// every key it covers only in its trailing digits, which keeps it within
/// backtracking reach.
pub(crate) fn is_valid_stride(stride: u64) -> bool {
    stride > 0 && 10u64.pow(stride.ilog10()) == stride
}

/// Numeric value of both boundaries, after checking they form an ordered
/// pair of equal-width digit strings that fit in a `u64`.
pub(crate) fn parse_bounds(low: &str, high: &str) -> Result<(u64, u64)> {
    if !is_valid_key(low) || !is_valid_key(high) {
        return Err(Error::malformed(low, high, "boundaries must be decimal digits"));
    }
    if low.len() != high.len() {
        return Err(Error::malformed(low, high, "boundaries differ in width"));
    }
    let (Ok(lo), Ok(hi)) = (low.parse::<u64>(), high.parse::<u64>()) else {
        return Err(Error::malformed(low, high, "boundary does not fit in 64 bits"));
    };
    if lo > hi {
        return Err(Error::malformed(low, high, "low boundary exceeds high boundary"));
    }
    Ok((lo, hi))
}
