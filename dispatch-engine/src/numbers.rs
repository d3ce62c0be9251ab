//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a count to f64, saturating to `f64::MAX` if the cast fails.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Sum level deficits without overflowing.
#[must_use]
pub fn saturating_sum<I>(values: I) -> u32
where
    I: IntoIterator<Item = u32>,
{
    values.into_iter().fold(0_u32, u32::saturating_add)
}
