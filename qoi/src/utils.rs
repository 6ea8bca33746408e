/// Computes the signed difference `a - b`, wrapped into `-128..=127`.
#[inline]
pub const fn diff(a: u8, b: u8) -> i8 {
    a.wrapping_sub(b) as i8
}

/// Applies a signed difference to a channel value, wrapping modulo 256.
#[inline]
pub const fn sum(a: u8, d: i8) -> u8 {
    a.wrapping_add(d as u8)
}
