//! Modular arithmetic over the ring of reel items.

/// Reduce `x` into `[0, n)`.
///
/// Values already inside the range are returned untouched, which keeps the
/// function idempotent even where `x + n` would round. `NaN` propagates and
/// `n == 0` yields `NaN`.
pub fn normalize(x: f64, n: usize) -> f64 {
    let n = n as f64;
    if (0.0..n).contains(&x) {
        return x;
    }
    ((x % n) + n) % n
}

/// Reduce an integer index into `[0, n)`.
///
/// # Panics
///
/// Panics if `n == 0`.
pub fn normalize_index(i: i64, n: usize) -> usize {
    i.rem_euclid(n as i64) as usize
}

/// Index of the item closest to the fractional position `x`.
pub fn nearest_index(x: f64, n: usize) -> Option<usize> {
    if n == 0 || !x.is_finite() {
        return None;
    }
    Some(normalize_index(x.round() as i64, n))
}
