//! Decimal helpers used to rebuild values from their erased proxies.
//!
//! These cover the three numeric contracts the Elf decoder relies on: powers
//! of ten as the nearest double, the decimal exponent of a double, and
//! rounding away from zero at a given number of decimal places.

/// Bit pattern appended by `close()` to terminate a block (the canonical
/// quiet NaN). Real data must never carry this exact pattern.
pub const END_SIGN: u64 = 0x7FF8_0000_0000_0000;

const POW10_POSITIVE: [f64; 21] = [
    1.0, 1.0e1, 1.0e2, 1.0e3, 1.0e4, 1.0e5, 1.0e6, 1.0e7, 1.0e8, 1.0e9, 1.0e10, 1.0e11, 1.0e12,
    1.0e13, 1.0e14, 1.0e15, 1.0e16, 1.0e17, 1.0e18, 1.0e19, 1.0e20,
];

const POW10_NEGATIVE: [f64; 21] = [
    1.0, 1.0e-1, 1.0e-2, 1.0e-3, 1.0e-4, 1.0e-5, 1.0e-6, 1.0e-7, 1.0e-8, 1.0e-9, 1.0e-10,
    1.0e-11, 1.0e-12, 1.0e-13, 1.0e-14, 1.0e-15, 1.0e-16, 1.0e-17, 1.0e-18, 1.0e-19, 1.0e-20,
];

/// Returns the double nearest to `10^n`.
pub fn pow10(n: i32) -> f64 {
    let idx = n.unsigned_abs() as usize;
    if n >= 0 && idx < POW10_POSITIVE.len() {
        POW10_POSITIVE[idx]
    } else if n < 0 && idx < POW10_NEGATIVE.len() {
        POW10_NEGATIVE[idx]
    } else {
        // Parsing is correctly rounded, unlike `powi`.
        format!("1e{n}").parse().unwrap_or_else(|_| 10f64.powi(n))
    }
}

/// Returns `floor(log10(|v|))`, or `None` for zero and non-finite input.
///
/// Inside the table range the exponent is found by comparing against exact
/// table entries, so values just below a power of ten are not rounded up by
/// `log10`.
pub fn decimal_exponent(v: f64) -> Option<i32> {
    let v = v.abs();
    if v == 0.0 || !v.is_finite() {
        return None;
    }
    if v >= 1.0 {
        for i in 0..POW10_POSITIVE.len() - 1 {
            if v < POW10_POSITIVE[i + 1] {
                return Some(i as i32);
            }
        }
    } else {
        for (i, p) in POW10_NEGATIVE.iter().enumerate().skip(1) {
            if v >= *p {
                return Some(-(i as i32));
            }
        }
    }
    Some(v.log10().floor() as i32)
}

/// Rounds `v` away from zero to `alpha` decimal places.
///
/// A negative `alpha` rounds to the left of the decimal point.
pub fn round_up(v: f64, alpha: i32) -> f64 {
    if alpha >= 0 {
        let scale = pow10(alpha);
        if v < 0.0 {
            (v * scale).floor() / scale
        } else {
            (v * scale).ceil() / scale
        }
    } else {
        let scale = pow10(-alpha);
        if v < 0.0 {
            (v / scale).floor() * scale
        } else {
            (v / scale).ceil() * scale
        }
    }
}
