/// Rounds half away from zero to the nearest integer.
pub fn nint(value: f64) -> i32 {
    value.round() as i32
}

/// Rounds half away from zero to `places` decimal places.
pub fn nint_places(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Right-aligns `value` in a field of `width` characters.
pub fn right(value: impl std::fmt::Display, width: usize) -> String {
    format!("{:>width$}", value.to_string(), width = width)
}

/// Right-aligns a fixed-precision number in a field of `width` characters.
///
/// Rounds half away from zero first; `format!` alone rounds exact ties to even.
pub fn fixed(value: f64, width: usize, precision: usize) -> String {
    let rounded = nint_places(value, precision as i32);
    format!("{:>width$.precision$}", rounded, width = width, precision = precision)
}

/// `M` right-aligned in a field of `width` characters.
pub fn missing(width: usize) -> String {
    right("M", width)
}

/// Right-aligned integer, or `M` when absent.
pub fn int_or_missing<T: std::fmt::Display>(value: Option<T>, width: usize) -> String {
    match value {
        Some(v) => right(v, width),
        None => missing(width),
    }
}

/// Right-aligned fixed-precision number, or `M` when absent.
pub fn fixed_or_missing(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        Some(v) => fixed(v, width, precision),
        None => missing(width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nint_rounds_half_away_from_zero() {
        assert_eq!(nint(2.5), 3);
        assert_eq!(nint(-2.5), -3);
        assert_eq!(nint(2.49), 2);
        assert_eq!(nint(62.5), 63);
    }

    #[test]
    fn test_nint_places() {
        assert_eq!(nint_places(72.45, 1), 72.5);
        assert_eq!(nint_places(50.0, 1), 50.0);
        assert_eq!(nint_places(-0.25, 1), -0.3);
    }

    #[test]
    fn test_padding() {
        assert_eq!(right(7, 4), "   7");
        assert_eq!(fixed(0.5, 6, 2), "  0.50");
        assert_eq!(missing(5), "    M");
        assert_eq!(int_or_missing::<i32>(None, 3), "  M");
        assert_eq!(fixed_or_missing(Some(1.26), 5, 1), "  1.3");
    }

    #[test]
    fn test_fixed_rounds_ties_away_from_zero() {
        assert_eq!(fixed(8.25, 5, 1), "  8.3");
        assert_eq!(fixed(0.5, 5, 0), "    1");
        assert_eq!(fixed(2.5, 5, 0), "    3");
        assert_eq!(fixed(0.125, 5, 2), " 0.13");
        assert_eq!(fixed(-0.25, 5, 1), " -0.3");
    }
}
