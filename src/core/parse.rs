/// Parse a raw form value into a whole measurement
///
/// Accepts surrounding whitespace and a comma as decimal separator, and
/// rounds half up the same way stored values are rounded. Returns `None`
/// for empty, non-numeric, non-finite or out-of-range input.
#[inline]
pub fn parse_measurement(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = trimmed.replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    let rounded = (value + 0.5).floor();
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return None;
    }

    Some(rounded as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_measurement("96"), Some(96));
        assert_eq!(parse_measurement("  104 "), Some(104));
    }

    #[test]
    fn test_parse_rounds_half_up() {
        assert_eq!(parse_measurement("96.5"), Some(97));
        assert_eq!(parse_measurement("96.49"), Some(96));
        assert_eq!(parse_measurement("-0.5"), Some(0));
        assert_eq!(parse_measurement("-1.6"), Some(-2));
    }

    #[test]
    fn test_parse_accepts_decimal_comma() {
        assert_eq!(parse_measurement("88,5"), Some(89));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("   "), None);
        assert_eq!(parse_measurement("abc"), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("inf"), None);
        assert_eq!(parse_measurement("1e12"), None);
    }
}
