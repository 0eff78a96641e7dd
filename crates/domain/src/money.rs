//! Money rounding shared by every report routine

/// Rounds a monetary amount to the cent, half up.
///
/// Negative zero is normalized so serialized payloads never carry `-0.0`.
pub fn round2(n: f64) -> f64 {
    (n * 100.0 + 0.5).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn rounds_to_the_cent() {
        assert_eq!(round2(12.3456), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(1000.0), 1000.0);
    }

    #[test]
    fn rounds_half_cents_up() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn normalizes_negative_zero() {
        let rounded = round2(-0.0);
        assert_eq!(rounded, 0.0);
        assert!(rounded.is_sign_positive());
    }

    #[test]
    fn is_idempotent() {
        for n in [0.0, 12.3456, -987.654, 0.005, -0.005] {
            let once = round2(n);
            assert_eq!(round2(once), once);
        }
    }
}
