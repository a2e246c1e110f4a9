// RPM to drive-internal velocity units for Kinco servo drives.
// DEC = (RPM * 512 * encoder resolution) / 1875

/// Encoder counts per motor revolution for the stock encoder
pub const DEFAULT_ENCODER_RESOLUTION: u32 = 10_000;

/// Convert a speed in RPM to the drive's internal DEC unit, assuming the
/// default encoder resolution.
pub fn rpm_to_dec(rpm: i32) -> i64 {
    rpm_to_dec_with_resolution(rpm, DEFAULT_ENCODER_RESOLUTION)
}

/// Convert a speed in RPM to DEC for a specific encoder resolution.
///
/// The division truncates toward zero. The result is deliberately wider
/// than the frame's 4-byte value field; narrowing to i32 is the caller's
/// checked step.
pub fn rpm_to_dec_with_resolution(rpm: i32, resolution: u32) -> i64 {
    (rpm as i64 * 512 * resolution as i64) / 1875
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rpm_is_zero() {
        assert_eq!(rpm_to_dec(0), 0);
    }

    #[test]
    fn test_1875_rpm_is_exact() {
        // 1875 * 512 * 10000 / 1875 leaves no remainder
        assert_eq!(rpm_to_dec(1875), 5_120_000);
    }

    #[test]
    fn test_truncates_toward_zero() {
        // 512 * 10000 / 1875 = 2730.67
        assert_eq!(rpm_to_dec(1), 2730);
        assert_eq!(rpm_to_dec(-1), -2730);
    }

    #[test]
    fn test_monotonic_in_rpm() {
        let mut prev = rpm_to_dec(0);
        for rpm in 1..=2000 {
            let dec = rpm_to_dec(rpm);
            assert!(dec >= prev, "rpm_to_dec({}) = {} < {}", rpm, dec, prev);
            prev = dec;
        }
    }

    #[test]
    fn test_custom_resolution() {
        // A 1875-count encoder makes the scale factor exactly 512
        assert_eq!(rpm_to_dec_with_resolution(10, 1875), 5120);
    }
}
