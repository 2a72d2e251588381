//! Human-readable durations for logs and reports.

const UNITS: [(f64, &str); 4] = [(1e3, "ns"), (1e6, "µs"), (1e9, "ms"), (60e9, "s")];

/// Render nanoseconds with the largest unit that keeps the value readable:
/// `ns`, `µs`, `ms`, `s`, then `m`.
pub fn format_nanos(nanos: f64) -> String {
    if !nanos.is_finite() {
        return format!("{nanos} ns");
    }
    let magnitude = nanos.abs();
    let mut divisor = 1.0;
    for (limit, unit) in UNITS {
        if magnitude < limit {
            return if unit == "ns" {
                format!("{nanos:.0} {unit}")
            } else {
                format!("{:.2} {unit}", nanos / divisor)
            };
        }
        divisor = limit;
    }
    format!("{:.2} m", nanos / 60e9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_units_by_magnitude() {
        assert_eq!(format_nanos(999.0), "999 ns");
        assert_eq!(format_nanos(1_500.0), "1.50 µs");
        assert_eq!(format_nanos(2_500_000.0), "2.50 ms");
        assert_eq!(format_nanos(3_000_000_000.0), "3.00 s");
        assert_eq!(format_nanos(90e9), "1.50 m");
        assert_eq!(format_nanos(-1_500.0), "-1.50 µs");
    }
}
