//! Time formatting helpers.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render a countdown in seconds as its two most significant units, e.g. `2h 5m`.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }
    let mut rest = secs;
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in UNITS {
        if parts.len() == 2 {
            break;
        }
        let n = rest / size;
        rest %= size;
        if n > 0 || !parts.is_empty() {
            parts.push(format!("{n}{suffix}"));
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_two_largest_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(300), "5m 0s");
        assert_eq!(format_duration(3_661), "1h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }
}
