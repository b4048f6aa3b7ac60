use chrono::NaiveDate;

/// Fast parse of `"YYYY-MM-DD"` → `NaiveDate`
pub fn parse_order_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // minimal length + separators check (byte-wise, so multibyte input
    // falls out here instead of panicking on a slice boundary)
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' || !s.is_ascii() {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: u32 = s[8..10].parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_dates() {
        assert_eq!(
            parse_order_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            parse_order_date(" 2024-12-01 "),
            NaiveDate::from_ymd_opt(2024, 12, 1)
        );
    }

    #[test]
    fn rejects_wrong_shapes() {
        // day-first ordering from the worked example
        assert_eq!(parse_order_date("15-03-2024"), None);
        assert_eq!(parse_order_date("2024/03/15"), None);
        assert_eq!(parse_order_date("2024-3-15"), None);
        assert_eq!(parse_order_date("2024-03-15T00:00:00"), None);
        assert_eq!(parse_order_date(""), None);
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert_eq!(parse_order_date("2024-13-01"), None);
        assert_eq!(parse_order_date("2024-02-30"), None);
        assert_eq!(parse_order_date("2023-02-29"), None);
        // leap day on an actual leap year is fine
        assert_eq!(
            parse_order_date("2024-02-29"),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }
}
