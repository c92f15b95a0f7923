use chrono::Timelike;

/// Formats a time of day as a 12-hour clock string, e.g. `9:05 AM`.
pub fn format_time<T: Timelike>(time: &T) -> String {
    let (is_pm, hour) = time.hour12();
    format!(
        "{}:{:02} {}",
        hour,
        time.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32) -> String {
        format_time(&NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_midnight_and_noon() {
        assert_eq!(at(0, 0), "12:00 AM");
        assert_eq!(at(12, 0), "12:00 PM");
    }

    #[test]
    fn test_minutes_are_padded() {
        assert_eq!(at(9, 5), "9:05 AM");
        assert_eq!(at(23, 59), "11:59 PM");
    }

    #[test]
    fn test_afternoon_wraps() {
        assert_eq!(at(13, 30), "1:30 PM");
    }
}
