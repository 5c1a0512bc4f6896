//! Date formatting shared by tagged `Date` values and the plain
//! `createdAt`/`updatedAt` strings of object replies.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `yyyy-MM-ddTHH:mm:ss.sssZ`, always UTC.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Length of `yyyy-MM-ddTHH:mm:ss.sssZ`.
const DATE_LEN: usize = 24;

/// Parses exactly [`DATE_FORMAT`]: three fraction digits, trailing `Z`,
/// no surrounding whitespace.
pub fn date_from_string(value: &str) -> Option<DateTime<Utc>> {
    // `%.f` accepts any number of digits; pin the dot position instead.
    if value.len() != DATE_LEN || value.as_bytes().get(19) != Some(&b'.') {
        return None;
    }
    NaiveDateTime::parse_from_str(value, PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn string_from_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{date_from_string, string_from_date};

    #[test]
    fn formats_with_millisecond_precision() {
        let date = Utc.with_ymd_and_hms(2013, 4, 2, 8, 5, 9).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(string_from_date(&date), "2013-04-02T08:05:09.042Z");
    }

    #[test]
    fn parses_backend_timestamps() {
        let parsed = date_from_string("2011-08-20T02:06:57.931Z").expect("valid timestamp");
        assert_eq!(string_from_date(&parsed), "2011-08-20T02:06:57.931Z");
    }

    #[test]
    fn rejects_garbage_and_missing_zone() {
        assert!(date_from_string("yesterday").is_none());
        assert!(date_from_string("2011-08-20T02:06:57.931").is_none());
        assert!(date_from_string("").is_none());
    }

    #[test]
    fn requires_exactly_three_fraction_digits() {
        assert!(date_from_string("2011-08-20T02:06:57Z").is_none());
        assert!(date_from_string("2011-08-20T02:06:57.9Z").is_none());
        assert!(date_from_string("2011-08-20T02:06:57.931000Z").is_none());
        assert!(date_from_string(" 2011-08-20T02:06:57.931Z").is_none());
        assert!(date_from_string("2011-08-20T02:06:57.931Z ").is_none());
        assert!(date_from_string("2011-08-20T02:06:57.000Z").is_some());
    }
}
