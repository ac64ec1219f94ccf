use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::table::Value;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parses the date/time layouts found in source databases.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        // Month tables store `YYYY-MM`.
        .or_else(|| {
            NaiveDate::parse_from_str(&format!("{}-01", text), "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Reads a cell as a point in time. Text cells are parsed; integer cells in
/// the four-digit range are read as the first instant of that year.
pub fn value_to_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Text(text) => parse_timestamp(text),
        Value::Integer(year @ 1000..=9999) => NaiveDate::from_ymd_opt(*year as i32, 1, 1)
            .map(|date| date.and_time(NaiveTime::MIN)),
        _ => None,
    }
}

pub fn format_day(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

pub fn format_month(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m").to_string()
}

pub fn format_year(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_timestamp_layouts() {
        for text in [
            "2020-03-05",
            "2020/03/05",
            "2020-03-05 00:00:00",
            "2020-03-05T00:00:00",
            "2020-03-05 00:00:00.000",
        ] {
            let ts = parse_timestamp(text).unwrap_or_else(|| panic!("failed on {}", text));
            assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2020, 3, 5).unwrap());
        }
        assert!(parse_timestamp("March 5th").is_none());
    }

    #[test]
    fn test_parse_month_layout() {
        let ts = parse_timestamp("2020-03").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
        assert!(value_to_timestamp(&Value::Integer(3)).is_none());
    }

    #[test]
    fn test_value_to_timestamp() {
        assert_eq!(value_to_timestamp(&Value::Integer(1999)).unwrap().year(), 1999);
        assert!(value_to_timestamp(&Value::Integer(7)).is_none());
        assert!(value_to_timestamp(&Value::Real(2020.0)).is_none());
        assert!(value_to_timestamp(&Value::Null).is_none());
    }

    #[test]
    fn test_formatting() {
        let ts = parse_timestamp("2021-11-09 13:45:00").unwrap();
        assert_eq!(format_day(&ts), "2021-11-09");
        assert_eq!(format_month(&ts), "2021-11");
        assert_eq!(format_year(&ts), "2021");
    }
}
