//! Display formatting for forecast epochs and observation timestamps

use chrono::{DateTime, Local, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use dwdx_core::StateValue;

use crate::{IngestError, IngestResult};

/// Render epoch milliseconds as `YYYY-MM-DD, HH:MM:SS GMT+N`.
///
/// The date is the UTC calendar date, the time of day and offset are
/// Europe/Berlin local time. Anything that is not a positive number is
/// returned unchanged.
pub fn format_epoch_millis(value: &StateValue) -> StateValue {
    let millis = match value {
        StateValue::Number(ms) if ms.is_finite() && *ms > 0.0 => *ms as i64,
        _ => return value.clone(),
    };
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(millis) else {
        return value.clone();
    };

    let local = utc.with_timezone(&Berlin);
    let offset_hours = local.offset().fix().local_minus_utc() / 3600;
    StateValue::Text(format!(
        "{}, {} GMT{:+}",
        utc.format("%Y-%m-%d"),
        local.format("%H:%M:%S"),
        offset_hours
    ))
}

/// Combine `DD.MM.YY` and `HH:MM` (UTC, year 2000+YY) into `YYYY-MM-DD HH:MM`
/// on the host's local wall clock.
pub fn observation_timestamp(date: &str, time: &str) -> IngestResult<String> {
    let malformed = || IngestError::Malformed(format!("bad timestamp '{} {}'", date, time));

    let mut date_parts = date.trim().split('.');
    let (Some(day), Some(month), Some(year), None) = (
        date_parts.next(),
        date_parts.next(),
        date_parts.next(),
        date_parts.next(),
    ) else {
        return Err(malformed());
    };
    let Some((hours, minutes)) = time.trim().split_once(':') else {
        return Err(malformed());
    };

    let day: u32 = day.parse().map_err(|_| malformed())?;
    let month: u32 = month.parse().map_err(|_| malformed())?;
    let year: i32 = year.parse().map_err(|_| malformed())?;
    let hours: u32 = hours.parse().map_err(|_| malformed())?;
    let minutes: u32 = minutes.parse().map_err(|_| malformed())?;

    let naive = NaiveDate::from_ymd_opt(2000 + year, month, day)
        .and_then(|d| d.and_hms_opt(hours, minutes, 0))
        .ok_or_else(malformed)?;
    let utc = Utc.from_utc_datetime(&naive);
    Ok(utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summer_time() {
        // 2024-06-01T12:00:00Z
        let out = format_epoch_millis(&StateValue::Number(1_717_243_200_000.0));
        assert_eq!(out, StateValue::Text("2024-06-01, 14:00:00 GMT+2".into()));
    }

    #[test]
    fn test_winter_time() {
        // 2024-01-15T12:00:00Z
        let out = format_epoch_millis(&StateValue::Number(1_705_320_000_000.0));
        assert_eq!(out, StateValue::Text("2024-01-15, 13:00:00 GMT+1".into()));
    }

    #[test]
    fn test_date_is_utc_date() {
        // 2024-06-01T23:30:00Z is already June 2nd in Berlin
        let out = format_epoch_millis(&StateValue::Number(1_717_284_600_000.0));
        assert_eq!(out, StateValue::Text("2024-06-01, 01:30:00 GMT+2".into()));
    }

    #[test]
    fn test_non_positive_unchanged() {
        for v in [
            StateValue::Number(0.0),
            StateValue::Number(-1_000.0),
            StateValue::Text("1717243200000".into()),
            StateValue::Null,
        ] {
            assert_eq!(format_epoch_millis(&v), v);
        }
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> String {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }

    #[test]
    fn test_observation_timestamp() {
        assert_eq!(
            observation_timestamp("01.06.24", "14:00").unwrap(),
            local(2024, 6, 1, 14, 0)
        );
        assert_eq!(
            observation_timestamp("31.12.23", "23:59").unwrap(),
            local(2023, 12, 31, 23, 59)
        );
    }

    #[test]
    fn test_observation_timestamp_malformed() {
        assert!(observation_timestamp("2024-06-01", "14:00").is_err());
        assert!(observation_timestamp("32.01.24", "14:00").is_err());
        assert!(observation_timestamp("01.06.24", "1400").is_err());
        assert!(observation_timestamp("01.06.24.1", "14:00").is_err());
    }
}
