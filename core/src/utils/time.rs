/**
 * iOS artifacts store time in many different encodings:
 *   Apple Absolute time (seconds since 2001-01-01) in seconds, milliseconds or microseconds
 *   Unixepoch in seconds, milliseconds or microseconds
 *   Chrome/WebKit time (microseconds since 1601-01-01)
 *
 * Each decoder below only accepts raw values inside a plausible numeric range and returns `None` otherwise
 */
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between 1970-01-01 and 2001-01-01
pub const APPLE_EPOCH_OFFSET: i64 = 978307200;
/// Seconds between 1601-01-01 and 1970-01-01
pub const WINDOWS_EPOCH_OFFSET: i64 = 11644473600;

/// Session scavenger acceptance window start (2020-01-01T00:00:00Z)
const WINDOW_START: i64 = 1577836800;
/// Session scavenger acceptance window end (2035-12-31T23:59:59Z)
const WINDOW_END: i64 = 2082758399;

/// Some SNSS values are stored 1597 days 11:24:56.909 in the future
const SESSION_OFFSET_MILLIS: i64 = 138021896909;

/// KST is UTC+9 with no daylight saving
const KST_OFFSET_SECONDS: i32 = 9 * 3600;

/// Return time now in seconds or 0
pub(crate) fn time_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::new(0, 0))
        .as_secs()
}

/// Build an instant from an epoch offset (in seconds) and a count of sub-second units
fn from_units(value: i64, units_per_second: i64, epoch_offset: i64) -> Option<DateTime<Utc>> {
    let seconds = value.div_euclid(units_per_second);
    let remainder = value.rem_euclid(units_per_second);
    let nanos = remainder * (1_000_000_000 / units_per_second);
    DateTime::from_timestamp(seconds.checked_add(epoch_offset)?, nanos as u32)
}

/// Chrome/WebKit microseconds since 1601-01-01
pub fn chrome_microseconds(value: u64) -> Option<DateTime<Utc>> {
    if !(8_000_000_000_000_000..=15_000_000_000_000_000).contains(&value) {
        return None;
    }
    from_units(value as i64, 1_000_000, -WINDOWS_EPOCH_OFFSET)
}

/// Unixepoch microseconds
pub fn unix_microseconds(value: u64) -> Option<DateTime<Utc>> {
    if !(630_000_000_000_000..=2_000_000_000_000_000).contains(&value) {
        return None;
    }
    from_units(value as i64, 1_000_000, 0)
}

/// Unixepoch milliseconds
pub fn unix_milliseconds(value: u64) -> Option<DateTime<Utc>> {
    if !(630_000_000_000..=2_000_000_000_000).contains(&value) {
        return None;
    }
    from_units(value as i64, 1_000, 0)
}

/// Unixepoch seconds
pub fn unix_seconds(value: u64) -> Option<DateTime<Utc>> {
    if !(1_577_836_800..=2_135_011_200).contains(&value) {
        return None;
    }
    from_units(value as i64, 1, 0)
}

/// Apple Absolute time in microseconds
pub fn apple_microseconds(value: u64) -> Option<DateTime<Utc>> {
    if !(630_000_000_000_000..=1_100_000_000_000_000).contains(&value) {
        return None;
    }
    from_units(value as i64, 1_000_000, APPLE_EPOCH_OFFSET)
}

/// Apple Absolute time in milliseconds
pub fn apple_milliseconds(value: u64) -> Option<DateTime<Utc>> {
    if !(630_000_000_000..=1_100_000_000_000).contains(&value) {
        return None;
    }
    from_units(value as i64, 1_000, APPLE_EPOCH_OFFSET)
}

/// Apple Absolute time in seconds
pub fn apple_seconds(value: u64) -> Option<DateTime<Utc>> {
    if !(630_000_000..=1_106_000_000).contains(&value) {
        return None;
    }
    from_units(value as i64, 1, APPLE_EPOCH_OFFSET)
}

/// Check if an instant is inside the session scavenger window
pub fn in_session_window(instant: &DateTime<Utc>) -> bool {
    let seconds = instant.timestamp();
    (WINDOW_START..=WINDOW_END).contains(&seconds)
}

fn session_offset() -> TimeDelta {
    TimeDelta::milliseconds(SESSION_OFFSET_MILLIS)
}

/// Shift an instant by the future offset observed in SNSS session files
pub fn apply_session_offset(instant: &DateTime<Utc>) -> DateTime<Utc> {
    *instant + session_offset()
}

/**
 * Undo the SNSS future offset.
 * While the instant is ahead of `now` the offset is subtracted, as long as the result stays inside the window.
 * The final instant is only accepted if it is inside the window
 */
pub fn normalize_session_time(
    instant: &DateTime<Utc>,
    now: &DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let offset = session_offset();
    let mut value = *instant;
    while value > *now {
        let shifted = value - offset;
        if !in_session_window(&shifted) {
            break;
        }
        value = shifted;
    }

    if in_session_window(&value) {
        return Some(value);
    }
    None
}

/**
 * Convert a schemaless Apple Absolute number by guessing its magnitude
 *   larger than 10^12 is nanoseconds
 *   larger than 10^9 is milliseconds
 *   anything else is seconds
 */
pub fn convert_date(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let seconds = if value > 1e12 {
        value / 1e9
    } else if value > 1e9 {
        value / 1e3
    } else {
        value
    };
    apple_float_seconds(seconds)
}

/// Convert fractional Apple Absolute seconds to an instant
pub fn apple_float_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1e6).round();
    if micros.abs() > i64::MAX as f64 {
        return None;
    }
    from_units(micros as i64, 1_000_000, APPLE_EPOCH_OFFSET)
}

/// Convert unixepoch seconds to an instant
pub fn unixepoch_to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Convert an instant to Apple Absolute seconds
pub fn to_mac_seconds(instant: &DateTime<Utc>) -> f64 {
    let micros = instant.timestamp_micros() - APPLE_EPOCH_OFFSET * 1_000_000;
    micros as f64 / 1e6
}

/// Render an instant in KST (UTC+9)
pub fn render_kst(instant: &DateTime<Utc>) -> String {
    match FixedOffset::east_opt(KST_OFFSET_SECONDS) {
        Some(kst) => instant
            .with_timezone(&kst)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => instant.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Render an optional instant in KST, empty string if missing
pub fn render_kst_opt(instant: &Option<DateTime<Utc>>) -> String {
    match instant {
        Some(value) => render_kst(value),
        None => String::new(),
    }
}

/// Render Apple Absolute seconds in KST
pub fn format_mac_time(seconds: f64) -> String {
    match apple_float_seconds(seconds) {
        Some(value) => render_kst(&value),
        None => String::new(),
    }
}

/// Convert `plist` dates to an instant
pub(crate) fn plist_date_to_datetime(date: &plist::Date) -> DateTime<Utc> {
    let system: SystemTime = (*date).into();
    DateTime::<Utc>::from(system)
}

#[cfg(test)]
mod tests {
    use super::{
        apple_microseconds, apple_milliseconds, apple_seconds, apply_session_offset,
        chrome_microseconds, convert_date, format_mac_time, in_session_window,
        normalize_session_time, render_kst, time_now, to_mac_seconds, unix_microseconds,
        unix_milliseconds, unix_seconds, APPLE_EPOCH_OFFSET,
    };
    use chrono::{DateTime, TimeZone, Utc};

    #[test]
    fn test_time_now() {
        let seconds_now = time_now();
        assert!(seconds_now > 100)
    }

    #[test]
    fn test_chrome_microseconds_boundary() {
        assert!(chrome_microseconds(8_000_000_000_000_000).is_some());
        assert!(chrome_microseconds(8_000_000_000_000_000 - 1).is_none());
        assert!(chrome_microseconds(15_000_000_000_000_001).is_none());

        let result = chrome_microseconds(13_289_983_960_000_000).unwrap();
        assert_eq!(result.timestamp(), 1645510360);
    }

    #[test]
    fn test_unix_seconds_boundary() {
        let result = unix_seconds(1_577_836_800).unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert!(unix_seconds(2_135_011_200).is_some());
        assert!(unix_seconds(2_135_011_201).is_none());
        assert!(unix_seconds(1_577_836_799).is_none());
    }

    #[test]
    fn test_unix_sub_seconds() {
        let millis = unix_milliseconds(1_655_693_243_123).unwrap();
        assert_eq!(millis.timestamp_millis(), 1_655_693_243_123);

        let micros = unix_microseconds(1_655_693_243_123_456).unwrap();
        assert_eq!(micros.timestamp_micros(), 1_655_693_243_123_456);
        assert!(unix_microseconds(100).is_none());
    }

    #[test]
    fn test_apple_decoders() {
        let seconds = apple_seconds(700_000_000).unwrap();
        assert_eq!(seconds.timestamp(), 700_000_000 + APPLE_EPOCH_OFFSET);

        let millis = apple_milliseconds(700_000_000_000).unwrap();
        assert_eq!(millis.timestamp(), 700_000_000 + APPLE_EPOCH_OFFSET);

        let micros = apple_microseconds(700_000_000_000_000).unwrap();
        assert_eq!(micros.timestamp(), 700_000_000 + APPLE_EPOCH_OFFSET);

        assert!(apple_seconds(1_106_000_001).is_none());
        assert!(apple_milliseconds(629_999_999_999).is_none());
    }

    #[test]
    fn test_convert_date_magnitudes() {
        let seconds = convert_date(5.0e8).unwrap();
        assert_eq!(seconds.timestamp(), 500_000_000 + APPLE_EPOCH_OFFSET);

        let millis = convert_date(5.0e11).unwrap();
        assert_eq!(millis.timestamp(), 500_000_000 + APPLE_EPOCH_OFFSET);

        let nanos = convert_date(5.0e13).unwrap();
        assert_eq!(nanos.timestamp(), 50_000 + APPLE_EPOCH_OFFSET);

        assert!(convert_date(f64::NAN).is_none());
    }

    #[test]
    fn test_normalize_session_time_round_trip() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let original = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();

        let shifted = apply_session_offset(&original);
        assert!(shifted > now);
        assert_eq!(normalize_session_time(&shifted, &now).unwrap(), original);
    }

    #[test]
    fn test_normalize_session_time_rejects_outside_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
        assert!(normalize_session_time(&old, &now).is_none());

        let past = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(normalize_session_time(&past, &now).unwrap(), past);
    }

    #[test]
    fn test_in_session_window() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2035, 12, 31, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2036, 1, 1, 0, 0, 0).unwrap();
        assert!(in_session_window(&start));
        assert!(in_session_window(&end));
        assert!(!in_session_window(&after));
    }

    #[test]
    fn test_render_kst() {
        let value = DateTime::from_timestamp(1574819646, 0).unwrap();
        assert_eq!(render_kst(&value), "2019-11-27 10:54:06");
    }

    #[test]
    fn test_format_mac_time_round_trip() {
        let samples = [
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 7, 4, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2099, 12, 31, 12, 0, 0).unwrap(),
        ];
        for sample in samples {
            assert_eq!(format_mac_time(to_mac_seconds(&sample)), render_kst(&sample));
        }
    }
}
