use chrono::{TimeZone, Utc};
use orchard_core::{chrome_microseconds, normalize_session_time, scavenge, unix_seconds};

#[test]
fn test_scavenge_session_blob() {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    let mut data = b"SNSS\x03\x00\x00\x00".to_vec();
    data.extend_from_slice(&[0; 92]);
    data.extend_from_slice(b"https://m.naver.com/");
    data.extend_from_slice(&[0x05, 0, 0, 0]);
    for unit in "NAVER".encode_utf16() {
        data.extend_from_slice(&unit.to_le_bytes());
    }
    data.extend_from_slice(&[0; 32]);
    // Chrome microseconds for 2024-03-15T08:30:00Z, before the URL
    data[60..68].copy_from_slice(&13354965000000000u64.to_le_bytes());

    let records = scavenge(&data, &now).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, "https://m.naver.com/");
    assert_eq!(records[0].title.as_deref(), Some("NAVER"));
    assert_eq!(
        records[0].timestamp.unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap()
    );
}

#[test]
fn test_scavenge_no_urls() {
    let now = Utc::now();
    assert!(scavenge(b"SNSS\x01\x00\x00\x00 no links here", &now)
        .unwrap()
        .is_empty());
}

#[test]
fn test_decoders() {
    assert_eq!(
        chrome_microseconds(13354965000000000).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap()
    );
    let instant = unix_seconds(1704067200).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    assert_eq!(normalize_session_time(&instant, &now), Some(instant));
}
