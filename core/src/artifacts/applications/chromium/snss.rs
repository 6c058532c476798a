/**
 * Carve `(url, title, timestamp)` records out of Chrome SNSS session files without parsing the command log.
 *
 * For every ASCII URL found:
 *   Timestamps are guessed from aligned 8 byte and 4 byte little endian values around the URL start.
 *   Every value accepted by a decoder and by the session window is a candidate and the latest one wins
 *   Titles are guessed right after the URL, either as a u32 length prefixed UTF16 string
 *   or as a NUL separated run of ASCII (UTF16LE without the length)
 */
use super::error::ChromiumError;
use crate::utils::{
    nom_helper::{nom_unsigned_eight_bytes, nom_unsigned_four_bytes, Endian},
    strings::{extract_utf16_string, printable_ratio},
    time::{
        apple_microseconds, apple_milliseconds, apple_seconds, chrome_microseconds,
        normalize_session_time, unix_microseconds, unix_milliseconds, unix_seconds,
    },
};
use chrono::{DateTime, Utc};
use common::applications::SessionRecord;
use log::{error, warn};
use regex::bytes::Regex;

type Decoder = fn(u64) -> Option<DateTime<Utc>>;

const LONG_DECODERS: [Decoder; 5] = [
    chrome_microseconds,
    unix_microseconds,
    unix_milliseconds,
    apple_microseconds,
    apple_milliseconds,
];
const SHORT_DECODERS: [Decoder; 2] = [unix_seconds, apple_seconds];

/// 8 byte scan window relative to the URL start
const LONG_WINDOW: (isize, isize) = (-64, 32);
/// 4 byte scan window relative to the URL start
const SHORT_WINDOW: (isize, isize) = (-32, 16);
const SCAN_STEP: usize = 4;

const MAX_TITLE_UNITS: u32 = 512;
const MIN_PRINTABLE: f64 = 0.7;

/// Scan a session blob using the current time to undo the future offset
pub fn parse_snss(data: &[u8]) -> Result<Vec<SessionRecord>, ChromiumError> {
    scavenge(data, &Utc::now())
}

/// Scan a session blob. `now` decides which decoded timestamps are in the future
pub fn scavenge(data: &[u8], now: &DateTime<Utc>) -> Result<Vec<SessionRecord>, ChromiumError> {
    let url_regex = match Regex::new(r"(?-u)https?://[\x21-\x7e]+") {
        Ok(result) => result,
        Err(err) => {
            error!("[snss] Could not compile URL regex: {err:?}");
            return Err(ChromiumError::Regex);
        }
    };
    let ascii_regex = match Regex::new(r"(?-u)^(?:[\x20-\x7e]\x00){3,}") {
        Ok(result) => result,
        Err(err) => {
            error!("[snss] Could not compile title regex: {err:?}");
            return Err(ChromiumError::Regex);
        }
    };

    let mut records = Vec::new();
    for hit in url_regex.find_iter(data) {
        let start = hit.start();
        let url_bytes = trim_url(hit.as_bytes());
        if url_bytes.is_empty() {
            continue;
        }
        let end = start + url_bytes.len();

        records.push(SessionRecord {
            url: String::from_utf8_lossy(url_bytes).to_string(),
            title: guess_title(data, end, &ascii_regex),
            timestamp: guess_timestamp(data, start, end, now),
        });
    }
    Ok(records)
}

/// Drop trailing quotes, brackets and NUL bytes
fn trim_url(url: &[u8]) -> &[u8] {
    let mut end = url.len();
    while end > 0 && matches!(url[end - 1], b'"' | b'\'' | b')' | b']' | 0) {
        end -= 1;
    }
    &url[..end]
}

/// Offsets of `size` byte windows inside the scan range that do not overlap the URL itself
fn window_offsets(
    data_len: usize,
    start: usize,
    end: usize,
    range: (isize, isize),
    size: usize,
) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut delta = range.0;
    while delta <= range.1 {
        let position = start as isize + delta;
        delta += SCAN_STEP as isize;
        if position < 0 {
            continue;
        }
        let position = position as usize;
        if position + size > data_len {
            continue;
        }
        if position < end && position + size > start {
            continue;
        }
        offsets.push(position);
    }
    offsets
}

fn guess_timestamp(
    data: &[u8],
    start: usize,
    end: usize,
    now: &DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let mut candidates = Vec::new();

    for offset in window_offsets(data.len(), start, end, LONG_WINDOW, 8) {
        let value = match nom_unsigned_eight_bytes(&data[offset..], Endian::Le) {
            Ok((_, result)) => result,
            Err(_) => continue,
        };
        for decoder in LONG_DECODERS {
            if let Some(instant) = decoder(value).and_then(|value| normalize_session_time(&value, now)) {
                candidates.push(instant);
            }
        }
    }

    for offset in window_offsets(data.len(), start, end, SHORT_WINDOW, 4) {
        let value = match nom_unsigned_four_bytes(&data[offset..], Endian::Le) {
            Ok((_, result)) => result,
            Err(_) => continue,
        };
        for decoder in SHORT_DECODERS {
            if let Some(instant) =
                decoder(u64::from(value)).and_then(|value| normalize_session_time(&value, now))
            {
                candidates.push(instant);
            }
        }
    }

    candidates.into_iter().max()
}

fn guess_title(data: &[u8], end: usize, ascii_regex: &Regex) -> Option<String> {
    if let Some(title) = length_prefixed_title(data, end) {
        return Some(title);
    }
    wide_ascii_title(data, end, ascii_regex)
}

fn accept_title(title: String) -> Option<String> {
    if title.is_empty() || printable_ratio(&title) < MIN_PRINTABLE {
        return None;
    }
    Some(title)
}

/**
 * u32 unit count followed by UTF16LE.
 * Pickled strings are padded to 4 bytes, so an odd count may leave one printable ASCII unit in the padding.
 * That single unit is kept. Nothing past the padding is read
 */
fn length_prefixed_title(data: &[u8], end: usize) -> Option<String> {
    let (_, length) = nom_unsigned_four_bytes(data.get(end..)?, Endian::Le).ok()?;
    if !(1..=MAX_TITLE_UNITS).contains(&length) {
        return None;
    }
    let title_start = end + 4;
    let mut title_end = title_start + 2 * length as usize;
    if title_end > data.len() {
        return None;
    }
    if (title_end - title_start) % 4 == 2
        && title_end + 2 <= data.len()
        && data[title_end + 1] == 0
        && (0x20..=0x7e).contains(&data[title_end])
    {
        title_end += 2;
    }
    accept_title(extract_utf16_string(&data[title_start..title_end]))
}

/// NUL followed by at least three `(ascii, NUL)` pairs
fn wide_ascii_title(data: &[u8], end: usize, ascii_regex: &Regex) -> Option<String> {
    if data.get(end) != Some(&0) {
        return None;
    }
    let remaining = data.get(end + 1..)?;
    let hit = ascii_regex.find(remaining)?;
    let title = accept_title(extract_utf16_string(hit.as_bytes()));
    if title.is_none() {
        warn!("[snss] Rejected title candidate at offset {end}");
    }
    title
}
