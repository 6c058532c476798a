/**
 * Note bodies are stored in several encodings depending on iOS version and sync source:
 * zlib, gzip, base64 wrapped zlib/gzip or plain UTF8. Decoded text often ends in binary protobuf noise
 * which is trimmed at the first run of three noise lines
 */
use crate::utils::{
    compression::decompress::{decompress_gzip_data, decompress_zlib},
    encoding::base64_decode_standard,
    strings::{is_hangul, strip_non_printable},
};

/// Lines with less than this share of letters and digits are noise
const NOISE_RATIO: f64 = 0.3;
/// Consecutive noise lines that end the readable text
const NOISE_RUN: usize = 3;

/// Check the two byte zlib header (CMF/FLG)
fn has_zlib_header(data: &[u8]) -> bool {
    if data.len() < 2 {
        return false;
    }
    let header = u16::from(data[0]) << 8 | u16::from(data[1]);
    data[0] & 0x0f == 8 && header % 31 == 0
}

fn inflate(data: &[u8]) -> Option<String> {
    if has_zlib_header(data) {
        if let Ok(result) = decompress_zlib(data) {
            return Some(String::from_utf8_lossy(&result).to_string());
        }
    }
    if data.starts_with(&[0x1f, 0x8b]) {
        if let Ok(result) = decompress_gzip_data(data) {
            return Some(String::from_utf8_lossy(&result).to_string());
        }
    }
    None
}

/// Decode a body candidate. zlib, then gzip, then base64 wrapped zlib/gzip, then raw UTF8
pub(crate) fn decode_blob(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if let Some(text) = inflate(data) {
        return Some(text);
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let compact: String = text.chars().filter(|value| !value.is_whitespace()).collect();
        if let Ok(decoded) = base64_decode_standard(&compact) {
            if let Some(text) = inflate(&decoded) {
                return Some(text);
            }
        }
    }

    Some(String::from_utf8_lossy(data).to_string())
}

fn is_noise(line: &str) -> bool {
    let total = line.chars().count();
    if total == 0 {
        return false;
    }
    let readable = line
        .chars()
        .filter(|character| character.is_alphanumeric() || is_hangul(*character))
        .count();
    (readable as f64 / total as f64) < NOISE_RATIO
}

/// Remove non-printable characters and cut the text at the first run of noise lines
pub(crate) fn clean_text(text: &str) -> String {
    let printable = strip_non_printable(text);
    let lines: Vec<&str> = printable.split('\n').collect();

    let mut end = lines.len();
    let mut run = 0;
    for (index, line) in lines.iter().enumerate() {
        if is_noise(line.trim_end_matches('\r')) {
            run += 1;
            if run == NOISE_RUN {
                end = index + 1 - NOISE_RUN;
                break;
            }
        } else {
            run = 0;
        }
    }

    lines[..end].join("\n").trim_end().to_string()
}

/// Decode and clean a body candidate
pub(crate) fn decode_body(data: &[u8]) -> Option<String> {
    let text = clean_text(&decode_blob(data)?);
    if text.is_empty() {
        return None;
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::{clean_text, decode_blob, decode_body, has_zlib_header};
    use crate::utils::encoding::base64_encode_standard;
    use flate2::{
        write::{GzEncoder, ZlibEncoder},
        Compression,
    };
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_zlib_with_noise() {
        let mut text = b"hello\n".to_vec();
        for _ in 0..4 {
            text.extend_from_slice(&[0x01, 0x9f, 0x2a, 0x00, 0xff, 0x3f, 0x07, b'\n']);
        }
        assert_eq!(decode_body(&zlib(&text)).unwrap(), "hello");
    }

    #[test]
    fn test_cascade() {
        assert_eq!(decode_blob(&gzip("메모 본문".as_bytes())).unwrap(), "메모 본문");

        let wrapped = base64_encode_standard(&zlib(b"wrapped note"));
        assert_eq!(decode_blob(wrapped.as_bytes()).unwrap(), "wrapped note");

        assert_eq!(decode_blob(b"plain note").unwrap(), "plain note");
        assert!(decode_blob(b"").is_none());
    }

    #[test]
    fn test_zlib_header() {
        assert!(has_zlib_header(&zlib(b"a")));
        assert!(!has_zlib_header(b"plain"));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("a\u{fffd}b\tc\n"), "ab\tc");
        assert_eq!(clean_text("first\n##\n$$\nsecond\n%%\n^^\n&&\nhidden"), "first\n##\n$$\nsecond");
        assert_eq!(clean_text("##\n$$\n%%"), "");
        assert_eq!(clean_text("장보기 목록\n- 우유\n\n- 계란"), "장보기 목록\n- 우유\n\n- 계란");
    }
}
