use log::warn;
use unicode_normalization::UnicodeNormalization;

/// Get a UTF16LE string from provided bytes data. NUL characters are removed
pub(crate) fn extract_utf16_string(data: &[u8]) -> String {
    let min_byte_size = 2;
    let utf16_data: Vec<u16> = data
        .chunks_exact(min_byte_size)
        .map(|wide_char| u16::from_le_bytes([wide_char[0], wide_char[1]]))
        .collect();

    let utf16_result = String::from_utf16(&utf16_data);
    match utf16_result {
        Ok(results) => results.replace('\0', ""),
        Err(err) => {
            warn!("[strings] Failed to get UTF16 string: {err:?}");
            String::from_utf16_lossy(&utf16_data).replace('\0', "")
        }
    }
}

/// Normalize a string to Unicode NFC. iOS stores most file names and plist strings in NFD
pub fn normalize_nfc(value: &str) -> String {
    value.nfc().collect()
}

/// The distinct spellings of a string: as given, NFC and NFD
pub(crate) fn unicode_forms(value: &str) -> Vec<String> {
    let mut forms = vec![value.to_string()];
    for form in [value.nfc().collect::<String>(), value.nfd().collect()] {
        if !forms.contains(&form) {
            forms.push(form);
        }
    }
    forms
}

/// Ratio of printable characters in a string. Empty strings return 0
pub(crate) fn printable_ratio(value: &str) -> f64 {
    let mut total = 0;
    let mut printable = 0;
    for character in value.chars() {
        total += 1;
        if !is_non_printable(character) {
            printable += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    printable as f64 / total as f64
}

/// Unicode format (`Cf`), line separator (`Zl`) and paragraph separator (`Zp`) code points
const FORMAT_RANGES: [(char, char); 24] = [
    ('\u{ad}', '\u{ad}'),
    ('\u{600}', '\u{605}'),
    ('\u{61c}', '\u{61c}'),
    ('\u{6dd}', '\u{6dd}'),
    ('\u{70f}', '\u{70f}'),
    ('\u{890}', '\u{891}'),
    ('\u{8e2}', '\u{8e2}'),
    ('\u{180e}', '\u{180e}'),
    ('\u{200b}', '\u{200f}'),
    ('\u{2028}', '\u{202e}'),
    ('\u{2060}', '\u{2064}'),
    ('\u{2066}', '\u{206f}'),
    ('\u{feff}', '\u{feff}'),
    ('\u{fff9}', '\u{fffb}'),
    ('\u{110bd}', '\u{110bd}'),
    ('\u{110cd}', '\u{110cd}'),
    ('\u{13430}', '\u{1343f}'),
    ('\u{1bca0}', '\u{1bca3}'),
    ('\u{1d173}', '\u{1d17a}'),
    ('\u{e0001}', '\u{e0001}'),
    ('\u{e0020}', '\u{e007f}'),
    ('\u{fffe}', '\u{ffff}'),
    ('\u{1fffe}', '\u{1ffff}'),
    ('\u{10fffe}', '\u{10ffff}'),
];

/// Check if a character is a control, format or separator code point (or a noncharacter)
pub(crate) fn is_non_printable(character: char) -> bool {
    if character.is_control() || character == '\u{fffd}' {
        return true;
    }
    FORMAT_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&character))
}

/// Remove U+FFFD and every non-printable character except new lines, carriage returns and tabs
pub(crate) fn strip_non_printable(value: &str) -> String {
    value
        .chars()
        .filter(|character| {
            matches!(character, '\n' | '\r' | '\t') || !is_non_printable(*character)
        })
        .collect()
}

/// Check if a character is in the Hangul syllable or Jamo blocks
pub(crate) fn is_hangul(character: char) -> bool {
    matches!(character,
        '\u{ac00}'..='\u{d7a3}' | '\u{1100}'..='\u{11ff}' | '\u{3130}'..='\u{318f}')
}

/// Case-insensitive substring check on NFC forms
pub(crate) fn contains_insensitive(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    normalize_nfc(haystack)
        .to_lowercase()
        .contains(&normalize_nfc(needle).to_lowercase())
}
