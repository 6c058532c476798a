/// Labels used for phone numbers in `ABMultiValueLabel`
pub(crate) const PHONE_LABELS: [&str; 7] = [
    "_$!<Mobile>!$_",
    "_$!<Home>!$_",
    "_$!<Work>!$_",
    "_$!<Main>!$_",
    "iPhone",
    "mobile",
    "",
];

/// Labels used for email addresses
pub(crate) const EMAIL_LABELS: [&str; 4] = ["Home", "Work", "email", ""];

/**
 * Format a phone number.
 * Values with characters other than `+`, digits, whitespace or `-` are returned as-is.
 * Otherwise a `+82` prefix becomes `0`, everything but digits is removed and
 * 11 digit `010` numbers are formatted as `010-xxxx-xxxx`
 */
pub fn format_phone(value: &str) -> String {
    let opaque = value
        .chars()
        .any(|character| !(character == '+' || character == '-' || character.is_ascii_digit() || character.is_whitespace()));
    if opaque {
        return value.to_string();
    }

    let local = match value.strip_prefix("+82") {
        Some(rest) => format!("0{rest}"),
        None => value.to_string(),
    };
    let digits: String = local.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 11 && digits.starts_with("010") {
        return format!("{}-{}-{}", &digits[0..3], &digits[3..7], &digits[7..]);
    }
    digits
}

/// Digits of a formatted phone number, used for full text lookups
pub(crate) fn phone_digits(value: &str) -> String {
    format_phone(value)
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}
