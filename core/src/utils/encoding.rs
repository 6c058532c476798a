use base64::{engine::general_purpose, DecodeError, Engine};

/// Base64 encode data using the STANDARD engine (alphabet along with "+" and "/")
pub(crate) fn base64_encode_standard(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

/// Base64 decode data use the STANDARD engine (alphabet along with "+" and "/")
pub(crate) fn base64_decode_standard(data: &str) -> Result<Vec<u8>, DecodeError> {
    general_purpose::STANDARD.decode(data)
}

/// Format bytes as lowercase hex, optionally joined by a separator
pub(crate) fn hex_string(data: &[u8], separator: &str) -> String {
    data.iter()
        .map(|value| format!("{value:02x}"))
        .collect::<Vec<String>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::{base64_decode_standard, base64_encode_standard, hex_string};

    #[test]
    fn test_base64_encode_standard() {
        let test = b"Hello word!";
        let result = base64_encode_standard(test);
        assert_eq!(result, "SGVsbG8gd29yZCE=")
    }

    #[test]
    fn test_base64_decode_standard() {
        let test = "SGVsbG8gd29yZCE=";
        let result = base64_decode_standard(test).unwrap();
        assert_eq!(result, b"Hello word!")
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[0, 17, 255], ":"), "00:11:ff");
        assert_eq!(hex_string(&[0xab, 0xcd], ""), "abcd");
    }
}
