use super::error::CompressionError;
use flate2::bufread::{MultiGzDecoder, ZlibDecoder};
use log::warn;
use std::io::Read;

/// Decompress raw gzip bytes. Data must start with the gzip signature
pub(crate) fn decompress_gzip_data(buffer: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if !buffer.starts_with(&[0x1f, 0x8b]) {
        return Err(CompressionError::GzipMagic);
    }
    let mut data = MultiGzDecoder::new(buffer);

    let mut decompress_data = Vec::new();
    let result = data.read_to_end(&mut decompress_data);
    if let Err(err) = result {
        warn!("[compression] Could not decompress gzip data: {err:?}");
        return Err(CompressionError::GzipDecompress);
    }

    Ok(decompress_data)
}

/// Decompress zlib data (with zlib header)
pub(crate) fn decompress_zlib(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut buffer = ZlibDecoder::new(data);
    let mut decompress_data = Vec::new();

    let result = buffer.read_to_end(&mut decompress_data);
    if let Err(err) = result {
        warn!("[compression] Could not decompress zlib data: {err:?}");
        return Err(CompressionError::ZlibDecompress);
    }

    Ok(decompress_data)
}

#[cfg(test)]
mod tests {
    use super::{decompress_gzip_data, decompress_zlib};
    use flate2::{write::ZlibEncoder, Compression};
    use std::io::Write;

    #[test]
    fn test_decompress_zlib() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello notes").unwrap();
        let data = encoder.finish().unwrap();

        assert_eq!(decompress_zlib(&data).unwrap(), b"hello notes");
    }

    #[test]
    fn test_decompress_zlib_bad_data() {
        assert!(decompress_zlib(b"not zlib at all").is_err());
    }

    #[test]
    fn test_decompress_gzip_not_gzip() {
        assert!(decompress_gzip_data(b"plain").is_err());
    }
}
