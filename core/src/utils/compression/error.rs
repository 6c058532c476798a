use std::fmt;

#[derive(Debug)]
pub(crate) enum CompressionError {
    CompressCreate,
    GzipFinish,
    GzipDecompress,
    GzipMagic,
    ZlibDecompress,
}

impl std::error::Error for CompressionError {}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::CompressCreate => write!(f, "Could not compress data"),
            CompressionError::GzipFinish => write!(f, "Could not finish gzip compression"),
            CompressionError::GzipDecompress => write!(f, "Could not decompress gzip data"),
            CompressionError::GzipMagic => write!(f, "Data does not have gzip signature"),
            CompressionError::ZlibDecompress => write!(f, "Could not decompress zlib data"),
        }
    }
}
