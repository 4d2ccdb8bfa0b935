//! Turns an uploaded image into base64 text for a JSON request body.
//!
//! The encoded text never carries a `data:` URI prefix. Attaching one is
//! up to whoever builds the outbound request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

/// Largest image accepted from an upload.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Image is empty")]
    Empty,

    #[error("Failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An image that has not necessarily been read yet.
#[derive(Clone, Debug)]
pub enum ImageBlob {
    Bytes(Arc<Vec<u8>>),
    File(PathBuf),
}

impl ImageBlob {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::Bytes(Arc::new(bytes))
    }

    /// Read the whole image into memory.
    pub async fn read(&self) -> Result<Arc<Vec<u8>>, EncodingError> {
        match self {
            Self::Bytes(bytes) => Ok(Arc::clone(bytes)),
            Self::File(path) => tokio::fs::read(path)
                .await
                .map(Arc::new)
                .map_err(|source| EncodingError::Io {
                    path: path.clone(),
                    source,
                }),
        }
    }
}

/// Read `blob` fully and return its base64 encoding.
pub async fn encode(blob: &ImageBlob) -> Result<String, EncodingError> {
    let bytes = blob.read().await?;
    if bytes.is_empty() {
        return Err(EncodingError::Empty);
    }
    Ok(BASE64.encode(bytes.as_slice()))
}

/// Drop a leading `data:<type>;base64,` prefix if present.
pub fn strip_data_uri(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(',') {
            return payload;
        }
    }
    trimmed
}

pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_encode_bytes() {
        let blob = ImageBlob::from_bytes(b"hello".to_vec());
        assert_eq!(encode(&blob).await.unwrap(), "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_encode_empty_fails() {
        let blob = ImageBlob::from_bytes(Vec::new());
        assert!(matches!(encode(&blob).await, Err(EncodingError::Empty)));
    }

    #[tokio::test]
    async fn test_encode_file() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF]).unwrap();

        let blob = ImageBlob::File(file.path().to_path_buf());
        assert_eq!(encode(&blob).await.unwrap(), "/9j/");
    }

    #[tokio::test]
    async fn test_encode_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blob = ImageBlob::File(dir.path().join("nope.png"));
        assert!(matches!(encode(&blob).await, Err(EncodingError::Io { .. })));
    }

    #[test]
    fn test_strip_data_uri() {
        assert_eq!(strip_data_uri("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_uri("AAAA"), "AAAA");
        assert_eq!(strip_data_uri("  AAAA\n"), "AAAA");
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("fridge.JPG")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("a/b.png")), "image/png");
        assert_eq!(
            media_type_for_path(Path::new("noext")),
            "application/octet-stream"
        );
    }
}
