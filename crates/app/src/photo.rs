//! Contact photo encoding.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Largest photo accepted before encoding.
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Reads an image file and encodes it as a `data:` URL.
pub fn data_url(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read photo {}", path.display()))?;
    anyhow::ensure!(
        bytes.len() <= MAX_PHOTO_BYTES,
        "photo {} is larger than {} MiB",
        path.display(),
        MAX_PHOTO_BYTES / (1024 * 1024)
    );

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_png_becomes_data_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("avatar.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        assert_eq!(data_url(&path).unwrap(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("avatar.unknownext");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(data_url(&path).unwrap(), "data:application/octet-stream;base64,YWJj");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(data_url(Path::new("/definitely/not/here.jpg")).is_err());
    }
}
