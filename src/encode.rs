// SPDX-License-Identifier: MIT
//! File readers for the upload flow.
//!
//! The claims file travels inside the upload JSON as base64; rule files
//! travel as raw text.  Reads are chunked so large claim batches do not hold
//! two full copies of the raw bytes while encoding.  Read errors propagate to
//! the caller — nothing here is swallowed.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tokio::io::AsyncReadExt;

use crate::api::ApiError;

/// Multiple of 3 so every chunk encodes to complete base64 quartets and the
/// chunks concatenate without internal padding.
const READ_CHUNK_BYTES: usize = 48 * 1024;

/// Read a file and return its contents as one base64 string.
pub async fn read_base64(path: &Path) -> Result<String, ApiError> {
    let mut file = tokio::fs::File::open(path).await.map_err(|source| {
        ApiError::FileRead {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut encoded = String::new();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let mut filled = 0;
        // Fill the chunk completely (short of EOF) so only the final chunk
        // may have a non-multiple-of-3 length.
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..]).await.map_err(|source| {
                ApiError::FileRead {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            break;
        }
        BASE64.encode_string(&buf[..filled], &mut encoded);
        if filled < buf.len() {
            break;
        }
    }
    Ok(encoded)
}

/// Read a rules file as UTF-8 text.
pub async fn read_text(path: &Path) -> Result<String, ApiError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ApiError::FileRead {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_base64_matches_one_shot_encode() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("claims.csv");
        // Larger than one chunk, not a multiple of the chunk size.
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let encoded = read_base64(&path).await.unwrap();
        assert_eq!(encoded, BASE64.encode(&data));
    }

    #[tokio::test]
    async fn test_read_base64_empty_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, b"").unwrap();

        assert_eq!(read_base64(&path).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_errors_propagate() {
        let err = read_base64(Path::new("/nonexistent/claims.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::FileRead { .. }));

        let err = read_text(Path::new("/nonexistent/rules.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::FileRead { .. }));
    }

    #[tokio::test]
    async fn test_read_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[{\"rule_id\": \"T1\"}]").unwrap();

        assert_eq!(read_text(&path).await.unwrap(), "[{\"rule_id\": \"T1\"}]");
    }
}
