//! File checksum computation.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use imgvault_types::Checksum;

/// Read chunk size for hashing; large images are read incrementally.
const HASH_CHUNK: usize = 64 * 1024;

/// Computes the SHA-256 checksum of a file on disk.
pub async fn sha256_file(path: &Path) -> Result<Checksum, std::io::Error> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest: [u8; 32] = hasher.finalize().into();
    Ok(Checksum::from_digest(&digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sha256_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        tokio::fs::write(&path, b"").await.unwrap();

        let sum = sha256_file(&path).await.unwrap();
        assert_eq!(
            sum.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_sha256_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        tokio::fs::write(&path, b"abc").await.unwrap();

        let sum = sha256_file(&path).await.unwrap();
        assert_eq!(
            sum.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_sha256_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = sha256_file(&dir.path().join("nope")).await;
        assert!(result.is_err());
    }
}
