//! Artifact checksum calculation.
//!
//! Every file a target produces is reported with its size and SHA-256, so
//! release pipelines can publish checksums without hashing again.

use crate::bundler::{
    error::{ErrorExt, Result},
    target::Artifact,
};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Calculates the SHA-256 checksum of a file.
///
/// Reads the file in 8KB chunks to handle large executables.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash (64 characters)
/// * `Err` - If the file cannot be read
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Describes a produced file as an [`Artifact`].
pub async fn describe_artifact(kind: &str, path: PathBuf) -> Result<Artifact> {
    let size = tokio::fs::metadata(&path)
        .await
        .fs_context("reading artifact metadata", &path)?
        .len();
    let sha256 = calculate_sha256(&path).await?;

    Ok(Artifact {
        kind: kind.to_string(),
        path,
        size,
        sha256,
    })
}
