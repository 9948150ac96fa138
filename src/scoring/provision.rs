use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("model artifact {0} is missing and MODEL_URL is not set")]
    NotConfigured(PathBuf),
    #[error("model download failed: {0}")]
    Download(#[from] reqwest::Error),
    #[error("model download returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("model artifact io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// 确保模型文件存在，缺失时从 `url` 下载
///
/// 提供 `sha256` 时，已有文件和新下载的文件都必须校验通过。
/// 下载先写入同目录的 `.part` 文件，校验后再重命名
pub async fn ensure_model(
    path: &Path,
    url: Option<&str>,
    sha256: Option<&str>,
) -> Result<(), ProvisionError> {
    if tokio::fs::try_exists(path).await? {
        tracing::info!("Using model artifact at {}", path.display());
        if let Some(expected) = sha256 {
            let bytes = tokio::fs::read(path).await?;
            verify_checksum(expected, &hex_digest(&bytes))?;
        }
        return Ok(());
    }

    let url = url.ok_or_else(|| ProvisionError::NotConfigured(path.to_path_buf()))?;
    tracing::info!("Downloading model artifact from {}", url);

    let partial = path.with_extension("part");
    match download(url, &partial).await {
        Ok(actual) => {
            if let Some(expected) = sha256 {
                if let Err(e) = verify_checksum(expected, &actual) {
                    let _ = tokio::fs::remove_file(&partial).await;
                    return Err(e);
                }
            }
            tokio::fs::rename(&partial, path).await?;
            tracing::info!("Model artifact saved to {}", path.display());
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

async fn download(url: &str, dest: &Path) -> Result<String, ProvisionError> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(ProvisionError::Status(response.status()));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(format!("{:x}", hasher.finalize()))
}

fn hex_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn verify_checksum(expected: &str, actual: &str) -> Result<(), ProvisionError> {
    if expected.eq_ignore_ascii_case(actual) {
        Ok(())
    } else {
        Err(ProvisionError::ChecksumMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
