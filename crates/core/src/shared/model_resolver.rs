use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// A downloadable ONNX model identified by its file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: &'static str,
}

/// Resolve a model into the platform cache directory, downloading it on
/// first use.
pub fn resolve(spec: ModelSpec, progress: Option<ProgressFn>) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, spec, progress)
}

/// Resolve a model inside `dir`. An explicit directory is used by the CLI
/// `--models` flag and by tests.
pub fn resolve_in(
    dir: &Path,
    spec: ModelSpec,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let path = dir.join(spec.name);
    if path.exists() {
        log::debug!("Model {} found at {}", spec.name, path.display());
        return Ok(path);
    }

    fs::create_dir_all(dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {}", spec.name, spec.url);
    download(spec.url, &path, progress)?;
    Ok(path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceFind/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceFind/models/` or `~/.cache/FaceFind/models/`
/// - Windows: `%LOCALAPPDATA%/FaceFind/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceFind").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceFind").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = download_to(url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_to(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |source: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    // Stream in 1MB chunks; embedding models are well over 100MB.
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(write_err)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UNREACHABLE: ModelSpec = ModelSpec {
        name: "missing.onnx",
        url: "http://invalid.nonexistent.example.com/missing.onnx",
    };

    #[test]
    fn test_resolve_in_returns_existing_file_without_download() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.onnx");
        fs::write(&path, b"cached model").unwrap();

        let resolved = resolve_in(tmp.path(), UNREACHABLE, None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_resolve_in_creates_directory_before_download() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("models");

        let result = resolve_in(&dir, UNREACHABLE, None);
        assert!(result.is_err());
        assert!(dir.exists());
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("FaceFind"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download(UNREACHABLE.url, &dest, None);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
    }

    #[test]
    fn test_download_leaves_no_partial_file_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let _ = download(UNREACHABLE.url, &dest, None);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
