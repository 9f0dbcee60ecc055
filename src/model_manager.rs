use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::models::BuiltinModel;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Downloads and caches the scorer artifacts (ONNX export plus
/// tokenizer), verifying sha256 hashes on every path that touches
/// disk. Concurrent downloads of the same artifact are serialized
/// through an async lock.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager rooted at the default cache location.
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Resolves the cache directory: `CRITICORE_CACHE` env override,
    /// then the platform cache dir, then `~/.cache`, then the system
    /// temp dir.
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var("CRITICORE_CACHE") {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("criticore").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("criticore").join("models");
        }

        env::temp_dir().join("criticore").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn get_model_path(&self, model: BuiltinModel) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join("model.onnx")
    }

    pub fn get_tokenizer_path(&self, model: BuiltinModel) -> PathBuf {
        let info = model.get_model_info();
        self.models_dir.join(info.name).join("tokenizer.json")
    }

    pub fn is_model_downloaded(&self, model: BuiltinModel) -> bool {
        let model_path = self.get_model_path(model);
        let tokenizer_path = self.get_tokenizer_path(model);
        log::debug!(
            "Artifact check: model {:?} (exists: {}), tokenizer {:?} (exists: {})",
            model_path,
            model_path.exists(),
            tokenizer_path,
            tokenizer_path.exists()
        );
        model_path.exists() && tokenizer_path.exists()
    }

    pub async fn download_model(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let info = model.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(model);
        let model_result = if model_path.exists() {
            if !self.verify_file(&model_path, &info.model_hash)? {
                log::warn!("Model file failed verification, redownloading");
                self.download_and_verify_file(&info.model_url, &model_path, &info.model_hash, "model")
                    .await
            } else {
                log::info!("Existing model file verified");
                Ok(())
            }
        } else {
            self.download_and_verify_file(&info.model_url, &model_path, &info.model_hash, "model")
                .await
        };

        let tokenizer_path = self.get_tokenizer_path(model);
        let tokenizer_result = if tokenizer_path.exists() {
            if !self.verify_file(&tokenizer_path, &info.tokenizer_hash)? {
                log::warn!("Tokenizer file failed verification, redownloading");
                self.download_and_verify_file(
                    &info.tokenizer_url,
                    &tokenizer_path,
                    &info.tokenizer_hash,
                    "tokenizer",
                )
                .await
            } else {
                log::info!("Existing tokenizer file verified");
                Ok(())
            }
        } else {
            self.download_and_verify_file(
                &info.tokenizer_url,
                &tokenizer_path,
                &info.tokenizer_hash,
                "tokenizer",
            )
            .await
        };

        match (model_result, tokenizer_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and tokenizer ready");
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                log::error!("Artifact setup failed: {}", e);
                // Leave no partial download behind
                let _ = self.remove_download(model);
                Err(e)
            }
        }
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::debug!("Verifying {:?}: got {}, want {}", path, hash, expected_hash);
        Ok(hash == expected_hash)
    }

    pub fn verify_model(&self, model: BuiltinModel) -> Result<bool, ModelError> {
        let info = model.get_model_info();
        let model_path = self.get_model_path(model);
        let tokenizer_path = self.get_tokenizer_path(model);

        if !model_path.exists() || !tokenizer_path.exists() {
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, &info.model_hash)?;
        let tokenizer_ok = self.verify_file(&tokenizer_path, &info.tokenizer_hash)?;

        Ok(model_ok && tokenizer_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: &str,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());

        if hash != expected_hash {
            log::error!(
                "{} hash mismatch: expected {}, got {}",
                file_type,
                expected_hash,
                hash
            );
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, bytes)?;

        // Re-read what actually landed on disk
        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified", file_type);
        Ok(())
    }

    pub fn remove_download(&self, model: BuiltinModel) -> Result<(), ModelError> {
        let model_path = self.get_model_path(model);
        let tokenizer_path = self.get_tokenizer_path(model);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if tokenizer_path.exists() {
            fs::remove_file(&tokenizer_path)?;
        }
        Ok(())
    }

    /// Ensures the artifact is present and verified, downloading or
    /// re-downloading as needed.
    pub async fn ensure_model_downloaded(&self, model: BuiltinModel) -> Result<(), ModelError> {
        if !self.is_model_downloaded(model) {
            log::info!("Artifact not found in cache, downloading");
            self.download_model(model).await?;
        } else if !self.verify_model(model)? {
            log::info!("Artifact failed verification, re-downloading");
            self.remove_download(model)?;
            self.download_model(model).await?;
        } else {
            log::debug!("Artifact present and verified");
        }
        Ok(())
    }
}
