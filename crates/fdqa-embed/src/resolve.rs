//! Locating model files: a pinned local directory first, the hosted hub id second.

use std::path::{Path, PathBuf};

use fdqa_core::{Error, Result};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightsFile {
    Safetensors(PathBuf),
    Pickle(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ModelFiles {
    /// Directory path or hub id the files came from.
    pub id: String,
    pub tokenizer: PathBuf,
    pub config: PathBuf,
    pub weights: WeightsFile,
}

/// Try `primary`; if it fails, log the substitution and try `fallback`.
/// Both failing reports both causes.
pub fn resolve_with_fallback<T>(
    primary_label: &str,
    primary: impl FnOnce() -> Result<T>,
    fallback_label: &str,
    fallback: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let first = match primary() {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };
    warn!(primary = primary_label, fallback = fallback_label, error = %first, "primary resource failed to load, falling back");
    fallback().map_err(|second| {
        Error::Embedding(format!(
            "could not load '{primary_label}' ({first}) nor fallback '{fallback_label}' ({second})"
        ))
    })
}

pub fn local_model_files(dir: &Path) -> Result<ModelFiles> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!("model directory {}", dir.display())));
    }
    let tokenizer = require_file(dir, "tokenizer.json")?;
    let config = require_file(dir, "config.json")?;
    let weights = if dir.join("model.safetensors").is_file() {
        WeightsFile::Safetensors(dir.join("model.safetensors"))
    } else {
        WeightsFile::Pickle(require_file(dir, "pytorch_model.bin")?)
    };
    info!(dir = %dir.display(), "using local model files");
    Ok(ModelFiles { id: dir.display().to_string(), tokenizer, config, weights })
}

/// Downloads (or reuses the cache of) `repo_id` from the Hugging Face hub.
pub fn hub_model_files(repo_id: &str) -> Result<ModelFiles> {
    let hub_err = |e: hf_hub::api::sync::ApiError| Error::Embedding(format!("hub model {repo_id}: {e}"));
    let api = hf_hub::api::sync::Api::new().map_err(hub_err)?;
    let repo = api.model(repo_id.to_string());
    info!(repo = repo_id, "fetching model files from hub");
    let tokenizer = repo.get("tokenizer.json").map_err(hub_err)?;
    let config = repo.get("config.json").map_err(hub_err)?;
    let weights = match repo.get("model.safetensors") {
        Ok(p) => WeightsFile::Safetensors(p),
        Err(_) => WeightsFile::Pickle(repo.get("pytorch_model.bin").map_err(hub_err)?),
    };
    Ok(ModelFiles { id: repo_id.to_string(), tokenizer, config, weights })
}

fn require_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let p = dir.join(name);
    if p.is_file() { Ok(p) } else { Err(Error::NotFound(format!("{}", p.display()))) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn primary_success_skips_fallback() {
        let called = Cell::new(false);
        let v = resolve_with_fallback("local", || Ok(1), "hub", || { called.set(true); Ok(2) }).unwrap();
        assert_eq!(v, 1);
        assert!(!called.get());
    }

    #[test]
    fn primary_failure_uses_fallback() {
        let v = resolve_with_fallback("local", || Err(Error::NotFound("x".into())), "hub", || Ok(2)).unwrap();
        assert_eq!(v, 2);
    }

    #[test]
    fn both_failing_is_an_embedding_error() {
        let err = resolve_with_fallback::<()>(
            "local",
            || Err(Error::NotFound("dir".into())),
            "hub",
            || Err(Error::Embedding("offline".into())),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, Error::Embedding(_)));
        assert!(msg.contains("dir") && msg.contains("offline"), "{msg}");
    }

    #[test]
    fn local_dir_requires_tokenizer_config_and_weights() {
        let dir = tempfile::TempDir::new().unwrap();
        let tmp = dir.path();
        assert!(local_model_files(tmp).is_err());
        std::fs::write(tmp.join("tokenizer.json"), "{}").unwrap();
        std::fs::write(tmp.join("config.json"), "{}").unwrap();
        assert!(local_model_files(tmp).is_err(), "weights still missing");
        std::fs::write(tmp.join("model.safetensors"), "").unwrap();
        let files = local_model_files(tmp).unwrap();
        assert_eq!(files.weights, WeightsFile::Safetensors(tmp.join("model.safetensors")));
    }
}
