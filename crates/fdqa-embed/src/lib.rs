//! Embedding provider backed by a candle XLM-RoBERTa encoder.
//!
//! The default model is KURE-v1 (a BGE-M3 derivative, 1024-d). Model files are
//! resolved from the pinned local directory first and from the Hugging Face
//! hub second; set `APP_USE_FAKE_EMBEDDINGS=1` to skip model loading entirely.
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use fdqa_core::config::{expand_path, EmbeddingSettings};
use fdqa_core::traits::Embedder;
use fdqa_core::{Error, Result};
use tokenizers::Tokenizer;
use tracing::{debug, info};

pub mod device;
pub mod fake;
pub mod pool;
pub mod resolve;
pub mod tokenize;

pub use device::{select_device, DeviceKind};
pub use fake::FakeEmbedder;
pub use pool::{masked_mean_l2, Pooling};
pub use resolve::{hub_model_files, local_model_files, resolve_with_fallback, ModelFiles, WeightsFile};

pub const FAKE_EMBEDDING_DIM: usize = 1024;

fn candle_err(e: candle_core::Error) -> Error {
    Error::Embedding(e.to_string())
}

pub struct EmbeddingModel {
    id: String,
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    pooling: Pooling,
}

impl EmbeddingModel {
    pub fn load(files: &ModelFiles, device: Device, max_len: usize, pooling: Pooling) -> Result<Self> {
        let started = Instant::now();
        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| Error::Embedding(format!("failed to load tokenizer from {}: {e}", files.tokenizer.display())))?;
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&files.config)?)
            .map_err(|e| Error::Embedding(format!("invalid model config {}: {e}", files.config.display())))?;
        let dim = config.hidden_size;
        let vb = match &files.weights {
            // SAFETY: the weights file is not modified while mapped.
            WeightsFile::Safetensors(path) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[path], DType::F32, &device).map_err(candle_err)?
            },
            WeightsFile::Pickle(path) => {
                let weights = candle_core::pickle::read_all(path).map_err(candle_err)?;
                let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
                VarBuilder::from_tensors(weights_map, DType::F32, &device)
            }
        };
        let model = XLMRobertaModel::new(&config, vb).map_err(candle_err)?;
        info!(model = %files.id, dim, elapsed_ms = started.elapsed().as_millis() as u64, "embedding model loaded");
        Ok(Self { id: files.id.clone(), model, tokenizer, device, dim, max_len, pooling })
    }

    /// Pinned local directory first, hosted model id second.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let device = select_device(settings.device.parse()?);
        let pooling: Pooling = settings.pooling.parse()?;
        let local = settings.model_path.as_deref().filter(|p| !p.trim().is_empty());
        let files = match local {
            Some(path) => resolve_with_fallback(
                path,
                || local_model_files(&expand_path(path)),
                &settings.model_name,
                || hub_model_files(&settings.model_name),
            )?,
            None => hub_model_files(&settings.model_name)?,
        };
        Self::load(&files, device, settings.max_len, pooling)
    }

    fn forward(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) = tokenize::tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like().map_err(candle_err)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)
            .map_err(candle_err)?;
        let pooled = pool::pool(self.pooling, &hidden, &attention_mask).map_err(candle_err)?;
        let v: Vec<f32> = pooled
            .to_device(&Device::Cpu)
            .and_then(|t| t.squeeze(0))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.to_vec1())
            .map_err(candle_err)?;
        if v.len() != self.dim {
            return Err(Error::Embedding(format!("expected {}-d embedding, got {}", self.dim, v.len())));
        }
        Ok(v)
    }
}

impl Embedder for EmbeddingModel {
    fn model_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let v = self.forward(text)?;
        if start.elapsed().as_millis() > 100 {
            debug!(elapsed_ms = start.elapsed().as_millis() as u64, chars = text.chars().count(), "slow embedding");
        }
        Ok(v)
    }
}

pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Built once at startup and shared read-only by every retriever.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_requested() {
        info!("using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    Ok(Arc::new(EmbeddingModel::from_settings(settings)?))
}
