//! Typed settings loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_RETRIEVAL__SEARCH_K=1`). The bare
//! `GEMINI_API_KEY` variable is honoured as the generator credential.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vector: VectorSettings,
    pub embedding: EmbeddingSettings,
    pub generator: GeneratorSettings,
    pub retrieval: RetrievalSettings,
    pub prompts: PromptSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    pub db_path: String,
    pub collection: String,
    pub qa_db_path: String,
    pub qa_collection: String,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            db_path: "./vector_db/franchise".to_string(),
            collection: "contracts_collection".to_string(),
            qa_db_path: "./vector_db/qa_knowledge_base".to_string(),
            qa_collection: "contracts_qa_collection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Pinned local model directory; tried first.
    pub model_path: Option<String>,
    /// Hosted model id used when the local directory cannot be loaded.
    pub model_name: String,
    /// `cpu`, `cuda` or `metal`.
    pub device: String,
    pub max_len: usize,
    /// `cls` or `mean`.
    pub pooling: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_path: None,
            model_name: "nlpai-lab/KURE-v1".to_string(),
            device: "cpu".to_string(),
            max_len: 512,
            pooling: "cls".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub model_name: String,
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model_name: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

impl GeneratorSettings {
    /// The credential has no default; anything that talks to the generator must call this.
    pub fn require_api_key(&self) -> Result<&str> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(Error::InvalidConfig(
                "generator API key is not set (GEMINI_API_KEY or APP_GENERATOR__API_KEY)".to_string(),
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub search_k: usize,
    pub context_max_length: usize,
    pub max_examples: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { search_k: 5, context_max_length: 8000, max_examples: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub template_path: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self { template_path: "./data/prompt_template.toml".to_string() }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::from_figment(Self::figment(&env_name))
    }

    /// Layered provider stack for `env_name`, exposed so callers (and tests) can merge overrides.
    pub fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["GEMINI_API_KEY"]).map(|_| "generator.api_key".into()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.search_k == 0 {
            return Err(Error::InvalidConfig("retrieval.search_k must be >= 1".to_string()));
        }
        if self.retrieval.context_max_length == 0 {
            return Err(Error::InvalidConfig("retrieval.context_max_length must be >= 1".to_string()));
        }
        if self.vector.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.collection must not be empty".to_string()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::InvalidConfig("embedding.max_len must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
