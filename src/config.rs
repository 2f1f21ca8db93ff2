//! Configuration: loading, validation, and defaults.
//!
//! A JSON file with serde-level defaults for every field, so a partial
//! config is always usable. A missing file falls back to defaults; invalid
//! JSON is warned about and replaced by defaults rather than aborting.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_store_dir() -> String {
    "db".to_string()
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    120
}

fn default_search_top_k() -> usize {
    4
}

fn default_lexical_chunk_size() -> usize {
    550
}

fn default_lexical_overlap() -> usize {
    100
}

fn default_lexical_top_k() -> usize {
    8
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding the vector index and metadata files.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Chunk window in characters for ingest.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Passages retrieved per question.
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default)]
    pub lexical: LexicalConfig,

    #[serde(default)]
    pub model: ModelConfig,
}

/// Settings for the ad-hoc lexical retrieval path (word windows).
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LexicalConfig {
    #[serde(default = "default_lexical_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_lexical_overlap")]
    pub overlap: usize,

    #[serde(default = "default_lexical_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    /// Embedding model the store's vectors came from. Informational until a
    /// real embedder backend is wired in.
    #[serde(default = "default_model_name")]
    pub name: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_top_k: default_search_top_k(),
            lexical: LexicalConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_lexical_chunk_size(),
            overlap: default_lexical_overlap(),
            top_k: default_lexical_top_k(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            dimensions: default_dimensions(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`. A missing
    /// file yields the default config; unparseable JSON is reported and
    /// replaced by the defaults.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.chunk_overlap < self.chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.lexical.chunk_size > 0,
            "lexical.chunk_size must be positive"
        );
        anyhow::ensure!(
            self.lexical.overlap < self.lexical.chunk_size,
            "lexical.overlap must be smaller than lexical.chunk_size"
        );
        anyhow::ensure!(self.lexical.top_k > 0, "lexical.top_k must be positive");
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
