use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::chunk::{ChunkParams, DEFAULT_MAX_CHARS, DEFAULT_MIN_CHARS};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

impl ChunkingConfig {
    pub fn params(&self) -> ChunkParams {
        ChunkParams {
            max_chars: self.max_chars,
            min_chars: self.min_chars,
        }
    }
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}
fn default_min_chars() -> usize {
    DEFAULT_MIN_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

impl RetrievalConfig {
    /// Passage count for a request: `requested` if given, else `max_chunks`.
    pub fn limit(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            Some(0) => anyhow::bail!("limit must be >= 1"),
            Some(n) => Ok(n),
            None => Ok(self.max_chunks),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chunks: default_max_chunks(),
        }
    }
}

fn default_max_chunks() -> usize {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct KnowledgeConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub mandatory: Vec<MandatoryConfig>,
}

/// A reference document. `location` is a file path or an http(s) URL.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub tag: String,
    pub location: String,
}

impl SourceConfig {
    pub fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

/// A passage always included in retrieval results.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MandatoryConfig {
    pub key: String,
    /// Tag of the source the passage is cut from.
    pub source: String,
    /// Regex locating the section heading.
    pub start: String,
    /// Regex bounding the passage; runs to end of document if absent.
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default = "default_snippet_chars")]
    pub max_chars: usize,
}

fn default_snippet_chars() -> usize {
    1600
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }

    // Validate retrieval
    if config.retrieval.max_chunks < 1 {
        anyhow::bail!("retrieval.max_chunks must be >= 1");
    }

    // Validate knowledge sources
    let mut tags = HashSet::new();
    for source in &config.knowledge.sources {
        if source.tag.trim().is_empty() {
            anyhow::bail!("knowledge.sources: tag must not be empty");
        }
        if source.location.trim().is_empty() {
            anyhow::bail!("knowledge.sources '{}': location must not be empty", source.tag);
        }
        if !tags.insert(source.tag.as_str()) {
            anyhow::bail!("knowledge.sources: duplicate tag '{}'", source.tag);
        }
    }

    for snippet in &config.knowledge.mandatory {
        if !tags.contains(snippet.source.as_str()) {
            anyhow::bail!(
                "knowledge.mandatory '{}': unknown source '{}'",
                snippet.key,
                snippet.source
            );
        }
        if snippet.max_chars == 0 {
            anyhow::bail!("knowledge.mandatory '{}': max_chars must be > 0", snippet.key);
        }
    }

    Ok(config)
}
