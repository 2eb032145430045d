//! Lazily loaded, process-wide knowledge base.
//!
//! The configured reference documents are fetched concurrently on first use,
//! chunked, and cached as a single [`Corpus`] for the lifetime of the
//! [`KnowledgeBase`]. Loading is single-flight: concurrent callers wait for
//! the same in-flight load. A failed load leaves the cache empty, so the next
//! retrieval retries the fetch.
//!
//! ```text
//! sources ──▶ DocumentLoader (fs / http, concurrent) ──▶ Corpus::build
//!                                                           │
//!                                  OnceCell<Arc<Corpus>> ◀──┘
//! ```

use anyhow::Context;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::chunk::ChunkParams;
use crate::config::{Config, MandatoryConfig, SourceConfig};
use crate::extract::{self, MIME_PDF};
use crate::rank::{Corpus, SourceDocument};

#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// A reference document could not be fetched.
    #[error("reference document '{tag}' unavailable: {reason}")]
    Unavailable { tag: String, reason: String },
    /// A reference document was fetched but could not be decoded.
    #[error("reference document '{tag}' could not be read: {reason}")]
    Extract { tag: String, reason: String },
}

impl KnowledgeError {
    pub fn source_tag(&self) -> &str {
        match self {
            KnowledgeError::Unavailable { tag, .. } | KnowledgeError::Extract { tag, .. } => tag,
        }
    }
}

/// Fetches the raw text of one reference document.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &SourceConfig) -> Result<String, KnowledgeError>;
}

/// Loads documents from local files or http(s) URLs, extracting text from
/// PDFs.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLoader {
    client: reqwest::Client,
}

impl ReferenceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    async fn fetch(&self, source: &SourceConfig) -> anyhow::Result<(Vec<u8>, String)> {
        let by_extension = extract::content_type_for(&source.location);

        if !source.is_remote() {
            let bytes = tokio::fs::read(&source.location)
                .await
                .with_context(|| format!("failed to read {}", source.location))?;
            return Ok((bytes, by_extension.to_string()));
        }

        let response = self
            .client
            .get(&source.location)
            .send()
            .await
            .with_context(|| format!("request to {} failed", source.location))?
            .error_for_status()?;

        let content_type = if by_extension == MIME_PDF {
            MIME_PDF.to_string()
        } else {
            response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(by_extension)
                .to_string()
        };

        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }
}

#[async_trait]
impl DocumentLoader for ReferenceLoader {
    async fn load(&self, source: &SourceConfig) -> Result<String, KnowledgeError> {
        let (bytes, content_type) =
            self.fetch(source)
                .await
                .map_err(|e| KnowledgeError::Unavailable {
                    tag: source.tag.clone(),
                    reason: format!("{:#}", e),
                })?;

        debug!(source = %source.tag, bytes = bytes.len(), %content_type, "fetched reference document");

        extract::extract_text(&bytes, &content_type).map_err(|e| KnowledgeError::Extract {
            tag: source.tag.clone(),
            reason: e.to_string(),
        })
    }
}

/// The configured reference corpus, loaded on first use.
pub struct KnowledgeBase {
    sources: Vec<SourceConfig>,
    mandatory: Vec<MandatoryConfig>,
    params: ChunkParams,
    loader: Arc<dyn DocumentLoader>,
    corpus: OnceCell<Arc<Corpus>>,
}

impl KnowledgeBase {
    pub fn new(config: &Config) -> Self {
        Self::with_loader(config, Arc::new(ReferenceLoader::new()))
    }

    pub fn with_loader(config: &Config, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            sources: config.knowledge.sources.clone(),
            mandatory: config.knowledge.mandatory.clone(),
            params: config.chunking.params(),
            loader,
            corpus: OnceCell::new(),
        }
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// The corpus, loading it first if no load has succeeded yet.
    pub async fn corpus(&self) -> Result<Arc<Corpus>, KnowledgeError> {
        self.corpus.get_or_try_init(|| self.load()).await.cloned()
    }

    /// The corpus if it is already loaded.
    pub fn loaded(&self) -> Option<Arc<Corpus>> {
        self.corpus.get().cloned()
    }

    pub async fn ensure_loaded(&self) -> Result<(), KnowledgeError> {
        self.corpus().await.map(|_| ())
    }

    /// Ranked passages for `query`; see [`Corpus::retrieve`].
    pub async fn retrieve(&self, query: &str, max_chunks: usize) -> Result<Vec<String>, KnowledgeError> {
        let corpus = self.corpus().await?;
        Ok(corpus.retrieve(query, max_chunks))
    }

    async fn load(&self) -> Result<Arc<Corpus>, KnowledgeError> {
        info!(sources = self.sources.len(), "loading reference documents");

        let texts = try_join_all(self.sources.iter().map(|s| self.loader.load(s))).await?;

        let documents: Vec<SourceDocument> = self
            .sources
            .iter()
            .zip(texts)
            .map(|(source, text)| SourceDocument {
                tag: source.tag.clone(),
                text: text.replace('\r', ""),
            })
            .collect();

        let corpus = Corpus::build(&documents, &self.mandatory, &self.params);
        info!(
            chunks = corpus.chunks().len(),
            mandatory = corpus.mandatory().len(),
            "reference documents loaded"
        );
        Ok(Arc::new(corpus))
    }
}

/// CLI entry point for `ebw search`.
///
/// With `explain`, prints the mandatory snippets and the scored chunks
/// separately instead of the assembled passage list.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>, explain: bool) -> anyhow::Result<()> {
    let kb = KnowledgeBase::new(config);
    let max_chunks = config.retrieval.limit(limit)?;

    if explain {
        let corpus = kb.corpus().await?;
        for snippet in corpus.mandatory() {
            println!("mandatory {}: {}", snippet.key, snippet.text);
        }
        let scored = corpus.score(query);
        if scored.is_empty() {
            println!("No matching chunks; results fall back to load order.");
            return Ok(());
        }
        for (i, s) in scored.iter().take(max_chunks).enumerate() {
            println!("{}. [{}] {}#{}", i + 1, s.score, s.source, s.id);
            println!("    {}", s.text);
            println!();
        }
        return Ok(());
    }

    let passages = kb.retrieve(query, max_chunks).await?;
    if passages.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for (i, passage) in passages.iter().enumerate() {
        println!("{}. {}", i + 1, passage);
        println!();
    }
    Ok(())
}
