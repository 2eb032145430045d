//! Term-overlap ranking over a loaded corpus.
//!
//! # Scoring
//!
//! 1. Normalize the query into its distinct terms.
//! 2. Score each chunk as the summed character length of the query terms
//!    it contains (longer terms are more specific).
//! 3. Drop zero scores and stable-sort by score (desc), so ties keep load
//!    order.
//! 4. Prepend the mandatory snippets and fill the remaining slots with
//!    ranked chunks whose text is not already a snippet.
//!
//! With no usable query terms, or no matching chunk, the ranked list is
//! replaced by the first chunks in load order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::chunk::{self, ChunkParams};
use crate::config::MandatoryConfig;
use crate::mandatory;
use crate::models::{KnowledgeChunk, MandatorySnippet};
use crate::terms;

/// Raw text of one reference document.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub tag: String,
    pub text: String,
}

/// Every chunk and mandatory snippet of the configured sources.
#[derive(Debug, Clone)]
pub struct Corpus {
    chunks: Vec<KnowledgeChunk>,
    mandatory: Vec<MandatorySnippet>,
    loaded_at: DateTime<Utc>,
}

/// Summary of a loaded corpus.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub chunks: usize,
    pub chunks_per_source: BTreeMap<String, usize>,
    pub mandatory_keys: Vec<String>,
    pub loaded_at: String,
}

/// A chunk with its overlap score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub source: String,
    pub id: usize,
    pub score: usize,
    pub text: String,
}

impl Corpus {
    pub fn new(chunks: Vec<KnowledgeChunk>, mandatory: Vec<MandatorySnippet>) -> Self {
        Self {
            chunks,
            mandatory,
            loaded_at: Utc::now(),
        }
    }

    /// Chunk every document in order and cut out the mandatory snippets.
    pub fn build(
        documents: &[SourceDocument],
        mandatory_entries: &[MandatoryConfig],
        params: &ChunkParams,
    ) -> Self {
        let chunks = documents
            .iter()
            .flat_map(|doc| chunk::chunk_document(&doc.tag, &doc.text, params))
            .collect();

        let mandatory = mandatory_entries
            .iter()
            .filter_map(|entry| {
                let doc = documents.iter().find(|d| d.tag == entry.source)?;
                mandatory::extract_snippet(entry, &doc.text)
            })
            .collect();

        Self::new(chunks, mandatory)
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    pub fn mandatory(&self) -> &[MandatorySnippet] {
        &self.mandatory
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.mandatory.is_empty()
    }

    pub fn stats(&self) -> CorpusStats {
        let mut per_source = BTreeMap::new();
        for c in &self.chunks {
            *per_source.entry(c.source.clone()).or_insert(0) += 1;
        }
        CorpusStats {
            chunks: self.chunks.len(),
            chunks_per_source: per_source,
            mandatory_keys: self.mandatory.iter().map(|m| m.key.clone()).collect(),
            loaded_at: self.loaded_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }

    /// Chunks with a positive score for `query`, best first.
    pub fn score(&self, query: &str) -> Vec<ScoredChunk> {
        let query_terms = terms::term_set(query);
        self.score_terms(&query_terms)
    }

    fn score_terms(&self, query_terms: &BTreeSet<String>) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .filter_map(|c| {
                let score = overlap_score(query_terms, &c.terms);
                (score > 0).then(|| ScoredChunk {
                    source: c.source.clone(),
                    id: c.id,
                    score,
                    text: c.text.clone(),
                })
            })
            .collect();

        // sort_by is stable: equal scores keep load order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Display texts for `query`: mandatory snippets first, then ranked
    /// chunks filling `max_chunks` in total. Without any match, the first
    /// `max_chunks` chunks in load order follow the snippets instead.
    ///
    /// A `max_chunks` of 0 is treated as 1.
    pub fn retrieve(&self, query: &str, max_chunks: usize) -> Vec<String> {
        let max_chunks = max_chunks.max(1);
        let query_terms = terms::term_set(query);

        let ranked: Vec<String> = if query_terms.is_empty() {
            Vec::new()
        } else {
            self.score_terms(&query_terms)
                .into_iter()
                .map(|s| s.text)
                .collect()
        };

        let (mut out, seen) = self.mandatory_texts();

        if ranked.is_empty() {
            let in_order = self.chunks.iter().map(|c| &c.text);
            out.extend(
                in_order
                    .filter(|text| !seen.contains(*text))
                    .take(max_chunks)
                    .cloned(),
            );
            return out;
        }

        let slots = max_chunks.saturating_sub(out.len());
        out.extend(
            ranked
                .into_iter()
                .filter(|text| !seen.contains(text))
                .take(slots),
        );
        out
    }

    /// Distinct mandatory snippet texts in configuration order.
    fn mandatory_texts(&self) -> (Vec<String>, HashSet<String>) {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for m in &self.mandatory {
            if seen.insert(m.text.clone()) {
                out.push(m.text.clone());
            }
        }
        (out, seen)
    }
}

/// Summed length of the query terms present in a chunk.
pub fn overlap_score(query_terms: &BTreeSet<String>, chunk_terms: &BTreeSet<String>) -> usize {
    query_terms
        .iter()
        .filter(|t| chunk_terms.contains(*t))
        .map(|t| t.chars().count())
        .sum()
}
