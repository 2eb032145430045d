use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::config::{Config, SourceConfig};
use crate::knowledge::KnowledgeBase;

/// Reachability of one configured reference document.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub tag: String,
    pub location: String,
    pub kind: &'static str,
    pub status: String,
}

/// Cheap status check: local files must exist, remote URLs are only checked
/// when the corpus is loaded.
pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    config.knowledge.sources.iter().map(source_status).collect()
}

fn source_status(source: &SourceConfig) -> SourceStatus {
    let (kind, status) = if source.is_remote() {
        ("http", "REMOTE".to_string())
    } else if Path::new(&source.location).is_file() {
        ("file", "OK".to_string())
    } else {
        ("file", "MISSING".to_string())
    };
    SourceStatus {
        tag: source.tag.clone(),
        location: source.location.clone(),
        kind,
        status,
    }
}

pub async fn list_sources(config: &Config) -> Result<()> {
    let statuses = get_sources(config);
    if statuses.is_empty() {
        println!("No reference sources configured.");
        return Ok(());
    }

    println!("{:<16} {:<6} {:<8} LOCATION", "SOURCE", "KIND", "STATUS");
    for s in &statuses {
        println!("{:<16} {:<6} {:<8} {}", s.tag, s.kind, s.status, s.location);
    }
    println!();

    let kb = KnowledgeBase::new(config);
    match kb.corpus().await {
        Ok(corpus) => {
            let stats = corpus.stats();
            println!("Loaded {} chunks at {}", stats.chunks, stats.loaded_at);
            for (tag, count) in &stats.chunks_per_source {
                println!("  {:<16} {} chunks", tag, count);
            }
            if stats.mandatory_keys.is_empty() {
                println!("  mandatory snippets: none");
            } else {
                println!("  mandatory snippets: {}", stats.mandatory_keys.join(", "));
            }
        }
        Err(e) => {
            println!("Load failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
