//! Heading-aligned text chunker for reference manuals.
//!
//! Splits a source document into [`KnowledgeChunk`]s. A new chunk starts at
//! every heading (a numbered outline marker such as `7.6.2 ...`, or a line
//! that is entirely upper case) and whenever the running buffer would grow
//! past `max_chars`. Date stamps and copyright lines, which repeat on every
//! page of the manuals, are dropped before chunking.
//!
//! Each chunk gets a per-source sequence id, display text prefixed with the
//! source tag, its index terms, and a SHA-256 hash of the display text.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::KnowledgeChunk;
use crate::terms;

/// Default buffer limit in characters.
pub const DEFAULT_MAX_CHARS: usize = 1200;
/// Chunks of this length or shorter are discarded.
pub const DEFAULT_MIN_CHARS: usize = 40;

static OUTLINE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\s").expect("static regex"));
static DATE_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("static regex"));

/// Chunk size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub max_chars: usize,
    pub min_chars: usize,
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

/// Lines kept for chunking: trimmed, non-empty, not a date stamp or a
/// copyright line.
pub fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !DATE_STAMP.is_match(line) && !line.starts_with('©'))
}

pub fn is_heading(line: &str) -> bool {
    OUTLINE_HEADING.is_match(line) || line == line.to_uppercase()
}

/// Collapse all whitespace runs (including newlines) to single spaces.
pub fn shrink(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` from the source tagged `source` into chunks.
pub fn chunk_document(source: &str, text: &str, params: &ChunkParams) -> Vec<KnowledgeChunk> {
    let mut raw: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for line in content_lines(text) {
        if is_heading(line) && !current.is_empty() {
            raw.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        let line_chars = line.chars().count();
        let next_chars = if current.is_empty() {
            line_chars
        } else {
            current_chars + 1 + line_chars
        };

        if next_chars > params.max_chars && !current.is_empty() {
            // The oversized line starts the next buffer.
            raw.push(std::mem::replace(&mut current, line.to_string()));
            current_chars = line_chars;
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
            current_chars = next_chars;
        }
    }

    if !current.is_empty() {
        raw.push(current);
    }

    raw.iter()
        .enumerate()
        .filter_map(|(idx, body)| {
            let shrunk = shrink(body);
            if shrunk.chars().count() <= params.min_chars {
                return None;
            }
            Some(make_chunk(source, idx + 1, &shrunk))
        })
        .collect()
}

/// Display text for a passage from `source`.
pub fn tagged(source: &str, text: &str) -> String {
    format!("[{}] {}", source, text)
}

fn make_chunk(source: &str, id: usize, body: &str) -> KnowledgeChunk {
    let text = tagged(source, body);
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    KnowledgeChunk {
        source: source.to_string(),
        id,
        terms: terms::term_set(body),
        text,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANUAL: &str = "\
2021-03-04 Trafikverket\n\
7.6 Logiska satser\n\
Logiska satser inleds med OMM, FAL, VAN eller NAR och avslutas med SLT.\n\
\n\
7.6.2 Nästling\n\
Logiska satser får inte nästlas i varandra under några omständigheter.\n\
© Trafikverket\n\
ALLMÄNT\n\
kort\n";

    fn params() -> ChunkParams {
        ChunkParams::default()
    }

    #[test]
    fn test_splits_on_headings_and_filters_noise() {
        let chunks = chunk_document("AUTOMATER7", MANUAL, &params());
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].text,
            "[AUTOMATER7] 7.6 Logiska satser Logiska satser inleds med OMM, FAL, VAN eller NAR och avslutas med SLT."
        );
        assert!(chunks[1].text.starts_with("[AUTOMATER7] 7.6.2 Nästling"));
        assert!(!chunks.iter().any(|c| c.text.contains("2021-03-04")));
        assert!(!chunks.iter().any(|c| c.text.contains('©')));
        // "ALLMÄNT\nkort" is too short to keep
        assert!(!chunks.iter().any(|c| c.text.contains("kort")));
    }

    #[test]
    fn test_ids_and_terms() {
        let chunks = chunk_document("KORPLAN8", MANUAL, &params());
        assert_eq!(chunks[0].id, 1);
        assert_eq!(chunks[1].id, 2);
        assert!(chunks.iter().all(|c| c.source == "KORPLAN8"));
        assert!(chunks[0].terms.contains("omm"));
        assert!(chunks[0].terms.contains("slt"));
        // the source tag is not indexed
        assert!(!chunks[0].terms.contains("korplan8"));
    }

    #[test]
    fn test_size_limit_keeps_overflowing_line() {
        let line_a = format!("a{}", " lorem ipsum".repeat(5));
        let line_b = format!("b{}", " dolor sit".repeat(5));
        let text = format!("{}\n{}\n", line_a, line_b);
        let p = ChunkParams {
            max_chars: 70,
            min_chars: 40,
        };
        let chunks = chunk_document("S", &text, &p);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, format!("[S] {}", line_a));
        assert_eq!(chunks[1].text, format!("[S] {}", line_b));
    }

    #[test]
    fn test_chunks_never_exceed_min_length_invariant() {
        let text = "x\ny\nz\n".repeat(50);
        for chunk in chunk_document("S", &text, &params()) {
            assert!(chunk.text.chars().count() > DEFAULT_MIN_CHARS);
        }
    }

    #[test]
    fn test_crlf_is_normalized() {
        let a = chunk_document("S", &MANUAL.replace('\n', "\r\n"), &params());
        let b = chunk_document("S", MANUAL, &params());
        assert_eq!(a, b);
    }

    #[test]
    fn test_deterministic() {
        let c1 = chunk_document("S", MANUAL, &params());
        let c2 = chunk_document("S", MANUAL, &params());
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.terms, b.terms);
            assert_eq!(a.hash, b.hash);
        }
    }

    #[test]
    fn test_heading_detection() {
        assert!(is_heading("7.6.2 Nästling"));
        assert!(is_heading("12 Inledning"));
        assert!(is_heading("ALLMÄNT"));
        assert!(!is_heading("Logiska satser"));
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_document("S", "", &params()).is_empty());
    }
}
