//! Extraction of mandatory reference passages.
//!
//! Some sections of the manuals (for example the nesting rules for logic
//! statements) are relevant to every script. They are cut out of the raw
//! source text by a start anchor and an optional end anchor, collapsed, and
//! clamped to a character budget. A missing or malformed anchor only means
//! there is no snippet for that key.

use regex::Regex;
use tracing::{debug, warn};

use crate::chunk::{shrink, tagged};
use crate::config::MandatoryConfig;
use crate::models::MandatorySnippet;
use crate::terms;

/// Appended to snippets cut at their character budget.
pub const ELLIPSIS: &str = "…";

/// Extract the snippet described by `entry` from the raw text of its source.
pub fn extract_snippet(entry: &MandatoryConfig, raw: &str) -> Option<MandatorySnippet> {
    let start = match Regex::new(&entry.start) {
        Ok(re) => re,
        Err(e) => {
            warn!(key = %entry.key, error = %e, "invalid start anchor, snippet skipped");
            return None;
        }
    };

    let Some(start_match) = start.find(raw) else {
        debug!(key = %entry.key, source = %entry.source, "start anchor not found");
        return None;
    };

    let rest = &raw[start_match.start()..];
    let body = match entry.end.as_deref() {
        Some(pattern) => match Regex::new(pattern) {
            // search past the heading itself so the end anchor cannot match it
            Ok(end) => match end.find_at(rest, start_match.len()) {
                Some(m) => &rest[..m.start()],
                None => rest,
            },
            Err(e) => {
                warn!(key = %entry.key, error = %e, "invalid end anchor, snippet skipped");
                return None;
            }
        },
        None => rest,
    };

    let shrunk = shrink(body);
    if shrunk.is_empty() {
        return None;
    }
    let clamped = clamp(&shrunk, entry.max_chars);

    Some(MandatorySnippet {
        key: entry.key.clone(),
        terms: terms::term_set(&clamped),
        text: tagged(&entry.source, &clamped),
    })
}

/// Truncate `text` to at most `max_chars` characters, ending with an
/// ellipsis when cut.
pub fn clamp(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str(ELLIPSIS);
    out
}
