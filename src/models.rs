//! Core data models shared by the validator and the knowledge engine.
//!
//! Issues flow out of [`crate::validate`]; chunks and snippets are produced
//! once per knowledge load and are immutable afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// Machine-readable identity of each rule the validator checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    EmptyFile,
    LongCommandToken,
    NestedLogic,
    NarInsideOtherBlock,
    SltWithoutHeader,
    OmmMissingUtf,
    FalUnpairedDaaUtf,
    NarUnpairedDaaUtf,
    NarTooManyPairs,
    InvalidLabel,
    StartMissingName,
    StartNameTooLong,
    StartPrefixMissingIdentity,
    UnknownStatement,
    LongLine,
    FirstLineNotStart,
    LastLineNotSlut,
    UnterminatedLogic,
}

impl IssueKind {
    /// Structural violations are errors, style findings are warnings and
    /// readability notes are info.
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::LongCommandToken
            | IssueKind::SltWithoutHeader
            | IssueKind::StartNameTooLong
            | IssueKind::UnknownStatement => Severity::Warning,
            IssueKind::LongLine => Severity::Info,
            _ => Severity::Error,
        }
    }
}

/// A single finding reported by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: IssueKind, line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            severity: code.severity(),
            code,
            message: message.into(),
            line,
            evidence: None,
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}: line {}: {}", self.severity, line, self.message)?,
            None => write!(f, "{}: {}", self.severity, self.message)?,
        }
        if let Some(ref evidence) = self.evidence {
            write!(f, " [{}]", evidence)?;
        }
        Ok(())
    }
}

/// Editing mode of the workbench; decides whether an empty script is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    #[default]
    Create,
    Edit,
    Debug,
}

impl AutomationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationMode::Create => "create",
            AutomationMode::Edit => "edit",
            AutomationMode::Debug => "debug",
        }
    }
}

impl fmt::Display for AutomationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AutomationMode::Create),
            "edit" => Ok(AutomationMode::Edit),
            "debug" => Ok(AutomationMode::Debug),
            other => Err(format!(
                "unknown mode: '{}'. Use create, edit, or debug.",
                other
            )),
        }
    }
}

/// A passage of reference text, ready for ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeChunk {
    /// Tag of the source document (e.g. `AUTOMATER7`).
    pub source: String,
    /// Per-source sequence number, starting at 1.
    pub id: usize,
    /// Whitespace-collapsed text prefixed with `[source]`.
    pub text: String,
    /// Lower-case index terms.
    pub terms: BTreeSet<String>,
    /// SHA-256 of `text`.
    pub hash: String,
}

/// A passage that is surfaced for every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatorySnippet {
    pub key: String,
    pub text: String,
    pub terms: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_serializes_without_empty_fields() {
        let issue = ValidationIssue::new(IssueKind::EmptyFile, None, "empty automation file");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["code"], "empty-file");
        assert!(json.get("line").is_none());
        assert!(json.get("evidence").is_none());
    }

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::new(IssueKind::LongLine, Some(4), "long line")
            .with_evidence("ch. 7.4");
        assert_eq!(issue.to_string(), "info: line 4: long line [ch. 7.4]");
    }

    #[test]
    fn test_mode_round_trip_from_str() {
        assert_eq!("edit".parse::<AutomationMode>(), Ok(AutomationMode::Edit));
        assert!("replay".parse::<AutomationMode>().is_err());
        assert_eq!(AutomationMode::default(), AutomationMode::Create);
    }
}
