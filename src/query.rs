//! Retrieval query construction and the context bundle.
//!
//! A run combines the editing mode, the operator's intent, the script, free
//! notes and the validator's findings into one query string, so passages
//! about the rules a script breaks rank alongside passages about what the
//! operator asked for. The resulting issues and passages are exactly what a
//! downstream generation step consumes.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::knowledge::{KnowledgeBase, KnowledgeError};
use crate::models::{AutomationMode, ValidationIssue};
use crate::validate::{validate_automation, ValidateOptions};

/// Extra query terms when writing a new automation: the chapters on file
/// structure, logic statements and labels plus their key commands.
pub const CREATE_SEED: &str = "7.4 7.6 7.7 7.9 START SLUT OMM FAL VAN NAR ATN HOP ATI ATB ATA";

/// Inputs of one workbench run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextRequest {
    #[serde(default)]
    pub mode: AutomationMode,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub notes: String,
}

/// Validator findings plus supporting passages for one run.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    pub mode: AutomationMode,
    pub issues: Vec<ValidationIssue>,
    pub passages: Vec<String>,
}

/// Build the retrieval query for a run.
pub fn compose_query(
    mode: AutomationMode,
    intent: &str,
    script: &str,
    notes: &str,
    issues: &[ValidationIssue],
) -> String {
    let seed = match mode {
        AutomationMode::Create => CREATE_SEED,
        _ => "",
    };
    let messages = issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} {} {} {} {} {}", mode, seed, intent, script, notes, messages)
}

/// Validate the script, then retrieve passages for the composed query.
pub async fn assemble_context(
    kb: &KnowledgeBase,
    request: &ContextRequest,
    max_chunks: usize,
) -> Result<ContextBundle, KnowledgeError> {
    let options = ValidateOptions::for_mode(request.mode, &request.script);
    let issues = validate_automation(&request.script, &options);

    let query = compose_query(
        request.mode,
        &request.intent,
        &request.script,
        &request.notes,
        &issues,
    );
    let passages = kb.retrieve(&query, max_chunks).await?;

    Ok(ContextBundle {
        mode: request.mode,
        issues,
        passages,
    })
}

/// CLI entry point for `ebw context`: prints the bundle as JSON.
pub async fn run_context(config: &Config, request: &ContextRequest, limit: Option<usize>) -> Result<()> {
    let kb = KnowledgeBase::new(config);
    let max_chunks = config.retrieval.limit(limit)?;
    let bundle = assemble_context(&kb, request, max_chunks).await?;
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}
