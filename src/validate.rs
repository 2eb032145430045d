//! Structural validator for automation scripts.
//!
//! A single forward pass over the classified lines of a script. The only
//! state carried between lines is the current [`LogicBlock`]: at most one
//! `OMM`/`FAL`/`VAN`/`NAR` block may be open, and it is closed by `SLT`.
//!
//! Every finding becomes a [`ValidationIssue`]; the pass always runs to the
//! end of input and issues are returned in emission order.
//!
//! # Rules
//!
//! | Rule | Severity |
//! |------|----------|
//! | Script is empty (unless allowed) | error |
//! | Command token longer than 16 characters | warning |
//! | Logic block opened inside another | error |
//! | `NAR` inside a non-`NAR` block | error |
//! | `SLT` with no open block | warning |
//! | `OMM` without `UTF`; `FAL`/`NAR` with unpaired `DAA`/`UTF` | error |
//! | `NAR` with more than two `DAA`/`UTF` pairs | error |
//! | `ATN`/`HOP` label not `[A-Z0-9]{5}` | error |
//! | `START` without name | error |
//! | `START` name longer than 6 characters | warning |
//! | `START_` with empty identity | error |
//! | Unknown statement (expression lines exempt) | warning |
//! | Line longer than 120 characters | info |
//! | First line not `START`, last line not `SLUT` | error |
//! | Block still open at end of script | error |

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;

use crate::lexer::{self, ClassifiedLine};
use crate::models::{AutomationMode, IssueKind, Severity, ValidationIssue};
use crate::vocab::LogicKind;

const MAX_TOKEN_CHARS: usize = 16;
const MAX_LINE_CHARS: usize = 120;
const MAX_AUTOMATION_NAME_CHARS: usize = 6;
const START_PREFIX: &str = "START_";

static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{5}$").expect("static regex"));

/// Options for a single validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Accept a script with no code lines (a brand-new automation).
    pub allow_empty: bool,
}

impl ValidateOptions {
    /// An empty script is only acceptable while creating a new automation.
    pub fn for_mode(mode: AutomationMode, source: &str) -> Self {
        Self {
            allow_empty: mode == AutomationMode::Create && source.trim().is_empty(),
        }
    }
}

/// Logic-block state between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LogicBlock {
    #[default]
    Closed,
    Open {
        kind: LogicKind,
        start_line: usize,
        daa_count: usize,
        utf_count: usize,
    },
}

/// Validate a script and return all findings in emission order.
///
/// Never fails: malformed or binary input simply produces issues.
pub fn validate_automation(source: &str, options: &ValidateOptions) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut block = LogicBlock::Closed;
    let mut first: Option<(usize, &str)> = None;
    let mut last: Option<(usize, &str)> = None;

    for line in lexer::classify_script(source) {
        if first.is_none() {
            first = Some((line.number, line.code));
        }
        last = Some((line.number, line.code));
        check_line(&line, &mut block, &mut issues);
    }

    let (Some((first_line, first_code)), Some((last_line, last_code))) = (first, last) else {
        if !options.allow_empty {
            issues.push(
                ValidationIssue::new(IssueKind::EmptyFile, None, "empty automation file")
                    .with_evidence("ch. 7.4"),
            );
        }
        return issues;
    };

    if !first_code.starts_with("START") {
        issues.push(
            ValidationIssue::new(
                IssueKind::FirstLineNotStart,
                Some(first_line),
                "first line should be START <automation>",
            )
            .with_evidence("ch. 7.4.4 example"),
        );
    }

    if !last_code.starts_with("SLUT") {
        issues.push(
            ValidationIssue::new(
                IssueKind::LastLineNotSlut,
                Some(last_line),
                "last line should be SLUT",
            )
            .with_evidence("ch. 7.4.4 example"),
        );
    }

    if let LogicBlock::Open {
        kind, start_line, ..
    } = block
    {
        issues.push(
            ValidationIssue::new(
                IssueKind::UnterminatedLogic,
                Some(start_line),
                format!("logic statement {} missing SLT", kind),
            )
            .with_evidence("ch. 7.6.2"),
        );
    }

    issues
}

fn check_line(line: &ClassifiedLine<'_>, block: &mut LogicBlock, issues: &mut Vec<ValidationIssue>) {
    let n = Some(line.number);
    let token = line.token.as_str();

    if token.chars().count() > MAX_TOKEN_CHARS {
        issues.push(
            ValidationIssue::new(
                IssueKind::LongCommandToken,
                n,
                "unusually long command name, check syntax",
            )
            .with_evidence("ch. 7.9 command lists"),
        );
    }

    if let Some(kind) = LogicKind::from_token(token) {
        match *block {
            LogicBlock::Open { .. } => issues.push(
                ValidationIssue::new(IssueKind::NestedLogic, n, "nested logic statement not permitted")
                    .with_evidence("ch. 7.6.2: logic statements must not be nested"),
            ),
            LogicBlock::Closed => {
                *block = LogicBlock::Open {
                    kind,
                    start_line: line.number,
                    daa_count: 0,
                    utf_count: 0,
                };
            }
        }
    }

    if token == "SLT" {
        match *block {
            LogicBlock::Closed => issues.push(
                ValidationIssue::new(IssueKind::SltWithoutHeader, n, "SLT without active logic header")
                    .with_evidence("ch. 7.6.2"),
            ),
            LogicBlock::Open {
                kind,
                daa_count,
                utf_count,
                ..
            } => {
                finalize_block(kind, daa_count, utf_count, line.number, issues);
                *block = LogicBlock::Closed;
            }
        }
    }

    if let LogicBlock::Open {
        kind,
        daa_count,
        utf_count,
        ..
    } = block
    {
        match token {
            "DAA" => *daa_count += 1,
            "UTF" => *utf_count += 1,
            "NAR" if *kind != LogicKind::Nar => issues.push(
                ValidationIssue::new(
                    IssueKind::NarInsideOtherBlock,
                    n,
                    format!("NAR is not permitted inside {}", kind),
                )
                .with_evidence("ch. 7.6.2"),
            ),
            _ => {}
        }
    }

    if token == "ATN" || token == "HOP" {
        let label = line.argument(0).unwrap_or("");
        if !LABEL.is_match(label) {
            issues.push(
                ValidationIssue::new(
                    IssueKind::InvalidLabel,
                    n,
                    format!("{} requires a label of exactly 5 characters (A-Z, 0-9)", token),
                )
                .with_evidence("ch. 7.9.6"),
            );
        }
    }

    if token == "START" {
        match line.argument(0) {
            None => issues.push(
                ValidationIssue::new(IssueKind::StartMissingName, n, "START is missing the automation name")
                    .with_evidence("ch. 7.4.3"),
            ),
            Some(name) if name.chars().count() > MAX_AUTOMATION_NAME_CHARS => issues.push(
                ValidationIssue::new(
                    IssueKind::StartNameTooLong,
                    n,
                    format!(
                        "automation name should be at most {} characters",
                        MAX_AUTOMATION_NAME_CHARS
                    ),
                )
                .with_evidence("ch. 7.4.3"),
            ),
            Some(_) => {}
        }
    }

    if token == START_PREFIX {
        issues.push(
            ValidationIssue::new(IssueKind::StartPrefixMissingIdentity, n, "START_ is missing its identity")
                .with_evidence("ch. 8.3.2.1"),
        );
    }

    if !line.known && !line.expression {
        issues.push(
            ValidationIssue::new(IssueKind::UnknownStatement, n, format!("unknown statement: {}", token))
                .with_evidence("ch. 7.9.2-7.9.7"),
        );
    }

    if line.char_len() > MAX_LINE_CHARS {
        issues.push(ValidationIssue::new(
            IssueKind::LongLine,
            n,
            "long line may be hard to troubleshoot in operation",
        ));
    }
}

fn finalize_block(
    kind: LogicKind,
    daa_count: usize,
    utf_count: usize,
    line: usize,
    issues: &mut Vec<ValidationIssue>,
) {
    let paired = daa_count >= 1 && utf_count >= 1 && daa_count == utf_count;
    let n = Some(line);

    match kind {
        LogicKind::Omm if utf_count < 1 => issues.push(
            ValidationIssue::new(IssueKind::OmmMissingUtf, n, "OMM missing UTF part")
                .with_evidence("ch. 7.6.2.1"),
        ),
        LogicKind::Fal if !paired => issues.push(
            ValidationIssue::new(IssueKind::FalUnpairedDaaUtf, n, "FAL requires matching DAA/UTF pairs")
                .with_evidence("ch. 7.6.2.2"),
        ),
        LogicKind::Nar => {
            if !paired {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::NarUnpairedDaaUtf,
                        n,
                        "NAR requires matching DAA/UTF pairs",
                    )
                    .with_evidence("ch. 7.6.2.4"),
                );
            }
            if daa_count > 2 || utf_count > 2 {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::NarTooManyPairs,
                        n,
                        "NAR may contain at most two DAA/UTF pairs",
                    )
                    .with_evidence("error message: FÖR MÅNGA DAA-UTF"),
                );
            }
        }
        _ => {}
    }
}

/// Count issues of the given severity.
pub fn count_severity(issues: &[ValidationIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// CLI entry point for `ebw validate`.
///
/// Reads the script from `path` (`-` for stdin), prints the issues and
/// returns `true` if no error-severity issue was found.
pub fn run_validate(
    path: &Path,
    mode: AutomationMode,
    allow_empty: bool,
    json: bool,
) -> Result<bool> {
    let source = if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read script from stdin")?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let mut options = ValidateOptions::for_mode(mode, &source);
    options.allow_empty |= allow_empty;

    let issues = validate_automation(&source, &options);
    let errors = count_severity(&issues, Severity::Error);

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!("No issues.");
    } else {
        for issue in &issues {
            println!("{}", issue);
        }
        println!();
        println!(
            "{} error(s), {} warning(s), {} info",
            errors,
            count_severity(&issues, Severity::Warning),
            count_severity(&issues, Severity::Info)
        );
    }

    Ok(errors == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn validate(source: &str) -> Vec<ValidationIssue> {
        validate_automation(source, &ValidateOptions::default())
    }

    fn kinds(issues: &[ValidationIssue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_minimal_script_is_clean() {
        assert!(validate("START ABC\nSLUT").is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let src = "-- header comment\n\nSTART ABC -- name\n   \nSIG A1\n-- trailing\nSLUT\n\n";
        assert!(validate(src).is_empty());
    }

    #[test]
    fn test_empty_script() {
        let allowed = validate_automation("", &ValidateOptions { allow_empty: true });
        assert!(allowed.is_empty());

        let rejected = validate("");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].code, IssueKind::EmptyFile);
        assert_eq!(rejected[0].message, "empty automation file");
        assert_eq!(rejected[0].line, None);

        // comment-only counts as empty
        assert_eq!(kinds(&validate("-- nothing\n\n")), vec![IssueKind::EmptyFile]);
    }

    #[test]
    fn test_long_automation_name_is_a_warning() {
        let issues = validate("START ABCDEF1\nSLUT");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].code, IssueKind::StartNameTooLong);
        assert!(issues[0].message.contains('6'));
        assert_eq!(issues[0].line, Some(1));
    }

    #[test]
    fn test_six_character_name_is_accepted() {
        assert!(validate("START ABCDEF\nSLUT").is_empty());
    }

    #[test]
    fn test_start_without_name() {
        let issues = validate("START\nSLUT");
        assert_eq!(kinds(&issues), vec![IssueKind::StartMissingName]);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_omm_without_utf_and_missing_start() {
        let issues = validate("OMM\nSLT");
        assert_eq!(
            kinds(&issues),
            vec![
                IssueKind::OmmMissingUtf,
                IssueKind::FirstLineNotStart,
                IssueKind::LastLineNotSlut
            ]
        );
        assert_eq!(issues[0].message, "OMM missing UTF part");
        assert_eq!(issues[0].line, Some(2));
        assert_eq!(issues[1].line, Some(1));
    }

    #[test]
    fn test_omm_with_utf_is_clean() {
        assert!(validate("START A\nOMM\nQST X\nUTF\nSIG A1\nSLT\nSLUT").is_empty());
    }

    #[test]
    fn test_short_label() {
        let issues = validate("START AB\nATN 12\nSLUT");
        assert_eq!(kinds(&issues), vec![IssueKind::InvalidLabel]);
        assert_eq!(issues[0].line, Some(2));
        assert!(issues[0].message.starts_with("ATN"));
    }

    #[test]
    fn test_label_rules() {
        assert!(validate("START AB\nHOP AB12C\nSLUT").is_empty());
        // lower case is not a valid label
        assert_eq!(
            kinds(&validate("START AB\nHOP ab12c\nSLUT")),
            vec![IssueKind::InvalidLabel]
        );
        assert_eq!(
            kinds(&validate("START AB\nHOP\nSLUT")),
            vec![IssueKind::InvalidLabel]
        );
        assert_eq!(
            kinds(&validate("START AB\nATN ABCDEF\nSLUT")),
            vec![IssueKind::InvalidLabel]
        );
    }

    #[test]
    fn test_nested_block_keeps_outer_block() {
        let src = "START A\nOMM\nFAL\nUTF\nSLT\nSLUT";
        let issues = validate(src);
        // OMM stays active and is closed with one UTF
        assert_eq!(kinds(&issues), vec![IssueKind::NestedLogic]);
        assert_eq!(issues[0].line, Some(3));
    }

    #[test]
    fn test_nar_inside_other_block() {
        let issues = validate("START A\nFAL\nNAR\nDAA\nUTF\nSLT\nSLUT");
        assert_eq!(
            kinds(&issues),
            vec![IssueKind::NestedLogic, IssueKind::NarInsideOtherBlock]
        );
        assert!(issues.iter().all(|i| i.line == Some(3)));
    }

    #[test]
    fn test_fal_pairing() {
        assert!(validate("START A\nFAL\nDAA\nUTF\nDAA\nUTF\nSLT\nSLUT").is_empty());
        assert_eq!(
            kinds(&validate("START A\nFAL\nDAA\nDAA\nUTF\nSLT\nSLUT")),
            vec![IssueKind::FalUnpairedDaaUtf]
        );
        assert_eq!(
            kinds(&validate("START A\nFAL\nSLT\nSLUT")),
            vec![IssueKind::FalUnpairedDaaUtf]
        );
    }

    #[test]
    fn test_nar_pair_limits() {
        assert!(validate("START A\nNAR\nDAA\nUTF\nSLT\nSLUT").is_empty());
        assert!(validate("START A\nNAR\nDAA\nUTF\nDAA\nUTF\nSLT\nSLUT").is_empty());

        let three = "START A\nNAR\nDAA\nUTF\nDAA\nUTF\nDAA\nUTF\nSLT\nSLUT";
        assert_eq!(kinds(&validate(three)), vec![IssueKind::NarTooManyPairs]);

        let unpaired = "START A\nNAR\nDAA\nDAA\nDAA\nUTF\nSLT\nSLUT";
        assert_eq!(
            kinds(&validate(unpaired)),
            vec![IssueKind::NarUnpairedDaaUtf, IssueKind::NarTooManyPairs]
        );
    }

    #[test]
    fn test_van_has_no_pairing_rule() {
        assert!(validate("START A\nVAN\nSLT\nSLUT").is_empty());
    }

    #[test]
    fn test_counters_reset_per_block() {
        let src = "START A\nFAL\nDAA\nUTF\nSLT\nFAL\nDAA\nSLT\nSLUT";
        let issues = validate(src);
        assert_eq!(kinds(&issues), vec![IssueKind::FalUnpairedDaaUtf]);
        assert_eq!(issues[0].line, Some(8));
    }

    #[test]
    fn test_stray_slt_is_a_warning() {
        let issues = validate("START A\nSLT\nSLUT");
        assert_eq!(kinds(&issues), vec![IssueKind::SltWithoutHeader]);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unterminated_block_reported_at_start_line() {
        let issues = validate("START A\nSIG A1\nOMM\nUTF\nSLUT");
        assert_eq!(kinds(&issues), vec![IssueKind::UnterminatedLogic]);
        assert_eq!(issues[0].line, Some(3));
        assert_eq!(issues[0].message, "logic statement OMM missing SLT");
    }

    #[test]
    fn test_start_prefix_without_identity() {
        let issues = validate("START A\nSTART_\nSLUT");
        assert_eq!(kinds(&issues), vec![IssueKind::StartPrefixMissingIdentity]);
        assert!(validate("START A\nSTART_X1\nSLUT").is_empty());
    }

    #[test]
    fn test_unknown_statement_and_expression_exemption() {
        let issues = validate("START A\nFROB X\nSLUT");
        assert_eq!(kinds(&issues), vec![IssueKind::UnknownStatement]);
        assert_eq!(issues[0].message, "unknown statement: FROB");

        assert!(validate("START A\n(\nQST A1\n) & !(\nQEQ B2\n)\nSLUT").is_empty());
    }

    #[test]
    fn test_lowercase_commands_are_known() {
        let issues = validate("START A\nsig a1\nSLUT");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_long_token_and_long_line() {
        let token = "SIG_ABCDEFGHIJKLMNOP";
        let issues = validate(&format!("START A\n{}\nSLUT", token));
        assert_eq!(kinds(&issues), vec![IssueKind::LongCommandToken]);

        let long = format!("SIG {}", "A".repeat(130));
        let issues = validate(&format!("START A\n{}\nSLUT", long));
        assert_eq!(kinds(&issues), vec![IssueKind::LongLine]);
        assert_eq!(issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_last_line_must_be_slut() {
        let issues = validate("START A\nSIG A1\n-- end");
        assert_eq!(kinds(&issues), vec![IssueKind::LastLineNotSlut]);
        assert_eq!(issues[0].line, Some(2));
    }

    #[test]
    fn test_options_for_mode() {
        assert!(ValidateOptions::for_mode(AutomationMode::Create, "  \n").allow_empty);
        assert!(!ValidateOptions::for_mode(AutomationMode::Create, "START A").allow_empty);
        assert!(!ValidateOptions::for_mode(AutomationMode::Edit, "").allow_empty);
    }

    #[test]
    fn test_crlf_input() {
        assert!(validate("START A\r\nSIG A1\r\nSLUT\r\n").is_empty());
    }

    proptest! {
        #[test]
        fn prop_validation_is_idempotent(src in "[ -~\n]{0,200}", allow in any::<bool>()) {
            let options = ValidateOptions { allow_empty: allow };
            prop_assert_eq!(
                validate_automation(&src, &options),
                validate_automation(&src, &options)
            );
        }

        #[test]
        fn prop_arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let src = String::from_utf8_lossy(&bytes);
            let _ = validate_automation(&src, &ValidateOptions::default());
        }

        #[test]
        fn prop_framed_scripts_have_no_frame_errors(
            body in proptest::collection::vec(
                prop_oneof![Just("SIG A1"), Just("ATN AB123"), Just("QST X"), Just("-- note"), Just("")],
                0..20,
            )
        ) {
            let src = format!("START X\n{}\nSLUT", body.join("\n"));
            let issues = validate(&src);
            prop_assert!(issues.iter().all(|i| !matches!(
                i.code,
                IssueKind::FirstLineNotStart | IssueKind::LastLineNotSlut | IssueKind::UnterminatedLogic
            )));
        }

        #[test]
        fn prop_unclosed_reopen_reports_nesting(
            first in prop_oneof![Just("OMM"), Just("FAL"), Just("VAN"), Just("NAR")],
            second in prop_oneof![Just("OMM"), Just("FAL"), Just("VAN"), Just("NAR")],
        ) {
            let src = format!("START X\n{}\nDAA\nUTF\n{}\nSLT\nSLUT", first, second);
            let issues = validate(&src);
            prop_assert!(issues.iter().any(|i| i.code == IssueKind::NestedLogic));
        }
    }
}
