//! Plain-text survey to Qualtrics Advanced Format TXT.
//!
//! Conversion is a single forward pass. Each trimmed line is classified by
//! [`classify_line`] against an ordered list of matchers, then emitted by
//! [`convert`]. The only state carried between lines is whether a question
//! is open, whether any content has been emitted, and the running question
//! counter.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::question::{infer_question_type, QuestionType};

/// Fixed header of every export.
pub const PREAMBLE: [&str; 8] = [
    "[[AdvancedFormat]]",
    "[[ED:opp:UPDATEHERE]]",
    "[[ED:Q_TotalDuration]]",
    "[[ED:Q_BallotBoxStuffing]]",
    "[[ED:Q_DuplicateRespondent]]",
    "[[ED:Q_QualityScore]]",
    "[[ED:QPMID]]",
    "",
];

/// Raw lines after a question header that type inference may look at.
pub const LOOKAHEAD_LINES: usize = 9;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_]*\n?").expect("valid fence pattern"));

static BLOCK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:##\s*|BLOCK:\s*|SECTION:\s*)(.+)$").expect("valid block pattern")
});

static QUESTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Q([0-9]+)[.:)]?\s*|([0-9]+)[.)\s]+)(.+)$").expect("valid question pattern")
});

static CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[-•*]\s*|[a-z]\)\s*|[0-9]+\)\s*)(.+)$").expect("valid choice pattern")
});

static NUMBERED_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\)").expect("valid bullet pattern"));

/// Classification of a single trimmed source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Empty line
    Blank,
    /// `//` comment, dropped
    Comment,
    /// `## Name`, `BLOCK: Name` or `SECTION: Name`
    BlockHeader { name: &'a str },
    /// Numbered (`Q3.`, `3)`) or standalone (`...?`) question
    Question { number: Option<&'a str>, text: &'a str },
    /// Answer choice; only recognised inside a question
    Choice { text: &'a str },
    /// Line wrapped in `[...]` or `(...)`, dropped
    Instruction,
    /// Screener or terminate marker, dropped
    Screener,
    /// Skip logic, replaced by a page break
    SkipLogic,
    /// Anything else, passed through
    Text,
}

/// Classify a trimmed line. First matching rule wins.
pub fn classify_line(line: &str, in_question: bool) -> LineKind<'_> {
    if line.is_empty() {
        return LineKind::Blank;
    }

    if line.starts_with("//") {
        return LineKind::Comment;
    }

    if let Some(caps) = BLOCK_HEADER.captures(line) {
        let name = caps.get(1).map_or("", |m| m.as_str().trim());
        return LineKind::BlockHeader { name };
    }

    if let Some(caps) = QUESTION_HEADER.captures(line) {
        let number = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        let text = caps.get(3).map_or("", |m| m.as_str().trim());
        return LineKind::Question { number, text };
    }

    if line.ends_with('?')
        && !line.starts_with('-')
        && !line.starts_with('•')
        && !NUMBERED_BULLET.is_match(line)
    {
        return LineKind::Question { number: None, text: line };
    }

    if in_question {
        if let Some(caps) = CHOICE.captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str().trim());
            return LineKind::Choice { text };
        }
    }

    if (line.starts_with('[') && line.ends_with(']'))
        || (line.starts_with('(') && line.ends_with(')'))
    {
        return LineKind::Instruction;
    }

    let upper = line.to_uppercase();
    if upper.contains("SCREENER") || upper.contains("TERMINATE") {
        return LineKind::Screener;
    }
    if upper.contains("SKIP TO") || upper.contains("GO TO") {
        return LineKind::SkipLogic;
    }

    LineKind::Text
}

/// Counts gathered while converting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub blocks: usize,
    pub questions: usize,
    pub choices: usize,
    pub page_breaks: usize,
    pub dropped_lines: usize,
    pub question_types: BTreeMap<QuestionType, usize>,
}

/// Convert a plain-text survey into Qualtrics Advanced Format TXT.
pub fn convert(raw: &str) -> String {
    convert_with_summary(raw).0
}

/// Convert and report what was found.
pub fn convert_with_summary(raw: &str) -> (String, ConversionSummary) {
    let cleaned = FENCE.replace_all(raw, "").replace("```", "");
    let lines: Vec<&str> = cleaned.split('\n').collect();

    let mut out: Vec<String> = PREAMBLE.iter().map(|s| (*s).to_string()).collect();
    let mut summary = ConversionSummary::default();

    let mut counter: u32 = 1;
    let mut in_question = false;
    let mut in_block = false;
    let mut emitted = false;

    for (i, raw_line) in lines.iter().enumerate() {
        let line = trim_line(raw_line);

        match classify_line(line, in_question) {
            LineKind::Blank => {
                if emitted && in_question {
                    out.push(String::new());
                }
                continue;
            }
            LineKind::Comment | LineKind::Instruction | LineKind::Screener => {
                summary.dropped_lines += 1;
                continue;
            }
            LineKind::BlockHeader { name } => {
                if in_block {
                    out.push(String::new());
                    out.push("[[Block]]".to_string());
                }
                out.push(String::new());
                out.push(format!("[[Block:{name}]]"));
                out.push(String::new());
                in_block = true;
                in_question = false;
                summary.blocks += 1;
            }
            LineKind::Question { number, text } => {
                if in_question {
                    out.push(String::new());
                }

                let end = (i + 1 + LOOKAHEAD_LINES).min(lines.len());
                let lookahead = lines[(i + 1).min(end)..end].join("\n");
                let qtype = infer_question_type(text, &lookahead);

                let number = number.map_or_else(|| counter.to_string(), str::to_string);
                out.push(format!("[[Question:{}:Q{}]]", qtype.tag(), number));
                out.push(text.to_string());

                counter += 1;
                in_question = true;
                summary.questions += 1;
                *summary.question_types.entry(qtype).or_insert(0) += 1;
            }
            LineKind::Choice { text } => {
                out.push("[[Choice]]".to_string());
                out.push(text.to_string());
                summary.choices += 1;
            }
            LineKind::SkipLogic => {
                out.push("[[PageBreak]]".to_string());
                summary.page_breaks += 1;
            }
            LineKind::Text => out.push(line.to_string()),
        }

        emitted = true;
    }

    out.push(String::new());
    out.push("[[Block]]".to_string());
    out.push(String::new());

    (out.join("\n"), summary)
}

/// Trim whitespace and byte-order marks from both ends of a line.
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Download name for an export: `Survey_<client>_<YYYY-MM-DD>.txt`.
///
/// Whitespace runs in the client name become a single `_`; an empty name
/// falls back to `Project`.
pub fn export_file_name(client: Option<&str>, date: NaiveDate) -> String {
    let client = client.map(str::trim).filter(|c| !c.is_empty()).unwrap_or("Project");
    let client = client.split_whitespace().collect::<Vec<_>>().join("_");
    format!("Survey_{}_{}.txt", client, date.format("%Y-%m-%d"))
}
