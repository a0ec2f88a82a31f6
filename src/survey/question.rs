//! Question type inference.

use std::fmt;

use serde::Serialize;

/// Qualtrics question type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum QuestionType {
    /// Single-answer multiple choice (`MC`)
    #[serde(rename = "MC")]
    MultipleChoice,
    /// Multiple answer (`MA`)
    #[serde(rename = "MA")]
    MultipleAnswer,
    /// Text entry (`TE`)
    #[serde(rename = "TE")]
    TextEntry,
    /// Matrix (`Matrix`)
    Matrix,
    /// Rank order (`RO`)
    #[serde(rename = "RO")]
    RankOrder,
    /// Slider (`Slider`)
    Slider,
    /// Net promoter score (`NPS`)
    #[serde(rename = "NPS")]
    NetPromoterScore,
}

impl QuestionType {
    /// Tag written inside `[[Question:<tag>:Qn]]`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "MC",
            Self::MultipleAnswer => "MA",
            Self::TextEntry => "TE",
            Self::Matrix => "Matrix",
            Self::RankOrder => "RO",
            Self::Slider => "Slider",
            Self::NetPromoterScore => "NPS",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

const TEXT_ENTRY: &[&str] = &[
    "please specify",
    "please describe",
    "please explain",
    "in your own words",
    "open-ended",
    "verbatim",
];

const MULTIPLE_ANSWER: &[&str] =
    &["select all", "check all", "multiple answers", "selecciona todos", "marca todos"];

const MATRIX: &[&str] = &["rate each", "for each of the following", "on a scale"];

const MATRIX_SCALE: &[&str] = &["strongly agree", "muy de acuerdo"];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Infer the type of a question from its text and the lines that follow it.
///
/// Rules are checked in priority order and the first hit wins, so a question
/// that says both "select all" and "rank" is multiple answer.
pub fn infer_question_type(question: &str, lookahead: &str) -> QuestionType {
    let text = question.to_lowercase();
    let following = lookahead.to_lowercase();

    if contains_any(&text, TEXT_ENTRY) {
        QuestionType::TextEntry
    } else if contains_any(&text, MULTIPLE_ANSWER) {
        QuestionType::MultipleAnswer
    } else if contains_any(&text, MATRIX) || contains_any(&following, MATRIX_SCALE) {
        QuestionType::Matrix
    } else if text.contains("rank") || text.contains("order") {
        QuestionType::RankOrder
    } else if contains_any(&text, &["slider", "0 to 100", "0 to 10"]) {
        QuestionType::Slider
    } else if text.contains("recommend") && (text.contains("0 to 10") || text.contains("nps")) {
        // Unreachable for "0 to 10" since the slider rule claims it first
        QuestionType::NetPromoterScore
    } else {
        QuestionType::MultipleChoice
    }
}
