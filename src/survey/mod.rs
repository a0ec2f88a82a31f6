//! Survey conversion to Qualtrics Advanced Format TXT.

mod question;
mod txt;

pub use question::{infer_question_type, QuestionType};
pub use txt::{
    classify_line, convert, convert_with_summary, export_file_name, ConversionSummary, LineKind,
    LOOKAHEAD_LINES, PREAMBLE,
};
