use swc_core::common::{SourceMap, Span};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{messages:}")]
    JsParseError { messages: String },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{message:}")]
    JsGenerateError { message: String },
}

pub fn code_location(span: Span, message: &str, cm: &SourceMap) -> String {
    let loc = cm.lookup_char_pos(span.lo);
    format!(
        "{}:{}:{}: {}",
        loc.file.name,
        loc.line,
        loc.col_display + 1,
        message
    )
}
