//! Structural check of message, note and keyword lines.
//!
//! This pass only looks at arrows; titles and participant declarations are
//! recognized so they can be skipped, and their contents are left to
//! [`super::declarations`].

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use super::grammar::{self, MESSAGE_FORMAT_HINT};
use super::types::{ErrorKind, LineWarning, RenderError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineError {
    pub message: String,
    /// Absent only for the generic internal-failure entry.
    pub line_number: Option<usize>,
    pub suggestion: Option<String>,
}

impl LineError {
    fn new(message: impl Into<String>, line_number: usize) -> Self {
        Self {
            message: message.into(),
            line_number: Some(line_number),
            suggestion: Some(MESSAGE_FORMAT_HINT.to_string()),
        }
    }

    pub fn to_render_error(&self) -> RenderError {
        RenderError {
            kind: ErrorKind::Syntax,
            message: self.message.clone(),
            line_number: self.line_number,
            suggestion: self.suggestion.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrowReport {
    pub is_valid: bool,
    pub is_empty: bool,
    pub errors: Vec<LineError>,
    pub warnings: Vec<LineWarning>,
}

impl ArrowReport {
    fn empty() -> Self {
        Self {
            is_valid: true,
            is_empty: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn internal_failure() -> Self {
        Self {
            is_valid: false,
            is_empty: false,
            errors: vec![LineError {
                message: "Unexpected error while checking diagram syntax".to_string(),
                line_number: None,
                suggestion: None,
            }],
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowSyntaxValidator;

impl ArrowSyntaxValidator {
    pub fn new() -> Self {
        Self
    }

    /// Never panics: an internal failure becomes a single generic error.
    pub fn validate(&self, content: &str) -> ArrowReport {
        if content.trim().is_empty() {
            return ArrowReport::empty();
        }

        guarded(|| check_lines(content))
    }
}

fn guarded(check: impl FnOnce() -> ArrowReport) -> ArrowReport {
    match panic::catch_unwind(AssertUnwindSafe(check)) {
        Ok(report) => report,
        Err(_) => {
            tracing::warn!("arrow syntax check failed internally");
            ArrowReport::internal_failure()
        }
    }
}

fn check_lines(content: &str) -> ArrowReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_number = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if grammar::is_title_line(line) {
            if title_marker_text(line).is_empty() {
                warnings.push(LineWarning {
                    message: "Title declaration has no text".to_string(),
                    line_number,
                });
            }
            continue;
        }

        if grammar::is_participant_line(line) {
            continue;
        }

        if grammar::is_note_line(line) {
            if !line.contains(':') {
                warnings.push(LineWarning {
                    message: "Note is missing a ':' before its text".to_string(),
                    line_number,
                });
            }
            continue;
        }

        if let Some(error) = check_message(line, line_number) {
            tracing::trace!(line_number, message = %error.message, "rejected message line");
            errors.push(error);
        }
    }

    ArrowReport {
        is_valid: errors.is_empty(),
        is_empty: false,
        errors,
        warnings,
    }
}

fn title_marker_text(line: &str) -> &str {
    let rest = line.get("title".len()..).unwrap_or("");
    match rest.split_once(':') {
        Some((_, text)) => text.trim(),
        None => rest.trim(),
    }
}

fn check_message(line: &str, line_number: usize) -> Option<LineError> {
    let Some((start, end)) = grammar::find_arrow(line) else {
        return Some(LineError::new(
            format!("Invalid line: no arrow found in '{line}'"),
            line_number,
        ));
    };

    let sender = line[..start].trim();
    let after = &line[end..];
    let receiver = after.split_once(':').map_or(after, |(r, _)| r).trim();

    if sender.is_empty() {
        let message = if start == 0 {
            "Message starts with an arrow: the sender is missing"
        } else {
            "Message is missing a sender"
        };
        return Some(LineError::new(message, line_number));
    }

    if receiver.is_empty() {
        let message = if after.trim().is_empty() {
            "Message ends with an arrow: the receiver is missing"
        } else {
            "Message is missing a receiver"
        };
        return Some(LineError::new(message, line_number));
    }

    match grammar::parse_message(line) {
        Some(parts) if !parts.sender.is_empty() && !parts.receiver.is_empty() => {
            tracing::trace!(
                line_number,
                sender = parts.sender,
                arrow = parts.arrow,
                receiver = parts.receiver,
                has_text = !parts.text.is_empty(),
                "message line"
            );
            None
        }
        _ => Some(LineError::new(
            format!("Invalid message syntax: '{line}'"),
            line_number,
        )),
    }
}
