use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::operations::BlockId;

/// One diagram block handed over by the host.
#[derive(Debug, Clone)]
pub struct DiagramSource {
    pub content: String,
    pub block: BlockId,
    pub line_count: usize,
}

impl DiagramSource {
    pub fn new(content: impl Into<String>, block: BlockId) -> Self {
        let content = content.into();
        let line_count = content.lines().count();
        Self {
            content,
            block,
            line_count,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

// ============================================
// Diagnostics
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Malformed title, participant or message line.
    Syntax,
    /// The render engine rejected locally valid input.
    Library,
    /// Nothing to validate or render.
    Empty,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => f.write_str("syntax"),
            Self::Library => f.write_str("library"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderError {
    pub kind: ErrorKind,
    pub message: String,
    pub line_number: Option<usize>,
    pub suggestion: Option<String>,
}

impl RenderError {
    pub fn syntax(message: impl Into<String>, line_number: Option<usize>) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            line_number,
            suggestion: None,
        }
    }

    pub fn library(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Library,
            message: message.into(),
            line_number: None,
            suggestion: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            kind: ErrorKind::Empty,
            message: "Diagram is empty".to_string(),
            line_number: None,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_number {
            Some(line) => write!(f, "{} error on line {}: {}", self.kind, line, self.message)?,
            None => write!(f, "{} error: {}", self.kind, self.message)?,
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

/// A non-fatal finding of the arrow pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineWarning {
    pub message: String,
    pub line_number: usize,
}

// ============================================
// Title / participant validation
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleValidation {
    pub is_valid: bool,
    pub title: Option<String>,
    pub error: Option<RenderError>,
}

impl TitleValidation {
    pub(crate) fn absent() -> Self {
        Self::default()
    }

    pub(crate) fn present(title: String) -> Self {
        Self {
            is_valid: true,
            title: Some(title),
            error: None,
        }
    }

    pub(crate) fn failed(error: RenderError) -> Self {
        Self {
            is_valid: false,
            title: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantValidation {
    pub is_valid: bool,
    pub short_name: Option<String>,
    pub display_name: Option<String>,
    pub has_alias: bool,
    pub declaration_order: usize,
    pub error: Option<RenderError>,
}

impl ParticipantValidation {
    pub(crate) fn failed(declaration_order: usize, error: RenderError) -> Self {
        Self {
            is_valid: false,
            short_name: None,
            display_name: None,
            has_alias: false,
            declaration_order,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub title: TitleValidation,
    pub participants: Vec<ParticipantValidation>,
    /// short name -> display name, valid declarations only
    pub participant_map: BTreeMap<String, String>,
    pub errors: Vec<RenderError>,
}

impl ValidationResult {
    /// Short names in declaration order, skipping invalid declarations.
    pub fn participant_order(&self) -> impl Iterator<Item = &str> {
        self.participants
            .iter()
            .filter(|p| p.is_valid)
            .filter_map(|p| p.short_name.as_deref())
    }
}

// ============================================
// Complexity
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagramMetrics {
    pub participant_count: usize,
    pub message_count: usize,
    pub exceeds_threshold: bool,
}
