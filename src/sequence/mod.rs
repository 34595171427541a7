mod arrows;
mod complexity;
mod declarations;
mod grammar;
mod types;

pub use arrows::{ArrowReport, ArrowSyntaxValidator, LineError};
pub use complexity::ComplexityAnalyzer;
pub use declarations::SyntaxValidator;
pub use types::{
    DiagramMetrics, DiagramSource, ErrorKind, LineWarning, ParticipantValidation, RenderError,
    TitleValidation, ValidationResult,
};

/// Alias kept for hosts that know the arrow pass as the diagram parser.
pub type DiagramParser = ArrowSyntaxValidator;
