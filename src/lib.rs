//! Validation, complexity analysis and cached render orchestration for
//! sequence diagram blocks embedded in Markdown notes.
//!
//! The host hands each block to [`DiagramRenderer`] and shows whatever
//! [`RenderResult`] comes back. Rendering itself is delegated to a
//! [`RenderEngine`] supplied by the host.

pub mod cache;
pub mod config;
pub mod engine;
pub mod markdown;
pub mod operations;
pub mod renderer;
pub mod sequence;
pub mod theme;

pub use cache::HashCache;
pub use config::{CachePolicy, ConfigError, PipelineConfig, Thresholds};
pub use engine::{EngineError, RenderEngine};
pub use markdown::{DiagramBlock, extract_blocks};
pub use operations::{BlockId, CancellationToken, RenderOperation, RenderOperationManager};
pub use renderer::{
    CacheSizes, CachedValidator, DiagramRenderer, RenderResult, ValidationReport,
};
pub use sequence::{
    ArrowSyntaxValidator, ComplexityAnalyzer, DiagramMetrics, DiagramParser, DiagramSource,
    ErrorKind, RenderError, SyntaxValidator, ValidationResult,
};
pub use theme::ThemeName;
