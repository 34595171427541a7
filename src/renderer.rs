//! The render pipeline: empty check, complexity, validation, engine.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;

use crate::cache::{self, HashCache};
use crate::config::{CachePolicy, PipelineConfig};
use crate::engine::{EngineError, RenderEngine};
use crate::operations::{CancellationToken, RenderOperationManager};
use crate::sequence::{
    ArrowReport, ArrowSyntaxValidator, ComplexityAnalyzer, DiagramMetrics, DiagramSource,
    LineWarning, RenderError, SyntaxValidator, ValidationResult,
};
use crate::theme::ThemeName;

/// Both validation passes over one text, plus their merged diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub declarations: ValidationResult,
    pub arrows: ArrowReport,
    /// All errors ordered by line; errors without a line come last.
    pub errors: Vec<RenderError>,
    pub warnings: Vec<LineWarning>,
}

impl ValidationReport {
    /// Runs the declaration pass and the arrow pass over the same text.
    pub fn build(content: &str) -> Self {
        Self::new(
            SyntaxValidator::new().validate_text(content),
            ArrowSyntaxValidator::new().validate(content),
        )
    }

    fn new(declarations: ValidationResult, arrows: ArrowReport) -> Self {
        let mut errors = declarations.errors.clone();
        errors.extend(arrows.errors.iter().map(|e| e.to_render_error()));
        errors.sort_by_key(|e| e.line_number.unwrap_or(usize::MAX));
        let warnings = arrows.warnings.clone();

        Self {
            declarations,
            arrows,
            errors,
            warnings,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.declarations.is_valid && self.arrows.is_valid
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty
    }

    pub fn primary_error(&self) -> Option<&RenderError> {
        self.errors.first()
    }
}

#[derive(Debug, Clone)]
pub enum RenderResult<A> {
    /// Blank input. Not an error.
    Empty,
    Error {
        error: RenderError,
        errors: Vec<RenderError>,
        warnings: Vec<LineWarning>,
        metrics: DiagramMetrics,
    },
    Success {
        artifact: Arc<A>,
        metrics: DiagramMetrics,
        validation: Arc<ValidationReport>,
        cached: bool,
    },
    /// The token was cancelled; the caller should drop this result.
    Cancelled,
}

impl<A> RenderResult<A> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&RenderError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn metrics(&self) -> Option<DiagramMetrics> {
        match self {
            Self::Error { metrics, .. } | Self::Success { metrics, .. } => Some(*metrics),
            Self::Empty | Self::Cancelled => None,
        }
    }
}

/// The validation pass behind its own cache. Needs no engine, so hosts
/// that only report diagnostics can use it directly.
pub struct CachedValidator {
    cache: Mutex<HashCache<Arc<ValidationReport>>>,
}

impl CachedValidator {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            cache: Mutex::new(HashCache::with_policy(policy)),
        }
    }

    /// Served from the cache when the exact same text was seen recently.
    pub fn validate(&self, source: &DiagramSource) -> Arc<ValidationReport> {
        let key = cache::validation_key(&source.content);
        if let Some(report) = self.lookup(&key) {
            tracing::debug!(block = %source.block, "validation cache hit");
            return report;
        }

        let report = Arc::new(ValidationReport::build(&source.content));
        self.store(key, Arc::clone(&report));
        report
    }

    fn lookup(&self, key: &str) -> Option<Arc<ValidationReport>> {
        self.cache.lock().get(key)
    }

    fn store(&self, key: String, report: Arc<ValidationReport>) {
        self.cache.lock().set(key, report);
    }

    pub fn size(&self) -> usize {
        self.cache.lock().size()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn cleanup(&self) -> usize {
        self.cache.lock().cleanup()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheSizes {
    pub validation: usize,
    pub render: usize,
}

pub struct DiagramRenderer<E: RenderEngine> {
    engine: E,
    analyzer: ComplexityAnalyzer,
    validator: CachedValidator,
    render_cache: Mutex<HashCache<Arc<E::Artifact>>>,
    operations: RenderOperationManager,
}

impl<E: RenderEngine> DiagramRenderer<E> {
    pub fn new(engine: E, config: &PipelineConfig) -> Self {
        Self {
            engine,
            analyzer: ComplexityAnalyzer::new(config.thresholds),
            validator: CachedValidator::new(config.validation_cache),
            render_cache: Mutex::new(HashCache::with_policy(config.render_cache)),
            operations: RenderOperationManager::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn operations(&self) -> &RenderOperationManager {
        &self.operations
    }

    pub fn analyze(&self, source: &DiagramSource) -> DiagramMetrics {
        self.analyzer.analyze(source)
    }

    /// Runs both validation passes, served from the validation cache when
    /// the exact same text was seen recently.
    pub fn validate(&self, source: &DiagramSource) -> Arc<ValidationReport> {
        self.validator.validate(source)
    }

    pub async fn render(
        &self,
        source: &DiagramSource,
        theme: ThemeName,
        cancel: &CancellationToken,
    ) -> RenderResult<E::Artifact> {
        if source.is_blank() {
            return RenderResult::Empty;
        }
        if cancel.is_cancelled() {
            return RenderResult::Cancelled;
        }

        let metrics = self.analyzer.analyze(source);
        if metrics.exceeds_threshold {
            tracing::info!(
                block = %source.block,
                participants = metrics.participant_count,
                messages = metrics.message_count,
                "diagram exceeds complexity thresholds"
            );
        }

        let validation_key = cache::validation_key(&source.content);
        let report = match self.validator.lookup(&validation_key) {
            Some(report) => report,
            None => {
                let report = Arc::new(ValidationReport::build(&source.content));
                if cancel.is_cancelled() {
                    return RenderResult::Cancelled;
                }
                self.validator.store(validation_key, Arc::clone(&report));
                report
            }
        };

        if !report.is_valid() {
            let error = report
                .primary_error()
                .cloned()
                .unwrap_or_else(|| RenderError::syntax("Diagram is invalid", None));
            tracing::debug!(block = %source.block, %error, "diagram failed validation");
            return RenderResult::Error {
                error,
                errors: report.errors.clone(),
                warnings: report.warnings.clone(),
                metrics,
            };
        }

        if cancel.is_cancelled() {
            return RenderResult::Cancelled;
        }

        let render_key = cache::render_key(&source.content, theme);
        let cached_artifact = self.render_cache.lock().get(&render_key);
        if let Some(artifact) = cached_artifact {
            tracing::debug!(block = %source.block, %theme, "render cache hit");
            return RenderResult::Success {
                artifact,
                metrics,
                validation: report,
                cached: true,
            };
        }

        tracing::debug!(block = %source.block, %theme, "render cache miss");
        let rendered = AssertUnwindSafe(self.engine.render(&source.content, theme, cancel))
            .catch_unwind()
            .await;

        if cancel.is_cancelled() {
            tracing::debug!(block = %source.block, "discarding result of cancelled render");
            return RenderResult::Cancelled;
        }

        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(_) => {
                tracing::warn!(block = %source.block, "render engine panicked");
                return library_error("render engine failed unexpectedly", &report, metrics);
            }
        };

        match rendered {
            Ok(artifact) => {
                let artifact = Arc::new(artifact);
                self.render_cache
                    .lock()
                    .set(render_key, Arc::clone(&artifact));
                RenderResult::Success {
                    artifact,
                    metrics,
                    validation: report,
                    cached: false,
                }
            }
            Err(EngineError::Cancelled) => RenderResult::Cancelled,
            Err(EngineError::Rejected(message)) => {
                tracing::warn!(block = %source.block, %message, "render engine rejected diagram");
                library_error(message, &report, metrics)
            }
        }
    }

    /// Registers the render under the block's identity, superseding any
    /// render still in flight for that block.
    pub async fn render_block(
        &self,
        source: &DiagramSource,
        theme: ThemeName,
    ) -> RenderResult<E::Artifact> {
        let token = self.operations.start(&source.block);
        let result = self.render(source, theme, &token).await;
        self.operations.complete(&source.block, &token);
        result
    }

    pub fn cleanup(&self) {
        let validation = self.validator.cleanup();
        let render = self.render_cache.lock().cleanup();
        if validation + render > 0 {
            tracing::debug!(validation, render, "evicted expired cache entries");
        }
    }

    pub fn clear_caches(&self) {
        self.validator.clear();
        self.render_cache.lock().clear();
    }

    pub fn cache_sizes(&self) -> CacheSizes {
        CacheSizes {
            validation: self.validator.size(),
            render: self.render_cache.lock().size(),
        }
    }
}

fn library_error<A>(
    message: impl Into<String>,
    report: &ValidationReport,
    metrics: DiagramMetrics,
) -> RenderResult<A> {
    let error = RenderError::library(message);
    RenderResult::Error {
        errors: vec![error.clone()],
        error,
        warnings: report.warnings.clone(),
        metrics,
    }
}
