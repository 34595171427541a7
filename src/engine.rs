//! Boundary to the rendering engine that turns validated text into a
//! visual artifact. The engine itself lives outside this crate.

use async_trait::async_trait;

use crate::operations::CancellationToken;
use crate::theme::ThemeName;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine could not handle the input. The message is shown verbatim.
    #[error("{0}")]
    Rejected(String),
    #[error("render cancelled")]
    Cancelled,
}

#[async_trait]
pub trait RenderEngine: Send + Sync {
    type Artifact: Send + Sync + 'static;

    /// Long-running engines should poll `cancel` and bail out early; the
    /// caller discards the result of a cancelled call either way.
    async fn render(
        &self,
        source: &str,
        theme: ThemeName,
        cancel: &CancellationToken,
    ) -> Result<Self::Artifact, EngineError>;
}
