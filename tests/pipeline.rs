use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use seqmark::{
    CancellationToken, DiagramRenderer, EngineError, ErrorKind, PipelineConfig, RenderEngine,
    RenderResult, ThemeName, extract_blocks,
};

#[derive(Default)]
struct OutlineEngine {
    calls: AtomicUsize,
}

#[async_trait]
impl RenderEngine for OutlineEngine {
    type Artifact = Vec<String>;

    async fn render(
        &self,
        source: &str,
        _theme: ThemeName,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(source.lines().map(str::to_string).collect())
    }
}

const NOTE: &str = r#"# Release process

```sequence
title: Tag a release
participant Developer as Dev
participant CI
Dev->CI: push tag
CI-->Dev: artifacts
```

Broken draft:

```sequence
participant as Bot
Bot->: ping
```

```sequence
```
"#;

#[tokio::test]
async fn blocks_of_one_note_are_isolated() {
    let renderer = DiagramRenderer::new(OutlineEngine::default(), &PipelineConfig::default());
    let blocks = extract_blocks(NOTE, "release.md");
    assert_eq!(blocks.len(), 3);

    let mut results = Vec::new();
    for block in &blocks {
        results.push(renderer.render_block(&block.source, ThemeName::GithubDark).await);
    }

    let RenderResult::Success { artifact, validation, metrics, .. } = &results[0] else {
        panic!("first block should render");
    };
    assert_eq!(artifact.len(), 5);
    assert_eq!(validation.declarations.title.title.as_deref(), Some("Tag a release"));
    let order: Vec<&str> = validation.declarations.participant_order().collect();
    assert_eq!(order, vec!["Dev", "CI"]);
    assert_eq!(metrics.message_count, 2);

    let RenderResult::Error { error, errors, .. } = &results[1] else {
        panic!("second block should fail validation");
    };
    assert_eq!(error.kind, ErrorKind::Syntax);
    assert_eq!(error.line_number, Some(1));
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[1].line_number, Some(2));
    assert_eq!(
        blocks[1].document_line(errors[1].line_number.unwrap_or(1)),
        15
    );

    assert!(matches!(results[2], RenderResult::Empty));
    assert_eq!(renderer.engine().calls.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.operations().pending_count(), 0);
}

#[tokio::test]
async fn re_rendering_a_note_hits_the_cache() {
    let renderer = DiagramRenderer::new(OutlineEngine::default(), &PipelineConfig::default());
    let blocks = extract_blocks(NOTE, "release.md");

    renderer.render_block(&blocks[0].source, ThemeName::Nord).await;
    let again = renderer.render_block(&blocks[0].source, ThemeName::Nord).await;

    assert!(matches!(again, RenderResult::Success { cached: true, .. }));
    assert_eq!(renderer.engine().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_renders_are_recomputed() {
    let config = PipelineConfig::from_toml("[render_cache]\ncapacity = 4\nttl_secs = 10\n")
        .expect("config");
    let renderer = DiagramRenderer::new(OutlineEngine::default(), &config);
    let blocks = extract_blocks(NOTE, "release.md");

    renderer.render_block(&blocks[0].source, ThemeName::Nord).await;
    tokio::time::advance(Duration::from_secs(11)).await;
    renderer.cleanup();
    assert_eq!(renderer.cache_sizes().render, 0);
    assert_eq!(renderer.cache_sizes().validation, 1);

    let again = renderer.render_block(&blocks[0].source, ThemeName::Nord).await;
    assert!(matches!(again, RenderResult::Success { cached: false, .. }));
    assert_eq!(renderer.engine().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn view_switch_cancels_everything_pending() {
    let renderer = DiagramRenderer::new(OutlineEngine::default(), &PipelineConfig::default());
    let blocks = extract_blocks(NOTE, "release.md");

    let tokens: Vec<CancellationToken> = blocks
        .iter()
        .map(|block| renderer.operations().start(&block.source.block))
        .collect();
    renderer.operations().cancel_all();

    let result = renderer
        .render(&blocks[0].source, ThemeName::Nord, &tokens[0])
        .await;
    assert!(matches!(result, RenderResult::Cancelled));
    assert_eq!(renderer.engine().calls.load(Ordering::SeqCst), 0);
}
