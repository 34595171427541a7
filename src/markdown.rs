use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::operations::BlockId;
use crate::sequence::DiagramSource;

/// Fence languages treated as sequence diagrams.
const DIAGRAM_LANGUAGES: &[&str] = &["sequence", "seq", "sequence-diagram"];

#[derive(Debug, Clone)]
pub struct DiagramBlock {
    pub source: DiagramSource,
    /// 1-based document line of the first content line.
    pub start_line: usize,
}

impl DiagramBlock {
    /// Maps a line number inside the block to a document line.
    pub fn document_line(&self, block_line: usize) -> usize {
        self.start_line + block_line.saturating_sub(1)
    }
}

/// Collects the fenced sequence diagram blocks of a Markdown document, in
/// document order. Block identities are `<doc_id>#<index>`.
pub fn extract_blocks(document: &str, doc_id: &str) -> Vec<DiagramBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (event, range) in Parser::new_ext(document, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                if is_diagram_fence(&info) {
                    let fence_line = line_of_offset(document, range.start);
                    current = Some((fence_line + 1, String::new()));
                }
            }
            Event::Text(text) => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((start_line, content)) = current.take() {
                    let block = BlockId::for_block(doc_id, blocks.len());
                    blocks.push(DiagramBlock {
                        source: DiagramSource::new(content, block),
                        start_line,
                    });
                }
            }
            _ => {}
        }
    }

    blocks
}

fn is_diagram_fence(info: &str) -> bool {
    let language = info.split_whitespace().next().unwrap_or("");
    DIAGRAM_LANGUAGES
        .iter()
        .any(|l| l.eq_ignore_ascii_case(language))
}

fn line_of_offset(document: &str, offset: usize) -> usize {
    document
        .get(..offset)
        .map_or(0, |prefix| prefix.matches('\n').count())
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "# Checkout\n\nSome prose.\n\n```sequence\ntitle: Pay\nA->B: card\n```\n\n```rust\nfn main() {}\n```\n\n```SEQ\n```\n";

    #[test]
    fn finds_only_sequence_fences() {
        let blocks = extract_blocks(NOTE, "checkout.md");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].source.content, "title: Pay\nA->B: card\n");
        assert_eq!(blocks[0].source.block.as_str(), "checkout.md#0");
        assert_eq!(blocks[1].source.block.as_str(), "checkout.md#1");
        assert!(blocks[1].source.is_blank());
    }

    #[test]
    fn maps_block_lines_to_document_lines() {
        let blocks = extract_blocks(NOTE, "checkout.md");
        assert_eq!(blocks[0].start_line, 6);
        assert_eq!(blocks[0].document_line(2), 7);
    }

    #[test]
    fn identities_are_stable_across_reparses() {
        let first = extract_blocks(NOTE, "a.md");
        let second = extract_blocks(NOTE, "a.md");
        assert_eq!(first[0].source.block, second[0].source.block);
    }
}
