use std::collections::HashSet;

use super::grammar;
use super::types::{DiagramMetrics, DiagramSource};
use crate::config::Thresholds;

/// Best-effort estimate of how expensive a diagram will be to render.
///
/// Lines that don't look like `<left>-><right>:` are ignored rather than
/// reported; correctness is the validators' job.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityAnalyzer {
    thresholds: Thresholds,
}

impl ComplexityAnalyzer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn analyze(&self, source: &DiagramSource) -> DiagramMetrics {
        self.analyze_text(&source.content)
    }

    pub fn analyze_text(&self, content: &str) -> DiagramMetrics {
        let content = content.trim();
        if content.is_empty() {
            return DiagramMetrics::default();
        }

        let mut participants: HashSet<&str> = HashSet::new();
        let mut message_count = 0;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || is_non_message_line(line) {
                continue;
            }

            if let Some((left, right)) = grammar::counted_message(line) {
                participants.insert(left);
                participants.insert(right);
                message_count += 1;
            }
        }

        let participant_count = participants.len();
        DiagramMetrics {
            participant_count,
            message_count,
            exceeds_threshold: participant_count > self.thresholds.max_participants
                || message_count > self.thresholds.max_messages,
        }
    }
}

fn is_non_message_line(line: &str) -> bool {
    grammar::is_title_line(line) || grammar::is_note_line(line)
}
