//! Title and participant declarations.
//!
//! Participants are laid out left to right in the order they are declared,
//! so `declaration_order` is assigned here and nowhere else.

use std::collections::BTreeMap;

use super::grammar;
use super::types::{
    DiagramSource, ParticipantValidation, RenderError, TitleValidation, ValidationResult,
};

const PARTICIPANT_FORMAT_HINT: &str =
    "Use 'participant Name' or 'participant Display Name as Name'";
const IDENT_HINT: &str =
    "Participant names must start with a letter or underscore and contain only letters, digits or underscores";

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxValidator;

impl SyntaxValidator {
    pub fn new() -> Self {
        Self
    }

    /// Also used as a line classifier: lines that aren't titles come back
    /// invalid with no error.
    pub fn validate_title(&self, line: &str) -> TitleValidation {
        self.validate_title_at(line, None)
    }

    fn validate_title_at(&self, line: &str, line_number: Option<usize>) -> TitleValidation {
        let line = line.trim();
        if let Some(text) = grammar::title_text(line) {
            let text = text.trim();
            if text.is_empty() {
                return TitleValidation::absent();
            }
            return TitleValidation::present(text.to_string());
        }

        if grammar::is_title_line(line) {
            return TitleValidation::failed(
                RenderError::syntax("Title declaration is missing a colon", line_number)
                    .with_suggestion("Add a colon after the keyword, e.g. 'title: My Diagram'"),
            );
        }

        TitleValidation::absent()
    }

    pub fn validate_participant(&self, line: &str, declaration_order: usize) -> ParticipantValidation {
        self.validate_participant_at(line, declaration_order, None)
    }

    fn validate_participant_at(
        &self,
        line: &str,
        declaration_order: usize,
        line_number: Option<usize>,
    ) -> ParticipantValidation {
        let line = line.trim();
        if !grammar::is_participant_line(line) {
            return ParticipantValidation::failed(
                declaration_order,
                RenderError::syntax("Not a participant declaration", line_number)
                    .with_suggestion(PARTICIPANT_FORMAT_HINT),
            );
        }

        let rest = grammar::participant_rest(line);
        if rest.is_empty() {
            return ParticipantValidation::failed(
                declaration_order,
                RenderError::syntax("Empty participant declaration", line_number)
                    .with_suggestion(PARTICIPANT_FORMAT_HINT),
            );
        }

        if let Some((display, alias)) = grammar::split_alias(rest) {
            let display = display.trim();
            let alias = alias.trim();
            if display.is_empty() {
                return ParticipantValidation::failed(
                    declaration_order,
                    RenderError::syntax(
                        format!("Invalid participant declaration: alias '{alias}' has an empty display name"),
                        line_number,
                    )
                    .with_suggestion(PARTICIPANT_FORMAT_HINT),
                );
            }
            if !grammar::is_identifier(alias) {
                return ParticipantValidation::failed(
                    declaration_order,
                    RenderError::syntax(
                        format!("Invalid participant alias '{alias}'"),
                        line_number,
                    )
                    .with_suggestion(IDENT_HINT),
                );
            }
            return ParticipantValidation {
                is_valid: true,
                short_name: Some(alias.to_string()),
                display_name: Some(display.to_string()),
                has_alias: true,
                declaration_order,
                error: None,
            };
        }

        if !grammar::is_identifier(rest) {
            return ParticipantValidation::failed(
                declaration_order,
                RenderError::syntax(format!("Invalid participant name '{rest}'"), line_number)
                    .with_suggestion(IDENT_HINT),
            );
        }

        ParticipantValidation {
            is_valid: true,
            short_name: Some(rest.to_string()),
            display_name: Some(rest.to_string()),
            has_alias: false,
            declaration_order,
            error: None,
        }
    }

    pub fn validate_diagram(&self, source: &DiagramSource) -> ValidationResult {
        self.validate_text(&source.content)
    }

    pub fn validate_text(&self, content: &str) -> ValidationResult {
        let mut title: Option<TitleValidation> = None;
        let mut participants = Vec::new();
        let mut errors = Vec::new();

        for (idx, raw) in content.lines().enumerate() {
            let line_number = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if grammar::is_title_line(line) {
                // First non-empty title wins; later title lines are ignored.
                if title.as_ref().is_some_and(|t| t.title.is_some()) {
                    continue;
                }
                let validation = self.validate_title_at(line, Some(line_number));
                if let Some(error) = &validation.error {
                    errors.push(error.clone());
                }
                if validation.title.is_some() || title.is_none() {
                    title = Some(validation);
                }
                continue;
            }

            if grammar::is_participant_line(line) {
                let validation =
                    self.validate_participant_at(line, participants.len(), Some(line_number));
                if let Some(error) = &validation.error {
                    errors.push(error.clone());
                }
                participants.push(validation);
            }
        }

        let participant_map: BTreeMap<String, String> = participants
            .iter()
            .filter(|p| p.is_valid)
            .filter_map(|p| Some((p.short_name.clone()?, p.display_name.clone()?)))
            .collect();

        let title = title.unwrap_or_default();
        let title_ok = title.title.is_none() || title.is_valid;
        let participants_ok = participants.iter().all(|p| p.is_valid);

        ValidationResult {
            is_valid: title_ok && participants_ok && errors.is_empty(),
            title,
            participants,
            participant_map,
            errors,
        }
    }
}
