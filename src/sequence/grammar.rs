//! Line classifiers shared by the validators and the complexity analyzer.

use std::sync::LazyLock;

use regex::Regex;

pub(crate) const MESSAGE_FORMAT_HINT: &str = "Use the format: Sender->Receiver: Message";

static TITLE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^title\s*:\s*(.*)$").expect("title pattern"));

/// Anything that starts with the `title` keyword, with or without the colon.
static TITLE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^title(?:\s*:|\s|$)").expect("title keyword pattern"));

static PARTICIPANT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^participant(?:\s|$)").expect("participant pattern"));

static ALIASED_PARTICIPANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<display>.*)\s)?as\s+(?P<alias>\S.*?)\s*$").expect("alias pattern")
});

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("ident pattern"));

static MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^-]+)(-{1,2}>)([^:]+):?\s*(.*)$").expect("message pattern")
});

static ARROW_GLYPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{1,2}>").expect("arrow pattern"));

/// Complexity counting only needs `<left>-{1,2}><right>:`.
static COUNTED_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)-{1,2}>([^:]+):").expect("counted message pattern"));

const NOTE_PREFIXES: [&str; 3] = ["Note left of", "Note right of", "Note over"];

/// Text following `title:` when the line is a well-formed title declaration.
pub(crate) fn title_text(line: &str) -> Option<&str> {
    TITLE_DECL
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub(crate) fn is_title_line(line: &str) -> bool {
    TITLE_KEYWORD.is_match(line)
}

pub(crate) fn is_participant_line(line: &str) -> bool {
    PARTICIPANT_KEYWORD.is_match(line)
}

/// Note positions are matched case-sensitively.
pub(crate) fn is_note_line(line: &str) -> bool {
    NOTE_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

pub(crate) fn is_identifier(token: &str) -> bool {
    IDENT.is_match(token)
}

/// Splits the remainder of a participant line into `(display, alias)` when it
/// carries an `as <alias>` suffix. The display part may be empty.
pub(crate) fn split_alias(rest: &str) -> Option<(&str, &str)> {
    let caps = ALIASED_PARTICIPANT.captures(rest)?;
    let display = caps.name("display").map_or("", |m| m.as_str());
    let alias = caps.name("alias")?.as_str();
    Some((display, alias))
}

/// The participant keyword is ASCII, so byte slicing past it is safe.
pub(crate) fn participant_rest(line: &str) -> &str {
    line.get("participant".len()..).unwrap_or("").trim()
}

pub(crate) struct MessageParts<'a> {
    pub sender: &'a str,
    pub arrow: &'a str,
    pub receiver: &'a str,
    pub text: &'a str,
}

pub(crate) fn parse_message(line: &str) -> Option<MessageParts<'_>> {
    let caps = MESSAGE.captures(line)?;
    Some(MessageParts {
        sender: caps.get(1)?.as_str().trim(),
        arrow: caps.get(2)?.as_str(),
        receiver: caps.get(3)?.as_str().trim(),
        text: caps.get(4).map_or("", |m| m.as_str()),
    })
}

/// Byte range of the first arrow glyph in the line.
pub(crate) fn find_arrow(line: &str) -> Option<(usize, usize)> {
    ARROW_GLYPH.find(line).map(|m| (m.start(), m.end()))
}

pub(crate) fn counted_message(line: &str) -> Option<(&str, &str)> {
    let caps = COUNTED_MESSAGE.captures(line)?;
    Some((caps.get(1)?.as_str().trim(), caps.get(2)?.as_str().trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_keyword_requires_a_word_boundary() {
        assert!(is_title_line("title: Checkout"));
        assert!(is_title_line("TITLE Checkout"));
        assert!(is_title_line("title"));
        assert!(!is_title_line("titleBar->B: hi"));
        assert!(!is_title_line("title->B: hi"));
    }

    #[test]
    fn split_alias_keeps_the_last_as() {
        assert_eq!(split_alias("Alice as A"), Some(("Alice", "A")));
        assert_eq!(split_alias("Tom as Jerry as TJ"), Some(("Tom as Jerry", "TJ")));
        assert_eq!(split_alias("as A"), Some(("", "A")));
        assert_eq!(split_alias("Alice"), None);
    }

    #[test]
    fn message_pattern_accepts_single_and_double_hyphen() {
        let solid = parse_message("A->B: Hello").expect("solid arrow");
        assert_eq!((solid.sender, solid.arrow, solid.receiver), ("A", "->", "B"));
        assert_eq!(solid.text, "Hello");

        let dashed = parse_message("A --> B").expect("dashed arrow without text");
        assert_eq!((dashed.sender, dashed.arrow, dashed.receiver), ("A", "-->", "B"));
        assert_eq!(dashed.text, "");
    }

    #[test]
    fn note_prefixes_are_case_sensitive() {
        assert!(is_note_line("Note over A: thinking"));
        assert!(!is_note_line("note over A: thinking"));
    }
}
