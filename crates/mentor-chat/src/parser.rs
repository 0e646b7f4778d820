//! Model-output parser.
//!
//! A completion is untrusted free text. The parser splits it at the
//! "Next Interaction Prompts" marker into the main answer and the numbered
//! follow-up suggestions that trail it, scrubbing the emphasis asterisks
//! and section labels the model tends to echo from its prompt template.
//! It is total: any input yields a valid [`ParsedAnswer`], never an error.

use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// Compiled patterns (compiled once, reused across calls)
// =============================================================================

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)next\s+interaction\s+prompts\s*:?").unwrap());

static ITEM_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.").unwrap());

static MENTORSHIP_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:topic-specific\s+)?mentorship\s+response\s*:?").unwrap());

static ENGAGEMENT_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:interactive\s+)?engagement\s+question\s*:?").unwrap());

static SPACE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

// =============================================================================
// ParsedAnswer
// =============================================================================

/// A model completion split into the answer and its follow-up suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnswer {
    /// The answer shown (and spoken) to the user. Never contains the
    /// marker phrase.
    pub main_text: String,
    /// Trimmed, non-empty suggestions in their original order.
    pub suggestions: Vec<String>,
}

/// Split a raw completion at the first marker occurrence.
///
/// Everything before the marker becomes the cleaned `main_text`;
/// numbered items after it become `suggestions`. A missing marker
/// yields the whole cleaned text with no suggestions, and malformed
/// numbering yields fewer (or zero) suggestions rather than an error.
pub fn parse(raw: &str) -> ParsedAnswer {
    match MARKER_RE.find(raw) {
        Some(marker) => ParsedAnswer {
            main_text: clean_main_text(&raw[..marker.start()]),
            suggestions: extract_suggestions(&raw[marker.end()..]),
        },
        None => ParsedAnswer {
            main_text: clean_main_text(raw),
            suggestions: Vec::new(),
        },
    }
}

// -- Private helpers --

/// Pull numbered items out of the block after the marker.
///
/// An item runs from its "integer + period" prefix to the next such
/// prefix or the end of the block, so bodies may span line breaks.
fn extract_suggestions(block: &str) -> Vec<String> {
    let starts: Vec<_> = ITEM_START_RE.find_iter(block).collect();
    let mut suggestions = Vec::with_capacity(starts.len());

    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).map_or(block.len(), |next| next.start());
        let item = clean_item(&block[start.end()..end]);
        if !item.is_empty() {
            suggestions.push(item);
        }
    }

    suggestions
}

/// Scrub emphasis asterisks, line breaks, and echoed section labels.
fn clean_main_text(text: &str) -> String {
    let flattened = flatten(text);
    let stripped = MENTORSHIP_LABEL_RE.replace_all(&flattened, " ");
    let stripped = ENGAGEMENT_LABEL_RE.replace_all(&stripped, " ");
    collapse_spaces(&stripped)
}

fn clean_item(text: &str) -> String {
    collapse_spaces(&flatten(text))
}

/// Remove asterisks and turn line breaks into spaces.
fn flatten(text: &str) -> String {
    text.replace('*', "").replace('\r', " ").replace('\n', " ")
}

fn collapse_spaces(text: &str) -> String {
    SPACE_RUN_RE.replace_all(text, " ").trim().to_string()
}

// =============================================================================
// Tests
// =============================================================================
