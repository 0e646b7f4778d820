//! Default follow-up suggestions.
//!
//! Seeds the UI with topic prompts before the first turn, and backs the
//! suggestions endpoint when no conversation context exists yet.

use rand::seq::IndexedRandom;

/// Phrases a sampled topic is slotted into.
pub const SUGGESTION_TEMPLATES: &[&str] = &[
    "Tell me about",
    "How do I approach",
    "What are best practices for",
    "What are common mistakes in",
    "How can I improve my",
    "What tools can help with",
];

/// Build default suggestions by sampling distinct topics.
///
/// Returns `min(max_suggestions, topics.len())` entries, each a randomly
/// chosen template applied to one sampled topic.
pub fn default_suggestions(topics: &[String], max_suggestions: usize) -> Vec<String> {
    let mut rng = rand::rng();
    let selected: Vec<&String> = topics
        .choose_multiple(&mut rng, max_suggestions.min(topics.len()))
        .collect();

    let mut suggestions = Vec::with_capacity(selected.len());
    for topic in selected {
        let template = SUGGESTION_TEMPLATES
            .choose(&mut rng)
            .copied()
            .unwrap_or("Tell me about");
        suggestions.push(format!("{} {}?", template, topic));
    }
    suggestions
}
