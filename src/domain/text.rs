//! Tokenization helpers shared by the classifier, retriever and scorers

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static STEP_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)\bstep\s+\d+\s*:|^\s*\d+[.)]\s+\S").expect("valid step marker regex")
});

/// Lowercase the text and split it on anything that is not alphanumeric
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokens with stopwords removed
pub fn content_tokens(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !stopwords.contains(t))
        .collect()
}

/// Number of times the phrase occurs as a contiguous token sequence
pub fn count_phrase(tokens: &[String], phrase: &str) -> usize {
    let needle = tokenize(phrase);
    if needle.is_empty() || needle.len() > tokens.len() {
        return 0;
    }

    tokens
        .windows(needle.len())
        .filter(|window| window.iter().zip(&needle).all(|(a, b)| a == b))
        .count()
}

pub fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    count_phrase(tokens, phrase) > 0
}

/// Split text into trimmed sentences on `.`, `!`, `?` and line breaks
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c == '\n' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// `Step N:` markers or a numbered list
pub fn has_step_markers(text: &str) -> bool {
    STEP_MARKER.is_match(text)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
