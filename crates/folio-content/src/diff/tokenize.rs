//! Splitting content into diff tokens

use super::Granularity;

/// Split `text` into tokens whose concatenation is `text` again
pub(crate) fn tokenize(text: &str, granularity: Granularity) -> Vec<&str> {
    match granularity {
        Granularity::Chars => text
            .char_indices()
            .map(|(start, ch)| &text[start..start + ch.len_utf8()])
            .collect(),
        Granularity::Words => words(text),
        Granularity::Lines => text.split_inclusive('\n').collect(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Class {
    Space,
    Word,
    Other,
}

fn class_of(ch: char) -> Class {
    if ch.is_whitespace() {
        Class::Space
    } else if ch.is_alphanumeric() || ch == '_' {
        Class::Word
    } else {
        Class::Other
    }
}

/// Runs of word characters, runs of whitespace, and single punctuation marks
fn words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;

    for (idx, ch) in text.char_indices() {
        let class = class_of(ch);
        let continues = current == Some(class) && class != Class::Other;
        if !continues && idx > start {
            tokens.push(&text[start..idx]);
            start = idx;
        }
        current = Some(class);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Collapse every whitespace run to one space and trim both ends
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
