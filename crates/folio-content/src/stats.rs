//! Text statistics stored alongside each version

use serde::{Deserialize, Serialize};

/// Word and character counts of a piece of content
///
/// Characters are Unicode scalar values, not bytes. Words are maximal runs of
/// non-whitespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    /// Whitespace-separated words
    pub word_count: u64,
    /// Unicode code points
    pub char_count: u64,
}

impl TextStats {
    /// Count words and characters in `content`
    #[must_use]
    pub fn of(content: &str) -> Self {
        Self {
            word_count: content.split_whitespace().count() as u64,
            char_count: content.chars().count() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_words() {
        assert_eq!(TextStats::of(""), TextStats::default());
        assert_eq!(TextStats::of("  \n\t").word_count, 0);
    }

    #[test]
    fn counts_words_across_whitespace_runs() {
        let stats = TextStats::of("  one two\n\nthree\tfour ");
        assert_eq!(stats.word_count, 4);
        assert_eq!(stats.char_count, 22);
    }

    #[test]
    fn counts_code_points_not_bytes() {
        let stats = TextStats::of("héllo wörld 🎉");
        assert_eq!(stats.char_count, 13);
        assert_eq!(stats.word_count, 3);
    }
}
