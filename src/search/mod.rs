//! Keyword parsing for topic search.
//!
//! A keyword is split on any whitespace. `#name` terms filter by tag, plain
//! terms filter by revision content. Terms within a group are OR-ed, the two
//! groups are AND-ed. Terms that are too short are ignored.

use crate::models::Memo;

/// Minimum length of a plain search word.
const MIN_WORD_CHARS: usize = 2;
/// Minimum length of a tag term after the leading `#`.
const MIN_TAG_CHARS: usize = 2;

/// A parsed search keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyword {
    pub words: Vec<String>,
    pub tags: Vec<String>,
}

impl Keyword {
    pub fn parse(keyword: &str) -> Self {
        let mut words = vec![];
        let mut tags = vec![];

        for term in keyword.split(char::is_whitespace) {
            if let Some(tag) = term.strip_prefix('#') {
                let tag = tag.trim_start_matches('#');
                if tag.chars().count() >= MIN_TAG_CHARS {
                    tags.push(tag.to_owned());
                }
            } else if term.chars().count() >= MIN_WORD_CHARS {
                words.push(term.to_owned());
            }
        }

        Self { words, tags }
    }

    /// True when no usable term is present: every topic matches.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.tags.is_empty()
    }

    /// Evaluate the keyword against a topic's revisions and tags.
    pub fn matches(&self, revisions: &[Memo], tags: &[String]) -> bool {
        let words_ok = self.words.is_empty()
            || revisions
                .iter()
                .any(|m| self.words.iter().any(|w| m.content.contains(w.as_str())));
        let tags_ok = self.tags.is_empty() || tags.iter().any(|t| self.tags.contains(t));
        words_ok && tags_ok
    }
}
