//! Topic model: the derived, read-only summary of a group of revisions.

use serde::{Deserialize, Serialize};

use super::{Memo, TopicId};

/// Maximum number of characters kept in a derived topic title.
pub const TITLE_MAX_CHARS: usize = 10;

/// A topic exists as long as it has at least one revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    /// Timestamp of the most recent revision
    pub timestamp: i64,
}

impl Topic {
    /// Summarize a topic from its latest revision.
    pub fn from_latest(memo: &Memo) -> Self {
        Self {
            id: memo.topic_id.clone(),
            title: parse_title(&memo.content),
            timestamp: memo.timestamp,
        }
    }
}

/// Derive a display title: skip leading `#`, keep the first line, truncate, trim.
pub fn parse_title(content: &str) -> String {
    content
        .chars()
        .skip_while(|c| *c == '#')
        .take_while(|c| *c != '\n')
        .take(TITLE_MAX_CHARS)
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Query string of `GET /api/topics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicQuery {
    #[serde(default)]
    pub keyword: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_short() {
        assert_eq!(parse_title("a"), "a");
    }

    #[test]
    fn test_parse_title_skips_heading_marks() {
        assert_eq!(parse_title("# a"), "a");
        assert_eq!(parse_title("## b "), "b");
    }

    #[test]
    fn test_parse_title_first_line_only() {
        assert_eq!(parse_title("a\nb"), "a");
    }

    #[test]
    fn test_parse_title_truncates() {
        assert_eq!(parse_title("01234567890"), "0123456789");
        assert_eq!(parse_title("メモメモメモメモメモメモ"), "メモメモメモメモメモ");
    }
}
