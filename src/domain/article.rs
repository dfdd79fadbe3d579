use serde::{Deserialize, Serialize};

/// Appended to every preview.
pub const TRUNCATION_MARKER: &str = "...";

/// Content at or above this many characters keeps a quarter, shorter content keeps half.
pub const LONG_CONTENT_CHARS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Assigned by the store on insert; zero until persisted.
    pub id: i64,
    pub title: String,
    pub content: String,
    pub preview: String,
    /// Seconds since the Unix epoch, zero when the feed date was unreadable.
    pub published: i64,
    pub link: String,
}

impl Article {
    pub fn new(title: impl Into<String>, content: impl Into<String>, published: i64, link: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            preview: String::new(),
            published,
            link: link.into(),
        }
    }

    /// Fill `preview` from `content`.
    pub fn with_preview(mut self) -> Self {
        self.preview = make_preview(&self.content);
        self
    }
}

/// Leading quarter (long content) or half (short content) of the characters, plus the marker.
pub fn make_preview(content: &str) -> String {
    let total = content.chars().count();
    let keep = if total >= LONG_CONTENT_CHARS {
        total / 4
    } else {
        total / 2
    };

    let mut preview: String = content.chars().take(keep).collect();
    preview.push_str(TRUNCATION_MARKER);
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(preview: &str) -> &str {
        preview.strip_suffix(TRUNCATION_MARKER).unwrap()
    }

    #[test]
    fn test_preview_short_content_keeps_half() {
        assert_eq!(make_preview("abcdefgh"), "abcd...");
    }

    #[test]
    fn test_preview_long_content_keeps_quarter() {
        let content = "x".repeat(200);
        let preview = make_preview(&content);
        assert_eq!(prefix(&preview).len(), 50);
    }

    #[test]
    fn test_preview_boundary_at_one_hundred_chars() {
        let just_below = "y".repeat(99);
        let at_limit = "y".repeat(100);
        assert_eq!(prefix(&make_preview(&just_below)).len(), 49);
        assert_eq!(prefix(&make_preview(&at_limit)).len(), 25);
    }

    #[test]
    fn test_preview_counts_characters_not_bytes() {
        let content = "привет мир"; // 10 chars, 19 bytes
        assert_eq!(make_preview(content), "приве...");
    }

    #[test]
    fn test_preview_always_ends_with_marker_and_prefix_is_shorter() {
        let samples = ["a", "ab", "hello world", &"long ".repeat(60)];
        for content in samples {
            let preview = make_preview(content);
            assert!(preview.ends_with(TRUNCATION_MARKER));
            assert!(prefix(&preview).chars().count() < content.chars().count());
        }
    }

    #[test]
    fn test_preview_strictly_shorter_once_prefix_outweighs_marker() {
        for len in 7..300 {
            let content = "z".repeat(len);
            assert!(make_preview(&content).chars().count() < len, "len {}", len);
        }
    }

    #[test]
    fn test_preview_of_empty_content_is_marker() {
        assert_eq!(make_preview(""), TRUNCATION_MARKER);
    }

    #[test]
    fn test_with_preview_leaves_id_unset() {
        let article = Article::new("Title", "0123456789", 100, "https://example.com/a").with_preview();
        assert_eq!(article.preview, "01234...");
        assert_eq!(article.id, 0);
    }
}
