use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity - a shared link or text post.
///
/// `points` is the denormalized score aggregate: outside an in-flight vote
/// transaction it always equals the signed sum of the post's ledger entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub creator_id: i64,
    pub title: String,
    pub text: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Truncated body preview for feed listings.
    pub fn snippet(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            return self.text.clone();
        }
        let mut out: String = self.text.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }
}

/// Data required to create a post. Id, score and timestamps are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub creator_id: i64,
    pub title: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_with_text(text: &str) -> Post {
        let now = Utc::now();
        Post {
            id: 1,
            creator_id: 1,
            title: "title".to_string(),
            text: text.to_string(),
            points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn short_text_is_not_truncated() {
        let post = post_with_text("short body");
        assert_eq!(post.snippet(150), "short body");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        let post = post_with_text(&"x".repeat(200));
        let snippet = post.snippet(150);
        assert_eq!(snippet.chars().count(), 153);
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let post = post_with_text(&"é".repeat(200));
        let snippet = post.snippet(150);
        assert!(snippet.ends_with("..."));
    }
}
