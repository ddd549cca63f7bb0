use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity - a user-authored reply to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

impl NewComment {
    pub fn new(post_id: i64, author_id: i64, text: String) -> Self {
        Self {
            post_id,
            author_id,
            text,
        }
    }

    pub fn into_comment(self, id: i64, created: DateTime<Utc>) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            author_id: self.author_id,
            text: self.text,
            created,
        }
    }
}
