use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forms::CleanedPost;

/// Post entity - a user-authored text record, optionally grouped and illustrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    /// Path of the uploaded image, relative to the media root.
    pub image: Option<String>,
}

impl Post {
    /// Apply an edit. Only the text and the group change; the author and
    /// publication date stay as they were at creation.
    pub fn apply_edit(&mut self, cleaned: CleanedPost) {
        self.text = cleaned.text;
        self.group_id = cleaned.group_id;
    }

    /// Listing order: newest first, ties broken by the higher id.
    pub fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
        b.pub_date.cmp(&a.pub_date).then_with(|| b.id.cmp(&a.id))
    }
}

/// A post that has not been stored yet. The publication date is assigned
/// by the storage layer.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl NewPost {
    pub fn new(author_id: i64, cleaned: CleanedPost) -> Self {
        Self {
            text: cleaned.text,
            author_id,
            group_id: cleaned.group_id,
            image: None,
        }
    }

    pub fn into_post(self, id: i64, pub_date: DateTime<Utc>) -> Post {
        Post {
            id,
            text: self.text,
            pub_date,
            author_id: self.author_id,
            group_id: self.group_id,
            image: self.image,
        }
    }
}

/// Which posts a feed lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match *self {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn post(id: i64, pub_date: DateTime<Utc>) -> Post {
        NewPost {
            text: format!("post {id}"),
            author_id: 1,
            group_id: Some(7),
            image: None,
        }
        .into_post(id, pub_date)
    }

    #[test]
    fn test_apply_edit_keeps_author_and_date() {
        let now = Utc::now();
        let mut p = post(1, now);
        p.apply_edit(CleanedPost {
            text: "edited".to_string(),
            group_id: None,
        });

        assert_eq!(p.text, "edited");
        assert_eq!(p.group_id, None);
        assert_eq!(p.author_id, 1);
        assert_eq!(p.pub_date, now);
    }

    #[test]
    fn test_newest_first_ordering() {
        let now = Utc::now();
        let mut posts = vec![
            post(1, now - TimeDelta::minutes(5)),
            post(2, now),
            post(3, now),
        ];
        posts.sort_by(Post::newest_first);

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_filter_matches() {
        let p = post(1, Utc::now());
        assert!(PostFilter::All.matches(&p));
        assert!(PostFilter::Group(7).matches(&p));
        assert!(!PostFilter::Group(8).matches(&p));
        assert!(PostFilter::Author(1).matches(&p));
        assert!(!PostFilter::Author(2).matches(&p));
    }
}
