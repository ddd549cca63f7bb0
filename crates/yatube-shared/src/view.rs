//! View models handed to the template engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display format for publication and comment dates.
pub const DATE_FORMAT: &str = "%-d %B %Y %H:%M";

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub title: String,
    pub slug: String,
}

/// A post as shown in feeds and on its own page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub url: String,
    pub text: String,
    pub pub_date: String,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    /// Public URL of the image, under the media prefix.
    pub image_url: Option<String>,
}

/// Path of a post's own page.
pub fn post_url(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub author: AuthorRef,
    pub text: String,
    pub created: String,
}

/// An entry of the group `<select>` on the post form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

/// Pager state for templates; page numbers are plain integers so the
/// template can build `?page=` links without branching on options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: u64,
    pub previous_page_number: u64,
}

impl<T> PageView<T> {
    pub fn new(object_list: Vec<T>, number: u64, num_pages: u64, count: u64) -> Self {
        Self {
            object_list,
            number,
            num_pages,
            count,
            has_next: number < num_pages,
            has_previous: number > 1,
            next_page_number: (number + 1).min(num_pages.max(1)),
            previous_page_number: number.saturating_sub(1).max(1),
        }
    }
}
