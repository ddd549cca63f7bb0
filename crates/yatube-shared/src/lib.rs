//! # Yatube Shared
//!
//! Types that cross the boundary between handlers and templates:
//! query-string parameters and the serializable view models pages render.

pub mod dto;
pub mod view;

pub use dto::{NextQuery, PageQuery};
pub use view::{
    AuthorRef, CommentView, GroupOption, GroupRef, PageView, PostCard, format_date, post_url,
};
