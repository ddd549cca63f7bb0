//! Domain entities - the core business objects.

mod comment;
mod group;
mod post;
mod user;

pub use comment::{Comment, NewComment};
pub use group::{Group, NewGroup};
pub use post::{NewPost, Post, PostFilter};
pub use user::{NewUser, User};
