//! SeaORM entities. Foreign keys carry the delete policies of the domain:
//! posts and comments die with their author, comments with their post, and
//! posts lose their group when it is deleted.

pub mod comment;
pub mod group;
pub mod post;
pub mod user;
