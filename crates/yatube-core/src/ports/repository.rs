use async_trait::async_trait;

use crate::domain::{
    Comment, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostFilter, User,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Overwrite a stored entity. Fails with `NotFound` if it does not exist.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the relation's delete policy to
    /// everything that references it.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i64> {
    /// Store a new user. A taken username is a `Constraint` error.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait GroupRepository: BaseRepository<Group, i64> {
    /// Store a new group. A taken slug is a `Constraint` error.
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// Every group, ordered by title.
    async fn list(&self) -> Result<Vec<Group>, RepoError>;
}

/// Post repository. Every listing is ordered newest first.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    /// Store a new post, stamping its publication date.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError>;

    async fn find_page(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;

    /// Find a post only if it was written by `author_id`.
    async fn find_by_author(&self, author_id: i64, id: i64) -> Result<Option<Post>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i64> {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Comments on a post, oldest first.
    async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;
}
