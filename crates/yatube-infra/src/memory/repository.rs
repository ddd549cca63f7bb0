use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use yatube_core::domain::{
    Comment, Group, NewComment, NewGroup, NewPost, NewUser, Post, PostFilter, User,
};
use yatube_core::error::RepoError;
use yatube_core::ports::{
    BaseRepository, CommentRepository, GroupRepository, PostRepository, UserRepository,
};

use super::store::{MemoryStore, Table, Tables};

/// An entity stored in one of the [`Tables`].
pub trait MemoryEntity: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;

    fn table(tables: &Tables) -> &Table<Self>;

    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;

    /// Unique and foreign-key checks run before a row is written.
    fn check(_tables: &Tables, _entity: &Self) -> Result<(), RepoError> {
        Ok(())
    }

    /// Delete policy for rows that reference a removed one.
    fn on_delete(_tables: &mut Tables, _id: i64) {}
}

/// Generic in-memory repository over one table of a shared [`MemoryStore`].
pub struct InMemoryRepository<T> {
    store: Arc<MemoryStore>,
    _entity: PhantomData<T>,
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryGroupRepository = InMemoryRepository<Group>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

impl<T: MemoryEntity> InMemoryRepository<T> {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Assign the next id and the current time, then insert.
    async fn insert_with<F>(&self, build: F) -> Result<T, RepoError>
    where
        F: FnOnce(i64, DateTime<Utc>) -> T + Send,
    {
        let mut tables = self.store.tables.write().await;
        let id = T::table(&tables).last_id + 1;
        let entity = build(id, Utc::now());
        T::check(&tables, &entity)?;

        let table = T::table_mut(&mut tables);
        table.last_id = id;
        table.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn select<R>(&self, query: impl FnOnce(&Table<T>) -> R + Send) -> R {
        let tables = self.store.tables.read().await;
        query(T::table(&tables))
    }
}

#[async_trait]
impl<T: MemoryEntity> BaseRepository<T, i64> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: i64) -> Result<Option<T>, RepoError> {
        Ok(self.select(|table| table.rows.get(&id).cloned()).await)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !T::table(&tables).contains(entity.id()) {
            return Err(RepoError::NotFound);
        }
        T::check(&tables, &entity)?;

        T::table_mut(&mut tables)
            .rows
            .insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if T::table_mut(&mut tables).rows.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        T::on_delete(&mut tables, id);
        Ok(())
    }
}

fn remove_comments(tables: &mut Tables, doomed: impl Fn(&Comment) -> bool) {
    tables.comments.rows.retain(|_, c| !doomed(c));
}

impl MemoryEntity for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.users
    }

    fn check(tables: &Tables, user: &Self) -> Result<(), RepoError> {
        let taken = tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username);
        if taken {
            return Err(RepoError::Constraint(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        Ok(())
    }

    /// Posts and comments are owned by their author.
    fn on_delete(tables: &mut Tables, id: i64) {
        tables.posts.rows.retain(|_, p| p.author_id != id);
        let posts = &tables.posts;
        let orphaned = |c: &Comment| c.author_id == id || !posts.contains(c.post_id);
        tables.comments.rows.retain(|_, c| !orphaned(c));
    }
}

impl MemoryEntity for Group {
    fn id(&self) -> i64 {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.groups
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.groups
    }

    fn check(tables: &Tables, group: &Self) -> Result<(), RepoError> {
        let taken = tables
            .groups
            .values()
            .any(|g| g.id != group.id && g.slug == group.slug);
        if taken {
            return Err(RepoError::Constraint(format!(
                "slug '{}' already exists",
                group.slug
            )));
        }
        Ok(())
    }

    /// Posts outlive their group.
    fn on_delete(tables: &mut Tables, id: i64) {
        for post in tables.posts.rows.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
    }
}

impl MemoryEntity for Post {
    fn id(&self) -> i64 {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.posts
    }

    fn check(tables: &Tables, post: &Self) -> Result<(), RepoError> {
        if !tables.users.contains(post.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                post.author_id
            )));
        }
        if let Some(group_id) = post.group_id {
            if !tables.groups.contains(group_id) {
                return Err(RepoError::Constraint(format!(
                    "group {group_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    fn on_delete(tables: &mut Tables, id: i64) {
        remove_comments(tables, |c| c.post_id == id);
    }
}

impl MemoryEntity for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn table(tables: &Tables) -> &Table<Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
        &mut tables.comments
    }

    fn check(tables: &Tables, comment: &Self) -> Result<(), RepoError> {
        if !tables.posts.contains(comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        if !tables.users.contains(comment.author_id) {
            return Err(RepoError::Constraint(format!(
                "author {} does not exist",
                comment.author_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        tracing::debug!(username = %user.username, "Creating user");
        self.insert_with(|id, now| user.into_user(id, now)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .select(|table| table.values().find(|u| u.username == username).cloned())
            .await)
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError> {
        self.insert_with(|id, _| group.into_group(id)).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        Ok(self
            .select(|table| table.values().find(|g| g.slug == slug).cloned())
            .await)
    }

    async fn list(&self) -> Result<Vec<Group>, RepoError> {
        let mut groups: Vec<Group> = self.select(|table| table.values().cloned().collect()).await;
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        self.insert_with(|id, now| post.into_post(id, now)).await
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        Ok(self
            .select(|table| table.values().filter(|p| filter.matches(p)).count() as u64)
            .await)
    }

    async fn find_page(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .select(|table| table.values().filter(|p| filter.matches(p)).cloned().collect())
            .await;
        posts.sort_by(Post::newest_first);

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_by_author(&self, author_id: i64, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self
            .select(|table| {
                table
                    .rows
                    .get(&id)
                    .filter(|p| p.author_id == author_id)
                    .cloned()
            })
            .await)
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        self.insert_with(|id, now| comment.into_comment(id, now)).await
    }

    async fn find_by_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .select(|table| table.values().filter(|c| c.post_id == post_id).cloned().collect())
            .await;
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}
