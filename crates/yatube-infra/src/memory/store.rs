use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use yatube_core::domain::{Comment, Group, Post, User};

/// Rows of one entity keyed by id, plus the id sequence.
#[derive(Debug)]
pub struct Table<T> {
    pub(crate) rows: BTreeMap<i64, T>,
    pub(crate) last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    pub fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

#[derive(Debug, Default)]
pub struct Tables {
    pub users: Table<User>,
    pub groups: Table<Group>,
    pub posts: Table<Post>,
    pub comments: Table<Comment>,
}

/// Shared in-memory database.
///
/// Data is lost on process restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}
