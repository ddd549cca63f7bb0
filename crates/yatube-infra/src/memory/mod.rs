//! In-process storage - used when no database is configured, and by tests.
//!
//! All four tables live behind one lock so that deletes can apply the same
//! cascade / set-null policies the PostgreSQL schema declares.

mod repository;
mod store;

pub use repository::{
    InMemoryCommentRepository, InMemoryGroupRepository, InMemoryPostRepository,
    InMemoryRepository, InMemoryUserRepository, MemoryEntity,
};
pub use store::{MemoryStore, Table, Tables};
