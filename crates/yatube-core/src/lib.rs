//! # Yatube Core
//!
//! The domain layer of Yatube.
//! This crate contains the blog's records, validation and pagination rules
//! with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;

pub use error::{DomainError, RepoError};
pub use pagination::{PageWindow, Paginator};
