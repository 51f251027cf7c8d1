//! Persistence boundary for tasks.
//!
//! Request handlers only see the [`TaskStore`] trait; the concrete store is
//! chosen once at startup and threaded through [`crate::api::AppState`].

use crate::tables::{NewTask, Task, TaskChangeset};
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::MemoryTaskStore;
pub use postgres::{PgTaskStore, Pool};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("task store lock poisoned")]
    Poisoned,
}

pub trait TaskStore: Send + Sync {
    /// Every task, ordered by id.
    fn list_all(&self) -> StoreResult<Vec<Task>>;

    fn insert(&self, task: NewTask) -> StoreResult<Task>;

    fn get(&self, id: i32) -> StoreResult<Task>;

    /// Applies `changes` and returns the updated task. An empty changeset
    /// returns the task as stored.
    fn update(&self, id: i32, changes: &TaskChangeset) -> StoreResult<Task>;

    fn delete(&self, id: i32) -> StoreResult<()>;
}
