use super::{StoreError, StoreResult, TaskStore};
use crate::tables::{NewTask, Task, TaskChangeset};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-local task table. Ids count up from 1 and are never handed out
/// twice, even after a delete.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: BTreeMap<i32, Task>,
    last_id: i32,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl TaskStore for MemoryTaskStore {
    fn list_all(&self) -> StoreResult<Vec<Task>> {
        Ok(self.read()?.tasks.values().cloned().collect())
    }

    fn insert(&self, task: NewTask) -> StoreResult<Task> {
        let mut state = self.write()?;
        state.last_id += 1;
        let task = task.into_task(state.last_id);
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    fn get(&self, id: i32) -> StoreResult<Task> {
        self.read()?
            .tasks
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: i32, changes: &TaskChangeset) -> StoreResult<Task> {
        let mut state = self.write()?;
        let task = state.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        changes.apply_to(task);
        Ok(task.clone())
    }

    fn delete(&self, id: i32) -> StoreResult<()> {
        self.write()?
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn created_at() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-01-05 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryTaskStore::new();

        // Test create
        let task = store
            .insert(NewTask::new("Test task", created_at()))
            .expect("Failed to insert task");
        assert_eq!(task.id, 1);

        // Test get
        let fetched = store.get(task.id).expect("Failed to get task");
        assert_eq!(fetched.title, "Test task");

        // Test update
        let changes = TaskChangeset {
            title: Some("Updated task".to_string()),
            ..Default::default()
        };
        let updated = store.update(task.id, &changes).expect("Failed to update task");
        assert_eq!(updated.title, "Updated task");
        assert_eq!(updated.created_at, created_at());

        // Test delete
        store.delete(task.id).expect("Failed to delete task");

        // Verify deletion
        assert!(matches!(store.get(task.id), Err(StoreError::NotFound(1))));
        assert!(matches!(store.delete(task.id), Err(StoreError::NotFound(1))));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let store = MemoryTaskStore::new();
        let first = store.insert(NewTask::new("one", created_at())).unwrap();
        let second = store.insert(NewTask::new("two", created_at())).unwrap();
        store.delete(second.id).unwrap();
        let third = store.insert(NewTask::new("three", created_at())).unwrap();

        assert_eq!((first.id, second.id, third.id), (1, 2, 3));
        let ids: Vec<i32> = store.list_all().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_update_unknown_task() {
        let store = MemoryTaskStore::new();
        let result = store.update(42, &TaskChangeset::default());
        assert!(matches!(result, Err(StoreError::NotFound(42))));
    }
}
