use super::{StoreError, StoreResult, TaskStore};
use crate::tables::{NewTask, Task, TaskChangeset};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use std::sync::Arc;

// Connection pool type
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgTaskStore {
    pool: Arc<Pool>,
}

impl PgTaskStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Builds a pool against `database_url`.
    pub fn connect(database_url: &str) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder().build(manager)?;
        Ok(Self::new(pool))
    }
}

fn not_found_or(err: diesel::result::Error, task_id: i32) -> StoreError {
    match err {
        diesel::result::Error::NotFound => StoreError::NotFound(task_id),
        _ => StoreError::Database(err),
    }
}

impl TaskStore for PgTaskStore {
    fn list_all(&self) -> StoreResult<Vec<Task>> {
        use crate::schema::tasks::dsl::*;

        let mut conn = self.pool.get()?;
        let results = tasks
            .order(id.asc())
            .select(Task::as_select())
            .load(&mut conn)?;
        Ok(results)
    }

    fn insert(&self, new_task: NewTask) -> StoreResult<Task> {
        use crate::schema::tasks;

        let mut conn = self.pool.get()?;
        let task = diesel::insert_into(tasks::table)
            .values(&new_task)
            .returning(Task::as_returning())
            .get_result(&mut conn)?;
        Ok(task)
    }

    fn get(&self, task_id: i32) -> StoreResult<Task> {
        use crate::schema::tasks::dsl::*;

        let mut conn = self.pool.get()?;
        tasks
            .find(task_id)
            .select(Task::as_select())
            .first(&mut conn)
            .map_err(|err| not_found_or(err, task_id))
    }

    fn update(&self, task_id: i32, changes: &TaskChangeset) -> StoreResult<Task> {
        use crate::schema::tasks::dsl::*;

        // diesel rejects an UPDATE with no SET clause
        if changes.is_empty() {
            return self.get(task_id);
        }

        let mut conn = self.pool.get()?;
        diesel::update(tasks.find(task_id))
            .set(changes)
            .returning(Task::as_returning())
            .get_result(&mut conn)
            .map_err(|err| not_found_or(err, task_id))
    }

    fn delete(&self, task_id: i32) -> StoreResult<()> {
        use crate::schema::tasks::dsl::*;

        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(tasks.find(task_id)).execute(&mut conn)?;

        if deleted > 0 {
            Ok(())
        } else {
            Err(StoreError::NotFound(task_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Priority;
    use chrono::NaiveDate;

    fn setup_store() -> PgTaskStore {
        dotenv::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgTaskStore::connect(&database_url).expect("Failed to create pool.")
    }

    #[test]
    #[ignore = "requires DATABASE_URL pointing at a migrated PostgreSQL database"]
    fn test_tasks_crud() {
        let store = setup_store();
        let now = chrono::Local::now().naive_local();

        // Test Create
        let mut new_task = NewTask::new("Test task", now);
        new_task.priority = Priority::from("Someday");
        new_task.due_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let created = store.insert(new_task).expect("Error saving new task");
        assert!(!created.completed);
        assert_eq!(created.category, "General");
        assert_eq!(created.priority, Priority::Other("Someday".to_string()));

        // Test Read
        let read = store.get(created.id).expect("Error loading task");
        assert_eq!(read.title, created.title);
        assert!(store
            .list_all()
            .expect("Error listing tasks")
            .iter()
            .any(|task| task.id == created.id));

        // Test Update
        let mut changes = TaskChangeset::toggle(&read, now);
        changes.due_date = Some(None);
        let updated = store
            .update(created.id, &changes)
            .expect("Error updating task");
        assert!(updated.completed);
        assert!(updated.completed_at.is_some());
        assert!(updated.due_date.is_none());

        let unchanged = store
            .update(created.id, &TaskChangeset::default())
            .expect("Error applying empty changeset");
        assert_eq!(unchanged, updated);

        // Test Delete
        store.delete(created.id).expect("Error deleting task");

        // Verify deletion
        assert!(matches!(
            store.get(created.id),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(created.id),
            Err(StoreError::NotFound(_))
        ));
    }
}
