//! Task persistence.

use crate::domain::{Task, TaskError, TaskPriority, TaskStatus};
use chrono::Utc;
use parking_lot::RwLock;
use portico_core::BoxFuture;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Criteria for listing tasks. Empty filters match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilters {
    /// Keep only tasks in this state.
    pub status: Option<TaskStatus>,
    /// Keep only tasks with this priority.
    pub priority: Option<TaskPriority>,
}

impl TaskFilters {
    fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
    }
}

/// Input for creating a task. Status and priority fall back to
/// `pending` and `medium`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    /// Required title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial state, defaults to pending.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Initial priority, defaults to medium.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

/// Partial update for a task. At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    /// New title, if changing.
    #[serde(default)]
    pub title: Option<String>,
    /// New description, if changing.
    #[serde(default)]
    pub description: Option<String>,
    /// New state, if changing.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// New priority, if changing.
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl TaskPatch {
    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }
}

/// Storage backend for tasks.
///
/// Failures are reported as `anyhow::Error`; domain conditions such as a
/// missing task carry a [`TaskError`] in the chain so the error mappers
/// can classify them.
pub trait TaskStore: Send + Sync + 'static {
    /// Lists tasks matching the filters, oldest first.
    fn list(&self, filters: TaskFilters) -> BoxFuture<'_, anyhow::Result<Vec<Task>>>;

    /// Fetches a task by id.
    fn get(&self, id: Uuid) -> BoxFuture<'_, anyhow::Result<Task>>;

    /// Creates a task and returns it with generated fields filled in.
    fn create(&self, input: NewTask) -> BoxFuture<'_, anyhow::Result<Task>>;

    /// Applies a partial update and returns the updated task.
    fn update(&self, id: Uuid, patch: TaskPatch) -> BoxFuture<'_, anyhow::Result<Task>>;

    /// Deletes a task by id.
    fn delete(&self, id: Uuid) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// An in-memory [`TaskStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Returns `true` if the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl TaskStore for MemoryStore {
    fn list(&self, filters: TaskFilters) -> BoxFuture<'_, anyhow::Result<Vec<Task>>> {
        Box::pin(async move {
            let tasks = self.tasks.read();
            let mut matched: Vec<Task> = tasks
                .values()
                .filter(|task| filters.matches(task))
                .cloned()
                .collect();
            matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(matched)
        })
    }

    fn get(&self, id: Uuid) -> BoxFuture<'_, anyhow::Result<Task>> {
        Box::pin(async move {
            self.tasks
                .read()
                .get(&id)
                .cloned()
                .ok_or_else(|| anyhow::Error::new(TaskError::NotFound))
        })
    }

    fn create(&self, input: NewTask) -> BoxFuture<'_, anyhow::Result<Task>> {
        Box::pin(async move {
            let now = Utc::now();
            let task = Task {
                id: Uuid::now_v7(),
                title: input.title,
                description: input.description,
                status: input.status.unwrap_or(TaskStatus::Pending),
                priority: input.priority.unwrap_or(TaskPriority::Medium),
                created_at: now,
                updated_at: now,
            };
            self.tasks.write().insert(task.id, task.clone());
            Ok(task)
        })
    }

    fn update(&self, id: Uuid, patch: TaskPatch) -> BoxFuture<'_, anyhow::Result<Task>> {
        Box::pin(async move {
            let mut tasks = self.tasks.write();
            let task = tasks
                .get_mut(&id)
                .ok_or_else(|| anyhow::Error::new(TaskError::NotFound))?;

            if let Some(title) = patch.title {
                task.title = title;
            }
            if let Some(description) = patch.description {
                task.description = Some(description);
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            task.updated_at = Utc::now();
            Ok(task.clone())
        })
    }

    fn delete(&self, id: Uuid) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.tasks
                .write()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| anyhow::Error::new(TaskError::NotFound))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            status: None,
            priority: None,
        }
    }

    #[tokio::test]
    async fn test_create_fills_defaults() {
        let store = MemoryStore::new();
        let task = store.create(new_task("write docs")).await.unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_returns_not_found_sentinel() {
        let store = MemoryStore::new();
        let err = store.get(Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::NotFound));
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_priority() {
        let store = MemoryStore::new();
        store
            .create(NewTask {
                status: Some(TaskStatus::Completed),
                priority: Some(TaskPriority::High),
                ..new_task("a")
            })
            .await
            .unwrap();
        store.create(new_task("b")).await.unwrap();

        let all = store.list(TaskFilters::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let completed = store
            .list(TaskFilters {
                status: Some(TaskStatus::Completed),
                priority: None,
            })
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title, "a");

        let high_pending = store
            .list(TaskFilters {
                status: Some(TaskStatus::Pending),
                priority: Some(TaskPriority::High),
            })
            .await
            .unwrap();
        assert!(high_pending.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_creation() {
        let store = MemoryStore::new();
        for title in ["first", "second", "third"] {
            store.create(new_task(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list(TaskFilters::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_update_touches_only_given_fields() {
        let store = MemoryStore::new();
        let task = store.create(new_task("draft")).await.unwrap();

        let updated = store
            .update(
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    ..TaskPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "draft");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let store = MemoryStore::new();
        let err = store
            .update(Uuid::now_v7(), TaskPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::NotFound));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let task = store.create(new_task("gone soon")).await.unwrap();

        store.delete(task.id).await.unwrap();
        assert!(store.is_empty());

        let err = store.delete(task.id).await.unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::NotFound));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch {
            title: Some("x".to_string()),
            ..TaskPatch::default()
        }
        .is_empty());
    }
}
