use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::Task;

/// In-memory backing store for the `TaskFactory` demo delegates.
#[derive(Clone)]
pub struct TaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
    next_id: Arc<RwLock<u64>>,
}

impl TaskStore {
    pub fn new() -> Self {
        let tasks = vec![
            Task { id: 1, title: "Write the spec".into(), completed: true },
            Task { id: 2, title: "Ship the runtime".into(), completed: false },
        ];
        TaskStore { tasks: Arc::new(RwLock::new(tasks)), next_id: Arc::new(RwLock::new(3)) }
    }

    pub async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    pub async fn get(&self, id: u64) -> Option<Task> {
        self.tasks.read().await.iter().find(|t| t.id == id).cloned()
    }

    pub async fn insert(&self, title: String, completed: bool) -> Task {
        let mut next_id = self.next_id.write().await;
        let task = Task { id: *next_id, title, completed };
        *next_id += 1;
        self.tasks.write().await.push(task.clone());
        task
    }

    pub async fn update(&self, id: u64, title: String, completed: bool) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.iter_mut().find(|t| t.id == id)?;
        task.title = title;
        task.completed = completed;
        Some(task.clone())
    }

    pub async fn delete(&self, id: u64) -> bool {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        tasks.len() != before
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
