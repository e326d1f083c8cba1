//! Ordered list of writes not yet confirmed by the remote store.

use crate::models::{Mutation, MutationTask};
use chrono::Utc;

/// FIFO of pending tasks. Tasks only enter at the tail and only leave from
/// the head, after the remote has acknowledged them.
#[derive(Debug, Default, Clone)]
pub struct MutationQueue {
    tasks: Vec<MutationTask>,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<MutationTask>) -> Self {
        Self { tasks }
    }

    /// Append a task for `op` and return a copy of it.
    pub fn enqueue(&mut self, op: Mutation) -> MutationTask {
        let task = MutationTask::new(op, Utc::now());
        self.tasks.push(task.clone());
        task
    }

    pub fn push(&mut self, task: MutationTask) {
        self.tasks.push(task);
    }

    /// Head of the queue, without removing it.
    pub fn peek(&self) -> Option<&MutationTask> {
        self.tasks.first()
    }

    /// Remove the head, but only if it is the task that was just applied.
    pub fn confirm(&mut self, task_id: &str) -> bool {
        match self.tasks.first() {
            Some(head) if head.id == task_id => {
                self.tasks.remove(0);
                true
            }
            _ => false,
        }
    }

    /// True when some queued task targets this event id.
    pub fn is_pending(&self, event_id: i64) -> bool {
        self.tasks.iter().any(|t| t.target_id() == event_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MutationTask> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[MutationTask] {
        &self.tasks
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
