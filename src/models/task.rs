use super::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The remote operation a task replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "UPPERCASE")]
pub enum Mutation {
    Create(Event),
    Update(Event),
    Delete { id: i64 },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create(_) => MutationKind::Create,
            Mutation::Update(_) => MutationKind::Update,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    /// Business id of the event the mutation targets.
    pub fn target_id(&self) -> i64 {
        match self {
            Mutation::Create(ev) | Mutation::Update(ev) => ev.id,
            Mutation::Delete { id } => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "CREATE",
            MutationKind::Update => "UPDATE",
            MutationKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A durable, queued description of one pending write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationTask {
    pub id: String,
    pub op: Mutation,
    pub enqueued_at: DateTime<Utc>,
}

impl MutationTask {
    pub fn new(op: Mutation, now: DateTime<Utc>) -> Self {
        let id = format!(
            "{}-{}",
            now.timestamp_millis(),
            uuid::Uuid::new_v4().simple()
        );
        Self {
            id,
            op,
            enqueued_at: now,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.op.kind()
    }

    pub fn target_id(&self) -> i64 {
        self.op.target_id()
    }
}
