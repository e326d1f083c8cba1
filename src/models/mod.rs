pub mod event;
pub mod record;
pub mod task;

pub use event::{Event, EventFields, RemoteRef};
pub use record::{Record, RecordInput};
pub use task::{Mutation, MutationKind, MutationTask};
