/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

use crate::models::MutationKind;

/// Colour of a queued task in `status` output.
pub fn color_for_kind(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::Create => GREEN,
        MutationKind::Update => YELLOW,
        MutationKind::Delete => RED,
    }
}

/// GREY for an event that never reached the remote store, RESET otherwise.
pub fn color_for_remote_ref<T>(remote_ref: Option<T>) -> &'static str {
    if remote_ref.is_some() { RESET } else { GREY }
}
