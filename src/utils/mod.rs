pub mod colors;
pub mod date;
pub mod ids;
pub mod path;
pub mod table;
pub mod time;

pub use time::{calculate_duration_minutes, format_minutes};
