//! Persistent record of every diagnosis made

mod record;
mod store;

pub use record::{HistoryRecord, DISPLAY_TIMESTAMP_FORMAT};
pub use store::{HistoryStore, HISTORY_COLUMNS};
