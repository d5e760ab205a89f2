//! Schedule store: all database access in one place.

mod cells;
mod statuses;
mod tasks;

pub use cells::CellRepo;
pub use statuses::StatusRepo;
pub use tasks::TaskRepo;
