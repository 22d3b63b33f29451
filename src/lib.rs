// todoit - task manager with priorities, categories and due dates

pub mod config;
pub mod filter;
pub mod form;
pub mod models;
pub mod record;
pub mod render;
pub mod slot;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use filter::Filter;
pub use form::{CloseAction, TaskForm};
pub use models::{Category, Priority, Stats, Task, TaskData, now_ms};
pub use slot::{FileSlot, MemorySlot, Slot, SqliteSlot};
pub use store::{Query, TaskStore};
pub use view::View;
