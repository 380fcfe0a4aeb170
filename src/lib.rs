//! A file-backed to-do list: a JSON task store, the validator that guards
//! it, and the terminal front-end that drives both.

pub mod app;
pub mod config;
pub mod error;
pub mod store;
pub mod task;
pub mod ui;
pub mod validate;

pub use config::Config;
pub use error::{ConfigError, Error, StoreError, ValidationError};
pub use store::TaskStore;
pub use task::{Priority, Task, TaskFields};
pub use validate::{is_valid_date, sanitize_text, validate, validate_on, RawTaskInput, TaskDraft};
