mod error;
mod model;
mod time;
mod validate;

pub use error::ValidationError;
pub use model::{Document, Recurrence, Task, DEFAULT_DURATION, MAX_DURATION, MIN_DURATION};
pub use validate::{validate_new_task, validate_task_patch, NewTask, TaskPatch};
