pub mod project;
pub mod task;
pub mod timeline;

pub use project::{Project, ProjectSettings, DEFAULT_PROJECT_NAME};
pub use task::{Priority, Task, TaskDraft, DEFAULT_CATEGORY};
pub use timeline::{TimeUnit, Timeline};
