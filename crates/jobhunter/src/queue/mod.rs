pub mod registry;
pub mod task;

pub use registry::TaskQueue;
pub use task::{StatusSummary, Task, TaskStatus};
