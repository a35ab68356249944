pub mod task;
pub mod task_sequence;

pub use crate::core::task::{PipelineTask, TaskContext, TaskResult};
pub use crate::core::task_sequence::{RetryPolicy, TaskSequence};
pub use crate::utils::error::Result;
