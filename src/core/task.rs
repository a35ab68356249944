use crate::utils::error::Result;
use std::path::PathBuf;
use std::time::Duration;

/// 單一 task 的執行結果
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_name: String,
    pub output: String,
    pub attempts: u32,
    pub duration: Duration,
}

/// Values handed from one task to the next within a run.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub execution_id: String,
    /// Key written by the fetch/upload task.
    pub uploaded_key: Option<String>,
    /// Local copy produced by the download task.
    pub downloaded_file: Option<PathBuf>,
    results: Vec<TaskResult>,
}

impl TaskContext {
    pub fn new(execution_id: String) -> Self {
        Self {
            execution_id,
            uploaded_key: None,
            downloaded_file: None,
            results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: TaskResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }
}

/// One node of the pipeline.
#[async_trait::async_trait]
pub trait PipelineTask: Send + Sync {
    fn name(&self) -> &str;

    /// Runs the task once. Returns a short description of what it produced.
    async fn run(&self, context: &mut TaskContext) -> Result<String>;
}
