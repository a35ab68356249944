use crate::config::RetrySettings;
use crate::core::task::{PipelineTask, TaskContext, TaskResult};
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Fixed-delay retry applied to every task of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            retries: settings.retries,
            delay: settings.delay(),
        }
    }
}

/// Runs tasks strictly in insertion order. A task that still fails after its
/// retries stops the sequence.
pub struct TaskSequence {
    tasks: Vec<Box<dyn PipelineTask>>,
    retry: RetryPolicy,
    execution_id: String,
}

impl TaskSequence {
    pub fn new(execution_id: String) -> Self {
        Self {
            tasks: Vec::new(),
            retry: RetryPolicy::default(),
            execution_id,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn add_task(&mut self, task: Box<dyn PipelineTask>) {
        self.tasks.push(task);
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn execute_all(&self) -> Result<Vec<TaskResult>> {
        let mut context = TaskContext::new(self.execution_id.clone());

        tracing::info!(
            "🎬 Starting run {} ({} tasks)",
            self.execution_id,
            self.tasks.len()
        );

        for task in &self.tasks {
            let result = self.execute_task(task.as_ref(), &mut context).await?;

            tracing::info!(
                "✅ Task executed: {} (attempts: {}, duration: {:?}) -> {}",
                result.task_name,
                result.attempts,
                result.duration,
                result.output
            );
            context.add_result(result);
        }

        Ok(context.results().to_vec())
    }

    async fn execute_task(
        &self,
        task: &dyn PipelineTask,
        context: &mut TaskContext,
    ) -> Result<TaskResult> {
        let start_time = Instant::now();
        let mut attempts = 0u32;
        let span = tracing::info_span!(
            "task",
            name = task.name(),
            execution_id = %context.execution_id
        );

        loop {
            attempts += 1;
            tracing::info!("▶️ Running task {} (attempt {})", task.name(), attempts);

            match task.run(context).instrument(span.clone()).await {
                Ok(output) => {
                    return Ok(TaskResult {
                        task_name: task.name().to_string(),
                        output,
                        attempts,
                        duration: start_time.elapsed(),
                    });
                }
                Err(e) if e.is_retryable() && attempts <= self.retry.retries => {
                    tracing::warn!(
                        "🔄 Task {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        task.name(),
                        attempts,
                        self.retry.retries + 1,
                        e,
                        self.retry.delay
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    tracing::error!("❌ Task {} failed: {}", task.name(), e);
                    return Err(EtlError::TaskFailed {
                        task: task.name().to_string(),
                        attempts,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    /// 獲取執行摘要
    pub fn get_execution_summary(results: &[TaskResult]) -> HashMap<String, serde_json::Value> {
        let mut summary = HashMap::new();

        let total_duration: Duration = results.iter().map(|r| r.duration).sum();
        let total_attempts: u32 = results.iter().map(|r| r.attempts).sum();

        summary.insert("total_tasks".to_string(), results.len().into());
        summary.insert("total_attempts".to_string(), total_attempts.into());
        summary.insert(
            "total_duration_ms".to_string(),
            (total_duration.as_millis() as u64).into(),
        );
        summary.insert(
            "executed_tasks".to_string(),
            serde_json::Value::Array(
                results
                    .iter()
                    .map(|r| serde_json::Value::String(r.task_name.clone()))
                    .collect(),
            ),
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct MockTask {
        name: String,
        failures_before_success: u32,
        retryable: bool,
        calls: Arc<AtomicU32>,
    }

    impl MockTask {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                failures_before_success: 0,
                retryable: true,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(mut self, times: u32, retryable: bool) -> Self {
            self.failures_before_success = times;
            self.retryable = retryable;
            self
        }

        fn calls(&self) -> Arc<AtomicU32> {
            self.calls.clone()
        }
    }

    #[async_trait::async_trait]
    impl PipelineTask for MockTask {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, context: &mut TaskContext) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                return Err(if self.retryable {
                    EtlError::store("put_object", "SlowDown")
                } else {
                    EtlError::config("bad config")
                });
            }
            context.uploaded_key = Some(format!("{}-key", self.name));
            Ok(format!("{} ok in {}", self.name, context.execution_id))
        }
    }

    fn sequence(retries: u32) -> TaskSequence {
        TaskSequence::new("test_run".to_string()).with_retry(RetryPolicy {
            retries,
            delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_tasks_run_in_order() {
        let mut seq = sequence(0);
        seq.add_task(Box::new(MockTask::new("a")));
        seq.add_task(Box::new(MockTask::new("b")));
        seq.add_task(Box::new(MockTask::new("c")));

        let results = seq.execute_all().await.unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.task_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(results.iter().all(|r| r.attempts == 1));
        assert_eq!(results[2].output, "c ok in test_run");
    }

    #[tokio::test]
    async fn test_retryable_failure_is_retried() {
        let flaky = MockTask::new("flaky").failing(2, true);
        let calls = flaky.calls();

        let mut seq = sequence(2);
        seq.add_task(Box::new(flaky));

        let results = seq.execute_all().await.unwrap();
        assert_eq!(results[0].attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let flaky = MockTask::new("flaky").failing(5, true);
        let calls = flaky.calls();

        let mut seq = sequence(2);
        seq.add_task(Box::new(flaky));

        let err = seq.execute_all().await.unwrap_err();
        assert!(matches!(err, EtlError::TaskFailed { attempts: 3, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_failure_stops_later_tasks() {
        let broken = MockTask::new("broken").failing(1, false);
        let broken_calls = broken.calls();
        let after = MockTask::new("after");
        let after_calls = after.calls();

        let mut seq = sequence(2);
        seq.add_task(Box::new(broken));
        seq.add_task(Box::new(after));

        let err = seq.execute_all().await.unwrap_err();
        match err {
            EtlError::TaskFailed { task, attempts, .. } => {
                assert_eq!(task, "broken");
                assert_eq!(attempts, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(broken_calls.load(Ordering::SeqCst), 1);
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_execution_summary() {
        let results = vec![
            TaskResult {
                task_name: "a".to_string(),
                output: String::new(),
                attempts: 1,
                duration: Duration::from_millis(100),
            },
            TaskResult {
                task_name: "b".to_string(),
                output: String::new(),
                attempts: 2,
                duration: Duration::from_millis(200),
            },
        ];

        let summary = TaskSequence::get_execution_summary(&results);
        assert_eq!(summary["total_tasks"], serde_json::json!(2));
        assert_eq!(summary["total_attempts"], serde_json::json!(3));
        assert_eq!(summary["total_duration_ms"], serde_json::json!(300));
        assert_eq!(summary["executed_tasks"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = RetryPolicy::from(RetrySettings {
            retries: 3,
            delay_seconds: 5,
        });
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.delay, Duration::from_secs(5));
        assert_eq!(RetryPolicy::none().retries, 0);
    }
}
