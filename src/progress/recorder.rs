use super::{ProgressReporter, TaskHandle};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A task as seen by the reporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    /// Album description for overall tasks, empty for page subtasks
    pub description: String,

    /// Album page index for page subtasks
    pub parent: Option<usize>,

    pub total: u64,
    pub completed: u64,
}

impl TaskRecord {
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// A log event as emitted by the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub category: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct Recorded {
    tasks: Vec<TaskRecord>,
    logs: Vec<LogRecord>,
    stopped: bool,
}

/// Reporter that keeps everything in memory
///
/// Useful for headless runs and for asserting on what the core reported.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    inner: Mutex<Recorded>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All tasks in registration order
    pub fn tasks(&self) -> Vec<TaskRecord> {
        self.lock().tasks.clone()
    }

    /// Overall (album) tasks in registration order
    pub fn overall_tasks(&self) -> Vec<TaskRecord> {
        self.lock()
            .tasks
            .iter()
            .filter(|task| task.parent.is_none())
            .cloned()
            .collect()
    }

    /// Page subtasks in registration order
    pub fn page_tasks(&self) -> Vec<TaskRecord> {
        self.lock()
            .tasks
            .iter()
            .filter(|task| task.parent.is_some())
            .cloned()
            .collect()
    }

    pub fn task(&self, handle: TaskHandle) -> Option<TaskRecord> {
        self.lock().tasks.get(handle.index()).cloned()
    }

    /// All log events in emission order
    pub fn logs(&self) -> Vec<LogRecord> {
        self.lock().logs.clone()
    }

    /// Messages of every log event in `category`
    pub fn logs_in(&self, category: &str) -> Vec<String> {
        self.lock()
            .logs
            .iter()
            .filter(|log| log.category == category)
            .map(|log| log.message.clone())
            .collect()
    }

    pub fn count(&self, category: &str) -> usize {
        self.logs_in(category).len()
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }
}

impl ProgressReporter for RecordingReporter {
    fn add_overall_task(&self, description: &str, total: u64) -> TaskHandle {
        let mut recorded = self.lock();
        recorded.tasks.push(TaskRecord {
            description: description.to_string(),
            parent: None,
            total,
            completed: 0,
        });
        TaskHandle::new(recorded.tasks.len() - 1)
    }

    fn add_task(&self, parent: usize, total: u64) -> TaskHandle {
        let mut recorded = self.lock();
        recorded.tasks.push(TaskRecord {
            description: String::new(),
            parent: Some(parent),
            total,
            completed: 0,
        });
        TaskHandle::new(recorded.tasks.len() - 1)
    }

    fn update_task(&self, task: TaskHandle, advance: u64) {
        if let Some(record) = self.lock().tasks.get_mut(task.index()) {
            record.completed += advance;
        }
    }

    fn update_log(&self, category: &str, message: &str) {
        self.lock().logs.push(LogRecord {
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    fn stop(&self) {
        self.lock().stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_advance() {
        let reporter = RecordingReporter::new();
        let overall = reporter.add_overall_task("Album", 2);
        let page = reporter.add_task(0, 3);

        reporter.update_task(page, 1);
        reporter.update_task(page, 2);
        reporter.update_task(overall, 1);

        assert_eq!(reporter.task(page).unwrap().completed, 3);
        assert!(reporter.task(page).unwrap().is_complete());
        assert!(!reporter.task(overall).unwrap().is_complete());
        assert_eq!(reporter.overall_tasks().len(), 1);
        assert_eq!(reporter.page_tasks()[0].parent, Some(0));
    }

    #[test]
    fn test_logs_by_category() {
        let reporter = RecordingReporter::new();
        reporter.update_log("Rate limit", "first");
        reporter.update_log("Retrying", "second");
        reporter.update_log("Rate limit", "third");

        assert_eq!(reporter.logs().len(), 3);
        assert_eq!(reporter.logs_in("Rate limit"), vec!["first", "third"]);
        assert_eq!(reporter.count("Retrying"), 1);
        assert_eq!(reporter.count("Fetch failed"), 0);
    }

    #[test]
    fn test_unknown_handle_is_ignored() {
        let reporter = RecordingReporter::new();
        reporter.update_task(TaskHandle::new(7), 1);
        assert!(reporter.tasks().is_empty());
    }

    #[test]
    fn test_stop() {
        let reporter = RecordingReporter::new();
        assert!(!reporter.is_stopped());
        reporter.stop();
        assert!(reporter.is_stopped());
    }
}
