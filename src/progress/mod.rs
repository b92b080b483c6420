//! Progress reporting collaborator
//!
//! The download core never renders anything itself. It registers tasks,
//! advances them and emits categorized log events through
//! [`ProgressReporter`]; the implementation decides how to show them.
//!
//! # Components
//!
//! - `LiveManager`: terminal progress bars and log lines via `indicatif`
//! - `RecordingReporter`: keeps every task and event in memory

mod live;
mod recorder;

pub use live::LiveManager;
pub use recorder::{LogRecord, RecordingReporter, TaskRecord};

/// Log event categories emitted by the download core
pub mod category {
    /// Number of pages discovered for an album
    pub const ALBUM_PAGES: &str = "Album pages";

    /// A failed attempt that will be retried after a backoff
    pub const RETRYING: &str = "Retrying";

    /// A 429 response; a cooldown follows
    pub const RATE_LIMIT: &str = "Rate limit";

    /// A request error that aborts the remaining attempts
    pub const REQUEST_FAILED: &str = "Request failed";

    /// All attempts were used up
    pub const FETCH_FAILED: &str = "Fetch failed";

    /// One image could not be downloaded
    pub const FAILED_DOWNLOAD: &str = "Failed download";

    /// Summary for a page with at least one failed image
    pub const FAILED_DOWNLOADS: &str = "Failed downloads";

    /// Pause between album pages
    pub const PREPARING_TO_RESUME: &str = "Preparing to resume";
}

/// Opaque reference to a task registered with a [`ProgressReporter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(usize);

impl TaskHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Receives task, progress and log events from the download core
///
/// The core only writes through this interface and never reads progress back
/// to make decisions.
pub trait ProgressReporter: Send + Sync {
    /// Registers the overall task of an album, one unit per album page
    fn add_overall_task(&self, description: &str, total: u64) -> TaskHandle;

    /// Registers a subtask for album page `parent`, one unit per picture
    fn add_task(&self, parent: usize, total: u64) -> TaskHandle;

    /// Advances a task
    fn update_task(&self, task: TaskHandle, advance: u64);

    /// Emits a human-readable log event
    fn update_log(&self, category: &str, message: &str);

    /// Ends the display; no further events are expected
    fn stop(&self);
}
