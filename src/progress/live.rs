use super::{ProgressReporter, TaskHandle};
use chrono::Local;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const OVERALL_TEMPLATE: &str =
    "{spinner:.green.bold} {msg:.bold} {wide_bar:.green/white.dim} {pos}/{len} pages";
const PAGE_TEMPLATE: &str = "  {prefix:.blue} {bar:40.cyan/white.dim} {pos}/{len} images";
const PROGRESS_CHARS: &str = "━━";

#[derive(Default)]
struct Bars {
    /// Bars indexed by `TaskHandle`; `None` once a bar left the screen
    all: Vec<Option<ProgressBar>>,

    /// Index of the current album bar
    overall: Option<usize>,

    /// Index of the current page bar
    page: Option<usize>,
}

impl Bars {
    fn get(&self, index: usize) -> Option<ProgressBar> {
        self.all.get(index).cloned().flatten()
    }

    fn take(&mut self, index: usize) -> Option<ProgressBar> {
        self.all.get_mut(index).and_then(Option::take)
    }
}

/// Terminal progress display
///
/// One bar per album and one for the album page in progress, with log events
/// printed above them. A page bar is cleared once complete or when the next
/// page starts. Log events are mirrored to `tracing` at debug level.
pub struct LiveManager {
    multi: MultiProgress,
    bars: Mutex<Bars>,
}

impl LiveManager {
    /// Creates a manager drawing to stderr
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(Bars::default()),
        }
    }

    /// Creates a manager that draws nothing
    pub fn hidden() -> Self {
        let manager = Self::new();
        manager.multi.set_draw_target(ProgressDrawTarget::hidden());
        manager
    }

    fn lock(&self) -> MutexGuard<'_, Bars> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, bar: ProgressBar) -> TaskHandle {
        let mut bars = self.lock();
        bars.all.push(Some(bar));
        TaskHandle::new(bars.all.len() - 1)
    }

    /// Removes the current page bar from the display
    fn clear_page(&self) {
        let bar = {
            let mut bars = self.lock();
            bars.page.take().and_then(|index| bars.take(index))
        };
        if let Some(bar) = bar {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }
}

impl Default for LiveManager {
    fn default() -> Self {
        Self::new()
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS)
}

impl ProgressReporter for LiveManager {
    fn add_overall_task(&self, description: &str, total: u64) -> TaskHandle {
        self.clear_page();
        let previous = {
            let bars = self.lock();
            bars.overall.and_then(|index| bars.get(index))
        };
        if let Some(bar) = previous {
            bar.finish();
        }

        let bar = self.multi.add(ProgressBar::new(total).with_style(style(OVERALL_TEMPLATE)));
        bar.set_message(description.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let handle = self.register(bar);
        self.lock().overall = Some(handle.index());
        handle
    }

    fn add_task(&self, parent: usize, total: u64) -> TaskHandle {
        self.clear_page();
        let bar = self.multi.add(ProgressBar::new(total).with_style(style(PAGE_TEMPLATE)));
        bar.set_prefix(format!("Page {}", parent + 1));

        let handle = self.register(bar);
        self.lock().page = Some(handle.index());
        handle
    }

    fn update_task(&self, task: TaskHandle, advance: u64) {
        let (bar, is_page) = {
            let bars = self.lock();
            (bars.get(task.index()), bars.page == Some(task.index()))
        };
        let Some(bar) = bar else {
            return;
        };

        bar.inc(advance);
        if bar.length().is_some_and(|len| bar.position() >= len) {
            if is_page {
                self.clear_page();
            } else {
                bar.finish();
            }
        }
    }

    fn update_log(&self, category: &str, message: &str) {
        tracing::debug!(category = %category, "{}", message);
        let line = format!("{} [{}] {}", Local::now().format("%H:%M:%S"), category, message);
        if self.multi.println(&line).is_err() {
            tracing::info!("{}", line);
        }
    }

    fn stop(&self) {
        let bars = std::mem::take(&mut *self.lock());
        for bar in bars.all.into_iter().flatten() {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
    }
}
