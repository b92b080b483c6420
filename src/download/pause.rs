//! Suspension points of the download loop
//!
//! Backoff, rate-limit cooldowns and pacing pauses all go through a
//! [`Sleeper`], so the whole loop can be driven without real delays.

use async_trait::async_trait;
use rand::Rng;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested duration
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested duration, in order
    pub fn durations(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times `duration` was requested exactly
    pub fn count_of(&self, duration: Duration) -> usize {
        self.durations().iter().filter(|d| **d == duration).count()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Draws a pause uniformly from `[min_secs, max_secs]`
pub fn random_pause<R: Rng + ?Sized>(rng: &mut R, min_secs: f64, max_secs: f64) -> Duration {
    let min = min_secs.max(0.0);
    let max = max_secs.max(min);
    Duration::from_secs_f64(rng.gen_range(min..=max))
}
