//! Quiet-interval debouncer for draw/edit bursts
//!
//! Every shape event bumps a generation. A scheduled settle only fires for the
//! latest generation and only once the quiet interval has elapsed since the
//! last event. Time is passed in so the window is testable.

use std::time::{Duration, Instant};

pub const DEFAULT_QUIET: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    generation: u64,
    last_event: Option<Instant>,
    settled: u64,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET)
    }
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, generation: 0, last_event: None, settled: 0 }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a shape event; returns its generation
    pub fn bump(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        self.last_event = Some(now);
        self.generation
    }

    /// True while the latest event has not been settled
    pub fn is_pending(&self) -> bool {
        self.settled < self.generation
    }

    /// Claim the settle for `generation` if it is still the latest and quiet
    pub fn try_settle(&mut self, generation: u64, now: Instant) -> bool {
        let quiet_elapsed = self
            .last_event
            .is_some_and(|last| now.saturating_duration_since(last) >= self.quiet);

        if generation == self.generation && self.is_pending() && quiet_elapsed {
            self.settled = generation;
            return true;
        }
        false
    }

    /// Drop any pending settle (drawings cleared or session reset)
    pub fn cancel(&mut self) {
        self.settled = self.generation;
    }
}
