//! Fixed-delay heartbeats on the monotonic clock.
//!
//! A heartbeat is polled from the run loop and simply declines to fire until
//! its delay has passed. Missed beats are never caught up.

use crate::config::TimingConfig;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Heartbeat {
    delay: Duration,
    // None while stopped.
    last: Option<Instant>,
}

impl Heartbeat {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    /// Starts (or restarts) counting from `now`; the first beat comes one
    /// full delay later.
    pub fn start(&mut self, now: Instant) {
        self.last = Some(now);
    }

    pub fn stop(&mut self) {
        self.last = None;
    }

    /// Fires at most once per call, and only if a full delay has elapsed
    /// since the previous beat.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) >= self.delay => {
                self.last = Some(now);
                true
            }
            _ => false,
        }
    }
}

/// The move and starvation heartbeats plus the shared pause flag.
#[derive(Clone, Debug)]
pub struct Scheduler {
    movement: Heartbeat,
    starvation: Heartbeat,
    paused: bool,
}

impl Scheduler {
    pub fn new(move_delay: Duration, starve_delay: Duration) -> Self {
        Self {
            movement: Heartbeat::new(move_delay),
            starvation: Heartbeat::new(starve_delay),
            paused: false,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.move_delay(), timing.starve_delay())
    }

    pub fn move_delay(&self) -> Duration {
        self.movement.delay()
    }

    pub fn starve_delay(&self) -> Duration {
        self.starvation.delay()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Restarts both heartbeats from `now`, unless paused.
    pub fn restart(&mut self, now: Instant) {
        if !self.paused {
            self.movement.start(now);
            self.starvation.start(now);
        }
    }

    pub fn set_paused(&mut self, paused: bool, now: Instant) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        if paused {
            self.movement.stop();
            self.starvation.stop();
        } else {
            self.restart(now);
        }
    }

    pub fn fire_movement(&mut self, now: Instant) -> bool {
        self.movement.fire(now)
    }

    pub fn fire_starvation(&mut self, now: Instant) -> bool {
        self.starvation.fire(now)
    }
}
