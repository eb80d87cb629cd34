use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::foundation::error::{GeoCamError, GeoCamResult};

/// Paces the recording loop; each tick yields the timestamp stamped into that frame.
pub trait FrameClock {
    fn tick(&mut self) -> impl Future<Output = DateTime<Utc>>;
}

/// Wall-clock ticks at a fixed rate. Late ticks are skipped rather than bunched.
#[derive(Debug)]
pub struct IntervalClock {
    interval: tokio::time::Interval,
}

impl IntervalClock {
    pub fn new(fps: u32) -> GeoCamResult<Self> {
        if fps == 0 {
            return Err(GeoCamError::validation("clock fps must be non-zero"));
        }
        let mut interval = tokio::time::interval(Duration::from_secs(1) / fps);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Ok(Self { interval })
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl FrameClock for IntervalClock {
    async fn tick(&mut self) -> DateTime<Utc> {
        self.interval.tick().await;
        Utc::now()
    }
}

/// Ticks immediately with synthetic timestamps `start, start + step, ...`.
///
/// Used for offline transcoding, where frames come as fast as the source decodes them.
/// With a limit, the clock stops ticking (pends forever) after that many ticks.
#[derive(Clone, Debug)]
pub struct SteppedClock {
    next: DateTime<Utc>,
    step: TimeDelta,
    remaining: Option<u64>,
}

impl SteppedClock {
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            next: start,
            step,
            remaining: None,
        }
    }

    /// One tick per frame at `fps`.
    pub fn at_fps(start: DateTime<Utc>, fps: u32) -> GeoCamResult<Self> {
        if fps == 0 {
            return Err(GeoCamError::validation("clock fps must be non-zero"));
        }
        let step = TimeDelta::nanoseconds(1_000_000_000 / i64::from(fps));
        Ok(Self::new(start, step))
    }

    pub fn limit(mut self, ticks: u64) -> Self {
        self.remaining = Some(ticks);
        self
    }
}

impl FrameClock for SteppedClock {
    async fn tick(&mut self) -> DateTime<Utc> {
        match self.remaining.as_mut() {
            Some(0) => std::future::pending().await,
            Some(n) => *n -= 1,
            None => {}
        }
        let now = self.next;
        self.next += self.step;
        now
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/clock.rs"]
mod tests;
