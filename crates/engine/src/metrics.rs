use std::time::Duration;

/// Counts scheduler polls and publishes the count once per window.
///
/// This runs on every poll regardless of whether a tick was due, so it measures how often the
/// host drives the scene, not the tick rate.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    elapsed: Duration,
    polls: u32,
    fps: u32,
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window: crate::clock::normalize_non_zero_duration(window, Duration::from_secs(1)),
            elapsed: Duration::ZERO,
            polls: 0,
            fps: 0,
        }
    }

    /// Last resampled value; zero until the first window completes.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Records one poll that happened `elapsed` after the previous one. Returns the new value
    /// when a window completed.
    pub fn record_poll(&mut self, elapsed: Duration) -> Option<u32> {
        self.polls = self.polls.saturating_add(1);
        self.elapsed = self.elapsed.saturating_add(elapsed);
        if self.elapsed < self.window {
            return None;
        }

        self.fps = self.polls;
        self.polls = 0;
        self.elapsed = Duration::ZERO;
        Some(self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resamples_once_per_window() {
        let mut counter = FpsCounter::new(Duration::from_secs(1));

        for _ in 0..59 {
            assert_eq!(counter.record_poll(Duration::from_millis(16)), None);
        }
        assert_eq!(counter.fps(), 0);

        assert_eq!(counter.record_poll(Duration::from_millis(100)), Some(60));
        assert_eq!(counter.fps(), 60);
        assert_eq!(counter.record_poll(Duration::from_millis(16)), None);
        assert_eq!(counter.fps(), 60);
    }

    #[test]
    fn long_stall_reports_polls_seen_in_window() {
        let mut counter = FpsCounter::new(Duration::from_secs(1));
        counter.record_poll(Duration::from_millis(10));

        assert_eq!(counter.record_poll(Duration::from_secs(2)), Some(2));
        assert_eq!(counter.record_poll(Duration::from_millis(10)), None);
    }
}
