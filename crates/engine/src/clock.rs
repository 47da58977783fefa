use std::time::Duration;

const FALLBACK_TICK_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

/// Fixed-period tick scheduler fed with wall-clock deltas.
///
/// Time accumulates across polls; each full period becomes one tick. When more ticks are due
/// than `max_ticks_per_poll`, the surplus backlog is dropped rather than replayed.
#[derive(Debug, Clone)]
pub struct TickClock {
    period: Duration,
    max_ticks_per_poll: u32,
    accumulator: Duration,
}

impl TickClock {
    pub fn new(period: Duration, max_ticks_per_poll: u32) -> Self {
        Self {
            period: normalize_non_zero_duration(period, FALLBACK_TICK_PERIOD),
            max_ticks_per_poll: max_ticks_per_poll.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulator
    }

    pub fn advance(&mut self, elapsed: Duration) -> StepPlan {
        let accumulator = self.accumulator.saturating_add(elapsed);
        let plan = plan_ticks(accumulator, self.period, self.max_ticks_per_poll);
        self.accumulator = plan.remaining_accumulator;
        plan
    }

    /// Forgets time accumulated towards the next tick.
    pub fn discard(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}

fn plan_ticks(mut accumulator: Duration, period: Duration, max_ticks: u32) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= period && ticks_to_run < max_ticks {
        accumulator = accumulator.saturating_sub(period);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= period {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

pub(crate) fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
