use std::time::{Duration, Instant};

/// Outcome of feeding one real frame into the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub raw_frame_delta: Duration,
    pub ticks_to_run: u32,
    pub dropped_backlog: Duration,
}

impl StepPlan {
    pub fn frame_was_clamped(&self, max_frame_delta: Duration) -> bool {
        self.raw_frame_delta > max_frame_delta
    }

    /// Whole ticks thrown away by the per-frame tick cap.
    pub fn dropped_backlog_ticks(&self, fixed_step: Duration) -> u32 {
        if fixed_step.is_zero() {
            return 0;
        }
        let ticks = self.dropped_backlog.as_nanos() / fixed_step.as_nanos();
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}

/// Fixed-timestep accumulator.
///
/// Real elapsed time is folded into `accumulator` and drained in whole
/// `fixed_step` increments. After every call to [`SimulationClock::advance_by`]
/// the accumulator is strictly smaller than `fixed_step`: the frame delta is
/// clamped to `max_frame_delta` and anything still owed once
/// `max_ticks_per_frame` ticks are planned is dropped.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    previous_time: Option<Instant>,
    accumulator: Duration,
    fixed_step: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
}

impl SimulationClock {
    pub fn new(fixed_step: Duration, max_frame_delta: Duration, max_ticks_per_frame: u32) -> Self {
        let fixed_step = normalize_non_zero_duration(fixed_step, Duration::from_secs_f64(1.0 / 60.0));
        Self {
            previous_time: None,
            accumulator: Duration::ZERO,
            fixed_step,
            max_frame_delta: normalize_non_zero_duration(
                max_frame_delta,
                Duration::from_millis(250),
            ),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
        }
    }

    pub fn from_tps(target_tps: u32, max_frame_delta: Duration, max_ticks_per_frame: u32) -> Self {
        let fixed_step = Duration::from_secs_f64(1.0 / target_tps.max(1) as f64);
        Self::new(fixed_step, max_frame_delta, max_ticks_per_frame)
    }

    pub fn fixed_step(&self) -> Duration {
        self.fixed_step
    }

    pub fn fixed_step_seconds(&self) -> f32 {
        self.fixed_step.as_secs_f32()
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub fn max_frame_delta(&self) -> Duration {
        self.max_frame_delta
    }

    pub fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Starts measuring from `now`; the next frame sees only time after it.
    pub fn reset(&mut self, now: Instant) {
        self.previous_time = Some(now);
        self.accumulator = Duration::ZERO;
    }

    /// Measures the time since the previous call and plans the ticks owed.
    ///
    /// The very first call only records `now` and plans nothing.
    pub fn advance_to(&mut self, now: Instant) -> StepPlan {
        let frame_dt = match self.previous_time {
            Some(previous) => now.saturating_duration_since(previous),
            None => Duration::ZERO,
        };
        self.previous_time = Some(now);
        self.advance_by(frame_dt)
    }

    pub fn advance_by(&mut self, frame_dt: Duration) -> StepPlan {
        let clamped_frame_dt = clamp_frame_delta(frame_dt, self.max_frame_delta);
        let accumulator = self.accumulator.saturating_add(clamped_frame_dt);
        let plan = plan_sim_steps(accumulator, self.fixed_step, self.max_ticks_per_frame);
        self.accumulator = plan.remaining_accumulator;
        StepPlan {
            raw_frame_delta: frame_dt,
            ticks_to_run: plan.ticks_to_run,
            dropped_backlog: plan.dropped_backlog,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DrainPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> DrainPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        // Keep the sub-step phase; only whole owed ticks are thrown away.
        let remainder = Duration::from_nanos(
            (accumulator.as_nanos() % fixed_dt.as_nanos()) as u64,
        );
        DrainPlan {
            ticks_to_run,
            remaining_accumulator: remainder,
            dropped_backlog: accumulator - remainder,
        }
    } else {
        DrainPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

pub(crate) fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
