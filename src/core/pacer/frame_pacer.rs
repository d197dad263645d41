//=========================================================================
// Frame Pacer
//=========================================================================
//
// Fixed-timestep accumulator ("free the physics").
//
// Per host frame:
// ```text
//   accumulated += dt
//   accumulated  = min(accumulated, max_frames_to_drop * timestep)
//   while accumulated >= timestep:
//       accumulated -= timestep
//       step_fn(timestep)  ── Pause ──> stop, remaining time kept
// ```
//
// Time above the clamp is discarded, never replayed. The subtraction
// happens before `step_fn` runs, so an iteration that requests a pause
// consumes its timestep without advancing the simulation.
//
//=========================================================================

//=== Constants ===========================================================

/// Default cap on simulation steps run for one host frame.
pub const MAX_FRAMES_TO_DROP: u32 = 3;

/// Absorbs rounding so `k` frames of exactly one timestep run `k` steps.
const EPSILON: f64 = 1e-9;

//=== StepControl =========================================================

/// Returned by the per-step callback after sampling input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
    Continue,
    /// Pause requested; abort the remaining steps of this frame.
    Pause,
}

//=== TickOutcome =========================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Steps that actually ran.
    pub steps: u32,
    pub paused: bool,
}

//=== FramePacer ==========================================================

#[derive(Debug, Clone)]
pub struct FramePacer {
    timestep: f64,
    max_frames_to_drop: u32,
    accumulated: f64,
}

impl FramePacer {
    /// # Panics
    ///
    /// Panics if `desired_fps` or `max_frames_to_drop` is zero.
    pub fn new(desired_fps: u32, max_frames_to_drop: u32) -> Self {
        assert!(desired_fps > 0, "desired fps must be positive");
        assert!(max_frames_to_drop > 0, "max frames to drop must be positive");

        Self {
            timestep: 1.0 / f64::from(desired_fps),
            max_frames_to_drop,
            accumulated: 0.0,
        }
    }

    //--- tick() -----------------------------------------------------------
    //
    // Drains `dt` seconds into fixed steps. Negative and non-finite deltas
    // count as zero. An error from `step_fn` aborts the frame and is
    // returned as-is.
    //
    pub fn tick<E, F>(&mut self, dt: f64, mut step_fn: F) -> Result<TickOutcome, E>
    where
        F: FnMut(f64) -> Result<StepControl, E>,
    {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.accumulated = (self.accumulated + dt).min(self.max_accumulated());

        let mut outcome = TickOutcome::default();
        while self.accumulated + EPSILON >= self.timestep {
            self.accumulated = (self.accumulated - self.timestep).max(0.0);

            match step_fn(self.timestep)? {
                StepControl::Continue => outcome.steps += 1,
                StepControl::Pause => {
                    outcome.paused = true;
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Drops any banked time.
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }

    //--- Query API --------------------------------------------------------

    /// Fixed step length in seconds.
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }

    pub fn max_frames_to_drop(&self) -> u32 {
        self.max_frames_to_drop
    }

    /// Upper bound of `accumulated`.
    pub fn max_accumulated(&self) -> f64 {
        self.timestep * f64::from(self.max_frames_to_drop)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    const FRAME_60: f64 = 1.0 / 60.0;

    /// Runs one tick counting steps, never pausing.
    fn tick(pacer: &mut FramePacer, dt: f64) -> TickOutcome {
        pacer
            .tick(dt, |_| Ok::<_, Infallible>(StepControl::Continue))
            .unwrap()
    }

    //=====================================================================
    // Stepping Tests
    //=====================================================================

    #[test]
    fn nominal_frames_run_one_step_each() {
        let mut pacer = FramePacer::new(60, MAX_FRAMES_TO_DROP);

        let steps: u32 = [0.0, FRAME_60, FRAME_60, FRAME_60]
            .iter()
            .map(|dt| tick(&mut pacer, *dt).steps)
            .sum();

        assert_eq!(steps, 3);
        assert!(pacer.accumulated() < 1e-9);
    }

    #[test]
    fn whole_millisecond_frames_bank_the_remainder() {
        let mut pacer = FramePacer::new(60, MAX_FRAMES_TO_DROP);

        let steps: Vec<u32> = [0.0, 0.016, 0.016, 0.016]
            .iter()
            .map(|dt| tick(&mut pacer, *dt).steps)
            .collect();

        assert_eq!(steps, vec![0, 0, 1, 1]);
        assert!(pacer.accumulated() > 0.0 && pacer.accumulated() < FRAME_60);
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut pacer = FramePacer::new(60, 3);

        let outcome = tick(&mut pacer, 0.5);

        assert_eq!(outcome.steps, 3);
        assert!(pacer.accumulated() < 1e-9);
    }

    #[test]
    fn steps_never_exceed_cap() {
        let mut pacer = FramePacer::new(60, 3);
        let deltas = [0.0, 0.004, 0.2, 0.033, 1.5, 0.017, 0.05, 0.0001, 10.0];

        for dt in deltas {
            let outcome = tick(&mut pacer, dt);
            assert!(outcome.steps <= 3, "{} steps for dt {}", outcome.steps, dt);
            assert!(pacer.accumulated() <= pacer.max_accumulated());
        }
    }

    #[test]
    fn step_receives_fixed_timestep() {
        let mut pacer = FramePacer::new(30, 3);
        let mut seen = Vec::new();

        pacer
            .tick(0.07, |dt| {
                seen.push(dt);
                Ok::<_, Infallible>(StepControl::Continue)
            })
            .unwrap();

        assert_eq!(seen, vec![1.0 / 30.0, 1.0 / 30.0]);
    }

    #[test]
    fn invalid_deltas_count_as_zero() {
        let mut pacer = FramePacer::new(60, 3);
        for dt in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(tick(&mut pacer, dt).steps, 0);
        }
        assert_eq!(pacer.accumulated(), 0.0);
    }

    //=====================================================================
    // Pause & Error Tests
    //=====================================================================

    #[test]
    fn pause_consumes_timestep_without_stepping() {
        let mut pacer = FramePacer::new(60, 3);
        let mut calls = 0;

        let outcome = pacer
            .tick(3.0 * FRAME_60, |_| {
                calls += 1;
                Ok::<_, Infallible>(if calls == 2 {
                    StepControl::Pause
                } else {
                    StepControl::Continue
                })
            })
            .unwrap();

        assert_eq!(outcome, TickOutcome { steps: 1, paused: true });
        assert_eq!(calls, 2);
        assert!((pacer.accumulated() - FRAME_60).abs() < 1e-9);
    }

    #[test]
    fn step_error_aborts_frame() {
        let mut pacer = FramePacer::new(60, 3);
        let mut calls = 0;

        let result = pacer.tick(3.0 * FRAME_60, |_| {
            calls += 1;
            Err("trap")
        });

        assert_eq!(result, Err("trap"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn reset_drops_banked_time() {
        let mut pacer = FramePacer::new(60, 3);
        tick(&mut pacer, 0.01);
        pacer.reset();
        assert_eq!(pacer.accumulated(), 0.0);
    }

    #[test]
    #[should_panic(expected = "desired fps must be positive")]
    fn zero_fps_panics() {
        FramePacer::new(0, 3);
    }
}
