//=========================================================================
// Game Loop
//=========================================================================
//
// Self-rescheduling frame task around the pacer.
//
// Architecture:
// ```text
//   start(now) ──request_frame()──> token
//                                     │  (host delivers the frame)
//   on_frame(token, t) ── stale? ─────┴─> ignored
//        │
//        ├─ dt = |t - last|
//        ├─ pacer.tick(dt): input.update → pause? → apply_input → step
//        ├─ capture(plan) ──> SceneSync::apply      (once per frame)
//        └─ request_frame() unless paused
//
//   stop() ──cancel_frame(token)
// ```
//
// At most one frame is outstanding. A frame whose token was cancelled or
// superseded is ignored, so a late delivery after `stop()` never steps.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use super::frame_pacer::{FramePacer, StepControl, TickOutcome};
use crate::core::input::InputSource;
use crate::core::simulation::{SimulationExports, SimulationHandle};
use crate::core::sync::{capture, SceneSync, SnapshotPlan};
use crate::error::SimulationError;

//=== FrameToken ==========================================================

/// Identifies one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

//=== FrameScheduler ======================================================

/// Host primitive that delivers one frame callback per request.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraws a request. Cancelling an already delivered or unknown
    /// token is a no-op.
    fn cancel_frame(&mut self, token: FrameToken);
}

//=== GameLoop ============================================================

pub struct GameLoop {
    pacer: FramePacer,
    plan: SnapshotPlan,
    /// Host timestamp of the previous frame, in milliseconds.
    last_timestamp: f64,
    pending: Option<FrameToken>,
}

impl GameLoop {
    pub fn new(pacer: FramePacer, plan: SnapshotPlan) -> Self {
        Self {
            pacer,
            plan,
            last_timestamp: 0.0,
            pending: None,
        }
    }

    //--- Control ----------------------------------------------------------

    /// Re-samples the clock and arms the first frame. No-op if running.
    pub fn start<S: FrameScheduler>(&mut self, now_ms: f64, scheduler: &mut S) {
        if self.pending.is_some() {
            return;
        }
        self.last_timestamp = now_ms;
        self.pending = Some(scheduler.request_frame());
        debug!(target: "pacer", "Loop started at {:.3} ms", now_ms);
    }

    /// Cancels the outstanding frame. No-op if stopped.
    pub fn stop<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if let Some(token) = self.pending.take() {
            scheduler.cancel_frame(token);
            debug!(target: "pacer", "Loop stopped");
        }
    }

    //--- on_frame() -------------------------------------------------------
    //
    // Runs one host frame. Returns `None` for a stale token. On a pause
    // request the loop stops itself and no snapshot is taken; on an error
    // it is left stopped as well.
    //
    pub fn on_frame<M, I, Y, S>(
        &mut self,
        token: FrameToken,
        timestamp_ms: f64,
        handle: &mut SimulationHandle<M>,
        input: &mut I,
        sync: &mut Y,
        scheduler: &mut S,
    ) -> Result<Option<TickOutcome>, SimulationError>
    where
        M: SimulationExports,
        I: InputSource,
        Y: SceneSync,
        S: FrameScheduler,
    {
        if self.pending != Some(token) {
            trace!(target: "pacer", "Ignoring stale frame {:?}", token);
            return Ok(None);
        }
        self.pending = None;

        let dt_ms = (timestamp_ms - self.last_timestamp).abs();
        self.last_timestamp = timestamp_ms;

        let outcome = self.pacer.tick(dt_ms / 1000.0, |timestep| -> Result<_, SimulationError> {
            input.update();
            if input.pause_requested() {
                return Ok(StepControl::Pause);
            }
            handle.apply_input(&input.current())?;
            handle.step(timestep)?;
            Ok(StepControl::Continue)
        })?;

        if outcome.paused {
            debug!(target: "pacer", "Pause requested after {} steps", outcome.steps);
            return Ok(Some(outcome));
        }

        let snapshot = capture(handle, &self.plan)?;
        sync.apply(&snapshot);

        self.pending = Some(scheduler.request_frame());
        Ok(Some(outcome))
    }

    //--- Query API --------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub fn plan(&self) -> &SnapshotPlan {
        &self.plan
    }

    /// Drops banked time, e.g. after the instance was replaced.
    pub fn reset_pacer(&mut self) {
        self.pacer.reset();
    }
}

//=========================================================================
// Manual Scheduler (tests)
//=========================================================================

/// Scheduler driven by hand: records requests and cancellations.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ManualScheduler {
    next: u64,
    pub requested: Vec<FrameToken>,
    pub cancelled: Vec<FrameToken>,
}

#[cfg(test)]
impl ManualScheduler {
    /// Most recent request that was not cancelled.
    pub fn due(&self) -> Option<FrameToken> {
        self.requested
            .last()
            .copied()
            .filter(|token| !self.cancelled.contains(token))
    }
}

#[cfg(test)]
impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken::new(self.next);
        self.requested.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.cancelled.push(token);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{InputEvent, KeyCode, KeyboardInput};
    use crate::core::simulation::scripted::ScriptedSimulation;
    use crate::core::sync::FrameSnapshot;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    struct Rig {
        game_loop: GameLoop,
        handle: SimulationHandle<ScriptedSimulation>,
        input: KeyboardInput,
        scheduler: ManualScheduler,
        snapshots: Vec<FrameSnapshot>,
    }

    impl Rig {
        fn new() -> Self {
            let mut handle = SimulationHandle::new(ScriptedSimulation::new()).unwrap();
            handle.create().unwrap();
            handle.initialize().unwrap();

            Self {
                game_loop: GameLoop::new(FramePacer::new(60, 3), SnapshotPlan::on_foot(["Plat 1"])),
                handle,
                input: KeyboardInput::new(),
                scheduler: ManualScheduler::default(),
                snapshots: Vec::new(),
            }
        }

        fn frame(&mut self, token: FrameToken, timestamp: f64) -> Option<TickOutcome> {
            let snapshots = &mut self.snapshots;
            let mut sync = |snapshot: &FrameSnapshot| snapshots.push(snapshot.clone());
            self.game_loop
                .on_frame(
                    token,
                    timestamp,
                    &mut self.handle,
                    &mut self.input,
                    &mut sync,
                    &mut self.scheduler,
                )
                .unwrap()
        }

        fn due(&self) -> FrameToken {
            self.scheduler.due().expect("a frame is armed")
        }
    }

    //=====================================================================
    // Scheduling Tests
    //=====================================================================

    #[test]
    fn start_arms_exactly_one_frame() {
        let mut rig = Rig::new();

        rig.game_loop.start(100.0, &mut rig.scheduler);
        rig.game_loop.start(200.0, &mut rig.scheduler);

        assert_eq!(rig.scheduler.requested.len(), 1);
        assert!(rig.game_loop.is_running());
    }

    #[test]
    fn frame_rearms_itself() {
        let mut rig = Rig::new();
        rig.game_loop.start(0.0, &mut rig.scheduler);

        let first = rig.due();
        rig.frame(first, FRAME_MS);
        let second = rig.due();

        assert_ne!(first, second);
        assert_eq!(rig.game_loop.pending(), Some(second));
    }

    #[test]
    fn stop_cancels_and_late_frame_is_ignored() {
        let mut rig = Rig::new();
        rig.game_loop.start(0.0, &mut rig.scheduler);
        let token = rig.due();

        rig.game_loop.stop(&mut rig.scheduler);

        assert_eq!(rig.scheduler.cancelled, vec![token]);
        assert_eq!(rig.frame(token, 1000.0), None);
        assert!(rig.snapshots.is_empty());
        assert!(!rig.game_loop.is_running());
    }

    #[test]
    fn restart_resamples_clock() {
        let mut rig = Rig::new();
        rig.game_loop.start(0.0, &mut rig.scheduler);
        rig.game_loop.stop(&mut rig.scheduler);

        rig.game_loop.start(60_000.0, &mut rig.scheduler);
        let outcome = rig.frame(rig.due(), 60_000.0 + FRAME_MS).unwrap();

        assert_eq!(outcome.steps, 1);
    }

    //=====================================================================
    // Stepping Tests
    //=====================================================================

    #[test]
    fn one_snapshot_per_frame_regardless_of_steps() {
        let mut rig = Rig::new();
        rig.game_loop.start(0.0, &mut rig.scheduler);

        let outcome = rig.frame(rig.due(), 3.0 * FRAME_MS).unwrap();

        assert_eq!(outcome.steps, 3);
        assert_eq!(rig.snapshots.len(), 1);
        assert_eq!(rig.snapshots[0].props[0].0, "Plat 1");
    }

    #[test]
    fn stall_is_capped_at_three_steps() {
        let mut rig = Rig::new();
        rig.game_loop.start(0.0, &mut rig.scheduler);

        let outcome = rig.frame(rig.due(), 500.0).unwrap();

        assert_eq!(outcome.steps, 3);
    }

    #[test]
    fn backwards_timestamp_uses_magnitude() {
        let mut rig = Rig::new();
        rig.game_loop.start(1000.0, &mut rig.scheduler);

        let outcome = rig.frame(rig.due(), 1000.0 - FRAME_MS).unwrap();

        assert_eq!(outcome.steps, 1);
    }

    #[test]
    fn held_input_moves_the_player() {
        let mut rig = Rig::new();
        rig.input.push(InputEvent::key(KeyCode::KeyW, true));
        rig.game_loop.start(0.0, &mut rig.scheduler);

        rig.frame(rig.due(), 2.0 * FRAME_MS);

        let body = rig.snapshots[0].player_body.unwrap();
        assert!(body.translation[2] < 0.0);
    }

    //=====================================================================
    // Pause Tests
    //=====================================================================

    #[test]
    fn pause_stops_loop_without_snapshot() {
        let mut rig = Rig::new();
        rig.input.push(InputEvent::key(KeyCode::Escape, true));
        rig.game_loop.start(0.0, &mut rig.scheduler);
        let requests = rig.scheduler.requested.len();

        let outcome = rig.frame(rig.due(), 3.0 * FRAME_MS).unwrap();

        assert_eq!(outcome, TickOutcome { steps: 0, paused: true });
        assert!(rig.snapshots.is_empty());
        assert!(!rig.game_loop.is_running());
        assert_eq!(rig.scheduler.requested.len(), requests);
    }
}
