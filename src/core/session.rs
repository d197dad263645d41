//=========================================================================
// Session
//=========================================================================
//
// Explicit context for one play session: the live simulation handle, the
// game loop, the input source, and the host-side settings.
//
// Architecture:
// ```text
//   UI / platform ──SessionCommand──> inbox ──process_commands()──┐
//                                                                 ↓
//   scheduler ──on_frame(token, t)──> Session ──> GameLoop ──> SimulationHandle
//                                        │
//                                        └─ AD_ANNOUNCEMENT ──> EventChannel
// ```
//
// Phases:
// ```text
//   Intro ──Start──> Playing ──Pause / Escape / focus loss──> Paused
//                      ↑                                        │
//                      └──────────── Resume / Restart ──────────┘
//
//   Restart fails ──> Failed (terminal: only Quit and host-only settings)
// ```
//
// Every phase change is announced for assistive devices on the same
// channel the simulation's own cues travel on. Master volume changes
// travel there too, as `MASTER_VOLUME`.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use crate::config::GameSettings;
use crate::core::events::GameEvent;
use crate::core::input::InputSource;
use crate::core::pacer::{FrameScheduler, FrameStats, FrameToken, GameLoop, PerfReport, TickOutcome};
use crate::core::simulation::{HandleState, SimulationExports, SimulationHandle};
use crate::core::sync::SceneSync;
use crate::error::SimulationError;

//=== Constants ===========================================================

/// Commands drained per `process_commands` call.
const MAX_COMMANDS_PER_FRAME: usize = 64;

//=== SessionPhase ========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Loaded, waiting for the player to start.
    Intro,
    Playing,
    /// Pause menu open; the loop is stopped.
    Paused,
    /// A restart failed and no instance is live.
    Failed,
}

//=== SessionCommand ======================================================

/// Requests from the UI and the platform.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Restart,
    SetLeftRightSensitivity(u8),
    SetUpDownSensitivity(u8),
    SetMasterVolume(f32),
    SetPerfStatistics(bool),
    /// Window or tab visibility changed.
    VisibilityChanged(bool),
    Quit,
}

//=== SessionControl ======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Exit,
}

//=== Session =============================================================

pub struct Session<M: SimulationExports, I: InputSource> {
    handle: SimulationHandle<M>,
    game_loop: GameLoop,
    input: I,
    settings: GameSettings,
    phase: SessionPhase,
    level_started: bool,
    inbox: Receiver<SessionCommand>,
    frame_stats: FrameStats,
    last_perf_report: Option<PerfReport>,
}

impl<M: SimulationExports, I: InputSource> Session<M, I> {
    //--- Construction -----------------------------------------------------
    //
    // Takes a freshly created handle, pushes the host's sensitivities into
    // it, and initializes the level. The starting master volume is raised
    // for audio listeners.
    //
    /// # Panics
    ///
    /// Panics unless `handle` is `Created`.
    pub fn new(
        mut handle: SimulationHandle<M>,
        game_loop: GameLoop,
        input: I,
        settings: GameSettings,
        inbox: Receiver<SessionCommand>,
    ) -> Result<Self, SimulationError> {
        assert_eq!(
            handle.state(),
            HandleState::Created,
            "a session takes a created, uninitialized simulation handle"
        );

        push_settings(&mut handle, &settings)?;
        handle.initialize()?;

        let mut session = Self {
            handle,
            game_loop,
            input,
            settings,
            phase: SessionPhase::Intro,
            level_started: false,
            inbox,
            frame_stats: FrameStats::new(),
            last_perf_report: None,
        };
        session.emit_master_volume();
        session.announce("Loading complete");
        Ok(session)
    }

    //=====================================================================
    // Commands
    //=====================================================================

    /// Drains pending commands, bounded per call.
    ///
    /// Returns `Exit` on `Quit` or when every sender is gone.
    pub fn process_commands<S: FrameScheduler>(
        &mut self,
        now_ms: f64,
        scheduler: &mut S,
    ) -> Result<SessionControl, SimulationError> {
        let mut drained = 0;

        while drained < MAX_COMMANDS_PER_FRAME {
            match self.inbox.try_recv() {
                Ok(command) => {
                    drained += 1;
                    if self.handle_command(command, now_ms, scheduler)? == SessionControl::Exit {
                        return Ok(SessionControl::Exit);
                    }
                }
                Err(TryRecvError::Disconnected) => return Ok(SessionControl::Exit),
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= MAX_COMMANDS_PER_FRAME {
            warn!(target: "session", "Command backlog: drained {} commands this frame", drained);
        }

        Ok(SessionControl::Continue)
    }

    //--- handle_command() -------------------------------------------------
    pub fn handle_command<S: FrameScheduler>(
        &mut self,
        command: SessionCommand,
        now_ms: f64,
        scheduler: &mut S,
    ) -> Result<SessionControl, SimulationError> {
        debug!(target: "session", "Command {:?} in {:?}", command, self.phase);

        match command {
            SessionCommand::Start => self.start(now_ms, scheduler),
            SessionCommand::Pause => self.pause(scheduler),
            SessionCommand::Resume => self.resume(now_ms, scheduler),
            SessionCommand::Restart => self.restart(now_ms, scheduler)?,
            SessionCommand::SetLeftRightSensitivity(value) => {
                if self.phase != SessionPhase::Failed {
                    self.handle.set_left_right_look_sensitivity(u32::from(value))?;
                }
                self.settings.left_right_look_sensitivity = value;
            }
            SessionCommand::SetUpDownSensitivity(value) => {
                if self.phase != SessionPhase::Failed {
                    self.handle.set_up_down_look_sensitivity(u32::from(value))?;
                }
                self.settings.up_down_look_sensitivity = value;
            }
            SessionCommand::SetMasterVolume(volume) => {
                self.settings.set_master_volume(volume);
                info!(target: "session", "Master volume {:.2}", self.settings.master_volume);
                self.emit_master_volume();
            }
            SessionCommand::SetPerfStatistics(enabled) => {
                self.settings.perf_statistics_enabled = enabled;
                self.frame_stats.reset();
                info!(target: "session", "Performance statistics {}", if enabled { "shown" } else { "hidden" });
            }
            SessionCommand::VisibilityChanged(visible) => {
                if !visible && self.level_started {
                    self.pause(scheduler);
                }
            }
            SessionCommand::Quit => return Ok(SessionControl::Exit),
        }

        Ok(SessionControl::Continue)
    }

    //=====================================================================
    // Flows
    //=====================================================================

    /// Leaves the intro and starts the loop.
    pub fn start<S: FrameScheduler>(&mut self, now_ms: f64, scheduler: &mut S) {
        if self.phase != SessionPhase::Intro {
            debug!(target: "session", "Start ignored in {:?}", self.phase);
            return;
        }
        self.start_gameplay(now_ms, scheduler);
        self.level_started = true;
    }

    /// Stops the loop and opens the pause menu. Only while playing.
    pub fn pause<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        self.stop_gameplay(scheduler);
        self.enter_pause();
    }

    pub fn resume<S: FrameScheduler>(&mut self, now_ms: f64, scheduler: &mut S) {
        if self.phase != SessionPhase::Paused {
            debug!(target: "session", "Resume ignored in {:?}", self.phase);
            return;
        }
        self.start_gameplay(now_ms, scheduler);
    }

    /// Replaces the instance with a fresh one and plays from the start.
    ///
    /// Host settings are pushed into the new instance before it is
    /// initialized. On failure no instance is left live and the session
    /// moves to `Failed`, where gameplay can no longer be started.
    pub fn restart<S: FrameScheduler>(&mut self, now_ms: f64, scheduler: &mut S) -> Result<(), SimulationError> {
        if matches!(self.phase, SessionPhase::Intro | SessionPhase::Failed) {
            debug!(target: "session", "Restart ignored in {:?}", self.phase);
            return Ok(());
        }
        if self.game_loop.is_running() {
            self.stop_gameplay(scheduler);
        }
        self.phase = SessionPhase::Paused;

        let settings = &self.settings;
        if let Err(err) = self.handle.reset_with(|fresh| push_settings(fresh, settings)) {
            error!(target: "session", "Restart failed: {}", err);
            self.phase = SessionPhase::Failed;
            return Err(err);
        }
        self.game_loop.reset_pacer();
        self.announce("Game reset");

        self.start_gameplay(now_ms, scheduler);
        Ok(())
    }

    //=====================================================================
    // Frames
    //=====================================================================

    /// Runs one delivered frame. A pause requested from input during the
    /// frame moves the session to `Paused`.
    pub fn on_frame<Y: SceneSync, S: FrameScheduler>(
        &mut self,
        token: FrameToken,
        timestamp_ms: f64,
        sync: &mut Y,
        scheduler: &mut S,
    ) -> Result<Option<TickOutcome>, SimulationError> {
        let started = Instant::now();
        let outcome = self.game_loop.on_frame(
            token,
            timestamp_ms,
            &mut self.handle,
            &mut self.input,
            sync,
            scheduler,
        )?;

        if let Some(tick) = outcome {
            if self.settings.perf_statistics_enabled {
                self.record_perf(timestamp_ms, started, tick.steps);
            }
            if tick.paused {
                self.announce("Gameplay stopped");
                self.enter_pause();
            }
        }
        Ok(outcome)
    }

    fn record_perf(&mut self, timestamp_ms: f64, started: Instant, steps: u32) {
        if let Some(report) = self.frame_stats.record(timestamp_ms, started.elapsed(), steps) {
            info!(
                target: "perf",
                "{:.1} fps, {:.2} ms/frame (max {:.2}), {:.2} steps/frame",
                report.fps,
                report.mean_frame_ms,
                report.max_frame_ms,
                report.steps_per_frame
            );
            self.last_perf_report = Some(report);
        }
    }

    //=====================================================================
    // Announcements
    //=====================================================================

    fn emit_master_volume(&mut self) {
        let volume = self.settings.master_volume;
        self.handle.events_mut().emit_event(&GameEvent::MasterVolume(volume));
    }

    /// Emits `message` as an `AD_ANNOUNCEMENT`.
    pub fn announce(&mut self, message: &str) {
        info!(target: "session", "{}", message);
        self.handle
            .events_mut()
            .emit_event(&GameEvent::Announcement(message.to_owned()));
    }

    //--- Query API --------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn level_started(&self) -> bool {
        self.level_started
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Most recent perf summary, while statistics are enabled.
    pub fn last_perf_report(&self) -> Option<PerfReport> {
        self.last_perf_report
    }

    pub fn handle(&self) -> &SimulationHandle<M> {
        &self.handle
    }

    pub fn handle_mut(&mut self) -> &mut SimulationHandle<M> {
        &mut self.handle
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn game_loop(&self) -> &GameLoop {
        &self.game_loop
    }

    //--- Internal Helpers -------------------------------------------------

    fn start_gameplay<S: FrameScheduler>(&mut self, now_ms: f64, scheduler: &mut S) {
        self.frame_stats.reset();
        self.announce("Gameplay started");
        self.game_loop.start(now_ms, scheduler);
        self.phase = SessionPhase::Playing;
    }

    fn stop_gameplay<S: FrameScheduler>(&mut self, scheduler: &mut S) {
        self.game_loop.stop(scheduler);
        self.announce("Gameplay stopped");
    }

    fn enter_pause(&mut self) {
        self.phase = SessionPhase::Paused;
        self.announce("Pause menu opened");
    }
}

/// Pushes the sensitivities into a created or initialized instance.
fn push_settings<M: SimulationExports>(
    handle: &mut SimulationHandle<M>,
    settings: &GameSettings,
) -> Result<(), SimulationError> {
    handle.set_left_right_look_sensitivity(u32::from(settings.left_right_look_sensitivity))?;
    handle.set_up_down_look_sensitivity(u32::from(settings.up_down_look_sensitivity))
}

//=========================================================================
// Unit Tests
//=========================================================================
