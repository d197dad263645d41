//=========================================================================
// Platform Subsystem
//
// Drives a `Session` from the winit event loop on the main thread.
//
// Architecture:
// ```text
//  Winit Event Loop (main thread)
//  ┌──────────────────────────────────────────────────────────────┐
//  │  KeyboardInput / MouseInput / DeviceEvent::MouseMotion       │
//  │    ↓ InputProcessor                                          │
//  │  KeyboardInput::push()       (presses only while playing)    │
//  │                                                              │
//  │  Focused / Occluded / menu keys                              │
//  │    ↓                                                         │
//  │  Sender<SessionCommand> ──> Session::process_commands()      │
//  │                               (about_to_wait, bounded)       │
//  │                                                              │
//  │  RedrawRequested                                             │
//  │    ↓ RedrawScheduler::take_due()                             │
//  │  Session::on_frame(token, now) ──> GameLoop ──> simulation   │
//  │    ↓ re-armed?                                               │
//  │  window.request_redraw()                                     │
//  └──────────────────────────────────────────────────────────────┘
// ```
//
// Menu keys:
// ```text
//   Intro    Enter           → Start
//   Paused   Enter / Escape  → Resume
//   Paused   R               → Restart
// ```
//
// Key Design Decisions:
// - **Redraw = display refresh**: one armed frame token is delivered per
//   `RedrawRequested`; an unarmed redraw delivers nothing
// - **Releases always reach the input source**: a key let go while the
//   pause menu is open must not stay held after resume
// - **Simulation errors end the loop**: the error is kept and returned
//   from `run()` once winit has exited
//
//=========================================================================

//=== Submodules ==========================================================

mod input_processor;
mod redraw_scheduler;

//=== External Crates =====================================================

use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::config::WindowConfig;
use crate::core::input::{InputEvent, KeyCode, KeyboardInput};
use crate::core::session::{Session, SessionCommand, SessionControl, SessionPhase};
use crate::core::simulation::SimulationExports;
use crate::core::sync::SceneSync;
use crate::error::SimulationError;
use input_processor::InputProcessor;
use redraw_scheduler::RedrawScheduler;

//=== Constants ===========================================================

/// Longest wait between command drains when no OS event arrives.
const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(10);

//=== PlatformError =======================================================

/// Platform initialization and runtime errors.
#[derive(Debug)]
pub enum PlatformError {
    /// Failed to create event loop (rare, indicates OS-level issue).
    EventLoopCreation(winit::error::EventLoopError),

    /// Event loop execution error.
    EventLoopExecution(winit::error::EventLoopError),

    /// Window could not be created.
    WindowCreation(winit::error::OsError),

    /// The simulation failed while the loop was running.
    Simulation(SimulationError),
}

//--- Trait Implementations -----------------------------------------------

impl std::fmt::Display for PlatformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventLoopCreation(e) => write!(f, "Event loop creation failed: {}", e),
            Self::EventLoopExecution(e) => write!(f, "Event loop error: {}", e),
            Self::WindowCreation(e) => write!(f, "Window creation failed: {}", e),
            Self::Simulation(e) => write!(f, "Simulation failed: {}", e),
        }
    }
}

impl std::error::Error for PlatformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EventLoopCreation(e) | Self::EventLoopExecution(e) => Some(e),
            Self::WindowCreation(e) => Some(e),
            Self::Simulation(e) => Some(e),
        }
    }
}

//=== Platform ============================================================

/// Window owner and session driver.
///
/// # Lifecycle
///
/// 1. **Construction**: `Platform::new(...)` takes the ready session
/// 2. **Execution**: `platform.run()` blocks in the winit event loop
/// 3. **Shutdown**: window closed, `Quit`, or a simulation error
///
/// This type is NOT Send/Sync; it stays on the main thread.
pub(crate) struct Platform<M: SimulationExports, Y: SceneSync> {
    /// OS window handle (None until `resumed()` called).
    window: Option<Window>,
    window_config: WindowConfig,

    session: Session<M, KeyboardInput>,
    sync: Y,
    scheduler: RedrawScheduler,

    /// Platform-originated commands (focus, menu keys).
    commands: Sender<SessionCommand>,
    input_processor: InputProcessor,

    /// Origin of the millisecond timestamps handed to the session.
    clock: Instant,
    failure: Option<PlatformError>,
}

impl<M: SimulationExports, Y: SceneSync> Platform<M, Y> {
    //--- Construction -----------------------------------------------------

    /// Does not create the window yet; that happens in `resumed()`.
    pub fn new(
        session: Session<M, KeyboardInput>,
        sync: Y,
        commands: Sender<SessionCommand>,
        window_config: WindowConfig,
    ) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            window_config,
            session,
            sync,
            scheduler: RedrawScheduler::new(),
            commands,
            input_processor: InputProcessor::new(),
            clock: Instant::now(),
            failure: None,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the event loop until the window closes or the session ends.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] if the loop cannot start, the window
    /// cannot be created, or the simulation fails mid-run.
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS winit requirement).
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting winit event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;
        event_loop
            .run_app(&mut self)
            .map_err(PlatformError::EventLoopExecution)?;

        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    /// Queues a command for the next drain.
    fn send(&self, command: SessionCommand) {
        if self.commands.send(command).is_err() {
            warn!(target: "platform", "Session inbox disconnected, dropping command");
        }
    }

    fn push_input(&mut self, event: InputEvent) {
        let is_press = matches!(
            event,
            InputEvent::KeyDown { .. } | InputEvent::MouseButtonDown { .. } | InputEvent::MouseMotion { .. }
        );
        if is_press && self.session.phase() != SessionPhase::Playing {
            return;
        }
        self.session.input_mut().push(event);
    }

    fn request_redraw_if_armed(&mut self) {
        if self.scheduler.take_redraw_request() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: PlatformError) {
        error!(target: "platform", "{}", err);
        self.failure = Some(err);
        event_loop.exit();
    }

    fn deliver_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(token) = self.scheduler.take_due() else {
            return;
        };
        let now = self.now_ms();
        match self.session.on_frame(token, now, &mut self.sync, &mut self.scheduler) {
            Ok(_) => self.request_redraw_if_armed(),
            Err(err) => self.fail(event_loop, PlatformError::Simulation(err)),
        }
    }
}

//=== Winit Integration ===================================================

impl<M: SimulationExports, Y: SceneSync> ApplicationHandler for Platform<M, Y> {
    /// Creates the window on startup (or the first mobile resume).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.window_config.title.clone())
            .with_inner_size(LogicalSize::new(self.window_config.width, self.window_config.height));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                self.window = Some(window);
                self.request_redraw_if_armed();
            }
            Err(e) => self.fail(event_loop, PlatformError::WindowCreation(e)),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                event_loop.exit();
            }

            WindowEvent::Focused(focused) => {
                debug!(target: "platform", "Focus changed: {}", focused);
                if !focused {
                    self.session.input_mut().push(InputEvent::FocusLost);
                }
                self.send(SessionCommand::VisibilityChanged(focused));
            }

            WindowEvent::Occluded(occluded) => {
                self.send(SessionCommand::VisibilityChanged(!occluded));
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let Some(event) = self.input_processor.process_key_event(&key_event) else {
                    trace!(target: "platform::input", "Unmapped key ignored");
                    return;
                };
                if let InputEvent::KeyDown { key } = event {
                    if let Some(command) = menu_command(self.session.phase(), key) {
                        self.send(command);
                    }
                }
                self.push_input(event);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input_processor.process_mouse_button(button, state);
                self.push_input(event);
            }

            WindowEvent::RedrawRequested => self.deliver_frame(event_loop),

            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if let Some(event) = self.input_processor.process_mouse_motion(delta) {
                self.push_input(event);
            }
        }
    }

    /// Drains session commands once the OS queue is empty.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.now_ms();
        match self.session.process_commands(now, &mut self.scheduler) {
            Ok(SessionControl::Continue) => self.request_redraw_if_armed(),
            Ok(SessionControl::Exit) => {
                info!(target: "platform", "Session requested exit");
                event_loop.exit();
            }
            Err(err) => self.fail(event_loop, PlatformError::Simulation(err)),
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + COMMAND_POLL_INTERVAL));
    }
}

//--- Menu Keys -----------------------------------------------------------

/// Command a key press triggers outside gameplay.
fn menu_command(phase: SessionPhase, key: KeyCode) -> Option<SessionCommand> {
    match (phase, key) {
        (SessionPhase::Intro, KeyCode::Enter) => Some(SessionCommand::Start),
        (SessionPhase::Paused, KeyCode::Enter | KeyCode::Escape) => Some(SessionCommand::Resume),
        (SessionPhase::Paused, KeyCode::KeyR) => Some(SessionCommand::Restart),
        _ => None,
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
