//=========================================================================
// Simulation Host Engine
//
// Main entry point: loads the simulation module and runs it in a window.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_config()           ├─ init(|events| ...)
//         ├─ with_module_path()      ├─ with_scene_sync()
//         └─ with_channel_capacity() └─ Session + Platform,
//                                       blocks until exit
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::info;

//=== Internal Dependencies ===============================================

use crate::config::HostConfig;
use crate::core::events::EventChannel;
use crate::core::input::KeyboardInput;
use crate::core::pacer::{FramePacer, GameLoop};
use crate::core::session::{Session, SessionCommand};
use crate::core::simulation::{load_simulation, SimulationHandle, WasmSimulation};
use crate::core::sync::{SceneSync, TraceSync};
use crate::error::LoadError;
use crate::platform::{Platform, PlatformError};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Config**: [`HostConfig::default`]
/// - **Command channel capacity**: 128 commands
///
/// # Examples
///
/// ```no_run
/// use sim_host::EngineBuilder;
///
/// EngineBuilder::new()
///     .with_module_path("levels/1/sim.wasm")
///     .build()?
///     .init(|events| {
///         events.on("PLAY_AUDIO", |payload| println!("audio {:?}", payload));
///     })
///     .run()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EngineBuilder {
    config: HostConfig,
    channel_capacity: usize,
}

impl EngineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: HostConfig::default(),
            channel_capacity: 128,
        }
    }

    /// Replaces the whole host configuration.
    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the module path of the current configuration.
    pub fn with_module_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.module_path = path.into();
        self
    }

    /// Sets the capacity of the UI → session command channel.
    ///
    /// Default: 128
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.channel_capacity = capacity;
        self
    }

    /// Loads the simulation module and produces an [`Engine`].
    ///
    /// # Errors
    ///
    /// [`LoadError::Config`] if the configuration fails validation,
    /// otherwise any [`LoadError`] from loading; the load is not retried.
    pub fn build(self) -> Result<Engine, LoadError> {
        self.config.validate()?;

        info!(
            "Building engine (module: {}, channel: {})",
            self.config.module_path.display(),
            self.channel_capacity
        );

        let handle = load_simulation(&self.config.module_path)?;
        let (commands, inbox) = bounded(self.channel_capacity);

        Ok(Engine {
            handle,
            config: self.config,
            commands,
            inbox,
            sync: TraceSync::new(),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Loaded simulation plus everything needed to run it.
///
/// # Architecture
///
/// ```text
/// Engine (Main Thread)
///   └─► Platform (winit event loop)
///         ├─► Session ──► GameLoop ──► SimulationHandle
///         └─► SceneSync (once per frame)
///
/// UI → Session: SessionCommand channel
/// Simulation → host: EventChannel listeners
/// ```
pub struct Engine<Y: SceneSync = TraceSync> {
    handle: SimulationHandle<WasmSimulation>,
    config: HostConfig,
    commands: Sender<SessionCommand>,
    inbox: Receiver<SessionCommand>,
    sync: Y,
}

impl<Y: SceneSync> Engine<Y> {
    //--- Initialization ---------------------------------------------------

    /// Registers event listeners before the level is initialized, so
    /// events raised during initialization are observed too.
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut EventChannel),
    {
        info!("Registering event listeners");
        init_fn(self.handle.events_mut());
        self
    }

    /// Replaces the renderer-side consumer of frame snapshots.
    pub fn with_scene_sync<Z: SceneSync>(self, sync: Z) -> Engine<Z> {
        Engine {
            handle: self.handle,
            config: self.config,
            commands: self.commands,
            inbox: self.inbox,
            sync,
        }
    }

    /// Sender for UI commands (start, pause, settings, ...).
    pub fn commands(&self) -> Sender<SessionCommand> {
        self.commands.clone()
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    //--- Execution --------------------------------------------------------

    /// Initializes the level and blocks in the event loop until exit.
    ///
    /// # Lifecycle
    ///
    /// 1. Pacer built from the module's desired fps
    /// 2. Session pushes settings, initializes the level (intro phase)
    /// 3. Platform runs the winit loop; Enter starts gameplay
    /// 4. On exit the session drops and the instance is destroyed
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS winit requirement).
    pub fn run(self) -> Result<(), PlatformError> {
        let Engine {
            handle,
            config,
            commands,
            inbox,
            sync,
        } = self;

        info!(
            "Starting engine runtime ({} fps, max {} steps per frame)",
            handle.desired_fps(),
            config.pacing.max_frames_to_drop
        );

        let pacer = FramePacer::new(handle.desired_fps(), config.pacing.max_frames_to_drop);
        let game_loop = GameLoop::new(pacer, config.snapshot.clone());
        let session = Session::new(
            handle,
            game_loop,
            KeyboardInput::new(),
            config.settings.clone(),
            inbox,
        )
        .map_err(PlatformError::Simulation)?;

        let platform = Platform::new(session, sync, commands, config.window.clone());
        info!("Platform initialized, entering event loop");

        let result = platform.run();
        info!("Engine shutdown complete");
        result
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
