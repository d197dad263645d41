//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use sim_host::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine entry point
pub use crate::engine::{Engine, EngineBuilder};

// Configuration and errors
pub use crate::config::{GameSettings, HostConfig};
pub use crate::error::{LoadError, SimulationError};

// Events
pub use crate::core::events::{tags, EventChannel, EventValue, GameEvent};

// Session and loop
pub use crate::core::pacer::{FramePacer, FrameScheduler, FrameToken, GameLoop, PerfReport};
pub use crate::core::session::{Session, SessionCommand, SessionPhase};

// Simulation boundary
pub use crate::core::input::{InputSource, KeyboardInput, SimInput};
pub use crate::core::simulation::{load_simulation, SimulationExports, SimulationHandle};
pub use crate::core::sync::{FrameSnapshot, SceneSync, SnapshotPlan};
pub use crate::core::transfer::Isometry;
