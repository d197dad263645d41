//=========================================================================
// Simulation Host - Library Root
//
// Native host for a compiled game simulation module.
//
// Responsibilities:
// - Load the module and own its single live instance
// - Pace simulation steps independently of display refresh
// - Relay the module's callbacks as named events
// - Hand one transform snapshot per frame to the renderer
//
// Typical usage:
// ```no_run
// use sim_host::EngineBuilder;
//
// fn main() -> Result<(), Box<dyn std::error::Error>> {
//     EngineBuilder::new().with_module_path("sim.wasm").build()?.run()?;
//     Ok(())
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the host/simulation boundary and the loop; `config` and
// `error` are shared by it and by the binary.
//
pub mod config;
pub mod core;
pub mod error;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` owns the winit window and event loop and is not part of the
// public API; `engine` wires it to a session.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------
pub use engine::{Engine, EngineBuilder};
pub use platform::PlatformError;
