//=========================================================================
// Simulation Handle
//=========================================================================
//
// Ownership and typed access for the opaque simulation module.
//
// Components:
// - `exports`: raw flat function table (`SimulationExports`)
// - `handle`: lifecycle state machine and typed calls over the table
// - `wasm`: wasmtime-backed module loader
//
// Architecture:
// ```text
//   load_simulation(path) ──> SimulationHandle<WasmSimulation>
//                                   │ create / initialize / reset / destroy
//                                   │ step(dt), input setters, queries
//                                   ▼
//                           SimulationExports ──> linear memory
// ```
//
//=========================================================================

//=== Module Declarations =================================================

mod exports;
mod handle;
mod wasm;

#[cfg(test)]
pub(crate) mod scripted;

//=== Public API ==========================================================

pub use exports::{names, GltfAsset, InputAxis, InputButton, LookAxis, SimulationExports};
pub use handle::{HandleState, InstanceId, SimulationHandle};
pub use wasm::{load_simulation, load_simulation_bytes, WasmSimulation};
