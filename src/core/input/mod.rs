//=========================================================================
// Input
//
// Raw platform input reduced to the seven channels the simulation reads.
//
// Components:
// - `event`: portable key / button / motion events
// - `state_tracker`: held state plus per-step deltas
// - `sim_input`: `SimInput`, the `InputSource` seam, and the keyboard
//   and mouse implementation
//
// Notes:
// The frame pacer samples an `InputSource` once per simulation step, so
// a press is seen by exactly one step even when a frame runs several.
//
//=========================================================================

//=== Submodules ==========================================================
pub mod event;
mod sim_input;
mod state_tracker;

//=== Public API ==========================================================
pub use event::{InputEvent, KeyCode, MouseButton};
pub use sim_input::{InputSource, KeyboardInput, SimInput};
pub use state_tracker::StateTracker;
