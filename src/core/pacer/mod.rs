//=========================================================================
// Pacer
//
// Fixed-timestep execution driven by a self-rescheduling frame callback.
//
// Components:
// - `frame_pacer`: the accumulator and its drop policy
// - `game_loop`: frame tokens, the scheduler seam, and the per-frame
//   input / step / snapshot sequence
// - `frame_stats`: frame-rate and frame-cost windows for perf reporting
//
//=========================================================================

//=== Submodules ==========================================================
mod frame_pacer;
mod frame_stats;
mod game_loop;

//=== Public API ==========================================================
pub use frame_pacer::{FramePacer, StepControl, TickOutcome, MAX_FRAMES_TO_DROP};
pub use frame_stats::{FrameStats, PerfReport, REPORT_INTERVAL_MS};
pub use game_loop::{FrameScheduler, FrameToken, GameLoop};

#[cfg(test)]
pub(crate) use game_loop::ManualScheduler;
