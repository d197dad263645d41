//=========================================================================
// Core Systems
//
// Everything on the host side of the simulation boundary that does not
// touch the OS.
//
// Components (leaf-first):
// - `transfer`: raw reads and writes against the module's linear memory
// - `simulation`: the opaque instance, its export table and lifecycle
// - `events`: simulation → host named events and their listeners
// - `input`: normalized control values sampled once per step
// - `pacer`: fixed-timestep accumulator and the self-rescheduling loop
// - `sync`: per-frame transform snapshots for the renderer
// - `session`: the context object tying one live handle to its loop
//
// Notes:
// Everything here is single-threaded. The simulation handle is only
// touched from inside one frame callback or one command at a time, which
// is what keeps the shared scratch slot safe without locks.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod events;
pub mod input;
pub mod pacer;
pub mod session;
pub mod simulation;
pub mod sync;
pub mod transfer;
