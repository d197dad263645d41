//=========================================================================
// Binary Transfer Layer
//=========================================================================
//
// Fixed-layout codec between host values and the simulation's linear
// memory.
//
// Architecture:
//   host value ──write_*()──> &mut [u8] (linear memory) ──> simulation
//   host value <──read_*()─── &[u8]     (linear memory) <── simulation
//
// Every function borrows the memory slice for the duration of one
// transfer. Nothing in this module keeps a slice, so a view can never
// outlive a call that grows the memory.
//
//=========================================================================

//=== Module Declarations =================================================

mod codec;
mod isometry;

//=== Public API ==========================================================

pub use codec::{read_bytes, read_isometry, read_string, write_isometry, write_string};
pub use isometry::Isometry;

/// Address inside the simulation's 32-bit linear memory.
pub type WasmPtr = u32;

/// Pointer/length pair describing a UTF-8 string in linear memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrRef {
    pub ptr: WasmPtr,
    pub len: u32,
}

impl StrRef {
    pub const fn new(ptr: WasmPtr, len: u32) -> Self {
        Self { ptr, len }
    }
}
