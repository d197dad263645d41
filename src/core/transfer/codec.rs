//=========================================================================
// Transfer Codec
//=========================================================================
//
// Bounds-checked reads and writes against a borrowed linear memory.
//
// Contract:
//   ptr + size must lie within memory.len() for every access, otherwise
//   the call fails with TransferError::OutOfBounds and touches nothing.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::{Isometry, StrRef, WasmPtr};
use crate::error::TransferError;

//=== Bounds ==============================================================

/// Resolves `[ptr, ptr + len)` to a checked byte range.
fn span(memory_len: usize, ptr: WasmPtr, len: usize) -> Result<std::ops::Range<usize>, TransferError> {
    let start = ptr as usize;
    match start.checked_add(len) {
        Some(end) if end <= memory_len => Ok(start..end),
        _ => Err(TransferError::OutOfBounds {
            ptr,
            len,
            memory_len,
        }),
    }
}

//=== Strings =============================================================

/// Copies `bytes` into memory at `ptr` (space previously allocated by the
/// simulation) and returns the pointer/length pair to hand back to it.
pub fn write_string(memory: &mut [u8], ptr: WasmPtr, bytes: &[u8]) -> Result<StrRef, TransferError> {
    let range = span(memory.len(), ptr, bytes.len())?;
    memory[range].copy_from_slice(bytes);

    let len = u32::try_from(bytes.len()).map_err(|_| TransferError::OutOfBounds {
        ptr,
        len: bytes.len(),
        memory_len: memory.len(),
    })?;
    Ok(StrRef::new(ptr, len))
}

/// Decodes `len` bytes at `ptr` as UTF-8.
///
/// Malformed sequences become U+FFFD rather than failing the call.
pub fn read_string(memory: &[u8], string: StrRef) -> Result<String, TransferError> {
    let range = span(memory.len(), string.ptr, string.len as usize)?;
    Ok(String::from_utf8_lossy(&memory[range]).into_owned())
}

//=== Byte Blobs ==========================================================

/// Snapshot copy of `len` bytes at `ptr`.
pub fn read_bytes(memory: &[u8], ptr: WasmPtr, len: u32) -> Result<Vec<u8>, TransferError> {
    let range = span(memory.len(), ptr, len as usize)?;
    Ok(memory[range].to_vec())
}

//=== Isometries ==========================================================

pub fn read_isometry(memory: &[u8], ptr: WasmPtr) -> Result<Isometry, TransferError> {
    let range = span(memory.len(), ptr, Isometry::BYTE_LEN)?;
    Ok(Isometry::from_le_bytes(&memory[range]))
}

pub fn write_isometry(memory: &mut [u8], ptr: WasmPtr, isometry: &Isometry) -> Result<(), TransferError> {
    let range = span(memory.len(), ptr, Isometry::BYTE_LEN)?;
    isometry.write_le_bytes(&mut memory[range]);
    Ok(())
}

//=========================================================================
// Unit Tests
//=========================================================================
