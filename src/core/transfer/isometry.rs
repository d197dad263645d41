//=========================================================================
// Isometry
//=========================================================================
//
// Rigid transform record exchanged through the scratch output slot.
//
// Layout (28 bytes, little-endian f32, no padding):
// ```text
//   0        4        8        12       16       20       24       28
//   ├ rot.x ─┼ rot.y ─┼ rot.z ─┼ rot.w ─┼ tr.x ──┼ tr.y ──┼ tr.z ──┤
// ```
//
//=========================================================================

/// Rotation (unit quaternion, `[x, y, z, w]`) plus translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isometry {
    pub rotation: [f32; 4],
    pub translation: [f32; 3],
}

impl Isometry {
    /// Number of bytes one isometry occupies in linear memory.
    pub const BYTE_LEN: usize = 7 * std::mem::size_of::<f32>();

    pub const IDENTITY: Isometry = Isometry {
        rotation: [0.0, 0.0, 0.0, 1.0],
        translation: [0.0, 0.0, 0.0],
    };

    pub fn new(rotation: [f32; 4], translation: [f32; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    //--- Raw Layout -------------------------------------------------------

    /// Decodes the seven-float record. `bytes` must be exactly `BYTE_LEN`.
    pub(super) fn from_le_bytes(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), Self::BYTE_LEN);

        let mut floats = [0.0f32; 7];
        for (value, chunk) in floats.iter_mut().zip(bytes.chunks_exact(4)) {
            *value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        Self {
            rotation: [floats[0], floats[1], floats[2], floats[3]],
            translation: [floats[4], floats[5], floats[6]],
        }
    }

    /// Encodes into the seven-float record. `out` must be exactly `BYTE_LEN`.
    pub(super) fn write_le_bytes(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), Self::BYTE_LEN);

        let floats = self.rotation.iter().chain(self.translation.iter());
        for (chunk, value) in out.chunks_exact_mut(4).zip(floats) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
    }
}

impl Default for Isometry {
    fn default() -> Self {
        Self::IDENTITY
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
