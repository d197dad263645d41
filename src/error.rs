//=========================================================================
// Error Types
//=========================================================================
//
// Recoverable failures surfaced by the host.
//
// Taxonomy:
//   TransferError    → linear memory access out of range
//   SimulationError  → export trapped / export absent / bad transfer
//   LoadError        → config rejected, or module could not be read,
//                      compiled or linked
//   ConfigError      → host configuration unreadable or invalid
//
// Programmer errors (using a destroyed handle, querying transforms before
// initialization) are not represented here: they panic.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::transfer::WasmPtr;

//=== TransferError =======================================================

/// Raw memory access outside the simulation's current linear memory.
///
/// Always indicates a layout or version mismatch between host and module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("access of {len} bytes at {ptr:#x} exceeds linear memory of {memory_len} bytes")]
    OutOfBounds {
        ptr: WasmPtr,
        len: usize,
        memory_len: usize,
    },
}

//=== SimulationError =====================================================

/// Failure while calling into a loaded simulation module.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The module trapped while executing an export.
    #[error("simulation trapped in `{export}`: {source}")]
    Trap {
        export: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The module does not provide this level-specific export.
    #[error("simulation does not export `{export}`")]
    Unsupported { export: &'static str },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

//=== LoadError ===========================================================

/// Failure to bring a simulation module up. Fatal to the load attempt.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read simulation module {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile simulation module: {0}")]
    Compile(#[source] anyhow::Error),

    #[error("failed to link host imports: {0}")]
    Link(#[source] anyhow::Error),

    #[error("failed to instantiate simulation module: {0}")]
    Instantiate(#[source] anyhow::Error),

    #[error("simulation module is missing export `{name}` or its signature differs: {source}")]
    MissingExport {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("simulation module has no linear memory")]
    MissingMemory,

    #[error("simulation module reports a desired frame rate of 0")]
    ZeroFrameRate,

    #[error("failed to create the first simulation instance: {0}")]
    Create(#[source] SimulationError),

    #[error("host configuration rejected: {0}")]
    Config(#[from] ConfigError),
}

//=== ConfigError =========================================================

/// Host configuration could not be loaded, saved or validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_error_reports_range() {
        let err = TransferError::OutOfBounds {
            ptr: 0x10,
            len: 28,
            memory_len: 32,
        };
        let msg = err.to_string();
        assert!(msg.contains("28 bytes"));
        assert!(msg.contains("0x10"));
        assert!(msg.contains("32 bytes"));
    }

    #[test]
    fn simulation_error_wraps_transfer() {
        let err: SimulationError = TransferError::OutOfBounds {
            ptr: 0,
            len: 1,
            memory_len: 0,
        }
        .into();
        assert!(matches!(err, SimulationError::Transfer(_)));
    }

    #[test]
    fn trap_keeps_source() {
        use std::error::Error as _;

        let err = SimulationError::Trap {
            export: "step",
            source: anyhow::anyhow!("unreachable executed"),
        };
        assert!(err.to_string().contains("`step`"));
        assert!(err.source().is_some());
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<TransferError>();
        assert_send_sync::<SimulationError>();
        assert_send_sync::<LoadError>();
        assert_send_sync::<ConfigError>();
    }
}
