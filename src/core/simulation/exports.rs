//=========================================================================
// Simulation Export Table
//=========================================================================
//
// The flat function table a simulation module exposes to its host.
//
// Every method maps one-to-one onto a module export and only moves plain
// integers and floats. Structured data travels through linear memory,
// which the table exposes as a borrowed slice fetched fresh on every
// access.
//
// Implementations:
//   WasmSimulation       → wasmtime instance of a compiled module
//   ScriptedSimulation   → in-process double (tests only)
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::events::EventChannel;
use crate::core::transfer::{StrRef, WasmPtr};
use crate::error::SimulationError;

//=== Export Names ========================================================

pub mod names {
    pub const ALLOC_STRING: &str = "alloc_string";
    pub const ALLOCATE_ISOMETRY: &str = "allocate_isometry_f32_unitquaternion_f32__3__space";
    pub const CREATE_SIM: &str = "create_sim";
    pub const DESTROY_SIM: &str = "destroy_sim";
    pub const INITIALIZE_SIM: &str = "initialize_sim";
    pub const DESIRED_FPS: &str = "desired_fps";
    pub const STEP: &str = "step";
    pub const PROP_ISOMETRY: &str = "prop_isometry";
    pub const CAMERA_GLOBAL_ISOMETRY: &str = "camera_global_isometry";
    pub const PLAYER_BODY_ISOMETRY: &str = "player_body_isometry";
    pub const CAR_CABIN_ISOMETRY: &str = "car_cabin_isometry";
    pub const WHEEL_ISOMETRY: &str = "wheel_isometry";
}

//=== Input Channels ======================================================

/// Continuous input axis, nominally in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAxis {
    MoveForward,
    MoveRight,
    RotateUp,
    RotateRight,
}

impl InputAxis {
    pub const ALL: [InputAxis; 4] = [
        InputAxis::MoveForward,
        InputAxis::MoveRight,
        InputAxis::RotateUp,
        InputAxis::RotateRight,
    ];

    pub fn export_name(self) -> &'static str {
        match self {
            Self::MoveForward => "input_set_move_forward",
            Self::MoveRight => "input_set_move_right",
            Self::RotateUp => "input_set_rotate_up",
            Self::RotateRight => "input_set_rotate_right",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Boolean input, passed across the boundary as `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputButton {
    Jump,
    Crouch,
    Aim,
}

impl InputButton {
    pub const ALL: [InputButton; 3] = [InputButton::Jump, InputButton::Crouch, InputButton::Aim];

    pub fn export_name(self) -> &'static str {
        match self {
            Self::Jump => "input_set_jump",
            Self::Crouch => "input_set_crouch",
            Self::Aim => "input_set_aim",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

//=== Settings ============================================================

/// Gameplay-tunable look sensitivity, owned by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookAxis {
    LeftRight,
    UpDown,
}

impl LookAxis {
    pub const ALL: [LookAxis; 2] = [LookAxis::LeftRight, LookAxis::UpDown];

    pub fn getter_name(self) -> &'static str {
        match self {
            Self::LeftRight => "settings_left_right_look_sensitivity",
            Self::UpDown => "settings_up_down_look_sensitivity",
        }
    }

    pub fn setter_name(self) -> &'static str {
        match self {
            Self::LeftRight => "settings_set_left_right_look_sensitivity",
            Self::UpDown => "settings_set_up_down_look_sensitivity",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

//=== Baked Assets ========================================================

/// Asset blob compiled into the simulation binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GltfAsset {
    Scene,
    /// Level-specific; absent from vehicle levels.
    Player,
}

impl GltfAsset {
    pub fn ptr_export(self) -> &'static str {
        match self {
            Self::Scene => "scene_gltf_bytes_ptr",
            Self::Player => "player_gltf_bytes_ptr",
        }
    }

    pub fn len_export(self) -> &'static str {
        match self {
            Self::Scene => "scene_gltf_bytes_len",
            Self::Player => "player_gltf_bytes_len",
        }
    }
}

//=== SimulationExports ===================================================

/// Raw call surface of one loaded simulation module.
///
/// `sim` is the opaque instance pointer returned by [`create_sim`]. No
/// method validates it; [`SimulationHandle`] owns that discipline.
///
/// Any call may run module code that grows linear memory, so slices from
/// [`memory`] must not be held across calls.
///
/// [`create_sim`]: SimulationExports::create_sim
/// [`memory`]: SimulationExports::memory
/// [`SimulationHandle`]: super::SimulationHandle
pub trait SimulationExports {
    //--- Allocation -------------------------------------------------------

    /// Reserves `len` bytes inside the module for a host-written string.
    fn alloc_string(&mut self, len: u32) -> Result<WasmPtr, SimulationError>;

    /// Reserves the scratch output slot transform queries write into.
    fn allocate_isometry(&mut self) -> Result<WasmPtr, SimulationError>;

    //--- Lifecycle --------------------------------------------------------

    fn create_sim(&mut self) -> Result<WasmPtr, SimulationError>;
    fn destroy_sim(&mut self, sim: WasmPtr) -> Result<(), SimulationError>;
    fn initialize_sim(&mut self, sim: WasmPtr) -> Result<(), SimulationError>;
    fn desired_fps(&mut self) -> Result<u32, SimulationError>;
    fn step(&mut self, sim: WasmPtr, dt: f64) -> Result<(), SimulationError>;

    //--- Input ------------------------------------------------------------

    fn set_axis(&mut self, sim: WasmPtr, axis: InputAxis, value: f32) -> Result<(), SimulationError>;
    fn set_button(&mut self, sim: WasmPtr, button: InputButton, pressed: bool) -> Result<(), SimulationError>;

    //--- Settings ---------------------------------------------------------

    fn look_sensitivity(&mut self, sim: WasmPtr, axis: LookAxis) -> Result<u32, SimulationError>;
    fn set_look_sensitivity(&mut self, sim: WasmPtr, axis: LookAxis, value: u32) -> Result<(), SimulationError>;

    //--- Assets -----------------------------------------------------------

    /// Location of a baked asset blob as `(ptr, len)`.
    fn gltf_bytes(&mut self, sim: WasmPtr, asset: GltfAsset) -> Result<(WasmPtr, u32), SimulationError>;

    //--- Transform Queries (write into `out`) ----------------------------

    fn prop_isometry(&mut self, sim: WasmPtr, name: StrRef, out: WasmPtr) -> Result<(), SimulationError>;
    fn camera_global_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError>;
    fn player_body_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError>;
    fn car_cabin_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError>;
    fn wheel_isometry(&mut self, sim: WasmPtr, index: u32, out: WasmPtr) -> Result<(), SimulationError>;

    //--- Host Side --------------------------------------------------------

    /// Current linear memory.
    fn memory(&self) -> &[u8];

    fn memory_mut(&mut self) -> &mut [u8];

    /// Channel the module's host imports emit into.
    fn events_mut(&mut self) -> &mut EventChannel;
}
