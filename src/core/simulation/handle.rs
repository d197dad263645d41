//=========================================================================
// Simulation Handle
//=========================================================================
//
// Owns the lifecycle of the one live simulation instance and exposes
// typed calls over the raw export table.
//
// State machine:
// ```text
//   Uninitialized ──create()──> Created ──initialize()──> Initialized
//         ▲                        │                          │
//         │                     destroy()       step() / queries / reset()
//         └──────── create() ── Destroyed <──── destroy() ────┘
// ```
//
// Misuse (stepping before initialization, any call on a destroyed
// instance, creating a second live instance) is a programmer error and
// panics. Failures inside the module surface as `SimulationError`.
//
// Linear memory is re-borrowed from the module after every call, so a
// grow inside any export can never leave a stale view behind.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::exports::{GltfAsset, InputAxis, InputButton, LookAxis, SimulationExports};
use crate::core::events::EventChannel;
use crate::core::input::SimInput;
use crate::core::transfer::{self, Isometry, WasmPtr};
use crate::error::{SimulationError, TransferError};

//=== HandleState =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Uninitialized,
    Created,
    Initialized,
    Destroyed,
}

//=== InstanceId ==========================================================

/// Identity of one simulation instance.
///
/// `raw` is the module's opaque pointer; `generation` increments on every
/// `create()`, so values taken from an earlier instance never compare
/// equal even if the module reuses the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId {
    raw: WasmPtr,
    generation: u32,
}

impl InstanceId {
    pub fn raw(&self) -> WasmPtr {
        self.raw
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

//=== SimulationHandle ====================================================

/// Exclusive owner of a loaded module and its live instance.
pub struct SimulationHandle<M: SimulationExports> {
    module: M,
    state: HandleState,
    instance: Option<InstanceId>,
    generation: u32,
    isometry_slot: WasmPtr,
    desired_fps: u32,
}

impl<M: SimulationExports> SimulationHandle<M> {
    /// Wraps a freshly loaded module.
    ///
    /// Reserves the scratch output slot and reads the fixed frame rate.
    /// No instance exists yet.
    pub fn new(mut module: M) -> Result<Self, SimulationError> {
        let isometry_slot = module.allocate_isometry()?;
        let desired_fps = module.desired_fps()?;
        debug!(target: "simulation", "Isometry slot at {:#x}, desired fps {}", isometry_slot, desired_fps);

        Ok(Self {
            module,
            state: HandleState::Uninitialized,
            instance: None,
            generation: 0,
            isometry_slot,
            desired_fps,
        })
    }

    //=====================================================================
    // Lifecycle
    //=====================================================================

    /// Allocates a new instance.
    ///
    /// # Panics
    ///
    /// Panics if an instance is already live.
    pub fn create(&mut self) -> Result<InstanceId, SimulationError> {
        assert!(
            matches!(self.state, HandleState::Uninitialized | HandleState::Destroyed),
            "create() while an instance is live ({:?})",
            self.state
        );

        let raw = self.module.create_sim()?;
        self.generation = self.generation.wrapping_add(1);
        let id = InstanceId {
            raw,
            generation: self.generation,
        };

        self.instance = Some(id);
        self.state = HandleState::Created;
        debug!(target: "simulation", "Created instance {:?}", id);
        Ok(id)
    }

    /// First-time level setup. Must run exactly once per created instance.
    ///
    /// # Panics
    ///
    /// Panics unless the handle is `Created`.
    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        let sim = self.require(&[HandleState::Created], "initialize");
        self.module.initialize_sim(sim)?;
        self.state = HandleState::Initialized;
        Ok(())
    }

    /// Releases the live instance. The handle stays `Destroyed` even when
    /// the module traps during teardown.
    ///
    /// # Panics
    ///
    /// Panics if no instance is live.
    pub fn destroy(&mut self) -> Result<(), SimulationError> {
        let sim = self.require(&[HandleState::Created, HandleState::Initialized], "destroy");
        self.state = HandleState::Destroyed;
        self.instance = None;
        self.module.destroy_sim(sim)
    }

    /// Replaces the live instance with a freshly created and initialized
    /// one. The old instance is destroyed before the new one exists.
    ///
    /// On failure the handle is left `Destroyed`.
    ///
    /// # Panics
    ///
    /// Panics unless the handle is `Initialized`.
    pub fn reset(&mut self) -> Result<InstanceId, SimulationError> {
        self.reset_with(|_| Ok(()))
    }

    /// [`reset`](Self::reset) that runs `configure` on the new instance
    /// after `create()` and before `initialize()`.
    ///
    /// A failing `configure` fails the reset like any other step: the
    /// replacement is destroyed and the handle left `Destroyed`.
    pub fn reset_with<F>(&mut self, configure: F) -> Result<InstanceId, SimulationError>
    where
        F: FnOnce(&mut Self) -> Result<(), SimulationError>,
    {
        self.require(&[HandleState::Initialized], "reset");

        let result = self.destroy().and_then(|()| {
            let id = self.create()?;
            configure(self)?;
            self.initialize()?;
            Ok(id)
        });

        match result {
            Ok(id) => {
                info!(target: "simulation", "Reset to instance {:?}", id);
                Ok(id)
            }
            Err(err) => {
                warn!(target: "simulation", "Reset failed: {}", err);
                // A created but uninitialized replacement must not outlive the failure.
                if let Some(orphan) = self.instance.take() {
                    if let Err(cleanup) = self.module.destroy_sim(orphan.raw) {
                        warn!(target: "simulation", "Failed to release {:?}: {}", orphan, cleanup);
                    }
                }
                self.state = HandleState::Destroyed;
                Err(err)
            }
        }
    }

    //=====================================================================
    // Stepping & Input
    //=====================================================================

    /// Advances simulated time by exactly `dt` seconds. Events raised by
    /// the module are dispatched before this returns.
    pub fn step(&mut self, dt: f64) -> Result<(), SimulationError> {
        let sim = self.require(&[HandleState::Initialized], "step");
        self.module.step(sim, dt)
    }

    pub fn set_move_forward(&mut self, value: f32) -> Result<(), SimulationError> {
        self.set_axis(InputAxis::MoveForward, value)
    }

    pub fn set_move_right(&mut self, value: f32) -> Result<(), SimulationError> {
        self.set_axis(InputAxis::MoveRight, value)
    }

    pub fn set_rotate_up(&mut self, value: f32) -> Result<(), SimulationError> {
        self.set_axis(InputAxis::RotateUp, value)
    }

    pub fn set_rotate_right(&mut self, value: f32) -> Result<(), SimulationError> {
        self.set_axis(InputAxis::RotateRight, value)
    }

    pub fn set_jump(&mut self, pressed: bool) -> Result<(), SimulationError> {
        self.set_button(InputButton::Jump, pressed)
    }

    pub fn set_crouch(&mut self, pressed: bool) -> Result<(), SimulationError> {
        self.set_button(InputButton::Crouch, pressed)
    }

    pub fn set_aim(&mut self, pressed: bool) -> Result<(), SimulationError> {
        self.set_button(InputButton::Aim, pressed)
    }

    /// Pushes every input channel at once.
    pub fn apply_input(&mut self, input: &SimInput) -> Result<(), SimulationError> {
        self.set_move_forward(input.move_forward)?;
        self.set_move_right(input.move_right)?;
        self.set_rotate_up(input.rotate_up)?;
        self.set_rotate_right(input.rotate_right)?;
        self.set_jump(input.jump)?;
        self.set_crouch(input.crouch)?;
        self.set_aim(input.aim)
    }

    fn set_axis(&mut self, axis: InputAxis, value: f32) -> Result<(), SimulationError> {
        let sim = self.require(&[HandleState::Created, HandleState::Initialized], axis.export_name());
        self.module.set_axis(sim, axis, value)
    }

    fn set_button(&mut self, button: InputButton, pressed: bool) -> Result<(), SimulationError> {
        let sim = self.require(&[HandleState::Created, HandleState::Initialized], button.export_name());
        self.module.set_button(sim, button, pressed)
    }

    //=====================================================================
    // Transform Queries
    //=====================================================================
    //
    // Each query writes into the shared slot and decodes it immediately,
    // so the returned value is an owned copy.
    //

    /// Transform of a named scene prop.
    pub fn prop_isometry(&mut self, name: &str) -> Result<Isometry, SimulationError> {
        let sim = self.require(&[HandleState::Initialized], "prop_isometry");

        let len = u32::try_from(name.len()).unwrap_or_else(|_| panic!("prop name of {} bytes", name.len()));
        let ptr = self.module.alloc_string(len)?;
        let name_ref = in_bounds(
            transfer::write_string(self.module.memory_mut(), ptr, name.as_bytes()),
            "alloc_string",
        );

        let out = self.isometry_slot;
        self.module.prop_isometry(sim, name_ref, out)?;
        Ok(self.read_slot("prop_isometry"))
    }

    pub fn camera_global_isometry(&mut self) -> Result<Isometry, SimulationError> {
        let sim = self.require(&[HandleState::Initialized], "camera_global_isometry");
        self.module.camera_global_isometry(sim, self.isometry_slot)?;
        Ok(self.read_slot("camera_global_isometry"))
    }

    pub fn player_body_isometry(&mut self) -> Result<Isometry, SimulationError> {
        let sim = self.require(&[HandleState::Initialized], "player_body_isometry");
        self.module.player_body_isometry(sim, self.isometry_slot)?;
        Ok(self.read_slot("player_body_isometry"))
    }

    pub fn car_cabin_isometry(&mut self) -> Result<Isometry, SimulationError> {
        let sim = self.require(&[HandleState::Initialized], "car_cabin_isometry");
        self.module.car_cabin_isometry(sim, self.isometry_slot)?;
        Ok(self.read_slot("car_cabin_isometry"))
    }

    pub fn wheel_isometry(&mut self, index: u32) -> Result<Isometry, SimulationError> {
        let sim = self.require(&[HandleState::Initialized], "wheel_isometry");
        self.module.wheel_isometry(sim, index, self.isometry_slot)?;
        Ok(self.read_slot("wheel_isometry"))
    }

    fn read_slot(&self, export: &'static str) -> Isometry {
        in_bounds(transfer::read_isometry(self.module.memory(), self.isometry_slot), export)
    }

    //=====================================================================
    // Settings
    //=====================================================================

    pub fn left_right_look_sensitivity(&mut self) -> Result<u32, SimulationError> {
        self.look_sensitivity(LookAxis::LeftRight)
    }

    pub fn up_down_look_sensitivity(&mut self) -> Result<u32, SimulationError> {
        self.look_sensitivity(LookAxis::UpDown)
    }

    pub fn set_left_right_look_sensitivity(&mut self, value: u32) -> Result<(), SimulationError> {
        self.set_look_sensitivity(LookAxis::LeftRight, value)
    }

    pub fn set_up_down_look_sensitivity(&mut self, value: u32) -> Result<(), SimulationError> {
        self.set_look_sensitivity(LookAxis::UpDown, value)
    }

    fn look_sensitivity(&mut self, axis: LookAxis) -> Result<u32, SimulationError> {
        let sim = self.require(&[HandleState::Created, HandleState::Initialized], axis.getter_name());
        self.module.look_sensitivity(sim, axis)
    }

    fn set_look_sensitivity(&mut self, axis: LookAxis, value: u32) -> Result<(), SimulationError> {
        let sim = self.require(&[HandleState::Created, HandleState::Initialized], axis.setter_name());
        self.module.set_look_sensitivity(sim, axis, value)
    }

    //=====================================================================
    // Baked Assets
    //=====================================================================

    /// Copy of the scene glTF compiled into the module.
    pub fn scene_gltf_bytes(&mut self) -> Result<Vec<u8>, SimulationError> {
        self.gltf_bytes(GltfAsset::Scene)
    }

    /// Copy of the player model glTF, on levels that have one.
    pub fn player_gltf_bytes(&mut self) -> Result<Vec<u8>, SimulationError> {
        self.gltf_bytes(GltfAsset::Player)
    }

    fn gltf_bytes(&mut self, asset: GltfAsset) -> Result<Vec<u8>, SimulationError> {
        let sim = self.require(&[HandleState::Created, HandleState::Initialized], asset.ptr_export());
        let (ptr, len) = self.module.gltf_bytes(sim, asset)?;
        Ok(in_bounds(
            transfer::read_bytes(self.module.memory(), ptr, len),
            asset.ptr_export(),
        ))
    }

    //=====================================================================
    // Query API
    //=====================================================================

    /// Fixed simulation rate; the pacer's timestep is its reciprocal.
    pub fn desired_fps(&self) -> u32 {
        self.desired_fps
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Live instance, if any.
    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// Channel the module's callbacks are emitted on.
    pub fn events_mut(&mut self) -> &mut EventChannel {
        self.module.events_mut()
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    #[cfg(test)]
    pub(crate) fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    //--- Internal Helpers -------------------------------------------------

    /// Returns the live instance pointer, panicking if the handle is not in
    /// one of `allowed`.
    fn require(&self, allowed: &[HandleState], operation: &str) -> WasmPtr {
        assert!(
            allowed.contains(&self.state),
            "`{}` called on a {:?} simulation handle",
            operation,
            self.state
        );
        match self.instance {
            Some(id) => id.raw,
            None => panic!("`{}` called without a live instance", operation),
        }
    }
}

impl<M: SimulationExports> Drop for SimulationHandle<M> {
    fn drop(&mut self) {
        if matches!(self.state, HandleState::Created | HandleState::Initialized) {
            if let Err(err) = self.destroy() {
                warn!(target: "simulation", "Failed to destroy instance on drop: {}", err);
            }
        }
    }
}

//--- Boundary Preconditions ----------------------------------------------

/// Out-of-range transfers mean host and module disagree on layout.
fn in_bounds<T>(result: Result<T, TransferError>, export: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("layout mismatch after `{}`: {}", export, err),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
