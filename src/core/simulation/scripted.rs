//=========================================================================
// Scripted Simulation
//=========================================================================
//
// In-process stand-in for a compiled simulation module.
//
// Owns a byte vector as linear memory with a bump allocator that grows it
// page by page, runs simple deterministic kinematics, and raises its cues
// through the same relay the wasm backend uses.
//
// Memory map:
// ```text
//   0 .. 1024      static strings and baked glTF blobs
//   1024 ..        bump heap (scratch slot, instances, strings)
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use super::exports::{names, GltfAsset, InputAxis, InputButton, LookAxis, SimulationExports};
use crate::core::events::{relay, EventChannel, HostCall};
use crate::core::transfer::{self, Isometry, StrRef, WasmPtr};
use crate::error::SimulationError;

//=== Constants ===========================================================

const PAGE_SIZE: usize = 65_536;
const MAX_PAGES: usize = 65_536;
const HEAP_START: u32 = 1024;
const INSTANCE_SIZE: u32 = 64;

const WALK_SPEED: f32 = 6.0;
const LOOK_RATE: f32 = 0.4;
const JUMP_SPEED: f32 = 5.0;
const GRAVITY: f32 = 9.81;
const EYE_HEIGHT: f32 = 1.6;
const CHECKPOINT_Z: f32 = -20.0;

const PROPS: [(&str, [f32; 3]); 3] = [
    ("Plat 1", [0.0, 0.0, -8.0]),
    ("Plat 2", [3.0, 1.0, -16.0]),
    ("Plat 3", [-3.0, 2.0, -24.0]),
];

const WHEEL_OFFSETS: [[f32; 3]; 4] = [
    [-0.8, 0.0, -1.3],
    [0.8, 0.0, -1.3],
    [-0.8, 0.0, 1.3],
    [0.8, 0.0, 1.3],
];

//=== Level ===============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    OnFoot,
    Vehicle,
}

//=== World ===============================================================

/// State of one simulation instance.
#[derive(Debug, Clone)]
struct World {
    initialized: bool,
    axes: [f32; 4],
    buttons: [bool; 3],
    sensitivity: [u32; 2],
    position: [f32; 3],
    vertical_speed: f32,
    yaw: f32,
    pitch: f32,
    elapsed: f64,
    checkpoint_reached: bool,
}

impl World {
    fn new() -> Self {
        Self {
            initialized: false,
            axes: [0.0; 4],
            buttons: [false; 3],
            sensitivity: [5, 5],
            position: [0.0; 3],
            vertical_speed: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            elapsed: 0.0,
            checkpoint_reached: false,
        }
    }

    fn heading(&self) -> [f32; 4] {
        let (sin, cos) = (self.yaw * 0.5).sin_cos();
        [0.0, sin, 0.0, cos]
    }

    /// Yaw then pitch.
    fn view(&self) -> [f32; 4] {
        let (sy, cy) = (self.yaw * 0.5).sin_cos();
        let (sp, cp) = (self.pitch * 0.5).sin_cos();
        [cy * sp, sy * cp, -sy * sp, cy * cp]
    }

    fn offset(&self, by: [f32; 3]) -> [f32; 3] {
        [
            self.position[0] + by[0],
            self.position[1] + by[1],
            self.position[2] + by[2],
        ]
    }
}

/// Cue raised during a step, relayed once the world borrow ends.
enum Cue {
    Jump,
    Checkpoint,
}

//--- Static Strings ------------------------------------------------------

struct Strings {
    player: StrRef,
    jump: StrRef,
    checkpoint_tag: StrRef,
    checkpoint_message: StrRef,
    initialized: StrRef,
    scene_gltf: StrRef,
    player_gltf: StrRef,
}

//=== ScriptedSimulation ==================================================

pub(crate) struct ScriptedSimulation {
    level: Level,
    memory: Vec<u8>,
    heap: u32,
    strings: Strings,
    events: EventChannel,
    worlds: HashMap<WasmPtr, World>,
    desired_fps: u32,
    fail_next_create: bool,
    destroyed: Rc<Cell<u32>>,
}

impl ScriptedSimulation {
    /// First-person level: props plus player body.
    pub fn new() -> Self {
        Self::with_level(Level::OnFoot)
    }

    /// Driving level: car cabin plus four wheels, no player body.
    pub fn vehicle() -> Self {
        Self::with_level(Level::Vehicle)
    }

    fn with_level(level: Level) -> Self {
        let mut memory = vec![0u8; PAGE_SIZE];
        let mut cursor = 16;
        let mut intern = |bytes: &[u8]| {
            let string = transfer::write_string(&mut memory, cursor, bytes).expect("static data fits page");
            cursor += string.len;
            string
        };

        let strings = Strings {
            player: intern(b"PLAYER"),
            jump: intern(b"JUMP"),
            checkpoint_tag: intern(b"CHECKPOINT_REACHED"),
            checkpoint_message: intern(b"Checkpoint reached"),
            initialized: intern(b"Level initialized"),
            scene_gltf: intern(b"glTF\x02\x00\x00\x00scene"),
            player_gltf: intern(b"glTF\x02\x00\x00\x00player"),
        };

        Self {
            level,
            memory,
            heap: HEAP_START,
            strings,
            events: EventChannel::new(),
            worlds: HashMap::new(),
            desired_fps: 60,
            fail_next_create: false,
            destroyed: Rc::new(Cell::new(0)),
        }
    }

    pub fn with_desired_fps(mut self, fps: u32) -> Self {
        self.desired_fps = fps;
        self
    }

    //--- Test Controls ----------------------------------------------------

    /// Makes the next `create_sim` trap.
    pub fn fail_next_create(&mut self) {
        self.fail_next_create = true;
    }

    pub fn live_instances(&self) -> usize {
        self.worlds.len()
    }

    /// Shared count of instances destroyed, readable after the double is gone.
    pub fn destroyed_counter(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.destroyed)
    }

    pub fn pages(&self) -> usize {
        self.memory.len() / PAGE_SIZE
    }

    //--- Internal Helpers -------------------------------------------------

    fn alloc(&mut self, len: u32, export: &'static str) -> Result<WasmPtr, SimulationError> {
        let ptr = (self.heap + 7) & !7;
        let end = ptr as usize + len as usize;

        if end > self.memory.len() {
            let pages = end.div_ceil(PAGE_SIZE);
            if pages > MAX_PAGES {
                return Err(trap(export, "linear memory exhausted"));
            }
            self.memory.resize(pages * PAGE_SIZE, 0);
        }

        self.heap = end as u32;
        Ok(ptr)
    }

    fn world(&self, sim: WasmPtr, export: &'static str) -> Result<&World, SimulationError> {
        self.worlds
            .get(&sim)
            .ok_or_else(|| trap(export, "unknown simulation pointer"))
    }

    fn world_mut(&mut self, sim: WasmPtr, export: &'static str) -> Result<&mut World, SimulationError> {
        self.worlds
            .get_mut(&sim)
            .ok_or_else(|| trap(export, "unknown simulation pointer"))
    }

    fn raise(&mut self, export: &'static str, call: HostCall) -> Result<(), SimulationError> {
        relay(&mut self.events, &self.memory, call)
            .map(drop)
            .map_err(|err| SimulationError::Trap {
                export,
                source: err.into(),
            })
    }

    fn write_out(&mut self, out: WasmPtr, isometry: &Isometry) -> Result<(), SimulationError> {
        transfer::write_isometry(&mut self.memory, out, isometry)?;
        Ok(())
    }

    fn require_level(&self, level: Level, export: &'static str) -> Result<(), SimulationError> {
        if self.level == level {
            Ok(())
        } else {
            Err(SimulationError::Unsupported { export })
        }
    }
}

//=== SimulationExports ===================================================

impl SimulationExports for ScriptedSimulation {
    fn alloc_string(&mut self, len: u32) -> Result<WasmPtr, SimulationError> {
        self.alloc(len, names::ALLOC_STRING)
    }

    fn allocate_isometry(&mut self) -> Result<WasmPtr, SimulationError> {
        self.alloc(Isometry::BYTE_LEN as u32, names::ALLOCATE_ISOMETRY)
    }

    fn create_sim(&mut self) -> Result<WasmPtr, SimulationError> {
        if std::mem::take(&mut self.fail_next_create) {
            return Err(trap(names::CREATE_SIM, "allocation failed"));
        }
        let ptr = self.alloc(INSTANCE_SIZE, names::CREATE_SIM)?;
        self.worlds.insert(ptr, World::new());
        Ok(ptr)
    }

    fn destroy_sim(&mut self, sim: WasmPtr) -> Result<(), SimulationError> {
        self.worlds
            .remove(&sim)
            .ok_or_else(|| trap(names::DESTROY_SIM, "unknown simulation pointer"))?;
        self.destroyed.set(self.destroyed.get() + 1);
        Ok(())
    }

    fn initialize_sim(&mut self, sim: WasmPtr) -> Result<(), SimulationError> {
        let world = self.world_mut(sim, names::INITIALIZE_SIM)?;
        if world.initialized {
            return Err(trap(names::INITIALIZE_SIM, "already initialized"));
        }
        world.initialized = true;

        let message = self.strings.initialized;
        self.raise(
            names::INITIALIZE_SIM,
            HostCall::Log {
                level: log::Level::Info,
                message,
            },
        )
    }

    fn desired_fps(&mut self) -> Result<u32, SimulationError> {
        Ok(self.desired_fps)
    }

    fn step(&mut self, sim: WasmPtr, dt: f64) -> Result<(), SimulationError> {
        let world = self.world_mut(sim, names::STEP)?;
        let dt32 = dt as f32;
        let mut cues = Vec::new();

        world.elapsed += dt;

        //--- Look ---
        let [forward, right, up, turn] = world.axes;
        world.yaw -= turn * world.sensitivity[LookAxis::LeftRight.index()] as f32 * LOOK_RATE * dt32;
        world.pitch = (world.pitch + up * world.sensitivity[LookAxis::UpDown.index()] as f32 * LOOK_RATE * dt32)
            .clamp(-1.2, 1.2);

        //--- Walk (forward is -z) ---
        let (sin, cos) = world.yaw.sin_cos();
        world.position[0] += (right * cos + forward * sin) * WALK_SPEED * dt32;
        world.position[2] += (forward * cos - right * sin) * WALK_SPEED * dt32;

        //--- Jump & gravity ---
        let grounded = world.position[1] <= 0.0 && world.vertical_speed <= 0.0;
        if grounded && world.buttons[InputButton::Jump.index()] {
            world.vertical_speed = JUMP_SPEED;
            cues.push(Cue::Jump);
        }
        world.vertical_speed -= GRAVITY * dt32;
        world.position[1] += world.vertical_speed * dt32;
        if world.position[1] <= 0.0 {
            world.position[1] = 0.0;
            world.vertical_speed = 0.0;
        }

        //--- Level progress ---
        if !world.checkpoint_reached && world.position[2] <= CHECKPOINT_Z {
            world.checkpoint_reached = true;
            cues.push(Cue::Checkpoint);
        }

        for cue in cues {
            match cue {
                Cue::Jump => {
                    let (target, clip) = (self.strings.player, self.strings.jump);
                    self.raise(
                        names::STEP,
                        HostCall::PlayAudio {
                            target,
                            clip,
                            rate: 1.0,
                            volume: 1.0,
                        },
                    )?;
                    self.raise(
                        names::STEP,
                        HostCall::LoopAnimation {
                            target,
                            clip,
                            time_scale: 1.0,
                        },
                    )?;
                }
                Cue::Checkpoint => {
                    let kind = self.strings.checkpoint_tag;
                    let message = self.strings.checkpoint_message;
                    self.raise(names::STEP, HostCall::LevelEvent { kind })?;
                    self.raise(names::STEP, HostCall::Announce { message })?;
                }
            }
        }
        Ok(())
    }

    fn set_axis(&mut self, sim: WasmPtr, axis: InputAxis, value: f32) -> Result<(), SimulationError> {
        self.world_mut(sim, axis.export_name())?.axes[axis.index()] = value;
        Ok(())
    }

    fn set_button(&mut self, sim: WasmPtr, button: InputButton, pressed: bool) -> Result<(), SimulationError> {
        self.world_mut(sim, button.export_name())?.buttons[button.index()] = pressed;
        Ok(())
    }

    fn look_sensitivity(&mut self, sim: WasmPtr, axis: LookAxis) -> Result<u32, SimulationError> {
        Ok(self.world(sim, axis.getter_name())?.sensitivity[axis.index()])
    }

    fn set_look_sensitivity(&mut self, sim: WasmPtr, axis: LookAxis, value: u32) -> Result<(), SimulationError> {
        self.world_mut(sim, axis.setter_name())?.sensitivity[axis.index()] = value;
        Ok(())
    }

    fn gltf_bytes(&mut self, sim: WasmPtr, asset: GltfAsset) -> Result<(WasmPtr, u32), SimulationError> {
        self.world(sim, asset.ptr_export())?;
        let blob = match asset {
            GltfAsset::Scene => self.strings.scene_gltf,
            GltfAsset::Player => {
                self.require_level(Level::OnFoot, asset.ptr_export())?;
                self.strings.player_gltf
            }
        };
        Ok((blob.ptr, blob.len))
    }

    fn prop_isometry(&mut self, sim: WasmPtr, name: StrRef, out: WasmPtr) -> Result<(), SimulationError> {
        let name = transfer::read_string(&self.memory, name)?;
        let world = self.world(sim, names::PROP_ISOMETRY)?;

        let isometry = match PROPS.iter().find(|(prop, _)| *prop == name) {
            Some((_, [x, y, z])) => {
                let bob = (world.elapsed as f32).sin() * 0.5;
                Isometry::from_translation([*x, *y + bob, *z])
            }
            None => Isometry::IDENTITY,
        };
        self.write_out(out, &isometry)
    }

    fn camera_global_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError> {
        let world = self.world(sim, names::CAMERA_GLOBAL_ISOMETRY)?;
        let isometry = Isometry::new(world.view(), world.offset([0.0, EYE_HEIGHT, 0.0]));
        self.write_out(out, &isometry)
    }

    fn player_body_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError> {
        self.require_level(Level::OnFoot, names::PLAYER_BODY_ISOMETRY)?;
        let world = self.world(sim, names::PLAYER_BODY_ISOMETRY)?;
        let isometry = Isometry::new(world.heading(), world.position);
        self.write_out(out, &isometry)
    }

    fn car_cabin_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError> {
        self.require_level(Level::Vehicle, names::CAR_CABIN_ISOMETRY)?;
        let world = self.world(sim, names::CAR_CABIN_ISOMETRY)?;
        let isometry = Isometry::new(world.heading(), world.offset([0.0, 0.5, 0.0]));
        self.write_out(out, &isometry)
    }

    fn wheel_isometry(&mut self, sim: WasmPtr, index: u32, out: WasmPtr) -> Result<(), SimulationError> {
        self.require_level(Level::Vehicle, names::WHEEL_ISOMETRY)?;
        let world = self.world(sim, names::WHEEL_ISOMETRY)?;
        let offset = WHEEL_OFFSETS
            .get(index as usize)
            .ok_or_else(|| trap(names::WHEEL_ISOMETRY, "wheel index out of range"))?;
        let isometry = Isometry::new(world.heading(), world.offset(*offset));
        self.write_out(out, &isometry)
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn events_mut(&mut self) -> &mut EventChannel {
        &mut self.events
    }
}

fn trap(export: &'static str, message: &str) -> SimulationError {
    SimulationError::Trap {
        export,
        source: anyhow::anyhow!("{}", message),
    }
}
