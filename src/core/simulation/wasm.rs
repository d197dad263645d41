//=========================================================================
// WebAssembly Backend
//=========================================================================
//
// Loads a compiled simulation module with wasmtime and adapts its
// exports to `SimulationExports`.
//
// Load pipeline (any failure rejects the load, no retry):
// ```text
//   read file ─> compile ─> link host imports ─> instantiate
//       ─> resolve export table ─> allocate scratch slot ─> create_sim
// ```
//
// Host imports live in the store data next to the event channel, so a
// callback raised mid-step decodes its arguments against the current
// linear memory and dispatches before the step returns.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::path::Path;
use std::time::Instant;

use log::{debug, info, Level};
use wasmtime::{
    AsContextMut, Caller, Engine, Instance, Linker, Memory, MemoryType, Module, Store, TypedFunc, WasmParams,
    WasmResults,
};

//=== Internal Dependencies ===============================================

use super::exports::{names, GltfAsset, InputAxis, InputButton, LookAxis, SimulationExports};
use super::SimulationHandle;
use crate::core::events::{relay, EventChannel, HostCall};
use crate::core::transfer::{StrRef, WasmPtr};
use crate::error::{LoadError, SimulationError};

//=== Constants ===========================================================

const HOST_MODULE: &str = "env";

/// Upper bound of a 32-bit linear memory, in 64 KiB pages.
const MAX_PAGES: u32 = 65_536;

//=== Loading =============================================================

/// Reads, compiles and instantiates the module at `path`, returning a
/// handle with its first instance created (not yet initialized).
///
/// Accepts both binary `.wasm` and text `.wat` modules.
pub fn load_simulation(path: impl AsRef<Path>) -> Result<SimulationHandle<WasmSimulation>, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    info!(target: "simulation", "Loading {} ({} bytes)", path.display(), bytes.len());
    load_simulation_bytes(&bytes)
}

/// Same as [`load_simulation`] for a module already in memory.
pub fn load_simulation_bytes(bytes: &[u8]) -> Result<SimulationHandle<WasmSimulation>, LoadError> {
    let module = WasmSimulation::instantiate(bytes)?;
    let mut handle = SimulationHandle::new(module).map_err(LoadError::Create)?;
    if handle.desired_fps() == 0 {
        return Err(LoadError::ZeroFrameRate);
    }
    handle.create().map_err(LoadError::Create)?;
    Ok(handle)
}

//=== HostState ===========================================================

/// Store data reachable from host imports.
struct HostState {
    events: EventChannel,
    epoch: Instant,
    memory: Option<Memory>,
}

//=== WasmSimulation ======================================================

/// One instantiated simulation module.
pub struct WasmSimulation {
    store: Store<HostState>,
    memory: Memory,
    exports: ExportTable,
}

impl WasmSimulation {
    fn instantiate(bytes: &[u8]) -> Result<Self, LoadError> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes).map_err(LoadError::Compile)?;

        let mut store = Store::new(
            &engine,
            HostState {
                events: EventChannel::new(),
                epoch: Instant::now(),
                memory: None,
            },
        );

        let mut linker = Linker::new(&engine);
        define_host_imports(&mut linker).map_err(LoadError::Link)?;

        // Modules built to import their memory get one supplied by the host.
        let imports_memory = module
            .imports()
            .any(|import| import.module() == "js" && import.name() == "mem");
        if imports_memory {
            let memory = Memory::new(&mut store, MemoryType::new(1, Some(MAX_PAGES))).map_err(LoadError::Link)?;
            linker.define(&store, "js", "mem", memory).map_err(LoadError::Link)?;
            store.data_mut().memory = Some(memory);
        }

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(LoadError::Instantiate)?;

        let memory = match instance.get_memory(&mut store, "memory") {
            Some(exported) => exported,
            None => store.data().memory.ok_or(LoadError::MissingMemory)?,
        };
        store.data_mut().memory = Some(memory);

        let exports = ExportTable::resolve(&instance, &mut store)?;
        debug!(
            target: "simulation",
            "Module instantiated ({} pages, player body: {}, vehicle: {})",
            memory.size(&store),
            exports.player_body_isometry.is_some(),
            exports.car_cabin_isometry.is_some()
        );

        Ok(Self {
            store,
            memory,
            exports,
        })
    }
}

//=== SimulationExports ===================================================

impl SimulationExports for WasmSimulation {
    fn alloc_string(&mut self, len: u32) -> Result<WasmPtr, SimulationError> {
        invoke(&mut self.store, &self.exports.alloc_string, names::ALLOC_STRING, len)
    }

    fn allocate_isometry(&mut self) -> Result<WasmPtr, SimulationError> {
        invoke(&mut self.store, &self.exports.allocate_isometry, names::ALLOCATE_ISOMETRY, ())
    }

    fn create_sim(&mut self) -> Result<WasmPtr, SimulationError> {
        invoke(&mut self.store, &self.exports.create_sim, names::CREATE_SIM, ())
    }

    fn destroy_sim(&mut self, sim: WasmPtr) -> Result<(), SimulationError> {
        invoke(&mut self.store, &self.exports.destroy_sim, names::DESTROY_SIM, sim)
    }

    fn initialize_sim(&mut self, sim: WasmPtr) -> Result<(), SimulationError> {
        invoke(&mut self.store, &self.exports.initialize_sim, names::INITIALIZE_SIM, sim)
    }

    fn desired_fps(&mut self) -> Result<u32, SimulationError> {
        invoke(&mut self.store, &self.exports.desired_fps, names::DESIRED_FPS, ())
    }

    fn step(&mut self, sim: WasmPtr, dt: f64) -> Result<(), SimulationError> {
        invoke(&mut self.store, &self.exports.step, names::STEP, (sim, dt))
    }

    fn set_axis(&mut self, sim: WasmPtr, axis: InputAxis, value: f32) -> Result<(), SimulationError> {
        let func = &self.exports.axes[axis.index()];
        invoke(&mut self.store, func, axis.export_name(), (sim, value))
    }

    fn set_button(&mut self, sim: WasmPtr, button: InputButton, pressed: bool) -> Result<(), SimulationError> {
        let func = &self.exports.buttons[button.index()];
        invoke(&mut self.store, func, button.export_name(), (sim, u32::from(pressed)))
    }

    fn look_sensitivity(&mut self, sim: WasmPtr, axis: LookAxis) -> Result<u32, SimulationError> {
        let func = &self.exports.sensitivity[axis.index()];
        invoke(&mut self.store, func, axis.getter_name(), sim)
    }

    fn set_look_sensitivity(&mut self, sim: WasmPtr, axis: LookAxis, value: u32) -> Result<(), SimulationError> {
        let func = &self.exports.set_sensitivity[axis.index()];
        invoke(&mut self.store, func, axis.setter_name(), (sim, value))
    }

    fn gltf_bytes(&mut self, sim: WasmPtr, asset: GltfAsset) -> Result<(WasmPtr, u32), SimulationError> {
        let (ptr_func, len_func) = match asset {
            GltfAsset::Scene => &self.exports.scene_gltf,
            GltfAsset::Player => self
                .exports
                .player_gltf
                .as_ref()
                .ok_or(SimulationError::Unsupported {
                    export: asset.ptr_export(),
                })?,
        };
        let ptr = invoke(&mut self.store, ptr_func, asset.ptr_export(), sim)?;
        let len = invoke(&mut self.store, len_func, asset.len_export(), sim)?;
        Ok((ptr, len))
    }

    fn prop_isometry(&mut self, sim: WasmPtr, name: StrRef, out: WasmPtr) -> Result<(), SimulationError> {
        invoke(
            &mut self.store,
            &self.exports.prop_isometry,
            names::PROP_ISOMETRY,
            (sim, name.ptr, name.len, out),
        )
    }

    fn camera_global_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError> {
        invoke(
            &mut self.store,
            &self.exports.camera_global_isometry,
            names::CAMERA_GLOBAL_ISOMETRY,
            (sim, out),
        )
    }

    fn player_body_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError> {
        let func = optional_export(&self.exports.player_body_isometry, names::PLAYER_BODY_ISOMETRY)?;
        invoke(&mut self.store, func, names::PLAYER_BODY_ISOMETRY, (sim, out))
    }

    fn car_cabin_isometry(&mut self, sim: WasmPtr, out: WasmPtr) -> Result<(), SimulationError> {
        let func = optional_export(&self.exports.car_cabin_isometry, names::CAR_CABIN_ISOMETRY)?;
        invoke(&mut self.store, func, names::CAR_CABIN_ISOMETRY, (sim, out))
    }

    fn wheel_isometry(&mut self, sim: WasmPtr, index: u32, out: WasmPtr) -> Result<(), SimulationError> {
        let func = optional_export(&self.exports.wheel_isometry, names::WHEEL_ISOMETRY)?;
        invoke(&mut self.store, func, names::WHEEL_ISOMETRY, (sim, index, out))
    }

    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn events_mut(&mut self) -> &mut EventChannel {
        &mut self.store.data_mut().events
    }
}

//--- Call Helpers --------------------------------------------------------

fn invoke<P, R>(
    store: &mut Store<HostState>,
    func: &TypedFunc<P, R>,
    export: &'static str,
    params: P,
) -> Result<R, SimulationError>
where
    P: WasmParams,
    R: WasmResults,
{
    func.call(store, params)
        .map_err(|source| SimulationError::Trap { export, source })
}

fn optional_export<'a, P, R>(
    func: &'a Option<TypedFunc<P, R>>,
    export: &'static str,
) -> Result<&'a TypedFunc<P, R>, SimulationError> {
    func.as_ref().ok_or(SimulationError::Unsupported { export })
}

//=== ExportTable =========================================================

/// Typed handles to every export, resolved once at load.
struct ExportTable {
    alloc_string: TypedFunc<u32, u32>,
    allocate_isometry: TypedFunc<(), u32>,
    create_sim: TypedFunc<(), u32>,
    destroy_sim: TypedFunc<u32, ()>,
    initialize_sim: TypedFunc<u32, ()>,
    desired_fps: TypedFunc<(), u32>,
    step: TypedFunc<(u32, f64), ()>,
    axes: Vec<TypedFunc<(u32, f32), ()>>,
    buttons: Vec<TypedFunc<(u32, u32), ()>>,
    sensitivity: Vec<TypedFunc<u32, u32>>,
    set_sensitivity: Vec<TypedFunc<(u32, u32), ()>>,
    scene_gltf: (TypedFunc<u32, u32>, TypedFunc<u32, u32>),
    prop_isometry: TypedFunc<(u32, u32, u32, u32), ()>,
    camera_global_isometry: TypedFunc<(u32, u32), ()>,

    //--- Level-specific ---
    player_gltf: Option<(TypedFunc<u32, u32>, TypedFunc<u32, u32>)>,
    player_body_isometry: Option<TypedFunc<(u32, u32), ()>>,
    car_cabin_isometry: Option<TypedFunc<(u32, u32), ()>>,
    wheel_isometry: Option<TypedFunc<(u32, u32, u32), ()>>,
}

impl ExportTable {
    fn resolve(instance: &Instance, store: &mut Store<HostState>) -> Result<Self, LoadError> {
        let player_gltf = match (
            optional(instance, store, GltfAsset::Player.ptr_export())?,
            optional(instance, store, GltfAsset::Player.len_export())?,
        ) {
            (Some(ptr), Some(len)) => Some((ptr, len)),
            _ => None,
        };

        Ok(Self {
            alloc_string: required(instance, store, names::ALLOC_STRING)?,
            allocate_isometry: required(instance, store, names::ALLOCATE_ISOMETRY)?,
            create_sim: required(instance, store, names::CREATE_SIM)?,
            destroy_sim: required(instance, store, names::DESTROY_SIM)?,
            initialize_sim: required(instance, store, names::INITIALIZE_SIM)?,
            desired_fps: required(instance, store, names::DESIRED_FPS)?,
            step: required(instance, store, names::STEP)?,
            axes: InputAxis::ALL
                .iter()
                .map(|axis| required(instance, store, axis.export_name()))
                .collect::<Result<_, _>>()?,
            buttons: InputButton::ALL
                .iter()
                .map(|button| required(instance, store, button.export_name()))
                .collect::<Result<_, _>>()?,
            sensitivity: LookAxis::ALL
                .iter()
                .map(|axis| required(instance, store, axis.getter_name()))
                .collect::<Result<_, _>>()?,
            set_sensitivity: LookAxis::ALL
                .iter()
                .map(|axis| required(instance, store, axis.setter_name()))
                .collect::<Result<_, _>>()?,
            scene_gltf: (
                required(instance, store, GltfAsset::Scene.ptr_export())?,
                required(instance, store, GltfAsset::Scene.len_export())?,
            ),
            prop_isometry: required(instance, store, names::PROP_ISOMETRY)?,
            camera_global_isometry: required(instance, store, names::CAMERA_GLOBAL_ISOMETRY)?,
            player_gltf,
            player_body_isometry: optional(instance, store, names::PLAYER_BODY_ISOMETRY)?,
            car_cabin_isometry: optional(instance, store, names::CAR_CABIN_ISOMETRY)?,
            wheel_isometry: optional(instance, store, names::WHEEL_ISOMETRY)?,
        })
    }
}

fn required<P, R>(instance: &Instance, store: &mut Store<HostState>, name: &'static str) -> Result<TypedFunc<P, R>, LoadError>
where
    P: WasmParams,
    R: WasmResults,
{
    instance
        .get_typed_func::<P, R>(&mut *store, name)
        .map_err(|source| LoadError::MissingExport { name, source })
}

/// Absent is fine; present with the wrong signature is not.
fn optional<P, R>(
    instance: &Instance,
    store: &mut Store<HostState>,
    name: &'static str,
) -> Result<Option<TypedFunc<P, R>>, LoadError>
where
    P: WasmParams,
    R: WasmResults,
{
    if instance.get_export(&mut *store, name).is_none() {
        return Ok(None);
    }
    required(instance, store, name).map(Some)
}

//=== Host Imports ========================================================

fn define_host_imports(linker: &mut Linker<HostState>) -> anyhow::Result<()> {
    linker.func_wrap(HOST_MODULE, "now", |caller: Caller<'_, HostState>| -> f64 {
        caller.data().epoch.elapsed().as_secs_f64() * 1000.0
    })?;

    linker.func_wrap(
        HOST_MODULE,
        "play_audio_hook",
        |mut caller: Caller<'_, HostState>, target_ptr: u32, target_len: u32, clip_ptr: u32, clip_len: u32, rate: f32, volume: f32| {
            dispatch(
                &mut caller,
                HostCall::PlayAudio {
                    target: StrRef::new(target_ptr, target_len),
                    clip: StrRef::new(clip_ptr, clip_len),
                    rate,
                    volume,
                },
            )
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "loop_audio_hook",
        |mut caller: Caller<'_, HostState>, target_ptr: u32, target_len: u32, clip_ptr: u32, clip_len: u32, rate: f32, volume: f32| {
            dispatch(
                &mut caller,
                HostCall::LoopAudio {
                    target: StrRef::new(target_ptr, target_len),
                    clip: StrRef::new(clip_ptr, clip_len),
                    rate,
                    volume,
                },
            )
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "stop_audio_hook",
        |mut caller: Caller<'_, HostState>, target_ptr: u32, target_len: u32, clip_ptr: u32, clip_len: u32| {
            dispatch(
                &mut caller,
                HostCall::StopAudio {
                    target: StrRef::new(target_ptr, target_len),
                    clip: StrRef::new(clip_ptr, clip_len),
                },
            )
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "loop_animation_hook",
        |mut caller: Caller<'_, HostState>, target_ptr: u32, target_len: u32, clip_ptr: u32, clip_len: u32, time_scale: f32| {
            dispatch(
                &mut caller,
                HostCall::LoopAnimation {
                    target: StrRef::new(target_ptr, target_len),
                    clip: StrRef::new(clip_ptr, clip_len),
                    time_scale,
                },
            )
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "stop_animation_hook",
        |mut caller: Caller<'_, HostState>, target_ptr: u32, target_len: u32, clip_ptr: u32, clip_len: u32| {
            dispatch(
                &mut caller,
                HostCall::StopAnimation {
                    target: StrRef::new(target_ptr, target_len),
                    clip: StrRef::new(clip_ptr, clip_len),
                },
            )
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "assistive_device_announce_hook",
        |mut caller: Caller<'_, HostState>, ptr: u32, len: u32| {
            dispatch(
                &mut caller,
                HostCall::Announce {
                    message: StrRef::new(ptr, len),
                },
            )
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "level_event_hook",
        |mut caller: Caller<'_, HostState>, ptr: u32, len: u32| {
            dispatch(
                &mut caller,
                HostCall::LevelEvent {
                    kind: StrRef::new(ptr, len),
                },
            )
        },
    )?;

    for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
        let import = HostCall::Log {
            level,
            message: StrRef::new(0, 0),
        }
        .import_name();

        linker.func_wrap(
            HOST_MODULE,
            import,
            move |mut caller: Caller<'_, HostState>, ptr: u32, len: u32| {
                dispatch(
                    &mut caller,
                    HostCall::Log {
                        level,
                        message: StrRef::new(ptr, len),
                    },
                )
            },
        )?;
    }

    Ok(())
}

/// Decodes a host call against the caller's current memory and emits it.
/// A bad pointer traps the calling export.
fn dispatch(caller: &mut Caller<'_, HostState>, call: HostCall) -> anyhow::Result<()> {
    let Some(memory) = caller.data().memory else {
        anyhow::bail!("`{}` called before linear memory was bound", call.import_name());
    };

    let (data, state) = memory.data_and_store_mut(caller.as_context_mut());
    relay(&mut state.events, data, call)?;
    Ok(())
}

//=========================================================================
// Unit Tests
//=========================================================================
