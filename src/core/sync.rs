//=========================================================================
// Scene Sync
//=========================================================================
//
// Per-frame transform snapshot handed to the renderer.
//
// Architecture:
// ```text
//   GameLoop (after stepping) ──capture(handle, plan)──> FrameSnapshot
//                                                            │
//                                                  SceneSync::apply()
// ```
//
// Every query goes through the shared scratch slot; `capture` decodes
// each result into the snapshot before issuing the next query.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::trace;
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::simulation::{InstanceId, SimulationExports, SimulationHandle};
use crate::core::transfer::Isometry;
use crate::error::SimulationError;

//=== SnapshotPlan ========================================================

/// Which transform queries a level needs each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotPlan {
    /// Named scene props, queried by name.
    pub props: Vec<String>,
    pub player_body: bool,
    pub car_cabin: bool,
    pub wheel_count: u32,
}

impl SnapshotPlan {
    /// First-person level: props plus player body.
    pub fn on_foot<I, S>(props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            props: props.into_iter().map(Into::into).collect(),
            player_body: true,
            car_cabin: false,
            wheel_count: 0,
        }
    }

    /// Driving level: cabin plus wheels.
    pub fn vehicle(wheel_count: u32) -> Self {
        Self {
            props: Vec::new(),
            player_body: false,
            car_cabin: true,
            wheel_count,
        }
    }
}

impl Default for SnapshotPlan {
    fn default() -> Self {
        Self::on_foot(Vec::<String>::new())
    }
}

//=== FrameSnapshot =======================================================

/// Owned copy of every transform one frame renders.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    /// Instance the transforms were read from.
    pub instance: InstanceId,
    pub camera: Isometry,
    pub player_body: Option<Isometry>,
    pub car_cabin: Option<Isometry>,
    pub wheels: Vec<Isometry>,
    pub props: Vec<(String, Isometry)>,
}

/// Issues the queries `plan` asks for.
///
/// # Panics
///
/// Panics if the handle is not initialized.
pub fn capture<M: SimulationExports>(
    handle: &mut SimulationHandle<M>,
    plan: &SnapshotPlan,
) -> Result<FrameSnapshot, SimulationError> {
    let camera = handle.camera_global_isometry()?;
    let Some(instance) = handle.instance() else {
        unreachable!("transform query succeeded without a live instance");
    };

    let player_body = if plan.player_body {
        Some(handle.player_body_isometry()?)
    } else {
        None
    };

    let car_cabin = if plan.car_cabin {
        Some(handle.car_cabin_isometry()?)
    } else {
        None
    };

    let wheels = (0..plan.wheel_count)
        .map(|index| handle.wheel_isometry(index))
        .collect::<Result<Vec<_>, _>>()?;

    let mut props = Vec::with_capacity(plan.props.len());
    for name in &plan.props {
        props.push((name.clone(), handle.prop_isometry(name)?));
    }

    Ok(FrameSnapshot {
        instance,
        camera,
        player_body,
        car_cabin,
        wheels,
        props,
    })
}

//=== SceneSync ===========================================================

/// Consumer of frame snapshots (the renderer's side of the boundary).
pub trait SceneSync {
    fn apply(&mut self, snapshot: &FrameSnapshot);
}

impl<F: FnMut(&FrameSnapshot)> SceneSync for F {
    fn apply(&mut self, snapshot: &FrameSnapshot) {
        self(snapshot)
    }
}

/// Logs each snapshot at `trace`. Used when no renderer is attached.
#[derive(Debug, Default)]
pub struct TraceSync {
    frames: u64,
}

impl TraceSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl SceneSync for TraceSync {
    fn apply(&mut self, snapshot: &FrameSnapshot) {
        self.frames += 1;
        trace!(
            target: "sync",
            "frame {} camera {:?} body {:?} props {}",
            self.frames,
            snapshot.camera.translation,
            snapshot.player_body.map(|body| body.translation),
            snapshot.props.len()
        );
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
