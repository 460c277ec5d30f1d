use std::{sync::Arc, time::Instant};

use arc_swap::{ArcSwap, Guard};
use glam::{Quat, Vec3};

use crate::{resource_manager::model::ModelInstance, sim::camera::Camera};

#[derive(Clone, Debug, PartialEq)]
pub struct CameraSnapshot {
    pub position: Vec3,
    pub target: Vec3,
    pub rotation: Quat,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}
impl Default for CameraSnapshot {
    fn default() -> Self {
        Camera::default().build_snapshot()
    }
}

/// Everything the renderer needs for one frame of one viewer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderSnapshot {
    pub frame_index: u32,
    pub camera: CameraSnapshot,
    /// (joint name, angle) in declaration order, empty until the model is ready
    pub joints: Vec<(String, f32)>,
}
impl RenderSnapshot {
    pub fn build(frame_index: u32, camera: &Camera, instance: Option<&ModelInstance>) -> Self {
        Self {
            frame_index,
            camera: camera.build_snapshot(),
            joints: instance.map(|instance| instance.joints.values()).unwrap_or_default(),
        }
    }

    pub fn joint(&self, name: &str) -> Option<f32> {
        self.joints.iter().find(|(joint, _)| joint == name).map(|(_, angle)| *angle)
    }
}

/// The two most recent frames, so the renderer can blend between ticks
#[derive(Clone, Debug)]
pub struct FramePair {
    pub previous: Arc<RenderSnapshot>,
    pub current: Arc<RenderSnapshot>,
    pub previous_at: Instant,
    pub current_at: Instant,
}
impl FramePair {
    /// How far `at` lies between the two publish times, extrapolating one tick ahead at most
    pub fn blend_factor(&self, at: Instant) -> f32 {
        let span = self.current_at.saturating_duration_since(self.previous_at).as_secs_f32();
        if span <= f32::EPSILON {
            return 1.0;
        }
        (at.saturating_duration_since(self.previous_at).as_secs_f32() / span).clamp(0.0, 2.0)
    }
}

/// Lock-free handoff from the viewer tick to the renderer thread
pub struct SnapshotHandoff {
    frames: ArcSwap<FramePair>,
}

impl SnapshotHandoff {
    pub fn new(first: RenderSnapshot) -> Self {
        let first = Arc::new(first);
        let at = Instant::now();
        Self { frames: ArcSwap::from_pointee(FramePair { previous: first.clone(), current: first, previous_at: at, current_at: at }) }
    }

    pub fn publish(&self, snapshot: RenderSnapshot) {
        let snapshot = Arc::new(snapshot);
        let at = Instant::now();
        self.frames.rcu(|frames| FramePair {
            previous: frames.current.clone(),
            previous_at: frames.current_at,
            current: snapshot.clone(),
            current_at: at,
        });
    }

    pub fn frames(&self) -> Guard<Arc<FramePair>> {
        self.frames.load()
    }

    pub fn latest(&self) -> Arc<RenderSnapshot> {
        self.frames.load().current.clone()
    }
}
