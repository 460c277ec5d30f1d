use glam::Vec3;

use crate::{config::FitConfig, resource_manager::model::ModelInstance};

use super::camera::CameraPose;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}
impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Aabb { min: first, max: first }, |aabb, p| Aabb { min: aabb.min.min(p), max: aabb.max.max(p) }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBounds {
    pub center: Vec3,
    pub radius: f32,
}

/// Framing bounds of a model at rest. Models without geometry get the minimum radius at the origin.
pub fn compute_bounds(instance: &ModelInstance, fit: &FitConfig) -> SceneBounds {
    let aabb = Aabb::from_points(instance.rest_positions().filter(|p| p.is_finite()));
    let (center, extent) = match aabb {
        Some(aabb) => (aabb.center(), aabb.size().max_element()),
        None => (Vec3::ZERO, 0.0),
    };
    SceneBounds { center: center + Vec3::Y * fit.eye_height_offset, radius: extent.max(fit.min_radius) }
}

/// (close, pulled back) camera poses along the viewing axis. The pulled back pose is the default view.
pub fn intro_poses(bounds: &SceneBounds, fit: &FitConfig) -> (CameraPose, CameraPose) {
    let axis = Vec3::from(fit.view_axis).try_normalize().unwrap_or(Vec3::Z);
    let at = |factor: f32| CameraPose { position: bounds.center + axis * bounds.radius * factor, target: bounds.center };
    (at(fit.near_factor), at(fit.far_factor))
}
