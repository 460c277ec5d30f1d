use std::sync::Arc;

use glam::Vec3;

use crate::sim::joints::JointRegistry;

use super::file_formats::modelfile;

/// Mesh geometry attached to a joint. Positions are shared read-only between instances.
#[derive(Clone, Debug)]
pub struct Visual {
    pub joint: Option<String>,
    pub offset: Vec3,
    pub positions: Arc<[Vec3]>,
}

/// Parsed model as stored in the cache, never mutated after load
#[derive(Debug)]
pub struct ModelTemplate {
    pub asset_id: String,
    pub name: String,
    pub joints: JointRegistry,
    pub visuals: Vec<Visual>,
    /// sub-resources that failed to load, their visuals are missing
    pub sub_resource_errors: Vec<String>,
}
impl ModelTemplate {
    pub fn from_description(asset_id: &str, description: &modelfile::Model, visuals: Vec<Visual>, sub_resource_errors: Vec<String>) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            name: description.name.clone(),
            joints: JointRegistry::from_description(&description.joints),
            visuals,
            sub_resource_errors,
        }
    }

    /// Independent copy with its own joint state
    pub fn instantiate(&self) -> ModelInstance {
        ModelInstance {
            asset_id: self.asset_id.clone(),
            name: self.name.clone(),
            joints: self.joints.clone(),
            visuals: self.visuals.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ModelInstance {
    pub asset_id: String,
    pub name: String,
    pub joints: JointRegistry,
    pub visuals: Vec<Visual>,
}
impl ModelInstance {
    pub fn joint_names(&self) -> Vec<String> {
        self.joints.names()
    }

    /// Rest-pose positions of every visual vertex, in model space
    pub fn rest_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.visuals.iter().flat_map(move |visual| {
            let base = visual
                .joint
                .as_deref()
                .and_then(|name| self.joints.handle(name))
                .map_or(Vec3::ZERO, |handle| self.joints.world_origin(handle))
                + visual.offset;
            visual.positions.iter().map(move |p| base + *p)
        })
    }
}
