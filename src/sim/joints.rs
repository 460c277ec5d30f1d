use std::collections::HashMap;

use generational_arena::{Arena, Index};
use glam::Vec3;
use tracing::{trace, warn};

use crate::resource_manager::file_formats::modelfile;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct JointHandle(pub Index);

#[derive(Clone, Debug)]
pub struct Joint {
    pub name: String,
    pub parent: Option<JointHandle>,
    pub origin: Vec3,
    pub axis: Vec3,
    pub limit: Option<modelfile::Limit>,
    /// radians
    pub angle: f32,
}

/// Named rotational joints of one model instance.
///
/// Built once when the instance is created, entries are never added or removed afterwards.
/// Lookups by name that miss are not errors: different models expose different joint sets,
/// so callers skip unknown joints.
#[derive(Clone, Default, Debug)]
pub struct JointRegistry {
    joints: Arena<Joint>,
    by_name: HashMap<String, JointHandle>,
    /// declaration order
    order: Vec<JointHandle>,
}
impl JointRegistry {
    pub fn from_description(descs: &[modelfile::Joint]) -> Self {
        let mut registry = Self::default();
        for desc in descs {
            if registry.by_name.contains_key(&desc.name) {
                warn!(joint = %desc.name, "duplicate joint name, keeping the first");
                continue;
            }
            let idx = registry.joints.insert(Joint {
                name: desc.name.clone(),
                parent: None,
                origin: Vec3::from(desc.origin),
                axis: Vec3::from(desc.axis).try_normalize().unwrap_or(Vec3::Z),
                limit: desc.limit,
                angle: 0.0,
            });
            registry.by_name.insert(desc.name.clone(), JointHandle(idx));
            registry.order.push(JointHandle(idx));
        }

        // second pass, parents may be declared after their children
        for desc in descs {
            let Some(parent_name) = &desc.parent else {
                continue;
            };
            let (Some(&child), parent) = (registry.by_name.get(&desc.name), registry.by_name.get(parent_name).copied()) else {
                continue;
            };
            match parent {
                Some(parent) if parent != child => {
                    if let Some(joint) = registry.joints.get_mut(child.0) {
                        joint.parent = Some(parent);
                    }
                }
                _ => warn!(joint = %desc.name, parent = %parent_name, "unknown parent joint, attaching to root"),
            }
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn handle(&self, name: &str) -> Option<JointHandle> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(handle.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Joint> {
        self.order.iter().filter_map(|handle| self.joints.get(handle.0))
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|joint| joint.name.clone()).collect()
    }

    pub fn get_joint_value(&self, name: &str) -> Option<f32> {
        self.handle(name).and_then(|handle| self.get(handle)).map(|joint| joint.angle)
    }

    /// Writes an angle, clamped to the joint limit if it has one.
    /// Returns false (and writes nothing) for unknown joints.
    pub fn set_joint_value(&mut self, name: &str, angle: f32) -> bool {
        let Some(handle) = self.handle(name) else {
            trace!(joint = name, "skipping unknown joint");
            return false;
        };
        self.set_by_handle(handle, angle)
    }

    pub fn set_by_handle(&mut self, handle: JointHandle, angle: f32) -> bool {
        let Some(joint) = self.joints.get_mut(handle.0) else {
            return false;
        };
        joint.angle = match joint.limit {
            Some(limit) => angle.clamp(limit.lower.min(limit.upper), limit.upper.max(limit.lower)),
            None => angle,
        };
        true
    }

    /// Rest-pose position of a joint, accumulated along the parent chain
    pub fn world_origin(&self, handle: JointHandle) -> Vec3 {
        let mut position = Vec3::ZERO;
        let mut current = Some(handle);
        // parent chains longer than the joint count mean a cycle
        let mut remaining = self.len();
        while let (Some(handle), true) = (current, remaining > 0) {
            let Some(joint) = self.get(handle) else {
                break;
            };
            position += joint.origin;
            current = joint.parent;
            remaining -= 1;
        }
        position
    }

    /// (name, angle) pairs in declaration order
    pub fn values(&self) -> Vec<(String, f32)> {
        self.iter().map(|joint| (joint.name.clone(), joint.angle)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, parent: Option<&str>, origin: [f32; 3], limit: Option<(f32, f32)>) -> modelfile::Joint {
        modelfile::Joint {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            origin,
            axis: [0.0, 0.0, 1.0],
            limit: limit.map(|(lower, upper)| modelfile::Limit { lower, upper }),
        }
    }

    #[test]
    fn set_and_get_by_name() {
        let mut registry = JointRegistry::from_description(&[desc("neck", None, [0.0; 3], None)]);
        assert!(registry.set_joint_value("neck", 0.4));
        assert_eq!(registry.get_joint_value("neck"), Some(0.4));
    }

    #[test]
    fn unknown_joint_is_skipped() {
        let mut registry = JointRegistry::from_description(&[desc("neck", None, [0.0; 3], None)]);
        assert!(!registry.set_joint_value("tail", 1.0));
        assert_eq!(registry.get_joint_value("tail"), None);
        assert_eq!(registry.get_joint_value("neck"), Some(0.0));
    }

    #[test]
    fn limits_clamp_written_angles() {
        let mut registry = JointRegistry::from_description(&[desc("pan", None, [0.0; 3], Some((-0.5, 0.5)))]);
        registry.set_joint_value("pan", 2.0);
        assert_eq!(registry.get_joint_value("pan"), Some(0.5));
        registry.set_joint_value("pan", -2.0);
        assert_eq!(registry.get_joint_value("pan"), Some(-0.5));
    }

    #[test]
    fn world_origin_follows_parents_declared_later() {
        let registry = JointRegistry::from_description(&[
            desc("head", Some("torso"), [0.0, 0.5, 0.0], None),
            desc("torso", None, [0.0, 1.0, 0.0], None),
        ]);
        let head = registry.handle("head").unwrap();
        assert_eq!(registry.world_origin(head), Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(registry.names(), vec!["head".to_string(), "torso".to_string()]);
    }

    #[test]
    fn parent_cycle_terminates() {
        let registry = JointRegistry::from_description(&[
            desc("a", Some("b"), [1.0, 0.0, 0.0], None),
            desc("b", Some("a"), [1.0, 0.0, 0.0], None),
        ]);
        let a = registry.handle("a").unwrap();
        assert_eq!(registry.world_origin(a), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn clone_is_independent() {
        let original = JointRegistry::from_description(&[desc("neck", None, [0.0; 3], None)]);
        let mut copy = original.clone();
        copy.set_joint_value("neck", 1.0);
        assert_eq!(original.get_joint_value("neck"), Some(0.0));
        assert_eq!(copy.get_joint_value("neck"), Some(1.0));
    }
}
