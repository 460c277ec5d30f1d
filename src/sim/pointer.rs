use glam::Vec2;

use super::joints::JointRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct PointerTarget {
    pub x: f32,
    pub y: f32,
    pub active: bool,
}
impl PointerTarget {
    /// What consumers should aim for, inactive reads as the center
    pub fn effective(&self) -> Vec2 {
        if self.active {
            Vec2::new(self.x, self.y).clamp(Vec2::NEG_ONE, Vec2::ONE)
        } else {
            Vec2::ZERO
        }
    }
}

/// Latest pointer position in viewport-normalized coordinates, +y up
#[derive(Default, Debug)]
pub struct PointerTracker {
    target: PointerTarget,
}
impl PointerTracker {
    pub fn target(&self) -> PointerTarget {
        self.target
    }

    /// `x`/`y` are in pixels from the top-left corner of a `width` x `height` viewport
    pub fn pointer_move(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let nx = (x / width) * 2.0 - 1.0;
        let ny = -((y / height) * 2.0 - 1.0);
        self.target = PointerTarget { x: nx.clamp(-1.0, 1.0), y: ny.clamp(-1.0, 1.0), active: true };
    }

    /// Pointer left the viewport or the window lost focus
    pub fn reset(&mut self) {
        self.target = PointerTarget::default();
    }
}

/// Drives the pan/tilt joints toward the pointer with exponential smoothing
#[derive(Debug)]
pub struct HeadDriver {
    pub pan_joint: String,
    pub tilt_joint: String,
    /// radians at x = 1
    pub max_pan: f32,
    /// radians at y = 1
    pub max_tilt: f32,
    /// fraction of the remaining distance covered per tick, in (0, 1]
    pub smoothing: f32,
    current: Vec2,
}
impl HeadDriver {
    pub fn new(pan_joint: impl Into<String>, tilt_joint: impl Into<String>, max_pan: f32, max_tilt: f32, smoothing: f32) -> Self {
        Self {
            pan_joint: pan_joint.into(),
            tilt_joint: tilt_joint.into(),
            max_pan,
            max_tilt,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
            current: Vec2::ZERO,
        }
    }

    /// Current smoothed (pan, tilt) in radians
    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn target_angles(&self, target: Vec2) -> Vec2 {
        Vec2::new(target.x * self.max_pan, target.y * self.max_tilt)
    }

    /// One smoothing step toward `target` (normalized), written to the joints.
    /// Missing joints are skipped.
    pub fn tick(&mut self, target: Vec2, joints: &mut JointRegistry) {
        let goal = self.target_angles(target.clamp(Vec2::NEG_ONE, Vec2::ONE));
        self.current = self.current.lerp(goal, self.smoothing);
        joints.set_joint_value(&self.pan_joint, self.current.x);
        joints.set_joint_value(&self.tilt_joint, self.current.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource_manager::file_formats::modelfile;

    fn head_joints() -> JointRegistry {
        let joint = |name: &str| modelfile::Joint { name: name.into(), parent: None, origin: [0.0; 3], axis: [0.0, 0.0, 1.0], limit: None };
        JointRegistry::from_description(&[joint("head_pan"), joint("head_tilt")])
    }

    #[test]
    fn normalizes_viewport_coordinates() {
        let mut tracker = PointerTracker::default();
        tracker.pointer_move(0.0, 0.0, 800.0, 600.0);
        assert_eq!(tracker.target(), PointerTarget { x: -1.0, y: 1.0, active: true });
        tracker.pointer_move(400.0, 300.0, 800.0, 600.0);
        assert_eq!(tracker.target().effective(), Vec2::ZERO);
        tracker.pointer_move(1600.0, 900.0, 800.0, 600.0);
        assert_eq!(tracker.target().effective(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn leave_resets_to_inactive_center() {
        let mut tracker = PointerTracker::default();
        tracker.pointer_move(700.0, 100.0, 800.0, 600.0);
        tracker.reset();
        assert!(!tracker.target().active);
        assert_eq!(tracker.target().effective(), Vec2::ZERO);
    }

    #[test]
    fn head_approaches_edge_without_overshoot() {
        let mut joints = head_joints();
        let mut head = HeadDriver::new("head_pan", "head_tilt", 0.6, 0.3, 0.08);
        let mut prev = Vec2::ZERO;
        for _ in 0..400 {
            head.tick(Vec2::ONE, &mut joints);
            let pan = joints.get_joint_value("head_pan").unwrap();
            let tilt = joints.get_joint_value("head_tilt").unwrap();
            assert!(pan >= prev.x && pan <= 0.6);
            assert!(tilt >= prev.y && tilt <= 0.3);
            prev = Vec2::new(pan, tilt);
        }
        assert!((prev.x - 0.6).abs() < 1e-3);
        assert!((prev.y - 0.3).abs() < 1e-3);
    }

    #[test]
    fn faster_smoothing_gets_closer_per_tick() {
        let mut joints = head_joints();
        let mut fast = HeadDriver::new("head_pan", "head_tilt", 0.6, 0.3, 0.15);
        let mut slow = HeadDriver::new("head_pan", "head_tilt", 0.6, 0.3, 0.05);
        for _ in 0..5 {
            fast.tick(Vec2::X, &mut joints);
            slow.tick(Vec2::X, &mut joints);
        }
        assert!(fast.current().x > slow.current().x);
    }

    #[test]
    fn missing_joints_are_ignored() {
        let mut joints = JointRegistry::default();
        let mut head = HeadDriver::new("head_pan", "head_tilt", 0.6, 0.3, 0.5);
        head.tick(Vec2::ONE, &mut joints);
        assert_eq!(head.current(), Vec2::new(0.3, 0.15));
    }
}
