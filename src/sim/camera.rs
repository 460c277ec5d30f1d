use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render_snapshot::CameraSnapshot;

fn look_at_rotation(eye: Vec3, target: Vec3, world_up: Vec3) -> Quat {
    let Some(forward) = (target - eye).try_normalize() else {
        return Quat::IDENTITY;
    };
    let up = (world_up - forward * world_up.dot(forward)).try_normalize().unwrap_or(Vec3::Z);
    let right = forward.cross(up);

    // Camera looks down -Z
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward))
}

/// Camera position plus the point it looks at
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}
impl Default for CameraPose {
    fn default() -> Self {
        Self { position: Vec3::new(0.0, 0.0, 5.0), target: Vec3::ZERO }
    }
}
impl CameraPose {
    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose { position: self.position.lerp(other.position, t), target: self.target.lerp(other.target, t) }
    }
}

/// Symmetric quadratic ease-in-out on [0, 1]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub start: f32,
    pub duration: f32,
    pub from: CameraPose,
    pub to: CameraPose,
}
impl Transition {
    /// Eased pose at `now`, and whether the transition is over. The final pose is `to` exactly.
    pub fn pose_at(&self, now: f32) -> (CameraPose, bool) {
        let t = if self.duration <= f32::EPSILON { 1.0 } else { (now - self.start) / self.duration };
        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from.lerp(&self.to, ease_in_out(t)), false)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChoreoState {
    Idle,
    IntroActive(Transition),
    /// Pointer output drives the head, the camera belongs to user input
    InteractiveFollow,
    ResettingToDefault(Transition),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoreoEvent {
    IntroFinished,
    ResetFinished,
}

/// Camera state machine: intro pan, idle hold, interactive follow, return to default.
///
/// At most one timed transition exists at a time since both live inside the single state.
#[derive(Debug)]
pub struct Choreographer {
    state: ChoreoState,
    default_pose: Option<CameraPose>,
    intro_played: bool,
}
impl Default for Choreographer {
    fn default() -> Self {
        Self { state: ChoreoState::Idle, default_pose: None, intro_played: false }
    }
}
impl Choreographer {
    pub fn state(&self) -> &ChoreoState {
        &self.state
    }

    pub fn default_pose(&self) -> Option<CameraPose> {
        self.default_pose
    }

    pub fn set_default_pose(&mut self, pose: CameraPose) {
        self.default_pose = Some(pose);
    }

    pub fn in_transition(&self) -> bool {
        matches!(self.state, ChoreoState::IntroActive(_) | ChoreoState::ResettingToDefault(_))
    }

    pub fn is_following(&self) -> bool {
        self.state == ChoreoState::InteractiveFollow
    }

    pub fn intro_played(&self) -> bool {
        self.intro_played
    }

    /// Starts the intro. Only once per choreographer, and never over a running transition.
    /// A pointer already following is overridden.
    pub fn begin_intro(&mut self, now: f32, from: CameraPose, to: CameraPose, duration: f32) -> bool {
        if self.intro_played || self.in_transition() {
            return false;
        }
        debug!(now, duration, "intro started");
        self.intro_played = true;
        self.state = ChoreoState::IntroActive(Transition { start: now, duration, from, to });
        true
    }

    /// Starts the smooth return to the default pose from wherever the camera is now.
    /// Replaces any other state, including a running intro.
    pub fn begin_reset(&mut self, now: f32, current: CameraPose, duration: f32) -> bool {
        let Some(to) = self.default_pose else {
            return false;
        };
        debug!(now, duration, "reset to default started");
        self.state = ChoreoState::ResettingToDefault(Transition { start: now, duration, from: current, to });
        true
    }

    /// Renewed user activity stops an in-flight reset where it is
    pub fn cancel_reset(&mut self) -> bool {
        if matches!(self.state, ChoreoState::ResettingToDefault(_)) {
            debug!("reset cancelled by activity");
            self.state = ChoreoState::Idle;
            true
        } else {
            false
        }
    }

    /// Idle <-> InteractiveFollow. Timed transitions are left alone.
    pub fn set_follow(&mut self, eligible: bool) {
        self.state = match (self.state, eligible) {
            (ChoreoState::Idle, true) => ChoreoState::InteractiveFollow,
            (ChoreoState::InteractiveFollow, false) => ChoreoState::Idle,
            (state, _) => state,
        };
    }

    /// Advances a running transition and writes the camera pose
    pub fn step(&mut self, now: f32, pose: &mut CameraPose) -> Option<ChoreoEvent> {
        let (transition, event) = match &self.state {
            ChoreoState::IntroActive(transition) => (*transition, ChoreoEvent::IntroFinished),
            ChoreoState::ResettingToDefault(transition) => (*transition, ChoreoEvent::ResetFinished),
            ChoreoState::Idle | ChoreoState::InteractiveFollow => return None,
        };
        let (next, done) = transition.pose_at(now);
        *pose = next;
        if done {
            debug!(?event, "camera transition finished");
            self.state = ChoreoState::Idle;
            Some(event)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub pose: CameraPose,
    pub up: Vec3,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}
impl Default for Camera {
    fn default() -> Self {
        Self { pose: CameraPose::default(), up: Vec3::Y, fovy: 45.0, znear: 0.05, zfar: 200.0 }
    }
}
impl Camera {
    pub fn build_snapshot(&self) -> CameraSnapshot {
        CameraSnapshot {
            position: self.pose.position,
            target: self.pose.target,
            rotation: look_at_rotation(self.pose.position, self.pose.target, self.up),
            fovy: self.fovy,
            znear: self.znear,
            zfar: self.zfar,
        }
    }

    /// Orbits the position around the target. Deltas are in degrees, pitch stops short of the poles.
    pub fn orbit(&mut self, yaw_deg: f32, pitch_deg: f32) {
        let offset = self.pose.position - self.pose.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let current_pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let limit = 85f32.to_radians();
        let pitch = (current_pitch + pitch_deg.to_radians()).clamp(-limit, limit) - current_pitch;

        let yawed = Quat::from_axis_angle(self.up, yaw_deg.to_radians()) * offset;
        let right = self.up.cross(yawed).try_normalize().unwrap_or(Vec3::X);
        let rotated = Quat::from_axis_angle(right, -pitch) * yawed;
        self.pose.position = self.pose.target + rotated;
    }

    /// Moves along the view direction, positive delta moves closer
    pub fn dolly(&mut self, delta: f32, min_distance: f32) {
        let offset = self.pose.position - self.pose.target;
        let distance = offset.length();
        let Some(direction) = offset.try_normalize() else {
            return;
        };
        let next = (distance - delta).max(min_distance);
        self.pose.position = self.pose.target + direction * next;
    }
}
