use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Camera timings, all in seconds
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// between load completion and the start of the intro move
    pub intro_delay: f32,
    pub intro_duration: f32,
    /// quiet time before the camera returns to the default view
    pub inactivity_window: f32,
    pub reset_duration: f32,
}
impl Default for TimingConfig {
    fn default() -> Self {
        Self { intro_delay: 0.0, intro_duration: 2.5, inactivity_window: 5.0, reset_duration: 1.0 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FitConfig {
    /// added to the bounds center so the camera frames roughly at eye height
    pub eye_height_offset: f32,
    pub min_radius: f32,
    /// intro start distance, in radii
    pub near_factor: f32,
    /// intro end and default distance, in radii
    pub far_factor: f32,
    /// direction from the model toward the camera
    pub view_axis: [f32; 3],
}
impl Default for FitConfig {
    fn default() -> Self {
        Self { eye_height_offset: 0.2, min_radius: 0.5, near_factor: 0.9, far_factor: 1.8, view_axis: [0.35, 0.25, 1.0] }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadTrackingMode {
    Off,
    /// follows the pointer whenever interaction is enabled
    Always,
    /// follows the pointer only while the camera is in interactive follow
    Gated,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HeadTrackingConfig {
    pub mode: HeadTrackingMode,
    pub pan_joint: String,
    pub tilt_joint: String,
    /// radians at the viewport edge
    pub max_pan: f32,
    pub max_tilt: f32,
    pub always_on_smoothing: f32,
    pub gated_smoothing: f32,
}
impl Default for HeadTrackingConfig {
    fn default() -> Self {
        Self {
            mode: HeadTrackingMode::Gated,
            pan_joint: "head_pan_joint".into(),
            tilt_joint: "head_tilt_joint".into(),
            max_pan: 0.6,
            max_tilt: 0.3,
            always_on_smoothing: 0.1,
            gated_smoothing: 0.05,
        }
    }
}
impl HeadTrackingConfig {
    pub fn smoothing(&self) -> f32 {
        match self.mode {
            HeadTrackingMode::Always => self.always_on_smoothing,
            HeadTrackingMode::Gated | HeadTrackingMode::Off => self.gated_smoothing,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OrbitConfig {
    /// drag pixels per degree
    pub sensitivity: f32,
    /// distance per wheel line
    pub zoom_speed: f32,
    pub min_distance: f32,
}
impl Default for OrbitConfig {
    fn default() -> Self {
        Self { sensitivity: 5.0, zoom_speed: 0.25, min_distance: 0.3 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub asset_id: String,
    /// gates pointer effects, orbit input and the inactivity reset
    pub enable_interaction: bool,
    /// played once after load, `on_wave_complete` fires when it ends
    pub greeting_clip: Option<String>,
    /// looped after the greeting
    pub idle_clip: Option<String>,
    pub timing: TimingConfig,
    pub fit: FitConfig,
    pub head: HeadTrackingConfig,
    pub orbit: OrbitConfig,
}
impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_id: "robot/robot.json".into(),
            enable_interaction: true,
            greeting_clip: Some("wave".into()),
            idle_clip: Some("idle".into()),
            timing: TimingConfig::default(),
            fit: FitConfig::default(),
            head: HeadTrackingConfig::default(),
            orbit: OrbitConfig::default(),
        }
    }
}
impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io { path: display.clone(), source })?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| ConfigError::Parse { path: display, source })
    }
}
