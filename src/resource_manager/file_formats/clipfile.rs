use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Keyframe {
    pub time: f32,
    pub joints: HashMap<String, f32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Clip {
    pub name: String,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    pub frames: Vec<Keyframe>,
}

/// Clip library file, a flat list of named clips
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClipLibrary {
    pub clips: Vec<Clip>,
}
