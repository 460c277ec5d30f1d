use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Limit {
    pub lower: f32,
    pub upper: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Joint {
    pub name: String,
    /// None = attached to the model root
    #[serde(default)]
    pub parent: Option<String>,
    /// Offset from the parent joint at rest
    #[serde(default)]
    pub origin: [f32; 3],
    #[serde(default = "default_axis")]
    pub axis: [f32; 3],
    #[serde(default)]
    pub limit: Option<Limit>,
}

fn default_axis() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Visual {
    /// Joint the geometry is attached to, None = model root
    #[serde(default)]
    pub joint: Option<String>,
    /// Mesh sub-resource, relative to the mesh base path
    pub mesh: String,
    #[serde(default)]
    pub offset: [f32; 3],
}

/// Model description file
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Model {
    pub name: String,
    pub joints: Vec<Joint>,
    #[serde(default)]
    pub visuals: Vec<Visual>,
}

/// Mesh sub-resource file. Only the positions matter to the engine, the renderer owns the rest.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
}
