use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use generational_arena::Index;
use glam::Vec3;
use tracing::{debug, warn};

use super::{
    file_formats::modelfile,
    model::{ModelTemplate, Visual},
};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
    #[error("asset {0} not found")]
    NotFound(String),
    #[error("loading {asset_id} failed: {message}")]
    Failed { asset_id: String, message: String },
    #[error("asset loader shut down")]
    Disconnected,
    #[error("timed out waiting for {0}")]
    Timeout(String),
}

/// Where model descriptions and their mesh sub-resources come from
pub trait AssetSource: Send + Sync {
    fn fetch_description(&self, asset_id: &str) -> Result<modelfile::Model, AssetError>;
    fn fetch_mesh(&self, asset_id: &str, mesh: &str) -> Result<modelfile::Mesh, AssetError>;
}

fn load_json<T>(path: &Path) -> Result<T, AssetError>
where
    T: serde::de::DeserializeOwned,
{
    let display = path.display().to_string();
    let json_file = std::fs::File::open(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => AssetError::NotFound(display.clone()),
        _ => AssetError::Io { path: display.clone(), source },
    })?;
    let json_reader = std::io::BufReader::new(json_file);
    serde_json::from_reader(json_reader).map_err(|source| AssetError::Parse { path: display, source })
}

/// Reads JSON assets from disk. Mesh paths resolve against `mesh_base`, or the description's
/// own directory when unset.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    pub base_path: PathBuf,
    pub mesh_base: Option<PathBuf>,
}
impl FsAssetSource {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into(), mesh_base: None }
    }

    pub fn with_mesh_base(mut self, mesh_base: impl Into<PathBuf>) -> Self {
        self.mesh_base = Some(mesh_base.into());
        self
    }

    fn mesh_path(&self, asset_id: &str, mesh: &str) -> PathBuf {
        match &self.mesh_base {
            Some(base) => base.join(mesh),
            None => {
                let description = self.base_path.join(asset_id);
                description.parent().map_or_else(|| PathBuf::from(mesh), |dir| dir.join(mesh))
            }
        }
    }
}
impl AssetSource for FsAssetSource {
    fn fetch_description(&self, asset_id: &str) -> Result<modelfile::Model, AssetError> {
        load_json(&self.base_path.join(asset_id))
    }

    fn fetch_mesh(&self, asset_id: &str, mesh: &str) -> Result<modelfile::Mesh, AssetError> {
        load_json(&self.mesh_path(asset_id, mesh))
    }
}

/// Fetches and assembles a template. A mesh that fails is left out and recorded on the template,
/// only a failed description fails the whole load.
pub fn load_template(source: &dyn AssetSource, asset_id: &str) -> Result<ModelTemplate, AssetError> {
    let description = source.fetch_description(asset_id)?;
    let mut visuals = Vec::with_capacity(description.visuals.len());
    let mut errors = vec![];
    for visual in &description.visuals {
        match source.fetch_mesh(asset_id, &visual.mesh) {
            Ok(mesh) => visuals.push(Visual {
                joint: visual.joint.clone(),
                offset: Vec3::from(visual.offset),
                positions: mesh.positions.into_iter().map(Vec3::from).collect(),
            }),
            Err(e) => {
                warn!(asset = asset_id, mesh = %visual.mesh, error = %e, "sub-resource failed");
                errors.push(e.to_string());
            }
        }
    }
    Ok(ModelTemplate::from_description(asset_id, &description, visuals, errors))
}

pub enum IoRequest {
    LoadModel { id: Index, asset_id: String },
}

pub enum IoResponse {
    ModelLoaded { id: Index, template: ModelTemplate },
    Error { id: Index, asset_id: String, message: String },
}

fn io_worker_loop(
    source: Arc<dyn AssetSource>,
    rx: crossbeam::channel::Receiver<IoRequest>,
    tx: crossbeam::channel::Sender<IoResponse>,
) {
    while let Ok(req) = rx.recv() {
        let result = match req {
            IoRequest::LoadModel { id, asset_id } => {
                debug!(asset = %asset_id, "fetching model");
                load_template(source.as_ref(), &asset_id).map_or_else(
                    |e| IoResponse::Error { id, asset_id: asset_id.clone(), message: e.to_string() },
                    |template| IoResponse::ModelLoaded { id, template },
                )
            }
        };

        // ignore send errors on shutdown
        let _ = tx.send(result);
    }
}

/// Worker threads performing asset fetches off the frame thread
pub struct IoManager {
    pub req_tx: crossbeam::channel::Sender<IoRequest>,
    pub res_rx: crossbeam::channel::Receiver<IoResponse>,
    _workers: Vec<std::thread::JoinHandle<()>>,
}
impl IoManager {
    pub fn new(source: Arc<dyn AssetSource>, worker_count: usize) -> Self {
        let (req_tx, req_rx) = crossbeam::channel::unbounded();
        let (res_tx, res_rx) = crossbeam::channel::unbounded();

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let source = source.clone();
                let rx = req_rx.clone();
                let tx = res_tx.clone();
                std::thread::spawn(move || {
                    io_worker_loop(source, rx, tx);
                })
            })
            .collect();

        Self { req_tx, res_rx, _workers: workers }
    }
}
