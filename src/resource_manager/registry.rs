use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use generational_arena::{Arena, Index};
use tracing::{info, warn};

use super::{
    io_manager::{AssetError, AssetSource, IoManager, IoRequest, IoResponse},
    model::{ModelInstance, ModelTemplate},
};

const IO_WORKERS: usize = 2;

/// Non-owning reference to a cache entry
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ModelId(Index);

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<ModelTemplate>),
    Failed(String),
}

/// What the host sees on the status channel
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Entry {
    pub asset_id: String,
    pub state: LoadState,
    /// how many times the asset was requested, fetched only on the first
    pub requests: u32,
}

/// Process wide single-flight model cache.
///
/// The first `request` for an asset id sends one fetch to the IO workers; every later request,
/// whether the load is still in flight or done, gets the same entry. Results are immutable once
/// resolved so nothing is ever evicted.
pub struct ModelCache {
    entries: Arena<Entry>,
    by_asset: HashMap<String, Index>,
    io: IoManager,
}

pub type SharedModelCache = Rc<RefCell<ModelCache>>;

impl ModelCache {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self::with_workers(source, IO_WORKERS)
    }

    pub fn with_workers(source: Arc<dyn AssetSource>, workers: usize) -> Self {
        Self { entries: Arena::new(), by_asset: HashMap::new(), io: IoManager::new(source, workers) }
    }

    pub fn shared(source: Arc<dyn AssetSource>) -> SharedModelCache {
        Rc::new(RefCell::new(Self::new(source)))
    }

    pub fn request(&mut self, asset_id: &str) -> ModelId {
        if let Some(&idx) = self.by_asset.get(asset_id) {
            if let Some(entry) = self.entries.get_mut(idx) {
                entry.requests += 1;
            }
            return ModelId(idx);
        }

        let idx = self.entries.insert(Entry { asset_id: asset_id.to_string(), state: LoadState::Loading, requests: 1 });
        self.by_asset.insert(asset_id.to_string(), idx);
        info!(asset = asset_id, "model load requested");

        if self.io.req_tx.send(IoRequest::LoadModel { id: idx, asset_id: asset_id.to_string() }).is_err() {
            warn!(asset = asset_id, "asset loader is gone");
            if let Some(entry) = self.entries.get_mut(idx) {
                entry.state = LoadState::Failed(AssetError::Disconnected.to_string());
            }
        }
        ModelId(idx)
    }

    pub fn entry(&self, id: ModelId) -> Option<&Entry> {
        self.entries.get(id.0)
    }

    pub fn state(&self, id: ModelId) -> Option<&LoadState> {
        self.entry(id).map(|entry| &entry.state)
    }

    /// None while loading or after a failure
    pub fn template(&self, id: ModelId) -> Option<Arc<ModelTemplate>> {
        match self.state(id) {
            Some(LoadState::Ready(template)) => Some(template.clone()),
            _ => None,
        }
    }

    pub fn status(&self, id: ModelId) -> LoadStatus {
        match self.state(id) {
            Some(LoadState::Loading) => LoadStatus { loading: true, error: None },
            Some(LoadState::Ready(template)) if !template.sub_resource_errors.is_empty() => {
                LoadStatus { loading: false, error: Some(template.sub_resource_errors.join("; ")) }
            }
            Some(LoadState::Ready(_)) => LoadStatus::default(),
            Some(LoadState::Failed(message)) => LoadStatus { loading: false, error: Some(message.clone()) },
            None => LoadStatus { loading: false, error: Some("unknown model".into()) },
        }
    }

    pub fn in_flight(&self) -> usize {
        self.entries.iter().filter(|(_, entry)| matches!(entry.state, LoadState::Loading)).count()
    }

    pub fn instantiate(template: &ModelTemplate) -> ModelInstance {
        template.instantiate()
    }

    fn apply(&mut self, response: IoResponse) {
        match response {
            IoResponse::ModelLoaded { id, template } => {
                let Some(entry) = self.entries.get_mut(id) else {
                    return;
                };
                info!(asset = %entry.asset_id, joints = template.joints.len(), visuals = template.visuals.len(), "model loaded");
                entry.state = LoadState::Ready(Arc::new(template));
            }
            IoResponse::Error { id, asset_id, message } => {
                warn!(asset = %asset_id, error = %message, "model load failed");
                if let Some(entry) = self.entries.get_mut(id) {
                    entry.state = LoadState::Failed(message);
                }
            }
        }
    }

    /// Drains finished loads without blocking, returns how many were applied
    pub fn process_responses(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(response) = self.io.res_rx.try_recv() {
            self.apply(response);
            applied += 1;
        }
        applied
    }

    /// Blocks until the model is resolved or `timeout` passes
    pub fn wait_for(&mut self, id: ModelId, timeout: Duration) -> Result<Arc<ModelTemplate>, AssetError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_responses();
            match self.entry(id) {
                Some(Entry { state: LoadState::Ready(template), .. }) => return Ok(template.clone()),
                Some(Entry { state: LoadState::Failed(message), asset_id, .. }) => {
                    return Err(AssetError::Failed { asset_id: asset_id.clone(), message: message.clone() })
                }
                Some(Entry { state: LoadState::Loading, asset_id, .. }) => {
                    let asset_id = asset_id.clone();
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match self.io.res_rx.recv_timeout(remaining) {
                        Ok(response) => self.apply(response),
                        Err(crossbeam::channel::RecvTimeoutError::Timeout) => return Err(AssetError::Timeout(asset_id)),
                        Err(crossbeam::channel::RecvTimeoutError::Disconnected) => return Err(AssetError::Disconnected),
                    }
                }
                None => return Err(AssetError::NotFound(format!("{id:?}"))),
            }
        }
    }
}
