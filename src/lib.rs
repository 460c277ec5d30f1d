pub mod config;
pub mod render_snapshot;
pub mod resource_manager;
pub mod scene_tree;
pub mod sim;
pub mod viewer;

pub use config::ViewerConfig;
pub use resource_manager::{
    io_manager::{AssetError, AssetSource, FsAssetSource},
    registry::{LoadStatus, ModelCache, SharedModelCache},
};
pub use scene_tree::Scene;
pub use sim::{animator::ClipLibrary, input::InputEvent};
pub use viewer::{Viewer, ViewerEvents};
