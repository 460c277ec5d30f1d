pub mod file_formats;
pub mod io_manager;
pub mod model;
pub mod registry;
