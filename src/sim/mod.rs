pub mod animator;
pub mod camera;
pub mod input;
pub mod joints;
pub mod pointer;
pub mod scene_fit;
pub mod timers;
