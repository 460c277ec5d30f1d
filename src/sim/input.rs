use std::sync::Arc;

use crossbeam_queue::SegQueue;

/// Host input, pushed from the page shell and drained by the viewer once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// pixels from the top-left of a `width` x `height` viewport
    PointerMove { x: f32, y: f32, width: f32, height: f32 },
    PointerLeave,
    /// window lost focus
    Blur,
    /// wheel lines, positive zooms in
    Wheel { delta: f32 },
    /// pointer drag with the orbit button held, in pixels
    Drag { dx: f32, dy: f32 },
    Touch,
}
impl InputEvent {
    /// Counts as user activity for the inactivity timer
    pub fn is_activity(&self) -> bool {
        !matches!(self, InputEvent::PointerLeave | InputEvent::Blur)
    }
}

pub type InputQueue = Arc<SegQueue<InputEvent>>;

pub fn input_queue() -> InputQueue {
    Arc::new(SegQueue::new())
}
