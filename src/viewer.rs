use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::{
    config::{HeadTrackingMode, ViewerConfig},
    render_snapshot::{RenderSnapshot, SnapshotHandoff},
    resource_manager::{
        model::ModelTemplate,
        registry::{LoadState, LoadStatus, ModelCache, ModelId, SharedModelCache},
    },
    scene_tree::{Scene, SceneNodeId},
    sim::{
        animator::{ClipLibrary, Playback},
        camera::{Camera, CameraPose, ChoreoState, Choreographer},
        input::{input_queue, InputEvent, InputQueue},
        pointer::{HeadDriver, PointerTracker},
        scene_fit::{compute_bounds, intro_poses, SceneBounds},
        timers::{TimerKind, Timers},
    },
};

/// Host page callbacks. Every method defaults to doing nothing.
pub trait ViewerEvents {
    /// Load progress and every asset failure, reported whenever the status changes
    fn on_status(&mut self, _status: &LoadStatus) {}
    fn on_loaded(&mut self) {}
    fn on_ready(&mut self, _joint_names: &[String]) {}
    /// Fired once, when the greeting clip has had time to finish
    fn on_wave_complete(&mut self) {}
}

pub struct NoEvents;
impl ViewerEvents for NoEvents {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading(ModelId),
    Ready(SceneNodeId),
    /// no model, controls stay inert
    Failed,
    Disposed,
}

/// One mounted viewer: owns its instance's playback, camera, pointer and timer state.
///
/// Everything happens inside `tick`, driven by the clock value the host passes in:
/// cache responses, input, due timers, clip playback, head tracking, camera, snapshot.
pub struct Viewer {
    config: ViewerConfig,
    cache: SharedModelCache,
    clips: ClipLibrary,
    events: Box<dyn ViewerEvents>,
    inputs: InputQueue,
    handoff: Arc<SnapshotHandoff>,
    phase: Phase,
    camera: Camera,
    choreo: Choreographer,
    playback: Playback,
    pointer: PointerTracker,
    head: Option<HeadDriver>,
    timers: Timers,
    bounds: Option<SceneBounds>,
    intro: Option<(CameraPose, CameraPose)>,
    /// intro delay expired while a reset was running
    intro_pending: bool,
    last_status: Option<LoadStatus>,
    frame_index: u32,
}

impl Viewer {
    pub fn mount(config: ViewerConfig, cache: SharedModelCache, clips: ClipLibrary, events: Box<dyn ViewerEvents>) -> Self {
        let model = cache.borrow_mut().request(&config.asset_id);
        info!(asset = %config.asset_id, interaction = config.enable_interaction, "viewer mounted");
        let head = (config.head.mode != HeadTrackingMode::Off).then(|| {
            HeadDriver::new(
                config.head.pan_joint.clone(),
                config.head.tilt_joint.clone(),
                config.head.max_pan,
                config.head.max_tilt,
                config.head.smoothing(),
            )
        });
        let camera = Camera::default();
        Self {
            config,
            cache,
            clips,
            events,
            inputs: input_queue(),
            handoff: Arc::new(SnapshotHandoff::new(RenderSnapshot::build(0, &camera, None))),
            phase: Phase::Loading(model),
            camera,
            choreo: Choreographer::default(),
            playback: Playback::default(),
            pointer: PointerTracker::default(),
            head,
            timers: Timers::default(),
            bounds: None,
            intro: None,
            intro_pending: false,
            last_status: None,
            frame_index: 0,
        }
    }

    /// Queue the host pushes input events onto
    pub fn inputs(&self) -> InputQueue {
        self.inputs.clone()
    }

    pub fn snapshots(&self) -> Arc<SnapshotHandoff> {
        self.handoff.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose
    }

    pub fn default_pose(&self) -> Option<CameraPose> {
        self.choreo.default_pose()
    }

    pub fn choreography(&self) -> &ChoreoState {
        self.choreo.state()
    }

    pub fn bounds(&self) -> Option<SceneBounds> {
        self.bounds
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn status(&self) -> LoadStatus {
        self.last_status.clone().unwrap_or_default()
    }

    /// Clears every pending timer, stops playback and removes the instance from the scene.
    /// Later ticks do nothing.
    pub fn unmount(&mut self, scene: &mut Scene) {
        if self.phase == Phase::Disposed {
            return;
        }
        self.timers.cancel_all();
        self.playback.stop();
        self.pointer.reset();
        if let Phase::Ready(node) = self.phase {
            scene.remove(node);
        }
        self.phase = Phase::Disposed;
        info!(asset = %self.config.asset_id, "viewer unmounted");
    }

    pub fn tick(&mut self, scene: &mut Scene, now: f32) {
        if self.phase == Phase::Disposed {
            return;
        }

        self.poll_model(scene, now);

        let Phase::Ready(node) = self.phase else {
            // nothing to drive yet, drop input instead of letting it pile up
            while self.inputs.pop().is_some() {}
            self.publish(RenderSnapshot::build(self.frame_index, &self.camera, None));
            return;
        };

        while let Some(event) = self.inputs.pop() {
            self.handle_input(event, now);
        }

        for timer in self.timers.drain_due(now) {
            self.fire(timer, now);
        }

        let interactive = self.config.enable_interaction;
        self.choreo.set_follow(interactive && self.pointer.target().active);

        let Some(instance) = scene.get_mut(node) else {
            warn!("viewer node missing from scene");
            return;
        };
        self.playback.tick(now, &mut instance.joints);

        if let Some(head) = &mut self.head {
            let eligible = interactive
                && match self.config.head.mode {
                    HeadTrackingMode::Always => true,
                    HeadTrackingMode::Gated => self.choreo.is_following(),
                    HeadTrackingMode::Off => false,
                };
            let target = if eligible { self.pointer.target().effective() } else { Vec2::ZERO };
            head.tick(target, &mut instance.joints);
        }

        self.choreo.step(now, &mut self.camera.pose);
        if self.intro_pending && !self.choreo.in_transition() && self.start_intro(now) {
            self.choreo.step(now, &mut self.camera.pose);
        }

        self.publish(RenderSnapshot::build(self.frame_index, &self.camera, scene.get(node)));
    }

    fn publish(&mut self, snapshot: RenderSnapshot) {
        self.handoff.publish(snapshot);
        self.frame_index = self.frame_index.wrapping_add(1);
    }

    fn report_status(&mut self, status: LoadStatus) {
        if self.last_status.as_ref() != Some(&status) {
            self.events.on_status(&status);
            self.last_status = Some(status);
        }
    }

    fn poll_model(&mut self, scene: &mut Scene, now: f32) {
        let Phase::Loading(model) = self.phase else {
            return;
        };
        let (state, status) = {
            let mut cache = self.cache.borrow_mut();
            cache.process_responses();
            (cache.state(model).cloned(), cache.status(model))
        };
        self.report_status(status);
        match state {
            Some(LoadState::Ready(template)) => self.on_model_ready(scene, &template, now),
            Some(LoadState::Loading) => (),
            Some(LoadState::Failed(_)) | None => {
                warn!(asset = %self.config.asset_id, "no model, viewer stays inert");
                self.phase = Phase::Failed;
            }
        }
    }

    fn on_model_ready(&mut self, scene: &mut Scene, template: &ModelTemplate, now: f32) {
        let instance = ModelCache::instantiate(template);
        let joint_names = instance.joint_names();

        // framing has to exist before the intro reads it
        let bounds = compute_bounds(&instance, &self.config.fit);
        let (close, far) = intro_poses(&bounds, &self.config.fit);
        self.bounds = Some(bounds);
        self.intro = Some((close, far));
        self.choreo.set_default_pose(far);
        self.camera.pose = close;

        self.phase = Phase::Ready(scene.insert(instance));
        info!(asset = %self.config.asset_id, joints = joint_names.len(), radius = bounds.radius, "viewer ready");
        self.events.on_loaded();
        self.events.on_ready(&joint_names);

        self.timers.arm(TimerKind::IntroDelay, now + self.config.timing.intro_delay.max(0.0));

        let greeting = self.config.greeting_clip.as_deref().and_then(|name| {
            let clip = self.clips.get(name);
            if clip.is_none() {
                warn!(clip = name, "greeting clip not in library");
            }
            clip
        });
        match greeting {
            Some(clip) => {
                self.timers.arm(TimerKind::GreetingComplete, now + clip.duration());
                self.playback.play(clip, now);
            }
            None => self.play_idle(now),
        }
    }

    fn play_idle(&mut self, now: f32) {
        if let Some(clip) = self.config.idle_clip.as_deref().and_then(|name| self.clips.get(name)) {
            self.playback.play(clip, now);
        }
    }

    fn start_intro(&mut self, now: f32) -> bool {
        let Some((close, far)) = self.intro else {
            return false;
        };
        let started = self.choreo.begin_intro(now, close, far, self.config.timing.intro_duration);
        if started {
            self.intro_pending = false;
        }
        started
    }

    fn fire(&mut self, timer: TimerKind, now: f32) {
        debug!(?timer, now, "timer fired");
        match timer {
            TimerKind::IntroDelay => {
                if !self.start_intro(now) && !self.choreo.intro_played() {
                    debug!("reset in progress, intro waits for it");
                    self.intro_pending = true;
                }
            }
            TimerKind::InactivityReset => {
                info!("inactive, returning camera to default view");
                self.choreo.begin_reset(now, self.camera.pose, self.config.timing.reset_duration);
            }
            TimerKind::GreetingComplete => {
                self.events.on_wave_complete();
                self.play_idle(now);
            }
        }
    }

    fn handle_input(&mut self, event: InputEvent, now: f32) {
        match event {
            InputEvent::PointerMove { x, y, width, height } => self.pointer.pointer_move(x, y, width, height),
            InputEvent::PointerLeave | InputEvent::Blur => self.pointer.reset(),
            _ => (),
        }
        if !self.config.enable_interaction {
            return;
        }
        if event.is_activity() {
            self.choreo.cancel_reset();
            self.timers.arm(TimerKind::InactivityReset, now + self.config.timing.inactivity_window);
        }
        if self.choreo.in_transition() {
            return;
        }
        match event {
            InputEvent::Wheel { delta } => {
                let orbit = &self.config.orbit;
                self.camera.dolly(delta * orbit.zoom_speed, orbit.min_distance);
            }
            InputEvent::Drag { dx, dy } => {
                let sensitivity = self.config.orbit.sensitivity.max(f32::EPSILON);
                self.camera.orbit(-dx / sensitivity, -dy / sensitivity);
            }
            _ => (),
        }
    }
}
