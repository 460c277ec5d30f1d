use std::{
    env,
    path::PathBuf,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use rigstage::{
    resource_manager::registry::LoadStatus, ClipLibrary, FsAssetSource, InputEvent, ModelCache, Scene, Viewer,
    ViewerConfig, ViewerEvents,
};
use tracing::{info, warn};

const TICK: f32 = 1.0 / 60.0;
const RUN_SECONDS: f32 = 14.0;
const VIEWPORT: (f32, f32) = (800.0, 600.0);

/// Logs host callbacks the way the page shell would surface them
struct LogEvents {
    label: &'static str,
}
impl ViewerEvents for LogEvents {
    fn on_status(&mut self, status: &LoadStatus) {
        match &status.error {
            Some(error) => warn!(viewer = self.label, %error, "status"),
            None => info!(viewer = self.label, loading = status.loading, "status"),
        }
    }

    fn on_ready(&mut self, joint_names: &[String]) {
        info!(viewer = self.label, joints = ?joint_names, "ready");
    }

    fn on_wave_complete(&mut self) {
        info!(viewer = self.label, "wave complete");
    }
}

/// Scripted input: a pointer sweep, a drag and a zoom, then nothing so the inactivity reset runs
fn scripted_input(t: f32) -> Option<InputEvent> {
    let (width, height) = VIEWPORT;
    match t {
        t if (3.0..5.0).contains(&t) => {
            let phase = (t - 3.0) / 2.0;
            Some(InputEvent::PointerMove { x: width * phase, y: height * (0.5 - 0.3 * phase), width, height })
        }
        t if (5.0..5.0 + TICK).contains(&t) => Some(InputEvent::PointerLeave),
        t if (5.5..6.0).contains(&t) => Some(InputEvent::Drag { dx: 4.0, dy: 1.0 }),
        t if (6.0..6.0 + TICK).contains(&t) => Some(InputEvent::Wheel { delta: 2.0 }),
        _ => None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => ViewerConfig::load(path).with_context(|| format!("loading viewer config {path}"))?,
        None => ViewerConfig::default(),
    };
    let assets = PathBuf::from(args.get(2).map_or("assets", String::as_str));

    let clip_path = assets.join("robot/clips.json");
    let clips = ClipLibrary::load(&clip_path).with_context(|| format!("loading clips from {}", clip_path.display()))?;

    let cache = ModelCache::shared(Arc::new(FsAssetSource::new(&assets)));
    let mut scene = Scene::default();

    // two viewers on one page share the cached model
    let mut viewers = vec![
        Viewer::mount(config.clone(), cache.clone(), clips.clone(), Box::new(LogEvents { label: "hero" })),
        Viewer::mount(
            ViewerConfig { enable_interaction: false, ..config },
            cache.clone(),
            clips,
            Box::new(LogEvents { label: "badge" }),
        ),
    ];
    let hero_input = viewers[0].inputs();
    let hero_snapshots = viewers[0].snapshots();

    let mut now = 0.0f32;
    let mut last_report = -1.0f32;
    while now < RUN_SECONDS {
        if let Some(event) = scripted_input(now) {
            hero_input.push(event);
        }
        for viewer in &mut viewers {
            viewer.tick(&mut scene, now);
        }

        if now - last_report >= 1.0 {
            last_report = now;
            let frames = hero_snapshots.frames();
            let snapshot = &frames.current;
            info!(
                t = now,
                frame = snapshot.frame_index,
                blend = frames.blend_factor(Instant::now()),
                camera = ?snapshot.camera.position,
                state = ?viewers[0].choreography(),
                head_pan = ?snapshot.joint("head_pan_joint"),
                "frame"
            );
        }

        // loads finish on the IO threads, give them a moment before the first frames
        if !viewers.iter().all(Viewer::is_ready) {
            thread::sleep(Duration::from_millis(5));
        }
        now += TICK;
    }

    for viewer in &mut viewers {
        viewer.unmount(&mut scene);
    }
    info!(remaining = scene.len(), "done");
    Ok(())
}
