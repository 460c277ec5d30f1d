use std::{collections::HashMap, path::Path, sync::Arc};

use tracing::{debug, info};

use crate::resource_manager::file_formats::clipfile;

use super::joints::JointRegistry;

/// Segments shorter than this are treated as instantaneous
pub const TIME_EPSILON: f32 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("clip {0:?} has no keyframes")]
    Empty(String),
    #[error("clip {clip:?} keyframe {index} has an invalid time {time}")]
    InvalidTime { clip: String, index: usize, time: f32 },
    #[error("clip {clip:?} keyframe {index} goes back in time")]
    Unordered { clip: String, index: usize },
    #[error("failed to read clip library {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("failed to parse clip library {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    /// joint name => angle in radians, need not cover every joint
    pub joints: HashMap<String, f32>,
}

/// A validated clip: at least one keyframe, times non-negative and non-decreasing
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    name: String,
    looping: bool,
    frames: Vec<Keyframe>,
}
impl Clip {
    pub fn new(name: impl Into<String>, looping: bool, frames: Vec<Keyframe>) -> Result<Self, ClipError> {
        let name = name.into();
        if frames.is_empty() {
            return Err(ClipError::Empty(name));
        }
        let mut prev = 0.0f32;
        for (index, frame) in frames.iter().enumerate() {
            if !frame.time.is_finite() || frame.time < 0.0 {
                return Err(ClipError::InvalidTime { clip: name, index, time: frame.time });
            }
            if frame.time < prev {
                return Err(ClipError::Unordered { clip: name, index });
            }
            prev = frame.time;
        }
        Ok(Self { name, looping, frames })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn frames(&self) -> &[Keyframe] {
        &self.frames
    }

    pub fn duration(&self) -> f32 {
        self.frames.last().map_or(0.0, |frame| frame.time)
    }
}

impl TryFrom<clipfile::Clip> for Clip {
    type Error = ClipError;

    fn try_from(clip: clipfile::Clip) -> Result<Self, Self::Error> {
        let frames = clip.frames.into_iter().map(|frame| Keyframe { time: frame.time, joints: frame.joints }).collect();
        Clip::new(clip.name, clip.looping, frames)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipSample {
    pub joints: HashMap<String, f32>,
    /// Non-looping clip reached its end, the values are the last keyframe
    pub finished: bool,
}

fn bracket(frames: &[Keyframe], t: f32) -> (usize, usize) {
    let n = frames.len();
    if n <= 1 || t >= frames[n - 1].time {
        return (n.saturating_sub(1), n.saturating_sub(1)); // after last, clamp
    }
    if t <= frames[0].time {
        return (0, 0); // before first, clamp
    }
    // first frame strictly after t, an exact hit lands on the later of two equal times
    let i = frames.partition_point(|frame| frame.time <= t);
    (i - 1, i)
}

/// Joint angles of `clip` at `elapsed` seconds after it started.
///
/// Pure function of its inputs. A joint named in only one of the two bracketing keyframes
/// is interpolated against 0 rather than the last value it was given.
pub fn sample(clip: &Clip, elapsed: f32) -> ClipSample {
    let duration = clip.duration();
    let (t, finished) = if clip.looping {
        if duration <= TIME_EPSILON {
            (0.0, false)
        } else {
            (elapsed.rem_euclid(duration), false)
        }
    } else if elapsed >= duration {
        (duration, true)
    } else {
        (elapsed, false)
    };

    let (i0, i1) = bracket(&clip.frames, t);
    let (f1, f2) = (&clip.frames[i0], &clip.frames[i1]);
    let alpha = ((t - f1.time) / (f2.time - f1.time).max(TIME_EPSILON)).clamp(0.0, 1.0);

    let mut joints = HashMap::with_capacity(f1.joints.len().max(f2.joints.len()));
    for name in f1.joints.keys().chain(f2.joints.keys()) {
        if joints.contains_key(name) {
            continue;
        }
        let v0 = f1.joints.get(name).copied().unwrap_or(0.0);
        let v1 = f2.joints.get(name).copied().unwrap_or(0.0);
        let value = if alpha <= 0.0 { v0 } else if alpha >= 1.0 { v1 } else { v0 + (v1 - v0) * alpha };
        joints.insert(name.clone(), value);
    }

    ClipSample { joints, finished }
}

#[derive(Clone, Debug)]
struct ActivePlayback {
    clip: Arc<Clip>,
    /// seconds on the viewer clock
    start_time: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    Idle,
    Playing,
    /// Non-looping clip ended on this tick, nothing was written
    Finished(String),
}

/// Currently active clip and when it started. `play` preempts without blending.
#[derive(Default, Debug)]
pub struct Playback {
    active: Option<ActivePlayback>,
}
impl Playback {
    pub fn play(&mut self, clip: Arc<Clip>, now: f32) {
        debug!(clip = clip.name(), now, "play");
        self.active = Some(ActivePlayback { clip, start_time: now });
    }

    pub fn stop(&mut self) {
        self.active = None;
    }

    pub fn active_clip(&self) -> Option<&Arc<Clip>> {
        self.active.as_ref().map(|active| &active.clip)
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn tick(&mut self, now: f32, joints: &mut JointRegistry) -> PlaybackEvent {
        let Some(active) = &self.active else {
            return PlaybackEvent::Idle;
        };
        let elapsed = (now - active.start_time).max(0.0);
        let result = sample(&active.clip, elapsed);
        if result.finished {
            let name = active.clip.name().to_string();
            debug!(clip = %name, "clip finished");
            self.active = None;
            return PlaybackEvent::Finished(name);
        }
        for (name, angle) in &result.joints {
            joints.set_joint_value(name, *angle);
        }
        PlaybackEvent::Playing
    }
}

/// Named clips available to a viewer
#[derive(Clone, Default, Debug)]
pub struct ClipLibrary {
    clips: HashMap<String, Arc<Clip>>,
}
impl ClipLibrary {
    pub fn from_file_format(library: clipfile::ClipLibrary) -> Result<Self, ClipError> {
        let mut clips = HashMap::new();
        for clip in library.clips {
            let clip = Clip::try_from(clip)?;
            clips.insert(clip.name().to_string(), Arc::new(clip));
        }
        Ok(Self { clips })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClipError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let file = std::fs::File::open(path).map_err(|source| ClipError::Io { path: shown.clone(), source })?;
        let library: clipfile::ClipLibrary = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|source| ClipError::Parse { path: shown.clone(), source })?;
        let library = Self::from_file_format(library)?;
        info!(path = %shown, clips = library.clips.len(), "loaded clip library");
        Ok(library)
    }

    pub fn insert(&mut self, clip: Clip) {
        self.clips.insert(clip.name().to_string(), Arc::new(clip));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Clip>> {
        self.clips.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f32, joints: &[(&str, f32)]) -> Keyframe {
        Keyframe { time, joints: joints.iter().map(|(name, v)| (name.to_string(), *v)).collect() }
    }

    fn ramp(looping: bool) -> Clip {
        Clip::new("ramp", looping, vec![frame(0.0, &[("a", 0.0)]), frame(1.0, &[("a", 1.0)])]).unwrap()
    }

    fn wave() -> Clip {
        Clip::new(
            "wave",
            false,
            vec![
                frame(0.0, &[("shoulder", 0.0), ("elbow", 0.2)]),
                frame(0.5, &[("shoulder", 1.2)]),
                frame(1.0, &[("shoulder", 0.8), ("elbow", -0.4)]),
                frame(2.0, &[("shoulder", 0.0), ("elbow", 0.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn ramp_midpoint_and_finish() {
        let clip = ramp(false);
        let mid = sample(&clip, 0.5);
        assert_eq!(mid.joints["a"], 0.5);
        assert!(!mid.finished);

        let end = sample(&clip, 2.0);
        assert_eq!(end.joints["a"], 1.0);
        assert!(end.finished);
    }

    #[test]
    fn non_looping_past_end_is_last_keyframe() {
        let clip = wave();
        let last = &clip.frames().last().unwrap().joints;
        for t in [2.0, 2.5, 10.0, 1e6] {
            let result = sample(&clip, t);
            assert!(result.finished);
            assert_eq!(&result.joints, last);
        }
    }

    #[test]
    fn looping_clip_is_periodic() {
        let clip = Clip::new("loop", true, wave().frames().to_vec()).unwrap();
        let duration = clip.duration();
        let mut t = 0.0f32;
        while t < 3.0 {
            let a = sample(&clip, t);
            let b = sample(&clip, t + duration);
            assert!(!a.finished && !b.finished);
            for (name, value) in &a.joints {
                assert!((value - b.joints[name]).abs() < 1e-4, "{name} at {t}: {value} vs {}", b.joints[name]);
            }
            t += 0.037;
        }
    }

    #[test]
    fn keyframes_are_reproduced_with_zero_fill() {
        let clip = wave();
        // at 0.5 the elbow is absent and its neighbour lists it, so it reads 0
        let at_half = sample(&clip, 0.5);
        assert_eq!(at_half.joints["shoulder"], 1.2);
        assert_eq!(at_half.joints["elbow"], 0.0);

        for f in clip.frames() {
            let result = sample(&clip, f.time);
            for (name, value) in &f.joints {
                assert_eq!(result.joints[name], *value, "{name} at {}", f.time);
            }
            for (name, value) in &result.joints {
                if !f.joints.contains_key(name) {
                    assert_eq!(*value, 0.0);
                }
            }
        }
    }

    #[test]
    fn interpolation_is_monotonic_between_keyframes() {
        let clip = Clip::new("up", false, vec![frame(0.0, &[("a", -0.3)]), frame(1.7, &[("a", 2.9)])]).unwrap();
        let mut prev = f32::NEG_INFINITY;
        for step in 0..=1000 {
            let t = 1.7 * step as f32 / 1000.0;
            let value = sample(&clip, t).joints["a"];
            assert!(value >= prev, "decreased at {t}");
            prev = value;
        }
    }

    #[test]
    fn degenerate_clip_holds_only_keyframe() {
        let single = Clip::new("pose", true, vec![frame(0.0, &[("a", 0.7)])]).unwrap();
        assert_eq!(sample(&single, 5.0).joints["a"], 0.7);

        let stacked = Clip::new("snap", false, vec![frame(0.0, &[("a", 0.1)]), frame(0.0, &[("a", 0.9)])]).unwrap();
        let result = sample(&stacked, 0.0);
        assert!(result.finished);
        assert_eq!(result.joints["a"], 0.9);
    }

    #[test]
    fn negative_elapsed_clamps_to_first_keyframe() {
        assert_eq!(sample(&ramp(false), -1.0).joints["a"], 0.0);
    }

    #[test]
    fn invalid_clips_are_rejected() {
        assert!(matches!(Clip::new("e", false, vec![]), Err(ClipError::Empty(_))));
        assert!(matches!(
            Clip::new("u", false, vec![frame(1.0, &[]), frame(0.5, &[])]),
            Err(ClipError::Unordered { index: 1, .. })
        ));
        assert!(matches!(Clip::new("n", false, vec![frame(-1.0, &[])]), Err(ClipError::InvalidTime { .. })));
    }

    #[test]
    fn playback_writes_then_clears_on_finish() {
        let mut joints = JointRegistry::from_description(&[crate::resource_manager::file_formats::modelfile::Joint {
            name: "a".into(),
            parent: None,
            origin: [0.0; 3],
            axis: [0.0, 0.0, 1.0],
            limit: None,
        }]);
        let mut playback = Playback::default();
        assert_eq!(playback.tick(0.0, &mut joints), PlaybackEvent::Idle);

        playback.play(Arc::new(ramp(false)), 10.0);
        assert_eq!(playback.tick(10.25, &mut joints), PlaybackEvent::Playing);
        assert_eq!(joints.get_joint_value("a"), Some(0.25));

        assert_eq!(playback.tick(11.5, &mut joints), PlaybackEvent::Finished("ramp".into()));
        assert!(!playback.is_playing());
        // the finishing tick writes nothing
        assert_eq!(joints.get_joint_value("a"), Some(0.25));
    }

    #[test]
    fn play_preempts_the_active_clip() {
        let mut joints = JointRegistry::default();
        let mut playback = Playback::default();
        playback.play(Arc::new(ramp(false)), 0.0);
        playback.play(Arc::new(wave()), 0.5);
        assert_eq!(playback.active_clip().map(|clip| clip.name()), Some("wave"));
        assert_eq!(playback.tick(2.0, &mut joints), PlaybackEvent::Playing);
    }

    #[test]
    fn library_parses_file_format() {
        let json = r#"{ "clips": [ { "name": "nod", "loop": true, "frames": [ { "time": 0.0, "joints": { "tilt": 0.0 } }, { "time": 0.4, "joints": { "tilt": 0.2 } } ] } ] }"#;
        let library: clipfile::ClipLibrary = serde_json::from_str(json).unwrap();
        let library = ClipLibrary::from_file_format(library).unwrap();
        let nod = library.get("nod").unwrap();
        assert!(nod.looping());
        assert_eq!(nod.duration(), 0.4);
        assert!(library.get("wave").is_none());
    }

    #[test]
    fn library_loads_from_disk_and_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("clips.json");
        std::fs::write(&good, r#"{ "clips": [ { "name": "nod", "frames": [ { "time": 0.0, "joints": {} } ] } ] }"#).unwrap();
        let library = ClipLibrary::load(&good).unwrap();
        assert_eq!(library.len(), 1);
        assert!(!library.get("nod").unwrap().looping());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ clips").unwrap();
        assert!(matches!(ClipLibrary::load(&bad), Err(ClipError::Parse { .. })));
        assert!(matches!(ClipLibrary::load(dir.path().join("missing.json")), Err(ClipError::Io { .. })));
    }
}
