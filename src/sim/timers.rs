use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    IntroDelay,
    InactivityReset,
    /// greeting clip length has elapsed
    GreetingComplete,
}

/// Deadlines on the viewer clock. At most one pending timer per kind, re-arming replaces it.
#[derive(Default, Debug)]
pub struct Timers {
    pending: Vec<(TimerKind, f32)>,
}
impl Timers {
    pub fn arm(&mut self, kind: TimerKind, deadline: f32) {
        self.cancel(kind);
        self.pending.push((kind, deadline));
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.pending.retain(|(pending, _)| *pending != kind);
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "cancelling timers");
        }
        self.pending.clear();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|(pending, _)| *pending == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every timer due at `now`, earliest first
    pub fn drain_due(&mut self, now: f32) -> Vec<TimerKind> {
        let mut due: Vec<(TimerKind, f32)> = self.pending.iter().copied().filter(|(_, deadline)| *deadline <= now).collect();
        if due.is_empty() {
            return vec![];
        }
        self.pending.retain(|(_, deadline)| *deadline > now);
        due.sort_by(|a, b| a.1.total_cmp(&b.1));
        due.into_iter().map(|(kind, _)| kind).collect()
    }
}
