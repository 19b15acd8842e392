//! Time sources the gauge follows, and the registry that hands them out once they are ready.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::debug;

/// Anything exposing a current playback position in seconds.
pub trait TimeSource {
    fn current_time(&self) -> f64;
}

pub type SharedTimeSource = Arc<dyn TimeSource + Send + Sync>;

/// Which time source a gauge follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    /// The host's main media timeline.
    Media,
    /// Another component, looked up by identifier.
    Component(String),
}

impl From<&str> for SourceSelector {
    fn from(s: &str) -> Self {
        match s {
            "media" => SourceSelector::Media,
            other => SourceSelector::Component(other.to_string()),
        }
    }
}

// ============================================================================
// CLOCKS
// ============================================================================

#[derive(Debug)]
struct ClockState {
    /// Position accumulated up to `resumed_at`.
    position: f64,
    resumed_at: Option<Instant>,
    rate: f64,
}

/// Media-style clock: starts paused at zero, advances in real time while playing.
#[derive(Debug)]
pub struct PlaybackClock {
    state: Mutex<ClockState>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                position: 0.0,
                resumed_at: None,
                rate: 1.0,
            }),
        }
    }

    /// A clock that is already playing.
    pub fn playing() -> Self {
        let clock = Self::new();
        clock.play();
        clock
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ClockState) -> R) -> R {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }

    fn settle(state: &mut ClockState, now: Instant) {
        if let Some(resumed_at) = state.resumed_at {
            state.position += now.duration_since(resumed_at).as_secs_f64() * state.rate;
            state.resumed_at = Some(now);
        }
    }

    pub fn play(&self) {
        self.with_state(|state| {
            if state.resumed_at.is_none() {
                state.resumed_at = Some(Instant::now());
            }
        });
    }

    pub fn pause(&self) {
        self.with_state(|state| {
            Self::settle(state, Instant::now());
            state.resumed_at = None;
        });
    }

    pub fn is_playing(&self) -> bool {
        self.with_state(|state| state.resumed_at.is_some())
    }

    /// Pause when playing, play when paused.
    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&self, position: f64) {
        self.with_state(|state| {
            state.position = position.max(0.0);
            if state.resumed_at.is_some() {
                state.resumed_at = Some(Instant::now());
            }
        });
    }

    pub fn set_rate(&self, rate: f64) {
        self.with_state(|state| {
            Self::settle(state, Instant::now());
            state.rate = rate;
        });
    }
}

impl TimeSource for PlaybackClock {
    fn current_time(&self) -> f64 {
        self.with_state(|state| match state.resumed_at {
            Some(resumed_at) => {
                state.position + resumed_at.elapsed().as_secs_f64() * state.rate
            }
            None => state.position,
        })
    }
}

/// Clock whose position is pushed by the host.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(position: f64) -> Self {
        Self {
            bits: AtomicU64::new(position.to_bits()),
        }
    }

    pub fn set(&self, position: f64) {
        self.bits.store(position.to_bits(), Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn current_time(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

// ============================================================================
// COMPONENT REGISTRY
// ============================================================================

/// Identity of a party waiting for a component to become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Outcome of looking up a time source.
pub enum Resolution {
    Ready(SharedTimeSource),
    /// Not ready yet; the receiver yields the source exactly once when it is.
    Pending(Receiver<SharedTimeSource>),
    /// Already waiting under this subscriber; keep the receiver you have.
    AlreadyPending,
    Unavailable,
}

#[derive(Default)]
struct ComponentSlot {
    source: Option<SharedTimeSource>,
    waiters: Vec<(SubscriberId, Sender<SharedTimeSource>)>,
}

/// Components exposing a time source, with one-shot readiness notification.
#[derive(Default)]
pub struct ComponentRegistry {
    media: Option<SharedTimeSource>,
    components: HashMap<String, ComponentSlot>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_media(&mut self, source: SharedTimeSource) {
        self.media = Some(source);
    }

    /// Declare a component that will become ready later.
    pub fn register(&mut self, id: impl Into<String>) {
        self.components.entry(id.into()).or_default();
    }

    pub fn is_ready(&self, id: &str) -> bool {
        self.components
            .get(id)
            .is_some_and(|slot| slot.source.is_some())
    }

    /// Mark a component ready and deliver its source to everyone waiting.
    /// Waiters are consumed, so a repeated call notifies nobody twice.
    pub fn mark_ready(&mut self, id: impl Into<String>, source: SharedTimeSource) {
        let id = id.into();
        let slot = self.components.entry(id.clone()).or_default();
        slot.source = Some(source.clone());
        let waiters = std::mem::take(&mut slot.waiters);
        debug!(component = %id, waiters = waiters.len(), "Component ready");
        for (_, sender) in waiters {
            // A waiter that went away no longer cares.
            let _ = sender.send(source.clone());
        }
    }

    /// Whether `subscriber` is waiting on `id`.
    pub fn is_subscribed(&self, id: &str, subscriber: SubscriberId) -> bool {
        self.components
            .get(id)
            .is_some_and(|slot| slot.waiters.iter().any(|(s, _)| *s == subscriber))
    }

    pub fn pending_subscribers(&self, id: &str) -> usize {
        self.components.get(id).map_or(0, |slot| slot.waiters.len())
    }

    /// Drop a subscription without firing it.
    pub fn unsubscribe(&mut self, id: &str, subscriber: SubscriberId) {
        if let Some(slot) = self.components.get_mut(id) {
            slot.waiters.retain(|(s, _)| *s != subscriber);
        }
    }

    /// Look up the source for `selector`, subscribing `subscriber` once if it is not ready.
    pub fn resolve(&mut self, selector: &SourceSelector, subscriber: SubscriberId) -> Resolution {
        match selector {
            SourceSelector::Media => match &self.media {
                Some(media) => Resolution::Ready(media.clone()),
                None => Resolution::Unavailable,
            },
            SourceSelector::Component(id) => {
                let slot = self.components.entry(id.clone()).or_default();
                if let Some(source) = &slot.source {
                    return Resolution::Ready(source.clone());
                }
                if slot.waiters.iter().any(|(s, _)| *s == subscriber) {
                    return Resolution::AlreadyPending;
                }
                let (sender, receiver) = mpsc::channel();
                slot.waiters.push((subscriber, sender));
                debug!(component = %id, "Waiting for component to become ready");
                Resolution::Pending(receiver)
            }
        }
    }
}
