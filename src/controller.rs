//! The gauge component: lifecycle, data loading, time-source binding and per-frame updates.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use rusttype::Font;
use tracing::{debug, error, info, warn};

use crate::config::GaugeOptions;
use crate::dial::{self, DialFrame, GeometryStyle};
use crate::error::{GaugeError, Result};
use crate::graduation::GraduationScale;
use crate::series::{self, TimeSeries};
use crate::source::{ComponentRegistry, Resolution, SharedTimeSource, SourceSelector, SubscriberId};
use crate::surface::{PixelSurface, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeState {
    /// Created, no surface yet.
    Uninitialized,
    /// Surface attached, waiting for series data.
    Loading,
    /// Scale planned; updates draw.
    Ready,
    /// Released; every call is a no-op.
    Disposed,
}

struct PendingBinding {
    component: String,
    receiver: Receiver<SharedTimeSource>,
    since: Instant,
}

/// Analog gauge following a recorded series in step with a time source.
pub struct Speedometer<S: Surface = PixelSurface> {
    options: GaugeOptions,
    state: GaugeState,
    subscriber: SubscriberId,
    font: Option<Font<'static>>,
    surface: Option<S>,
    series: Option<TimeSeries>,
    scale: Option<GraduationScale>,
    time_source: Option<SharedTimeSource>,
    pending_binding: Option<PendingBinding>,
    pending_load: Option<Receiver<Result<TimeSeries>>>,
    last_error: Option<GaugeError>,
}

impl<S: Surface> Speedometer<S> {
    pub fn new(options: GaugeOptions) -> Self {
        let font = Font::try_from_bytes(options.font_data);
        if font.is_none() {
            warn!("Speedometer font could not be parsed, labels will not be drawn");
        }
        Self {
            options,
            state: GaugeState::Uninitialized,
            subscriber: SubscriberId::next(),
            font,
            surface: None,
            series: None,
            scale: None,
            time_source: None,
            pending_binding: None,
            pending_load: None,
            last_error: None,
        }
    }

    /// Attach the surface, bind the time source and start loading the configured series.
    pub fn boot(&mut self, surface: S, registry: &mut ComponentRegistry) {
        if self.state != GaugeState::Uninitialized {
            warn!(state = ?self.state, "Speedometer already booted");
            return;
        }

        self.surface = Some(surface);
        if !self.options.dom {
            self.hide();
        }

        self.bind_time_source(registry);
        self.state = if self.scale.is_some() {
            GaugeState::Ready
        } else {
            GaugeState::Loading
        };
        self.start_loading();
        info!(size = self.options.size, source = %self.options.source, "Speedometer booted");
    }

    /// Re-apply visibility and bind the time source again. Loaded data is kept.
    pub fn reset(&mut self, registry: &mut ComponentRegistry) {
        if matches!(self.state, GaugeState::Disposed | GaugeState::Uninitialized) {
            return;
        }

        if self.options.dom {
            self.show();
        } else {
            self.hide();
        }

        self.time_source = None;
        self.bind_time_source(registry);
        debug!("Speedometer reset");
    }

    /// Drop the current data and load the configured series again.
    pub fn reload(&mut self) {
        if matches!(self.state, GaugeState::Disposed | GaugeState::Uninitialized) {
            return;
        }
        self.series = None;
        self.scale = None;
        self.state = GaugeState::Loading;
        self.start_loading();
    }

    /// Install a series directly, planning its scale.
    pub fn load_series(&mut self, series: TimeSeries) {
        if self.state == GaugeState::Disposed {
            return;
        }
        self.pending_load = None;

        match GraduationScale::plan(series.samples()) {
            Ok(scale) => {
                info!(
                    samples = series.len(),
                    frequency = series.frequency(),
                    unit = series.unit(),
                    top = scale.top(),
                    "Series loaded"
                );
                self.series = Some(series);
                self.scale = Some(scale);
                self.last_error = None;
                if self.state == GaugeState::Loading {
                    self.state = GaugeState::Ready;
                }
            }
            Err(e) => self.fail_loading(e),
        }
    }

    /// Advance one frame. Returns the drawn geometry, or `None` when there is nothing to draw yet.
    pub fn update(&mut self) -> Option<DialFrame> {
        if self.state == GaugeState::Disposed {
            return None;
        }
        self.poll_pending();

        let (series, scale, source) = match (&self.series, &self.scale, &self.time_source) {
            (Some(series), Some(scale), Some(source)) => (series, scale, source),
            _ => return None,
        };
        let surface = self.surface.as_mut()?;

        let value = series.lookup_clamped(source.current_time());
        let frame = dial::resolve(
            value,
            scale,
            f64::from(self.options.size),
            series.unit(),
            &GeometryStyle::from_options(&self.options),
        );

        // Not attached yet: try again next frame
        if let Some(mut canvas) = surface.canvas() {
            frame
                .scene(&self.options)
                .render(&mut canvas, self.font.as_ref());
        }

        Some(frame)
    }

    pub fn show(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.show();
        }
    }

    pub fn hide(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.hide();
        }
    }

    /// Release everything. Safe to call repeatedly and from any state.
    pub fn dispose(&mut self) {
        if self.state == GaugeState::Disposed {
            return;
        }
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
        }
        self.series = None;
        self.scale = None;
        self.time_source = None;
        self.pending_binding = None;
        self.pending_load = None;
        self.state = GaugeState::Disposed;
        info!("Speedometer disposed");
    }

    pub fn state(&self) -> GaugeState {
        self.state
    }

    pub fn options(&self) -> &GaugeOptions {
        &self.options
    }

    pub fn series(&self) -> Option<&TimeSeries> {
        self.series.as_ref()
    }

    pub fn scale(&self) -> Option<&GraduationScale> {
        self.scale.as_ref()
    }

    pub fn last_error(&self) -> Option<&GaugeError> {
        self.last_error.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.time_source.is_some()
    }

    pub fn is_waiting_for_source(&self) -> bool {
        self.pending_binding.is_some()
    }

    /// The surface, for compositing the gauge elsewhere.
    pub fn texture(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    fn start_loading(&mut self) {
        match self.options.data_path() {
            Some(path) => {
                debug!(path, "Requesting series data");
                self.pending_load = Some(series::spawn_load(path));
            }
            None => warn!("Speedometer can't load series data: invalid path"),
        }
    }

    fn fail_loading(&mut self, e: GaugeError) {
        error!(error = %e, "Speedometer series rejected");
        self.series = None;
        self.scale = None;
        // Before boot there is no loading phase to fall back to
        if self.state == GaugeState::Ready {
            self.state = GaugeState::Loading;
        }
        self.last_error = Some(e);
    }

    fn bind_time_source(&mut self, registry: &mut ComponentRegistry) {
        // A subscription is already waiting; it fires once.
        if self.pending_binding.is_some() {
            return;
        }

        let selector = self.options.source_selector();
        let mut resolution = registry.resolve(&selector, self.subscriber);
        if matches!(resolution, Resolution::AlreadyPending) {
            if let SourceSelector::Component(id) = &selector {
                // Our receiver was dropped after a timeout; start a fresh subscription.
                registry.unsubscribe(id, self.subscriber);
                resolution = registry.resolve(&selector, self.subscriber);
            }
        }

        match (resolution, selector) {
            (Resolution::Ready(source), _) => {
                debug!(source = %self.options.source, "Time source bound");
                self.time_source = Some(source);
            }
            (Resolution::Pending(receiver), SourceSelector::Component(component)) => {
                self.pending_binding = Some(PendingBinding {
                    component,
                    receiver,
                    since: Instant::now(),
                });
            }
            (Resolution::Pending(_), SourceSelector::Media)
            | (Resolution::AlreadyPending, _)
            | (Resolution::Unavailable, _) => {
                warn!(source = %self.options.source, "Time source unavailable");
            }
        }
    }

    fn poll_pending(&mut self) {
        if let Some(receiver) = &self.pending_load {
            match receiver.try_recv() {
                Ok(Ok(series)) => self.load_series(series),
                Ok(Err(e)) => {
                    self.pending_load = None;
                    self.fail_loading(e);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.pending_load = None;
                    error!("Series loader stopped without a result");
                }
            }
        }

        if let Some(pending) = &self.pending_binding {
            match pending.receiver.try_recv() {
                Ok(source) => {
                    debug!(component = %pending.component, "Time source bound");
                    self.time_source = Some(source);
                    self.pending_binding = None;
                }
                Err(TryRecvError::Empty) => {
                    if let Some(timeout) = self.options.source_ready_timeout() {
                        if pending.since.elapsed() >= timeout {
                            let e = GaugeError::SourceTimeout {
                                component: pending.component.clone(),
                                timeout,
                            };
                            warn!(error = %e, "Giving up on time source");
                            self.last_error = Some(e);
                            self.pending_binding = None;
                        }
                    }
                }
                Err(TryRecvError::Disconnected) => {
                    self.pending_binding = None;
                }
            }
        }
    }
}
