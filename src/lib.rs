// ============================================================================
// CRATE LAYOUT
// ============================================================================

//! Analog speedometer gauge that replays a recorded time series in step with a
//! playback clock.
//!
//! The pipeline for one frame is: look up the sample for the current time in a
//! [`TimeSeries`], resolve the dial geometry against the [`GraduationScale`]
//! planned for that series, and rasterize the resulting [`Scene`] onto the
//! gauge's [`PixelSurface`]. [`Speedometer`] owns that loop together with the
//! component lifecycle and time-source binding.

pub mod config;
pub mod controller;
pub mod demo;
pub mod dial;
pub mod error;
pub mod graduation;
pub mod logging;
pub mod scene;
pub mod series;
pub mod source;
pub mod surface;
pub mod window;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use config::{Color, FontSpec, GaugeOptions, Placement};
pub use controller::{GaugeState, Speedometer};
pub use dial::DialFrame;
pub use error::{GaugeError, Result};
pub use graduation::GraduationScale;
pub use logging::{init_tracing, LogFormat, LoggingConfig};
pub use scene::{Canvas, DrawCommand, Scene};
pub use series::TimeSeries;
pub use source::{
    ComponentRegistry, ManualClock, PlaybackClock, SharedTimeSource, SourceSelector, TimeSource,
};
pub use surface::{PixelSurface, Surface};
pub use window::{run_window, DelayedSource, Player};
