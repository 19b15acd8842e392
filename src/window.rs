//! Desktop player: a window that plays a recorded series through the gauge.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use tracing::{debug, error, info};
use winit::dpi::{LogicalPosition, LogicalSize};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::config::{Color, GaugeOptions};
use crate::controller::Speedometer;
use crate::error::Result;
use crate::series::TimeSeries;
use crate::source::{ComponentRegistry, PlaybackClock, TimeSource};
use crate::surface::{PixelSurface, Surface};

/// A component time source that only becomes ready after `delay`.
#[derive(Debug, Clone)]
pub struct DelayedSource {
    pub component: String,
    pub delay: Duration,
}

/// Gauge, clock and registry as driven by the window, without the window itself.
pub struct Player {
    gauge: Speedometer,
    registry: ComponentRegistry,
    clock: Arc<PlaybackClock>,
    delayed: Option<(String, Instant)>,
    background: Color,
}

impl Player {
    pub fn new(
        mut options: GaugeOptions,
        series: Option<TimeSeries>,
        delayed: Option<DelayedSource>,
    ) -> Self {
        let clock = Arc::new(PlaybackClock::playing());
        let mut registry = ComponentRegistry::new();
        registry.set_media(clock.clone());

        let delayed = delayed.map(|source| {
            registry.register(source.component.as_str());
            options.source = source.component.clone();
            (source.component, Instant::now() + source.delay)
        });

        let background = options.background_color;
        let size = options.size as usize;
        // Attached on the first frame, once the window exists
        let surface = PixelSurface::new(size, size, options.placement());

        let mut gauge = Speedometer::new(options);
        gauge.boot(surface, &mut registry);
        if let Some(series) = series {
            gauge.load_series(series);
        }

        Self {
            gauge,
            registry,
            clock,
            delayed,
            background,
        }
    }

    /// Advance one frame and write the composited result into `frame`.
    pub fn tick(&mut self, frame: &mut [u8]) {
        self.release_delayed_source();

        if let Some(surface) = self.gauge.surface_mut() {
            surface.attach();
        }
        self.gauge.update();

        let texture = self
            .gauge
            .texture()
            .filter(|surface| surface.is_visible())
            .and_then(PixelSurface::pixels);
        composite(frame, self.background, texture);
    }

    /// Pause or resume playback.
    pub fn toggle_playback(&mut self) {
        self.clock.toggle();
        info!(
            playing = self.clock.is_playing(),
            position = self.clock.current_time(),
            "Playback toggled"
        );
    }

    /// Rewind to the start and rebind the gauge.
    pub fn restart(&mut self) {
        self.clock.seek(0.0);
        self.gauge.reset(&mut self.registry);
        info!("Playback restarted");
    }

    pub fn shutdown(&mut self) {
        self.gauge.dispose();
    }

    pub fn gauge(&self) -> &Speedometer {
        &self.gauge
    }

    fn release_delayed_source(&mut self) {
        let due = matches!(&self.delayed, Some((_, ready_at)) if Instant::now() >= *ready_at);
        if !due {
            return;
        }
        if let Some((component, _)) = self.delayed.take() {
            debug!(component = %component, "Delayed time source ready");
            self.registry.mark_ready(component, self.clock.clone());
        }
    }
}

/// Fill `frame` with the background and blend the gauge texture over it.
fn composite(frame: &mut [u8], background: Color, texture: Option<&[u8]>) {
    let (r, g, b) = background.as_tuple();
    for (i, px) in frame.chunks_exact_mut(4).enumerate() {
        let mut out = [r, g, b, 0xff];
        if let Some(src) = texture.and_then(|t| t.get(i * 4..i * 4 + 4)) {
            let alpha = src[3] as f32 / 255.0;
            for (channel, s) in out.iter_mut().zip(src) {
                *channel = (*s as f32 * alpha + *channel as f32 * (1.0 - alpha)).round() as u8;
            }
            out[3] = 0xff;
        }
        px.copy_from_slice(&out);
    }
}

/// Open the player window and run until it is closed.
pub fn run_window(title: &str, mut player: Player) -> Result<()> {
    let options = player.gauge().options().clone();
    let size = options.size;

    let event_loop = EventLoop::new()?;
    let mut builder = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(LogicalSize::new(f64::from(size), f64::from(size)))
        .with_resizable(false);
    if options.left.is_some() || options.top.is_some() {
        builder = builder.with_position(LogicalPosition::new(
            options.left.unwrap_or(0.0),
            options.top.unwrap_or(0.0),
        ));
    }
    let window = Arc::new(builder.build(&event_loop)?);

    let physical = window.inner_size();
    let surface_texture = SurfaceTexture::new(physical.width, physical.height, &window);
    // Buffer matches the gauge texture; pixels scales it to the window
    let mut pixels = Pixels::new(size, size, surface_texture)?;

    let frame_duration = Duration::from_secs_f64(1.0 / options.max_framerate.max(1.0));
    let mut last_frame = Instant::now();
    let window_clone = window.clone();

    info!(size, fps = options.max_framerate, "Player window opened");

    event_loop.run(move |event, window_target| {
        window_target.set_control_flow(ControlFlow::Poll);
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    player.shutdown();
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                        error!(error = %e, "Failed to resize surface");
                    }
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key,
                            state: ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                } => match logical_key {
                    Key::Named(NamedKey::Space) => player.toggle_playback(),
                    Key::Character(c) if c.eq_ignore_ascii_case("r") => player.restart(),
                    _ => {}
                },
                WindowEvent::RedrawRequested => {
                    player.tick(pixels.frame_mut());
                    if let Err(e) = pixels.render() {
                        error!(error = %e, "Render failed");
                        player.shutdown();
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if last_frame.elapsed() >= frame_duration {
                    window_clone.request_redraw();
                    last_frame = Instant::now();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
