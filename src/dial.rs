//! Dial geometry: turns a value and a graduation scale into everything needed to draw one frame.

use std::f64::consts::FRAC_PI_2;

use crate::config::{descriptor_pixel_size, GaugeOptions};
use crate::graduation::{tick_offset, GraduationScale};
use crate::scene::{clockwise_sweep, DrawCommand, Scene, TextBaseline};

/// Angle of value zero: six o'clock, values sweep clockwise from there.
pub const ZERO_ANGLE: f64 = FRAC_PI_2;

/// Minor subdivisions per major interval.
pub const MINOR_PER_MAJOR: usize = 5;

/// Distance of tick labels from the centre, relative to the radius.
const LABEL_RADIUS_FACTOR: f64 = 0.70;

/// Fallback readout size when the label font size has no integer prefix.
const DEFAULT_READOUT_PX: f64 = 20.0;

/// Numeric inputs of the geometry, extracted from the cosmetic options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryStyle {
    pub tracker_width: f64,
    pub gauge_line_width: f64,
    /// Size used to space the value and unit readouts below the centre.
    pub readout_px: f64,
}

impl GeometryStyle {
    pub fn from_options(options: &GaugeOptions) -> Self {
        Self {
            tracker_width: options.gauge.tracker,
            gauge_line_width: options.gauge.line,
            readout_px: options.label.size_prefix().unwrap_or(DEFAULT_READOUT_PX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    fn polar(center: f64, distance: f64, angle: f64) -> Self {
        Self {
            x: center + distance * angle.cos(),
            y: center + distance * angle.sin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickKind {
    /// Labelled tick at a whole step.
    Major { label: String, anchor: Point },
    Minor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickGeometry {
    pub index: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    pub kind: TickKind,
}

impl TickGeometry {
    pub fn is_major(&self) -> bool {
        matches!(self.kind, TickKind::Major { .. })
    }
}

/// Filled cap riding the end of the moving arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tracker {
    pub center: Point,
    pub radius: f64,
}

/// Geometry of one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DialFrame {
    pub value: f64,
    pub needle_angle: f64,
    pub dial_size: f64,
    pub center: f64,
    pub radius: f64,
    /// Radius of the moving arc and the ticks.
    pub track_radius: f64,
    pub ticks: Vec<TickGeometry>,
    pub tracker: Tracker,
    pub value_label: String,
    pub value_anchor: Point,
    pub unit_label: String,
    pub unit_anchor: Point,
}

pub fn needle_angle(value: f64, scale: &GraduationScale) -> f64 {
    ZERO_ANGLE + value * scale.angular_multiplier()
}

/// Whole-number readout, rounding halves away from zero.
/// Negative values keep their sign even when they round to zero (`-0.4` reads `-0`).
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs().round() as i64;
    if value < 0.0 {
        format!("-{magnitude}")
    } else {
        magnitude.to_string()
    }
}

pub fn resolve(
    value: f64,
    scale: &GraduationScale,
    dial_size: f64,
    unit: &str,
    style: &GeometryStyle,
) -> DialFrame {
    let angle = needle_angle(value, scale);
    let center = dial_size / 2.0;
    let radius = dial_size / 2.0 - (style.tracker_width / 2.0 + 4.0);
    let track_radius = radius - style.gauge_line_width;

    let ticks = tick_layout(scale, center, radius);

    let tracker_distance = radius * (1.0 - (style.tracker_width / 2.0 + 2.0) / radius);
    let tracker = Tracker {
        center: Point::polar(center, tracker_distance, angle),
        radius: style.tracker_width / 2.0 + 4.0,
    };

    DialFrame {
        value,
        needle_angle: angle,
        dial_size,
        center,
        radius,
        track_radius,
        ticks,
        tracker,
        value_label: format_value(value),
        value_anchor: Point {
            x: center,
            y: center + 0.2 * style.readout_px,
        },
        unit_label: unit.to_string(),
        unit_anchor: Point {
            x: center,
            y: center + 0.9 * style.readout_px,
        },
    }
}

fn tick_layout(scale: &GraduationScale, center: f64, radius: f64) -> Vec<TickGeometry> {
    let divisions = scale.ticks().len() - 1;
    let offset = tick_offset(divisions);

    (0..=MINOR_PER_MAJOR * divisions)
        .map(|index| {
            let i = index as f64;
            if index % MINOR_PER_MAJOR == 0 {
                let start_angle = ZERO_ANGLE + (i - 0.1) * offset;
                TickGeometry {
                    index,
                    start_angle,
                    end_angle: ZERO_ANGLE + (i + 0.2) * offset,
                    kind: TickKind::Major {
                        label: scale.ticks()[index / MINOR_PER_MAJOR].to_string(),
                        anchor: Point::polar(center, radius * LABEL_RADIUS_FACTOR, start_angle),
                    },
                }
            } else {
                TickGeometry {
                    index,
                    start_angle: ZERO_ANGLE + i * offset,
                    end_angle: ZERO_ANGLE + (i + 0.1) * offset,
                    kind: TickKind::Minor,
                }
            }
        })
        .collect()
}

impl DialFrame {
    /// Draw commands for this frame, styled by `options`.
    pub fn scene(&self, options: &GaugeOptions) -> Scene {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear);

        // Moving arc
        scene.add_command(DrawCommand::Arc {
            cx: self.center,
            cy: self.center,
            radius: self.track_radius,
            start_angle: ZERO_ANGLE,
            end_angle: self.needle_angle,
            line_width: options.gauge.line,
            color: options.gauge.color,
        });

        // Graduation
        let dial_label = &options.dial.label;
        let label_size = format!("{}px", self.dial_size / 12.0);
        let label_font = dial_label.descriptor_with_size(&label_size);
        let label_px = descriptor_pixel_size(&label_font).unwrap_or((self.dial_size / 12.0) as f32);
        for tick in &self.ticks {
            let line_width = match &tick.kind {
                TickKind::Major { label, anchor } => {
                    scene.add_command(DrawCommand::Text {
                        x: anchor.x,
                        y: anchor.y,
                        text: label.clone(),
                        font: label_font.clone(),
                        font_size: label_px,
                        baseline: TextBaseline::Middle,
                        color: dial_label.color,
                    });
                    options.dial.graduation.large
                }
                TickKind::Minor => options.dial.graduation.small,
            };
            scene.add_command(DrawCommand::Arc {
                cx: self.center,
                cy: self.center,
                radius: self.track_radius,
                start_angle: tick.start_angle,
                end_angle: tick.end_angle,
                line_width,
                color: options.dial.color,
            });
        }

        // Tracker cap, outlined with the dial stroke
        scene.add_command(DrawCommand::Disc {
            cx: self.tracker.center.x,
            cy: self.tracker.center.y,
            radius: self.tracker.radius,
            fill: options.gauge.color,
            outline: Some((2.0, options.dial.color)),
        });

        // Readout; the unit keeps the value color but takes the label font
        let text_font = options.text.descriptor();
        scene.add_command(DrawCommand::Text {
            x: self.value_anchor.x,
            y: self.value_anchor.y,
            text: self.value_label.clone(),
            font_size: font_px(&text_font, &options.text.font_size),
            font: text_font,
            baseline: TextBaseline::Alphabetic,
            color: options.text.color,
        });
        let unit_font = options.label.descriptor();
        scene.add_command(DrawCommand::Text {
            x: self.unit_anchor.x,
            y: self.unit_anchor.y,
            text: self.unit_label.clone(),
            font_size: font_px(&unit_font, &options.label.font_size),
            font: unit_font,
            baseline: TextBaseline::Alphabetic,
            color: options.text.color,
        });

        scene
    }

    /// Total clockwise sweep of the moving arc.
    pub fn arc_sweep(&self) -> f64 {
        clockwise_sweep(ZERO_ANGLE, self.needle_angle)
    }
}

fn font_px(descriptor: &str, fallback_size: &str) -> f32 {
    descriptor_pixel_size(descriptor)
        .or_else(|| descriptor_pixel_size(fallback_size))
        .unwrap_or(DEFAULT_READOUT_PX as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn style() -> GeometryStyle {
        GeometryStyle {
            tracker_width: 12.0,
            gauge_line_width: 8.0,
            readout_px: 20.0,
        }
    }

    fn scale_45() -> GraduationScale {
        GraduationScale::plan(&[0.0, 10.0, 20.0, 31.0, 40.0]).unwrap()
    }

    #[test]
    fn test_zero_value_points_at_six_oclock() {
        for max in [5.0, 40.0, 450.0] {
            let scale = GraduationScale::plan(&[max]).unwrap();
            let frame = resolve(0.0, &scale, 300.0, "m", &style());
            assert_eq!(frame.needle_angle, FRAC_PI_2);
        }
    }

    #[test]
    fn test_needle_angle_scenario() {
        let frame = resolve(31.0, &scale_45(), 300.0, "m", &style());
        assert!((frame.needle_angle - (FRAC_PI_2 + 31.0 * 0.06)).abs() < EPS);
        assert_eq!(frame.value_label, "31");
        assert_eq!(frame.unit_label, "m");
    }

    #[test]
    fn test_radii() {
        let frame = resolve(10.0, &scale_45(), 300.0, "m", &style());
        assert_eq!(frame.center, 150.0);
        assert_eq!(frame.radius, 150.0 - (6.0 + 4.0));
        assert_eq!(frame.track_radius, 140.0 - 8.0);
    }

    #[test]
    fn test_tick_layout() {
        let frame = resolve(0.0, &scale_45(), 300.0, "m", &style());
        // 9 divisions, 5 subdivisions each
        assert_eq!(frame.ticks.len(), 46);
        let majors: Vec<&TickGeometry> = frame.ticks.iter().filter(|t| t.is_major()).collect();
        assert_eq!(majors.len(), 10);

        let offset = 0.21 - 0.01 * 9.0;
        let first = &frame.ticks[0];
        assert!((first.start_angle - (FRAC_PI_2 - 0.1 * offset)).abs() < EPS);
        assert!((first.end_angle - (FRAC_PI_2 + 0.2 * offset)).abs() < EPS);

        let minor = &frame.ticks[3];
        assert!(!minor.is_major());
        assert!((minor.start_angle - (FRAC_PI_2 + 3.0 * offset)).abs() < EPS);
        assert!((minor.end_angle - (FRAC_PI_2 + 3.1 * offset)).abs() < EPS);

        match &frame.ticks[45].kind {
            TickKind::Major { label, anchor } => {
                assert_eq!(label, "45");
                let angle = FRAC_PI_2 + 44.9 * offset;
                assert!((anchor.x - (150.0 + 140.0 * 0.7 * angle.cos())).abs() < EPS);
                assert!((anchor.y - (150.0 + 140.0 * 0.7 * angle.sin())).abs() < EPS);
            }
            TickKind::Minor => panic!("last tick should be major"),
        }
    }

    #[test]
    fn test_tracker_cap() {
        let frame = resolve(0.0, &scale_45(), 300.0, "m", &style());
        // Straight down from the centre at distance radius - tracker/2 - 2
        assert!((frame.tracker.center.x - 150.0).abs() < EPS);
        assert!((frame.tracker.center.y - (150.0 + 140.0 - 8.0)).abs() < EPS);
        assert_eq!(frame.tracker.radius, 10.0);
    }

    #[test]
    fn test_readout_anchors_and_rounding() {
        let frame = resolve(12.5, &scale_45(), 300.0, "km/h", &style());
        assert_eq!(frame.value_label, "13");
        assert_eq!(frame.value_anchor, Point { x: 150.0, y: 154.0 });
        assert_eq!(frame.unit_anchor, Point { x: 150.0, y: 168.0 });
        assert_eq!(format_value(-2.5), "-3");
        assert_eq!(format_value(7.49), "7");
    }

    #[test]
    fn test_format_value_signed_zero() {
        assert_eq!(format_value(-0.4), "-0");
        assert_eq!(format_value(-0.5), "-1");
        assert_eq!(format_value(-0.0), "0");
        assert_eq!(format_value(0.4), "0");
        assert_eq!(format_value(0.5), "1");
    }

    #[test]
    fn test_geometry_style_from_options() {
        let options = GaugeOptions::default();
        let style = GeometryStyle::from_options(&options);
        assert_eq!(style.tracker_width, options.gauge.tracker);
        assert_eq!(style.gauge_line_width, options.gauge.line);
        assert_eq!(style.readout_px, 20.0);
    }

    #[test]
    fn test_scene_order_and_styles() {
        let options = GaugeOptions::default();
        let frame = resolve(31.0, &scale_45(), 300.0, "m", &style());
        let scene = frame.scene(&options);
        let commands = scene.commands();

        assert_eq!(commands[0], DrawCommand::Clear);
        match &commands[1] {
            DrawCommand::Arc {
                start_angle,
                end_angle,
                color,
                ..
            } => {
                assert_eq!(*start_angle, FRAC_PI_2);
                assert_eq!(*end_angle, frame.needle_angle);
                assert_eq!(*color, options.gauge.color);
            }
            other => panic!("expected moving arc, got {other:?}"),
        }

        // clear + arc + 46 tick arcs + 10 labels + cap + 2 readouts
        assert_eq!(commands.len(), 1 + 1 + 46 + 10 + 1 + 2);

        match &commands[2] {
            DrawCommand::Text { text, font, font_size, .. } => {
                assert_eq!(text, "0");
                assert_eq!(font, "normal normal normal 25px sans-serif");
                assert_eq!(*font_size, 25.0);
            }
            other => panic!("expected tick label, got {other:?}"),
        }

        let readouts: Vec<&DrawCommand> = commands.iter().rev().take(2).collect();
        match readouts[1] {
            DrawCommand::Text { text, font_size, baseline, .. } => {
                assert_eq!(text, "31");
                assert_eq!(*font_size, 40.0);
                assert_eq!(*baseline, TextBaseline::Alphabetic);
            }
            other => panic!("expected value readout, got {other:?}"),
        }
        match readouts[0] {
            DrawCommand::Text { text, font_size, color, .. } => {
                assert_eq!(text, "m");
                assert_eq!(*font_size, 20.0);
                assert_eq!(*color, options.text.color);
            }
            other => panic!("expected unit readout, got {other:?}"),
        }
    }

    #[test]
    fn test_arc_sweep_for_negative_values_wraps() {
        let frame = resolve(-1.0, &scale_45(), 300.0, "m", &style());
        assert!(frame.arc_sweep() > std::f64::consts::PI);
        let frame = resolve(20.0, &scale_45(), 300.0, "m", &style());
        assert!((frame.arc_sweep() - 20.0 * 0.06).abs() < EPS);
    }
}
