// ============================================================================
// RETAINED MODE ABSTRACTIONS
// ============================================================================

use std::f64::consts::TAU;

use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::{descriptor_pixel_size, Color};

/// Vertical anchoring of a text command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextBaseline {
    /// `y` is the vertical centre of the ink.
    Middle,
    /// `y` is the baseline.
    Alphabetic,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Reset every pixel to transparent.
    Clear,
    /// Stroke a clockwise arc from `start_angle` to `end_angle`.
    Arc {
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        line_width: f64,
        color: Color,
    },
    /// Filled circle with an optional outline.
    Disc {
        cx: f64,
        cy: f64,
        radius: f64,
        fill: Color,
        outline: Option<(f64, Color)>,
    },
    /// Horizontally centred text.
    Text {
        x: f64,
        y: f64,
        text: String,
        /// Font descriptor; its pixel size sets the glyph scale. The face is always the embedded one.
        font: String,
        /// Size used when `font` names no pixel size.
        font_size: f32,
        baseline: TextBaseline,
        color: Color,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Rasterize every command in order. Text is skipped when no font is available.
    pub fn render(&self, canvas: &mut Canvas<'_>, font: Option<&Font<'_>>) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear => canvas.clear(),
                DrawCommand::Arc {
                    cx,
                    cy,
                    radius,
                    start_angle,
                    end_angle,
                    line_width,
                    color,
                } => {
                    stroke_arc(
                        canvas,
                        *cx,
                        *cy,
                        *radius,
                        *start_angle,
                        *end_angle,
                        *line_width,
                        *color,
                    );
                }
                DrawCommand::Disc {
                    cx,
                    cy,
                    radius,
                    fill,
                    outline,
                } => {
                    draw_circle(canvas, *cx, *cy, *radius, *fill);
                    if let Some((width, color)) = outline {
                        stroke_arc(canvas, *cx, *cy, *radius, 0.0, TAU, *width, *color);
                    }
                }
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font: descriptor,
                    font_size,
                    baseline,
                    color,
                } => {
                    if let Some(font) = font {
                        draw_text(
                            canvas,
                            *x,
                            *y,
                            text,
                            font,
                            text_scale(descriptor, *font_size),
                            *baseline,
                            *color,
                        );
                    }
                }
            }
        }
    }
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

/// Borrowed RGBA8 pixel buffer.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(frame.len(), width * height * 4);
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.frame.fill(0);
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.frame[idx..idx + 4]);
        Some(out)
    }

    /// Source-over blend of `color` at coverage `alpha`.
    fn blend(&mut self, x: i32, y: i32, color: Color, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let dst = &mut self.frame[idx..idx + 4];
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = alpha + dst_a * (1.0 - alpha);
        let (r, g, b) = color.as_tuple();
        for (channel, src) in dst.iter_mut().zip([r, g, b]) {
            let mixed = (src as f32 * alpha + *channel as f32 * dst_a * (1.0 - alpha)) / out_a;
            *channel = mixed.round() as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

/// Clockwise sweep from `start` to `end`, in `[0, TAU]`.
pub fn clockwise_sweep(start: f64, end: f64) -> f64 {
    let delta = end - start;
    if delta >= TAU {
        TAU
    } else {
        delta.rem_euclid(TAU)
    }
}

fn stroke_arc(
    canvas: &mut Canvas<'_>,
    cx: f64,
    cy: f64,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    line_width: f64,
    color: Color,
) {
    let sweep = clockwise_sweep(start_angle, end_angle);
    if sweep <= 0.0 || line_width <= 0.0 {
        return;
    }
    let inner = (radius - line_width / 2.0).max(0.0);
    let outer = radius + line_width / 2.0;

    let min_x = (cx - outer - 1.0).floor().max(0.0) as i32;
    let max_x = (cx + outer + 1.0).ceil().min(canvas.width as f64 - 1.0) as i32;
    let min_y = (cy - outer - 1.0).floor().max(0.0) as i32;
    let max_y = (cy + outer + 1.0).ceil().min(canvas.height as f64 - 1.0) as i32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let angle = dy.atan2(dx);
            let in_arc = sweep >= TAU || (angle - start_angle).rem_euclid(TAU) <= sweep;
            if !in_arc {
                continue;
            }
            let aa = if dist > outer {
                1.0 - (dist - outer).min(1.0)
            } else if dist < inner {
                1.0 - (inner - dist).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                canvas.blend(x, y, color, aa as f32);
            }
        }
    }
}

fn draw_circle(canvas: &mut Canvas<'_>, cx: f64, cy: f64, radius: f64, color: Color) {
    let reach = radius.ceil() as i32 + 1;
    let (ix, iy) = (cx.floor() as i32, cy.floor() as i32);
    for y in iy - reach..=iy + reach {
        for x in ix - reach..=ix + reach {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = if dist > radius {
                1.0 - (dist - radius).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                canvas.blend(x, y, color, aa as f32);
            }
        }
    }
}

/// Glyph scale for a text command: the descriptor's pixel size, else `fallback`.
fn text_scale(descriptor: &str, fallback: f32) -> Scale {
    Scale::uniform(descriptor_pixel_size(descriptor).unwrap_or(fallback))
}

fn draw_text(
    canvas: &mut Canvas<'_>,
    x: f64,
    y: f64,
    text: &str,
    font: &Font<'_>,
    scale: Scale,
    baseline: TextBaseline,
    color: Color,
) {
    let glyphs: Vec<PositionedGlyph<'_>> = font.layout(text, scale, point(0.0, 0.0)).collect();

    // Bounding box of the whole string relative to a baseline at y = 0
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let offset_x = x.round() as i32 - (max_x - min_x) / 2 - min_x;
    let offset_y = match baseline {
        TextBaseline::Middle => y.round() as i32 - (max_y - min_y) / 2 - min_y,
        TextBaseline::Alphabetic => y.round() as i32,
    };

    for glyph in &glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x + bb.min.x + gx as i32;
                let py = offset_y + bb.min.y + gy as i32;
                canvas.blend(px, py, color, v);
            });
        }
    }
}
