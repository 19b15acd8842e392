use std::path::Path;
use std::time::Duration;

use bon::Builder;
use serde::Deserialize;

use crate::error::{GaugeError, Result};
use crate::logging::LoggingConfig;
use crate::source::SourceSelector;

/// Color representation for gauge elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Parses `#rrggbb` or `#rgb`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || GaugeError::Config(format!("invalid color '{s}', expected #rrggbb"));
        let hex = s
            .trim()
            .strip_prefix('#')
            .filter(|h| h.is_ascii())
            .ok_or_else(invalid)?;
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |h: &str| channel(h).map(|v| v * 17);
                Ok(Self::new(
                    expand(&hex[0..1])?,
                    expand(&hex[1..2])?,
                    expand(&hex[2..3])?,
                ))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = GaugeError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

/// A font role: either a complete descriptor in `font`, or the parts it is composed from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSpec {
    pub font: Option<String>,
    pub font_style: String,
    pub font_variant: String,
    pub font_weight: String,
    pub font_size: String,
    pub font_family: String,
    pub color: Color,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            font: None,
            font_style: "normal".to_string(),
            font_variant: "normal".to_string(),
            font_weight: "normal".to_string(),
            font_size: "16px".to_string(),
            font_family: "sans-serif".to_string(),
            color: Color::new(0xff, 0xff, 0xff),
        }
    }
}

impl FontSpec {
    pub fn sized(font_size: &str, font_weight: &str) -> Self {
        Self {
            font_size: font_size.to_string(),
            font_weight: font_weight.to_string(),
            ..Self::default()
        }
    }

    /// Descriptor for this role, composed from the parts when `font` is unset.
    pub fn descriptor(&self) -> String {
        self.descriptor_with_size(&self.font_size)
    }

    /// Same as [`descriptor`](Self::descriptor) with the size part replaced.
    pub fn descriptor_with_size(&self, size: &str) -> String {
        match &self.font {
            Some(font) => font.clone(),
            None => format!(
                "{} {} {} {} {}",
                self.font_style, self.font_variant, self.font_weight, size, self.font_family
            ),
        }
    }

    /// Integer prefix of `font_size` ("20px" -> 20).
    pub fn size_prefix(&self) -> Option<f64> {
        leading_integer(&self.font_size)
    }
}

/// Leading integer of a string, ignoring leading whitespace. `None` when there are no digits.
pub fn leading_integer(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<f64>().ok().map(|v| sign * v)
}

/// Pixel size named in a font descriptor such as `"bold 20px/1.2 Arial"`.
pub fn descriptor_pixel_size(descriptor: &str) -> Option<f32> {
    descriptor.split_whitespace().find_map(|token| {
        token
            .split('/')
            .next()
            .and_then(|t| t.strip_suffix("px"))
            .and_then(|t| t.parse::<f32>().ok())
    })
}

/// Moving arc and tracker cap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GaugeStyle {
    pub color: Color,
    /// Stroke width of the moving arc.
    pub line: f64,
    /// Tracker width; sets the dial inset and the cap size.
    pub tracker: f64,
}

impl Default for GaugeStyle {
    fn default() -> Self {
        Self {
            color: Color::new(0xff, 0x8c, 0x00),
            line: 8.0,
            tracker: 12.0,
        }
    }
}

/// Stroke widths for major and minor ticks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraduationWidths {
    pub large: f64,
    pub small: f64,
}

impl Default for GraduationWidths {
    fn default() -> Self {
        Self {
            large: 3.0,
            small: 1.0,
        }
    }
}

/// Tick marks and their labels.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DialStyle {
    pub color: Color,
    pub graduation: GraduationWidths,
    pub label: FontSpec,
}

impl Default for DialStyle {
    fn default() -> Self {
        Self {
            color: Color::new(0xdd, 0xdd, 0xdd),
            graduation: GraduationWidths::default(),
            label: FontSpec::default(),
        }
    }
}

/// Where the series document lives.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataSource {
    pub json: Option<String>,
}

/// Offsets of the surface inside its host, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub top: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
}

#[derive(Debug, Clone, Builder, Deserialize)]
#[serde(default)]
pub struct GaugeOptions {
    // Surface configuration
    #[builder(default = 300)]
    pub size: u32,
    pub top: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    /// Initial visibility; `false` keeps the surface hidden.
    #[builder(default = true)]
    pub dom: bool,

    // Data and synchronization
    #[builder(default)]
    pub data: DataSource,
    #[builder(default = "media".to_string(), into)]
    pub source: String,
    pub source_ready_timeout_ms: Option<u64>,

    // Styles
    #[builder(default)]
    pub gauge: GaugeStyle,
    #[builder(default)]
    pub dial: DialStyle,
    #[builder(default = FontSpec::sized("40px", "bold"))]
    pub text: FontSpec,
    #[builder(default = FontSpec::sized("20px", "normal"))]
    pub label: FontSpec,

    // Window configuration
    #[builder(default = 60.0)]
    pub max_framerate: f64,
    #[builder(default = Color::new(0x10, 0x10, 0x14))]
    pub background_color: Color,

    // Font configuration
    #[serde(skip)]
    #[builder(default = include_bytes!("DejaVuSans.ttf"))]
    pub font_data: &'static [u8],

    #[builder(default)]
    pub logging: LoggingConfig,
}

impl Default for GaugeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GaugeOptions {
    /// Load options from a JSON5 file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GaugeError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse options from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(json5::from_str(content)?)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            top: self.top,
            left: self.left,
            right: self.right,
            bottom: self.bottom,
        }
    }

    pub fn source_selector(&self) -> SourceSelector {
        SourceSelector::from(self.source.as_str())
    }

    pub fn source_ready_timeout(&self) -> Option<Duration> {
        self.source_ready_timeout_ms.map(Duration::from_millis)
    }

    /// Series path, if one is configured and non-empty.
    pub fn data_path(&self) -> Option<&str> {
        self.data.json.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = GaugeOptions::default();
        assert_eq!(options.size, 300);
        assert!(options.dom);
        assert_eq!(options.source, "media");
        assert_eq!(options.text.font_size, "40px");
        assert_eq!(options.label.font_size, "20px");
        assert!(options.data_path().is_none());
        assert!(options.source_ready_timeout().is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let options = GaugeOptions::builder()
            .size(400)
            .dom(false)
            .source("video-player")
            .source_ready_timeout_ms(250)
            .build();
        assert_eq!(options.size, 400);
        assert!(!options.dom);
        assert_eq!(
            options.source_selector(),
            SourceSelector::Component("video-player".to_string())
        );
        assert_eq!(
            options.source_ready_timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_parse_json5() {
        let options = GaugeOptions::parse(
            r##"{
                // dial in the lower-left corner
                size: 240,
                left: 16,
                bottom: 16,
                data: { json: "altitude.json" },
                gauge: { color: "#00ff00", line: 6 },
                dial: { graduation: { large: 4 }, label: { fontFamily: "serif" } },
                text: { font: "bold 32px monospace" },
            }"##,
        )
        .unwrap();
        assert_eq!(options.size, 240);
        assert_eq!(options.placement().left, Some(16.0));
        assert_eq!(options.placement().top, None);
        assert_eq!(options.data_path(), Some("altitude.json"));
        assert_eq!(options.gauge.color, Color::new(0, 0xff, 0));
        assert_eq!(options.gauge.line, 6.0);
        assert_eq!(options.gauge.tracker, GaugeStyle::default().tracker);
        assert_eq!(options.dial.graduation.large, 4.0);
        assert_eq!(options.dial.graduation.small, 1.0);
        assert_eq!(options.dial.label.font_family, "serif");
        assert_eq!(options.text.descriptor(), "bold 32px monospace");
        assert_eq!(options.label.font_size, "20px");
    }

    #[test]
    fn test_parse_rejects_bad_color() {
        let err = GaugeOptions::parse(r#"{ gauge: { color: "orange" } }"#).unwrap_err();
        assert!(matches!(err, GaugeError::Config(_)));
    }

    #[test]
    fn test_blank_data_path_is_ignored() {
        let options = GaugeOptions::parse(r#"{ data: { json: "  " } }"#).unwrap();
        assert!(options.data_path().is_none());
    }

    #[test]
    fn test_color_parse() {
        assert_eq!(Color::parse("#102030").unwrap(), Color::new(0x10, 0x20, 0x30));
        assert_eq!(Color::parse("#fff").unwrap(), Color::new(0xff, 0xff, 0xff));
        assert!(Color::parse("102030").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#zzzzzz").is_err());
    }

    #[test]
    fn test_font_descriptor_composition() {
        let spec = FontSpec::sized("20px", "bold");
        assert_eq!(spec.descriptor(), "normal normal bold 20px sans-serif");
        assert_eq!(
            spec.descriptor_with_size("25px"),
            "normal normal bold 25px sans-serif"
        );

        let explicit = FontSpec {
            font: Some("italic 12px serif".to_string()),
            ..spec
        };
        assert_eq!(explicit.descriptor_with_size("25px"), "italic 12px serif");
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("20px"), Some(20.0));
        assert_eq!(leading_integer("  7.9em"), Some(7.0));
        assert_eq!(leading_integer("-3"), Some(-3.0));
        assert_eq!(leading_integer("px"), None);
        assert_eq!(leading_integer(""), None);
    }

    #[test]
    fn test_descriptor_pixel_size() {
        assert_eq!(descriptor_pixel_size("bold 20px Arial"), Some(20.0));
        assert_eq!(descriptor_pixel_size("normal 12.5px/1.2 serif"), Some(12.5));
        assert_eq!(descriptor_pixel_size("bold 1em Arial"), None);
    }
}
