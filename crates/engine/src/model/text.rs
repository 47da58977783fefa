use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;
use crate::surface::{glyphs, Color, Surface, TextAlign, TransformGuard};

const DEFAULT_PIXELS: f64 = 10.0;
const DEFAULT_FONT: &str = "sans-serif";

/// Measures the rendered width of one line of text.
pub trait TextMetrics: fmt::Debug + Send + Sync {
    fn measure(&self, line: &str, font: &str, pixels: f64) -> f64;
}

/// Metrics of the built-in glyph font drawn by `PixelSurface`; the family is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphMetrics;

impl TextMetrics for GlyphMetrics {
    fn measure(&self, line: &str, _font: &str, pixels: f64) -> f64 {
        glyphs::line_advance(line, pixels)
    }
}

/// Possibly multi-line text. Lines are separated by `\n` and advance by exactly `pixels`.
///
/// Width and height are derived: every change to the text, font or pixel size re-measures them
/// (width of the widest line, height of `pixels` per line). Colour, alignment and max width do
/// not affect geometry.
#[derive(Debug, Clone)]
pub struct TextModel {
    text: String,
    pixels: f64,
    font: String,
    color: Color,
    align: Option<TextAlign>,
    max_width: Option<f64>,
    width: f64,
    height: f64,
    metrics: Arc<dyn TextMetrics>,
}

impl Default for TextModel {
    fn default() -> Self {
        Self::with_metrics(Arc::new(GlyphMetrics))
    }
}

impl TextModel {
    pub fn new(text: impl Into<String>) -> Self {
        Self::default().with_text(text)
    }

    pub fn with_metrics(metrics: Arc<dyn TextMetrics>) -> Self {
        let mut model = Self {
            text: String::new(),
            pixels: DEFAULT_PIXELS,
            font: DEFAULT_FONT.to_string(),
            color: Color::default(),
            align: None,
            max_width: None,
            width: 0.0,
            height: 0.0,
            metrics,
        };
        model.update_size();
        model
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_pixels(mut self, pixels: f64) -> Self {
        self.set_pixels(pixels);
        self
    }

    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.set_font(font);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self.update_size();
        self
    }

    pub fn set_pixels(&mut self, pixels: f64) -> &mut Self {
        self.pixels = pixels.max(0.0);
        self.update_size();
        self
    }

    pub fn set_font(&mut self, font: impl Into<String>) -> &mut Self {
        self.font = font.into();
        self.update_size();
        self
    }

    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    pub fn set_align(&mut self, align: TextAlign) -> &mut Self {
        self.align = Some(align);
        self
    }

    pub fn set_max_width(&mut self, max_width: Option<f64>) -> &mut Self {
        self.max_width = max_width;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pixels(&self) -> f64 {
        self.pixels
    }

    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn align(&self) -> Option<TextAlign> {
        self.align
    }

    pub fn max_width(&self) -> Option<f64> {
        self.max_width
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// `"{pixels}px {font}"`, as handed to the surface.
    pub fn font_string(&self) -> String {
        format!("{}px {}", self.pixels, self.font)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    fn update_size(&mut self) {
        let mut widest: f64 = 0.0;
        let mut line_count = 0usize;
        for line in self.text.split('\n') {
            widest = widest.max(self.metrics.measure(line, &self.font, self.pixels));
            line_count += 1;
        }
        self.width = widest.max(0.0);
        self.height = self.pixels * line_count as f64;
    }

    pub(crate) fn render(&self, entity: &Entity, surface: &mut dyn Surface) {
        let (x, y) = (entity.x(), entity.y());
        let mut surface =
            TransformGuard::rotated(surface, entity.angle(), x, y, self.width, self.height);
        surface.set_font(&self.font_string());
        surface.set_fill_color(self.color);
        if let Some(align) = self.align {
            surface.set_text_align(align);
        }
        for (index, line) in self.lines().enumerate() {
            surface.fill_text(line, x, y + index as f64 * self.pixels, self.max_width);
        }
    }
}
