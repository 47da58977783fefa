use crate::images::Bitmap;

use super::{Color, Surface, TextAlign};

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    ClearRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    SetFillColor(Color),
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    FillCircle {
        cx: f64,
        cy: f64,
        radius: f64,
    },
    DrawImage {
        bitmap_width: u32,
        bitmap_height: u32,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    SetFont(String),
    SetTextAlign(TextAlign),
    FillText {
        text: String,
        x: f64,
        y: f64,
        max_width: Option<f64>,
    },
    Translate {
        dx: f64,
        dy: f64,
    },
    Rotate {
        radians: f64,
    },
    ResetTransform,
}

impl DrawCall {
    /// True for calls that put paint on the surface.
    pub fn is_paint(&self) -> bool {
        matches!(
            self,
            DrawCall::FillRect { .. }
                | DrawCall::FillCircle { .. }
                | DrawCall::DrawImage { .. }
                | DrawCall::FillText { .. }
        )
    }
}

/// Headless surface that records calls instead of rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn paint_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|call| call.is_paint())
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(DrawCall::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn set_fill_color(&mut self, color: Color) {
        self.calls.push(DrawCall::SetFillColor(color));
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(DrawCall::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        self.calls.push(DrawCall::FillCircle { cx, cy, radius });
    }

    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64) {
        self.calls.push(DrawCall::DrawImage {
            bitmap_width: bitmap.width(),
            bitmap_height: bitmap.height(),
            x,
            y,
            width,
            height,
        });
    }

    fn set_font(&mut self, font: &str) {
        self.calls.push(DrawCall::SetFont(font.to_string()));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.calls.push(DrawCall::SetTextAlign(align));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) {
        self.calls.push(DrawCall::FillText {
            text: text.to_string(),
            x,
            y,
            max_width,
        });
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.calls.push(DrawCall::Translate { dx, dy });
    }

    fn rotate(&mut self, radians: f64) {
        self.calls.push(DrawCall::Rotate { radians });
    }

    fn reset_transform(&mut self) {
        self.calls.push(DrawCall::ResetTransform);
    }
}
