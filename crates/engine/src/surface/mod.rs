mod color;
pub(crate) mod glyphs;
mod pixel;
mod recording;

use std::f64::consts::PI;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::images::Bitmap;

pub use color::{Color, ColorError};
pub use pixel::PixelSurface;
pub use recording::{DrawCall, RecordingSurface};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Width and height of a drawing surface, used for border math.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Immediate-mode 2D drawing context.
///
/// Coordinates are surface pixels with the origin at the top-left corner and y pointing down.
/// `translate` and `rotate` compose onto the current transform until `reset_transform`.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn set_fill_color(&mut self, color: Color);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64);
    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64);

    /// CSS-style font shorthand, `"{pixels}px {family}"`.
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    /// Draws one line with its baseline at `y`, squeezed horizontally to fit `max_width`.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>);

    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, radians: f64);
    fn reset_transform(&mut self);

    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width() as f64, self.height() as f64)
    }
}

/// Rotates the surface by `angle_degrees` (clockwise) about the centre of the box at
/// `(x, y)` sized `width x height`. Callers must reset the transform afterwards.
pub fn rotate_about_center<S: Surface + ?Sized>(
    surface: &mut S,
    angle_degrees: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) {
    let cx = x + width / 2.0;
    let cy = y + height / 2.0;
    surface.translate(cx, cy);
    surface.rotate(angle_degrees * PI / 180.0);
    surface.translate(-cx, -cy);
}

/// Scoped centre-pivot rotation; resets the surface transform to identity when dropped.
pub struct TransformGuard<'a> {
    surface: &'a mut dyn Surface,
}

impl<'a> TransformGuard<'a> {
    pub fn rotated(
        surface: &'a mut dyn Surface,
        angle_degrees: f64,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        rotate_about_center(&mut *surface, angle_degrees, x, y, width, height);
        Self { surface }
    }
}

impl<'a> Deref for TransformGuard<'a> {
    type Target = dyn Surface + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.surface
    }
}

impl<'a> DerefMut for TransformGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.surface
    }
}

impl Drop for TransformGuard<'_> {
    fn drop(&mut self) {
        self.surface.reset_transform();
    }
}

/// Parses the pixel size out of a `"{pixels}px {family}"` font string.
pub(crate) fn font_pixels(font: &str) -> Option<f64> {
    let size = font.split_whitespace().find(|token| token.ends_with("px"))?;
    size.trim_end_matches("px").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_about_center_pivots_on_box_center() {
        let mut surface = RecordingSurface::new(100, 100);
        rotate_about_center(&mut surface, 90.0, 10.0, 20.0, 30.0, 40.0);

        let calls = surface.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], DrawCall::Translate { dx: 25.0, dy: 40.0 });
        assert!(
            matches!(calls[1], DrawCall::Rotate { radians } if (radians - PI / 2.0).abs() < 1e-12)
        );
        assert_eq!(
            calls[2],
            DrawCall::Translate {
                dx: -25.0,
                dy: -40.0
            }
        );
    }

    #[test]
    fn guard_resets_transform_on_drop() {
        let mut surface = RecordingSurface::new(10, 10);
        {
            let mut guard = TransformGuard::rotated(&mut surface, 0.0, 0.0, 0.0, 2.0, 2.0);
            guard.fill_rect(0.0, 0.0, 2.0, 2.0);
        }

        assert_eq!(surface.calls().last(), Some(&DrawCall::ResetTransform));
        assert_eq!(
            surface
                .calls()
                .iter()
                .filter(|call| **call == DrawCall::ResetTransform)
                .count(),
            1
        );
    }

    #[test]
    fn guard_resets_transform_when_drawing_panics() {
        let mut surface = RecordingSurface::new(10, 10);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = TransformGuard::rotated(&mut surface, 45.0, 0.0, 0.0, 2.0, 2.0);
            panic!("draw failed");
        }));

        assert!(result.is_err());
        assert_eq!(surface.calls().last(), Some(&DrawCall::ResetTransform));
    }

    #[test]
    fn font_pixels_reads_css_shorthand() {
        assert_eq!(font_pixels("12px monospace"), Some(12.0));
        assert_eq!(font_pixels("bold 9.5px serif"), Some(9.5));
        assert_eq!(font_pixels("serif"), None);
    }
}
