use crate::images::Bitmap;

use super::glyphs::{self, ADVANCE_COLUMNS, GLYPH_COLUMNS, GLYPH_ROWS};
use super::{font_pixels, Color, Surface, TextAlign};

const CLEAR_PIXEL: [u8; 4] = [0, 0, 0, 0];
const DEFAULT_FONT_PIXELS: f64 = 10.0;
const SINGULAR_EPSILON: f64 = 1e-12;

/// Canvas-style affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn translate(&mut self, tx: f64, ty: f64) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    fn rotate(&mut self, radians: f64) {
        let (sin, cos) = radians.sin_cos();
        let Affine { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaintMode {
    Blend,
    Replace,
}

/// Software RGBA8 rasterizer implementing [`Surface`].
///
/// Shapes are sampled at pixel centres through the inverse of the current transform, so rotated
/// draws need no special casing. Images are sampled nearest-neighbour. Text uses the built-in
/// glyph font scaled to the font's pixel size.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    frame: Vec<u8>,
    transform: Affine,
    fill: Color,
    font_pixels: f64,
    text_align: TextAlign,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![0; width as usize * height as usize * 4],
            transform: Affine::IDENTITY,
            fill: Color::default(),
            font_pixels: DEFAULT_FONT_PIXELS,
            text_align: TextAlign::default(),
        }
    }

    /// Resizes the frame; existing pixels are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.frame = vec![0; width as usize * height as usize * 4];
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(self.frame.get(offset..offset + 4)?);
        Some(rgba)
    }

    /// Copies as much of the frame as fits into `target`, e.g. a `pixels` frame buffer.
    pub fn copy_to(&self, target: &mut [u8]) {
        let len = target.len().min(self.frame.len());
        target[..len].copy_from_slice(&self.frame[..len]);
    }

    fn paint_local<F>(
        &mut self,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        mode: PaintMode,
        shade: F,
    ) where
        F: Fn(f64, f64) -> Option<[u8; 4]>,
    {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let Some(inverse) = self.transform.inverse() else {
            return;
        };

        let corners = [
            self.transform.apply(left, top),
            self.transform.apply(right, top),
            self.transform.apply(left, bottom),
            self.transform.apply(right, bottom),
        ];
        let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
        if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
            return;
        }

        let start_x = min_x.floor().clamp(0.0, self.width as f64) as u32;
        let end_x = max_x.ceil().clamp(0.0, self.width as f64) as u32;
        let start_y = min_y.floor().clamp(0.0, self.height as f64) as u32;
        let end_y = max_y.ceil().clamp(0.0, self.height as f64) as u32;

        let row_stride = self.width as usize * 4;
        for py in start_y..end_y {
            for px in start_x..end_x {
                let (lx, ly) = inverse.apply(px as f64 + 0.5, py as f64 + 0.5);
                let Some(color) = shade(lx, ly) else {
                    continue;
                };
                let offset = py as usize * row_stride + px as usize * 4;
                let Some(target) = self.frame.get_mut(offset..offset + 4) else {
                    continue;
                };
                match mode {
                    PaintMode::Replace => target.copy_from_slice(&color),
                    PaintMode::Blend => blend_over(target, color),
                }
            }
        }
    }
}

fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let src_alpha = src[3] as u32;
    if src_alpha == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    if src_alpha == 0 {
        return;
    }
    let inv_alpha = 255 - src_alpha;
    for channel in 0..3 {
        dst[channel] =
            ((src[channel] as u32 * src_alpha + dst[channel] as u32 * inv_alpha + 127) / 255) as u8;
    }
    dst[3] = (src_alpha + (dst[3] as u32 * inv_alpha + 127) / 255) as u8;
}

fn normalized_span(origin: f64, extent: f64) -> (f64, f64) {
    if extent < 0.0 {
        (origin + extent, origin)
    } else {
        (origin, origin + extent)
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (left, right) = normalized_span(x, width);
        let (top, bottom) = normalized_span(y, height);
        self.paint_local(left, top, right, bottom, PaintMode::Replace, |lx, ly| {
            (lx >= left && lx < right && ly >= top && ly < bottom).then_some(CLEAR_PIXEL)
        });
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (left, right) = normalized_span(x, width);
        let (top, bottom) = normalized_span(y, height);
        let color = self.fill.to_array();
        self.paint_local(left, top, right, bottom, PaintMode::Blend, |lx, ly| {
            (lx >= left && lx < right && ly >= top && ly < bottom).then_some(color)
        });
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64) {
        if radius <= 0.0 {
            return;
        }
        let color = self.fill.to_array();
        let radius_sq = radius * radius;
        self.paint_local(
            cx - radius,
            cy - radius,
            cx + radius,
            cy + radius,
            PaintMode::Blend,
            |lx, ly| {
                let (dx, dy) = (lx - cx, ly - cy);
                (dx * dx + dy * dy <= radius_sq).then_some(color)
            },
        );
    }

    fn draw_image(&mut self, bitmap: &Bitmap, x: f64, y: f64, width: f64, height: f64) {
        if bitmap.width() == 0 || bitmap.height() == 0 || width == 0.0 || height == 0.0 {
            return;
        }
        let (left, right) = normalized_span(x, width);
        let (top, bottom) = normalized_span(y, height);
        let scale_x = bitmap.width() as f64 / width;
        let scale_y = bitmap.height() as f64 / height;
        self.paint_local(left, top, right, bottom, PaintMode::Blend, |lx, ly| {
            let u = ((lx - x) * scale_x).floor();
            let v = ((ly - y) * scale_y).floor();
            if u < 0.0 || v < 0.0 {
                return None;
            }
            bitmap.pixel(u as u32, v as u32)
        });
    }

    fn set_font(&mut self, font: &str) {
        if let Some(pixels) = font_pixels(font) {
            self.font_pixels = pixels;
        }
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.text_align = align;
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) {
        let cell = glyphs::cell_size(self.font_pixels);
        if cell <= 0.0 {
            return;
        }
        let natural_width = glyphs::line_advance(text, self.font_pixels);
        let squeeze = match max_width {
            Some(limit) if natural_width > 0.0 && natural_width > limit => {
                limit.max(0.0) / natural_width
            }
            _ => 1.0,
        };
        let cell_width = cell * squeeze;
        let line_width = natural_width * squeeze;
        let start_x = match self.text_align {
            TextAlign::Left => x,
            TextAlign::Center => x - line_width / 2.0,
            TextAlign::Right => x - line_width,
        };
        let top = y - GLYPH_ROWS as f64 * cell;

        for (index, ch) in text.chars().enumerate() {
            let Some(rows) = glyphs::glyph_rows(ch) else {
                continue;
            };
            let glyph_x = start_x + (index as u32 * ADVANCE_COLUMNS) as f64 * cell_width;
            for (row, bits) in rows.iter().enumerate() {
                for column in 0..GLYPH_COLUMNS {
                    if bits & (1 << (GLYPH_COLUMNS - 1 - column)) == 0 {
                        continue;
                    }
                    self.fill_rect(
                        glyph_x + column as f64 * cell_width,
                        top + row as f64 * cell,
                        cell_width,
                        cell,
                    );
                }
            }
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.transform.rotate(radians);
    }

    fn reset_transform(&mut self) {
        self.transform = Affine::IDENTITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::rotate_about_center;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn painted(surface: &PixelSurface, x: u32, y: u32) -> bool {
        surface.pixel(x, y).map(|rgba| rgba[3] > 0).unwrap_or(false)
    }

    #[test]
    fn fill_rect_covers_only_its_pixels() {
        let mut surface = PixelSurface::new(4, 4);
        surface.set_fill_color(Color::rgb(255, 0, 0));
        surface.fill_rect(1.0, 1.0, 2.0, 2.0);

        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(2, 2), Some(RED));
        assert!(!painted(&surface, 0, 0));
        assert!(!painted(&surface, 3, 3));
    }

    #[test]
    fn rotation_about_center_turns_top_row_into_right_column() {
        let mut surface = PixelSurface::new(4, 4);
        surface.set_fill_color(Color::rgb(255, 0, 0));
        rotate_about_center(&mut surface, 90.0, 0.0, 0.0, 4.0, 4.0);
        surface.fill_rect(0.0, 0.0, 4.0, 1.0);

        for y in 0..4 {
            assert!(painted(&surface, 3, y), "right column row {y}");
            assert!(!painted(&surface, 0, y), "left column row {y}");
        }
    }

    #[test]
    fn reset_transform_restores_identity() {
        let mut surface = PixelSurface::new(4, 4);
        surface.translate(2.0, 2.0);
        surface.rotate(1.0);
        surface.reset_transform();
        surface.fill_rect(0.0, 0.0, 1.0, 1.0);

        assert!(painted(&surface, 0, 0));
        assert!(!painted(&surface, 1, 1));
    }

    #[test]
    fn fill_circle_paints_disc() {
        let mut surface = PixelSurface::new(9, 9);
        surface.fill_circle(4.5, 4.5, 3.0);

        assert!(painted(&surface, 4, 4));
        assert!(painted(&surface, 2, 4));
        assert!(!painted(&surface, 0, 0));
        assert!(!painted(&surface, 8, 8));
    }

    #[test]
    fn clear_rect_replaces_instead_of_blending() {
        let mut surface = PixelSurface::new(2, 2);
        surface.fill_rect(0.0, 0.0, 2.0, 2.0);
        surface.clear_rect(0.0, 0.0, 1.0, 2.0);

        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn translucent_fill_blends_over_existing_pixels() {
        let mut surface = PixelSurface::new(1, 1);
        surface.set_fill_color(Color::WHITE);
        surface.fill_rect(0.0, 0.0, 1.0, 1.0);
        surface.set_fill_color(Color::rgba(0, 0, 0, 128));
        surface.fill_rect(0.0, 0.0, 1.0, 1.0);

        assert_eq!(surface.pixel(0, 0), Some([127, 127, 127, 255]));
    }

    #[test]
    fn draw_image_scales_nearest_neighbour() {
        let mut rgba = RED.to_vec();
        rgba.extend_from_slice(&BLUE);
        let bitmap = Bitmap::from_rgba(2, 1, rgba).expect("bitmap");
        let mut surface = PixelSurface::new(4, 1);
        surface.draw_image(&bitmap, 0.0, 0.0, 4.0, 1.0);

        assert_eq!(surface.pixel(0, 0), Some(RED));
        assert_eq!(surface.pixel(1, 0), Some(RED));
        assert_eq!(surface.pixel(2, 0), Some(BLUE));
        assert_eq!(surface.pixel(3, 0), Some(BLUE));
    }

    #[test]
    fn fill_text_honours_alignment() {
        let mut surface = PixelSurface::new(16, 8);
        surface.set_font("7px monospace");
        surface.fill_text("1", 0.0, 5.0, None);
        assert!(painted(&surface, 1, 0));
        assert!(!painted(&surface, 0, 0));

        let mut surface = PixelSurface::new(16, 8);
        surface.set_font("7px monospace");
        surface.set_text_align(TextAlign::Right);
        surface.fill_text("1", 8.0, 5.0, None);
        assert!(painted(&surface, 5, 0));
        assert!(!painted(&surface, 1, 0));
    }

    #[test]
    fn fill_text_squeezes_to_max_width() {
        let mut surface = PixelSurface::new(16, 8);
        surface.set_font("7px monospace");
        surface.fill_text("11", 0.0, 5.0, Some(4.0));

        for x in 4..16 {
            for y in 0..8 {
                assert!(!painted(&surface, x, y), "pixel {x},{y} outside max width");
            }
        }
        assert!(painted(&surface, 2, 0));
    }

    #[test]
    fn copy_to_and_resize() {
        let mut surface = PixelSurface::new(1, 1);
        surface.fill_rect(0.0, 0.0, 1.0, 1.0);
        let mut target = [9u8; 8];
        surface.copy_to(&mut target);
        assert_eq!(target, [0, 0, 0, 255, 9, 9, 9, 9]);

        surface.resize(2, 2);
        assert_eq!(surface.frame().len(), 16);
        assert!(surface.frame().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn drawing_on_empty_surface_is_safe() {
        let mut surface = PixelSurface::new(0, 0);
        surface.fill_rect(-5.0, -5.0, 50.0, 50.0);
        surface.fill_text("hello", 0.0, 0.0, None);
        assert!(surface.frame().is_empty());
    }
}
