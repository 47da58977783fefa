use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::surface::PixelSurface;

/// Scales a fixed-size [`PixelSurface`] onto the window through `pixels`.
pub(crate) struct FramePresenter {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
}

impl FramePresenter {
    pub(crate) fn new(
        window: Arc<Window>,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            size.width.max(1),
            size.height.max(1),
            buffer_width,
            buffer_height,
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
        })
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            width,
            height,
            self.buffer_width,
            self.buffer_height,
        )?;
        Ok(())
    }

    pub(crate) fn present(&mut self, surface: &PixelSurface) -> Result<(), Error> {
        surface.copy_to(self.pixels.frame_mut());
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        surface_width: u32,
        surface_height: u32,
        buffer_width: u32,
        buffer_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer_width.max(1), buffer_height.max(1), surface)
    }
}
