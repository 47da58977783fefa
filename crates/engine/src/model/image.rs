use tracing::info;

use crate::entity::Entity;
use crate::images::{Bitmap, BitmapSlot, ImageLoader, ImageRequest};
use crate::surface::{Surface, TransformGuard};

/// Bitmap drawn at a fixed size; the bitmap itself arrives asynchronously.
///
/// Rendering before the bitmap resolves issues another load request and skips the draw for that
/// frame. Once resolved, the bitmap is cached in the slot and drawn immediately on every render.
#[derive(Debug, Clone)]
pub struct ImageModel {
    width: f64,
    height: f64,
    url: Option<String>,
    slot: BitmapSlot,
}

impl ImageModel {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            url: None,
            slot: BitmapSlot::new(),
        }
    }

    /// Sets the source URL without loading it; the first render requests it.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.slot = BitmapSlot::new();
        self
    }

    /// Points the model at a new URL and starts loading it right away.
    pub fn set_url(&mut self, url: impl Into<String>, loader: &dyn ImageLoader) -> &mut Self {
        self.url = Some(url.into());
        self.slot = BitmapSlot::new();
        self.load(loader);
        self
    }

    /// Replaces the cached bitmap with an already decoded one.
    pub fn set_bitmap(&mut self, bitmap: Bitmap) -> &mut Self {
        let slot = BitmapSlot::new();
        slot.resolve(bitmap);
        self.slot = slot;
        self
    }

    /// Requests the bitmap for the current URL. Does nothing without a URL.
    pub fn load(&self, loader: &dyn ImageLoader) {
        let Some(url) = &self.url else {
            return;
        };
        loader.load(ImageRequest {
            url: url.clone(),
            size: self.target_size(),
            slot: self.slot.clone(),
        });
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.slot.get()
    }

    pub fn slot(&self) -> &BitmapSlot {
        &self.slot
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    fn target_size(&self) -> Option<(u32, u32)> {
        let (width, height) = (self.width.round(), self.height.round());
        (width >= 1.0 && height >= 1.0).then_some((width as u32, height as u32))
    }

    pub(crate) fn render(
        &self,
        entity: &Entity,
        surface: &mut dyn Surface,
        images: &dyn ImageLoader,
    ) {
        let Some(bitmap) = self.slot.get() else {
            if let Some(url) = &self.url {
                info!(url = %url, entity = entity.id().0, "image_not_loaded_retrying");
                self.load(images);
            }
            return;
        };

        let (x, y) = (entity.x(), entity.y());
        let mut surface =
            TransformGuard::rotated(surface, entity.angle(), x, y, self.width, self.height);
        surface.draw_image(bitmap, x, y, self.width, self.height);
    }
}
