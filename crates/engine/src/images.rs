use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;

use image::imageops::FilterType;
use thiserror::Error;
use tracing::{debug, warn};

/// Decoded straight-alpha RGBA8 pixels. Cloning shares the pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitmapError {
    #[error("pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

impl Bitmap {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, BitmapError> {
        let expected = width as usize * height as usize * 4;
        let actual = rgba.len();
        if expected != actual {
            return Err(BitmapError::LengthMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into(),
        })
    }

    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            rgba: pixels.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut texel = [0u8; 4];
        texel.copy_from_slice(self.rgba.get(offset..offset + 4)?);
        Some(texel)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Assign-once cell a loader resolves when decoding finishes.
///
/// Clones share the same cell, so a late resolution for a removed entity lands harmlessly in a
/// slot nobody reads anymore. Only the first resolution wins.
#[derive(Debug, Clone, Default)]
pub struct BitmapSlot(Arc<OnceLock<Bitmap>>);

impl BitmapSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Bitmap> {
        self.0.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }

    /// Stores `bitmap` if the slot is still empty. Returns whether this call resolved it.
    pub fn resolve(&self, bitmap: Bitmap) -> bool {
        self.0.set(bitmap).is_ok()
    }

    pub fn shares_with(&self, other: &BitmapSlot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub url: String,
    /// Target dimensions; the decoded image is resized to them when present.
    pub size: Option<(u32, u32)>,
    pub slot: BitmapSlot,
}

/// Asynchronous "load image by URL" capability injected into the scene.
///
/// Implementations resolve `request.slot` at some later point, or never on failure. There is no
/// cancellation and no error channel back to the caller.
pub trait ImageLoader {
    fn load(&self, request: ImageRequest);
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to decode image at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image at {path} decoded to an invalid buffer: {source}")]
    Buffer {
        path: PathBuf,
        #[source]
        source: BitmapError,
    },
}

/// Decodes image files on a background thread.
///
/// URLs are file paths, optionally prefixed with `file://`; relative paths resolve against
/// `base_dir` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    base_dir: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve_path(&self, url: &str) -> PathBuf {
        let raw = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.base_dir {
            Some(base) if raw.is_relative() => base.join(raw),
            _ => raw.to_path_buf(),
        }
    }

    pub fn load_blocking(
        &self,
        url: &str,
        size: Option<(u32, u32)>,
    ) -> Result<Bitmap, ImageLoadError> {
        decode_image_file(&self.resolve_path(url), size)
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, request: ImageRequest) {
        let path = self.resolve_path(&request.url);
        let spawned = thread::Builder::new()
            .name("image-loader".to_string())
            .spawn(move || match decode_image_file(&path, request.size) {
                Ok(bitmap) => {
                    if !request.slot.resolve(bitmap) {
                        debug!(url = %request.url, "image_already_resolved");
                    }
                }
                Err(error) => {
                    warn!(url = %request.url, error = %error, "image_load_failed");
                }
            });
        if let Err(error) = spawned {
            warn!(error = %error, "image_loader_spawn_failed");
        }
    }
}

fn decode_image_file(path: &Path, size: Option<(u32, u32)>) -> Result<Bitmap, ImageLoadError> {
    let decoded = image::open(path).map_err(|source| ImageLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rgba = decoded.to_rgba8();
    if let Some((width, height)) = size {
        if width > 0 && height > 0 && (width, height) != rgba.dimensions() {
            rgba = image::imageops::resize(&rgba, width, height, FilterType::Nearest);
        }
    }
    let (width, height) = rgba.dimensions();
    Bitmap::from_rgba(width, height, rgba.into_raw()).map_err(|source| ImageLoadError::Buffer {
        path: path.to_path_buf(),
        source,
    })
}
