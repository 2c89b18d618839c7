//! The Document: base image, canvas size and marker store for one session.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::error::{LimitError, LimitErrorKind};
use image::{ImageError, RgbaImage};
use std::fmt;
use tiny_skia::{ColorU8, Pixmap};

use crate::error::{AnnotateError, Result};
use crate::geometry::SurfaceSize;
use crate::store::MarkerStore;

/// Canvas size used while no image is loaded.
pub const PLACEHOLDER_SIZE: SurfaceSize = SurfaceSize::new(800, 600);

/// A decoded photograph together with the self-contained `data:` URL it
/// came from, so a project can be exported without touching the filesystem.
///
/// Pixels are kept premultiplied, ready to be drawn onto a surface.
#[derive(Clone)]
pub struct BaseImage {
    pixmap: Pixmap,
    data_url: String,
}

impl BaseImage {
    /// Decode an encoded image file (PNG, JPEG, ...) and keep its bytes.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        let pixels = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
        let data_url = format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(bytes)
        );
        Ok(Self {
            pixmap: premultiply(&pixels)?,
            data_url,
        })
    }

    /// Decode an embedded `data:<mime>;base64,<payload>` image.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let bytes = decode_data_url(data_url)?;
        let format = image::guess_format(&bytes)
            .map_err(|e| AnnotateError::malformed(format!("imageSrc is not an image: {e}")))?;
        let pixmap = image::load_from_memory_with_format(&bytes, format)
            .and_then(|img| premultiply(&img.to_rgba8()))
            .map_err(|e| AnnotateError::malformed(format!("imageSrc could not be decoded: {e}")))?;
        Ok(Self {
            pixmap,
            data_url: data_url.to_string(),
        })
    }

    pub(crate) fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn native_size(&self) -> SurfaceSize {
        SurfaceSize::new(self.pixmap.width(), self.pixmap.height())
    }
}

impl PartialEq for BaseImage {
    fn eq(&self, other: &Self) -> bool {
        self.data_url == other.data_url && self.pixmap.data() == other.pixmap.data()
    }
}

impl fmt::Debug for BaseImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseImage")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("data_url_len", &self.data_url.len())
            .finish()
    }
}

fn premultiply(pixels: &RgbaImage) -> std::result::Result<Pixmap, ImageError> {
    let mut pixmap = Pixmap::new(pixels.width(), pixels.height()).ok_or_else(|| {
        ImageError::Limits(LimitError::from_kind(LimitErrorKind::DimensionError))
    })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(pixels.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| AnnotateError::malformed("imageSrc must be a data: URL"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AnnotateError::malformed("imageSrc has no payload"))?;
    if !header.ends_with(";base64") {
        return Err(AnnotateError::malformed("imageSrc must be base64 encoded"));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AnnotateError::malformed(format!("imageSrc payload: {e}")))
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    image: Option<BaseImage>,
    canvas: SurfaceSize,
    store: MarkerStore,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document showing the placeholder.
    pub fn new() -> Self {
        Self {
            image: None,
            canvas: PLACEHOLDER_SIZE,
            store: MarkerStore::new(),
        }
    }

    /// A fresh document bound to `image`, canvas at the image's native size.
    pub fn with_image(image: BaseImage) -> Self {
        let canvas = image.native_size();
        Self {
            image: Some(image),
            canvas,
            store: MarkerStore::new(),
        }
    }

    pub(crate) fn from_parts(image: BaseImage, canvas: SurfaceSize, store: MarkerStore) -> Self {
        Self {
            image: Some(image),
            canvas,
            store,
        }
    }

    pub fn image(&self) -> Option<&BaseImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn require_image(&self) -> Result<&BaseImage> {
        self.image.as_ref().ok_or(AnnotateError::NoImageLoaded)
    }

    /// Logical size marker coordinates are relative to.
    pub fn canvas(&self) -> SurfaceSize {
        self.canvas
    }

    pub fn store(&self) -> &MarkerStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MarkerStore {
        &mut self.store
    }
}
