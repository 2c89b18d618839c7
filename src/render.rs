//! Full-repaint rendering of a Document onto a tiny-skia surface.
//!
//! The renderer only reads the Document. Every call clears the surface and
//! redraws image, markers and the live stroke, so the same input always
//! yields the same pixels.

use image::RgbaImage;
use tiny_skia::{
    Color, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, Stroke, Transform,
};

use crate::document::Document;
use crate::error::{AnnotateError, Result};
use crate::geometry::SurfaceSize;
use crate::glyphs;
use crate::model::{Category, ImagePoint, Marker, MarkerGeometry, Rgb};

/// Radius of a point-marker disc in canvas units.
pub const MARKER_RADIUS: f32 = 12.0;
/// Stroke width of freehand paths.
pub const PATH_WIDTH: f32 = 2.0;
/// Each glyph cell becomes a square of this many canvas units.
pub const GLYPH_SCALE: f32 = 2.0;
/// Gap between a path's first point and its label box.
pub const LABEL_MARGIN: f32 = 4.0;
pub const LABEL_PADDING: f32 = 3.0;

pub const PLACEHOLDER_FILL: Rgb = Rgb::new(0xe9, 0xec, 0xef);
pub const PLACEHOLDER_FRAME: Rgb = Rgb::new(0xad, 0xb5, 0xbd);

/// A freehand stroke still being captured, drawn in its category color.
#[derive(Clone, Copy, Debug)]
pub struct InProgressPath<'a> {
    pub category: Category,
    pub points: &'a [ImagePoint],
}

/// The display surface: a premultiplied RGBA pixel buffer.
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Returns `None` for a zero-sized or oversized surface.
    pub fn new(size: SurfaceSize) -> Option<Self> {
        Pixmap::new(size.width, size.height).map(|pixmap| Self { pixmap })
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Reallocate if `size` differs. Contents are undefined until the next render.
    pub fn resize(&mut self, size: SurfaceSize) -> bool {
        if size == self.size() {
            return true;
        }
        match Pixmap::new(size.width, size.height) {
            Some(pixmap) => {
                self.pixmap = pixmap;
                true
            }
            None => false,
        }
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.pixmap.width(), self.pixmap.height(), |x, y| {
            let c = self
                .pixmap
                .pixel(x, y)
                .unwrap_or(PremultipliedColorU8::TRANSPARENT)
                .demultiply();
            image::Rgba([c.red(), c.green(), c.blue(), c.alpha()])
        })
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }
}

fn solid(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

/// Redraw `document` onto `surface`.
///
/// Marker coordinates are relative to the document canvas; when the
/// surface has a different size they are scaled to follow the image.
pub fn render(surface: &mut Surface, document: &Document, in_progress: Option<InProgressPath<'_>>) {
    let size = surface.size();
    let pixmap = &mut surface.pixmap;
    pixmap.fill(Color::TRANSPARENT);

    match document.image() {
        Some(image) => {
            let src = image.pixmap();
            let scale = Transform::from_scale(
                size.width as f32 / src.width() as f32,
                size.height as f32 / src.height() as f32,
            );
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..Default::default()
            };
            pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, scale, None);
        }
        None => draw_placeholder(pixmap),
    }

    let canvas = document.canvas();
    let ts = if canvas.is_empty() {
        Transform::identity()
    } else {
        Transform::from_scale(
            size.width as f32 / canvas.width as f32,
            size.height as f32 / canvas.height as f32,
        )
    };

    for marker in document.store().markers() {
        draw_marker(pixmap, marker, ts);
    }

    if let Some(live) = in_progress {
        stroke_polyline(pixmap, live.points, live.category.color(), ts);
    }
}

/// Render the document at canvas size for saving as a flat picture.
pub fn flatten(document: &Document) -> Result<RgbaImage> {
    document.require_image()?;
    let mut surface = Surface::new(document.canvas()).ok_or(AnnotateError::NoImageLoaded)?;
    render(&mut surface, document, None);
    Ok(surface.to_rgba_image())
}

fn draw_placeholder(pixmap: &mut Pixmap) {
    let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
    let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) else {
        return;
    };
    pixmap.fill_rect(rect, &solid(PLACEHOLDER_FILL), Transform::identity(), None);

    let frame = PathBuilder::from_rect(rect);
    let stroke = Stroke {
        width: 4.0,
        ..Default::default()
    };
    pixmap.stroke_path(&frame, &solid(PLACEHOLDER_FRAME), &stroke, Transform::identity(), None);
}

fn draw_marker(pixmap: &mut Pixmap, marker: &Marker, ts: Transform) {
    let color = marker.category.color();
    let label = marker.number.to_string();

    match &marker.geometry {
        MarkerGeometry::Point(center) => {
            if let Some(disc) = PathBuilder::from_circle(center.x, center.y, MARKER_RADIUS) {
                pixmap.fill_path(&disc, &solid(color), FillRule::Winding, ts, None);
            }
            let (w, h) = label_extent(&label);
            draw_digits(
                pixmap,
                &label,
                center.x - w / 2.0,
                center.y - h / 2.0,
                Rgb::WHITE,
                ts,
            );
        }
        MarkerGeometry::Path(points) => {
            stroke_polyline(pixmap, points, color, ts);
            let Some(first) = points.first() else {
                return;
            };
            let (w, h) = label_extent(&label);
            let box_w = w + LABEL_PADDING * 2.0;
            let box_h = h + LABEL_PADDING * 2.0;
            let left = first.x + LABEL_MARGIN;
            let top = first.y - LABEL_MARGIN - box_h;
            if let Some(rect) = Rect::from_xywh(left, top, box_w, box_h) {
                pixmap.fill_rect(rect, &solid(color), ts, None);
            }
            draw_digits(
                pixmap,
                &label,
                left + LABEL_PADDING,
                top + LABEL_PADDING,
                Rgb::BLACK,
                ts,
            );
        }
    }
}

/// Open polyline; the stroke is never closed back to its start.
fn stroke_polyline(pixmap: &mut Pixmap, points: &[ImagePoint], color: Rgb, ts: Transform) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width: PATH_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &solid(color), &stroke, ts, None);
}

fn label_extent(label: &str) -> (f32, f32) {
    (
        glyphs::text_width(label) as f32 * GLYPH_SCALE,
        glyphs::GLYPH_HEIGHT as f32 * GLYPH_SCALE,
    )
}

fn draw_digits(pixmap: &mut Pixmap, text: &str, x: f32, y: f32, color: Rgb, ts: Transform) {
    let mut paint = solid(color);
    paint.anti_alias = false;
    for (col, row) in glyphs::lit_cells(text) {
        let cell = Rect::from_xywh(
            x + col as f32 * GLYPH_SCALE,
            y + row as f32 * GLYPH_SCALE,
            GLYPH_SCALE,
            GLYPH_SCALE,
        );
        if let Some(cell) = cell {
            pixmap.fill_rect(cell, &paint, ts, None);
        }
    }
}
