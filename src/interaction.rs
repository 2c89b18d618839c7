//! Pointer-driven marker creation.
//!
//! Point categories commit on pointer-down. Path categories capture a
//! freehand stroke between pointer-down and pointer-up (or leave/cancel)
//! and commit it if it has enough points.

use crate::document::Document;
use crate::error::Result;
use crate::model::{Category, ImagePoint, ShapeKind};
use crate::render::InProgressPath;

/// Pointer input already mapped into image space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(ImagePoint),
    Move(ImagePoint),
    Up,
    /// The pointer left the surface.
    Leave,
    /// Touch cancel or an equivalent host event.
    Cancel,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    CapturingPath {
        category: Category,
        points: Vec<ImagePoint>,
    },
}

/// What the host should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Nothing changed.
    Unchanged,
    /// Only the live stroke changed; redraw to show it.
    Redraw,
    /// A marker was added to the store.
    Committed { category: Category, number: u32 },
}

#[derive(Clone, Debug, Default)]
pub struct Interaction {
    active: Category,
    state: InteractionState,
}

impl Interaction {
    pub fn new(active: Category) -> Self {
        Self {
            active,
            state: InteractionState::Idle,
        }
    }

    pub fn active_category(&self) -> Category {
        self.active
    }

    /// Applies to the next stroke or click; a stroke in progress keeps its
    /// own category.
    pub fn set_active_category(&mut self, category: Category) {
        self.active = category;
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, InteractionState::CapturingPath { .. })
    }

    /// The live stroke to draw on top of the committed markers.
    pub fn pending(&self) -> Option<InProgressPath<'_>> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::CapturingPath { category, points } => Some(InProgressPath {
                category: *category,
                points,
            }),
        }
    }

    /// Drop any stroke in progress without committing it.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Feed one pointer event.
    ///
    /// Events are ignored while no image is loaded. A rejected commit
    /// returns the error and leaves the machine idle with the store untouched.
    pub fn handle(&mut self, document: &mut Document, event: PointerEvent) -> Result<Response> {
        if !document.has_image() {
            return Ok(Response::Unchanged);
        }

        match event {
            PointerEvent::Down(point) if !self.is_capturing() => match self.active.shape() {
                ShapeKind::Point => {
                    let marker = document
                        .store_mut()
                        .create_point_marker(self.active, point)?;
                    Ok(Response::Committed {
                        category: marker.category,
                        number: marker.number,
                    })
                }
                ShapeKind::Path => {
                    self.state = InteractionState::CapturingPath {
                        category: self.active,
                        points: vec![point],
                    };
                    Ok(Response::Redraw)
                }
            },
            PointerEvent::Move(point) => match &mut self.state {
                InteractionState::CapturingPath { points, .. } => {
                    points.push(point);
                    Ok(Response::Redraw)
                }
                InteractionState::Idle => Ok(Response::Unchanged),
            },
            PointerEvent::Up | PointerEvent::Leave | PointerEvent::Cancel => {
                let InteractionState::CapturingPath { category, points } =
                    std::mem::take(&mut self.state)
                else {
                    return Ok(Response::Unchanged);
                };
                let marker = document.store_mut().create_path_marker(category, points)?;
                Ok(Response::Committed {
                    category: marker.category,
                    number: marker.number,
                })
            }
            PointerEvent::Down(_) => Ok(Response::Unchanged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BaseImage;
    use crate::error::AnnotateError;
    use crate::model::MarkerGeometry;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn loaded_document() -> Document {
        let img = RgbaImage::from_pixel(100, 100, image::Rgba([0, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        Document::with_image(BaseImage::from_encoded(&out.into_inner()).unwrap())
    }

    fn pt(x: f32, y: f32) -> ImagePoint {
        ImagePoint::new(x, y)
    }

    #[test]
    fn test_point_category_commits_on_down() {
        let mut doc = loaded_document();
        let mut ix = Interaction::new(Category::Bolt);
        let response = ix.handle(&mut doc, PointerEvent::Down(pt(3.0, 4.0))).unwrap();
        assert_eq!(
            response,
            Response::Committed {
                category: Category::Bolt,
                number: 1
            }
        );
        assert!(!ix.is_capturing());
        assert_eq!(
            doc.store().markers()[0].geometry,
            MarkerGeometry::Point(pt(3.0, 4.0))
        );
    }

    #[test]
    fn test_path_capture_and_commit() {
        let mut doc = loaded_document();
        let mut ix = Interaction::new(Category::Component);
        assert_eq!(
            ix.handle(&mut doc, PointerEvent::Down(pt(0.0, 0.0))).unwrap(),
            Response::Redraw
        );
        ix.handle(&mut doc, PointerEvent::Move(pt(1.0, 1.0))).unwrap();
        ix.handle(&mut doc, PointerEvent::Move(pt(2.0, 0.0))).unwrap();

        let pending = ix.pending().unwrap();
        assert_eq!(pending.category, Category::Component);
        assert_eq!(pending.points.len(), 3);
        assert!(doc.store().is_empty());

        let response = ix.handle(&mut doc, PointerEvent::Up).unwrap();
        assert_eq!(
            response,
            Response::Committed {
                category: Category::Component,
                number: 1
            }
        );
        assert!(ix.pending().is_none());
        assert_eq!(
            doc.store().markers()[0].geometry,
            MarkerGeometry::Path(vec![pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, 0.0)])
        );
    }

    #[test]
    fn test_short_stroke_is_rejected_and_discarded() {
        let mut doc = loaded_document();
        let mut ix = Interaction::new(Category::Custom);
        ix.handle(&mut doc, PointerEvent::Down(pt(0.0, 0.0))).unwrap();
        ix.handle(&mut doc, PointerEvent::Move(pt(1.0, 0.0))).unwrap();
        let err = ix.handle(&mut doc, PointerEvent::Up).unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidGeometry { points: 2, .. }));
        assert!(!ix.is_capturing());
        assert!(doc.store().is_empty());
        assert_eq!(doc.store().counters().get(Category::Custom), 1);
    }

    #[test]
    fn test_leave_and_cancel_finalize_like_up() {
        for end in [PointerEvent::Leave, PointerEvent::Cancel] {
            let mut doc = loaded_document();
            let mut ix = Interaction::new(Category::Custom);
            ix.handle(&mut doc, PointerEvent::Down(pt(0.0, 0.0))).unwrap();
            ix.handle(&mut doc, PointerEvent::Move(pt(1.0, 0.0))).unwrap();
            ix.handle(&mut doc, PointerEvent::Move(pt(2.0, 0.0))).unwrap();
            ix.handle(&mut doc, end).unwrap();
            assert_eq!(doc.store().len(), 1);
            assert!(!ix.is_capturing());
        }
    }

    #[test]
    fn test_events_without_image_are_ignored() {
        let mut doc = Document::new();
        let mut ix = Interaction::new(Category::Component);
        for event in [
            PointerEvent::Down(pt(1.0, 1.0)),
            PointerEvent::Move(pt(2.0, 2.0)),
            PointerEvent::Up,
        ] {
            assert_eq!(ix.handle(&mut doc, event).unwrap(), Response::Unchanged);
        }
        assert!(!ix.is_capturing());
        assert!(doc.store().is_empty());
    }

    #[test]
    fn test_moves_and_ups_while_idle_do_nothing() {
        let mut doc = loaded_document();
        let mut ix = Interaction::new(Category::Component);
        assert_eq!(
            ix.handle(&mut doc, PointerEvent::Move(pt(1.0, 1.0))).unwrap(),
            Response::Unchanged
        );
        assert_eq!(ix.handle(&mut doc, PointerEvent::Up).unwrap(), Response::Unchanged);
        assert!(doc.store().is_empty());
    }

    #[test]
    fn test_category_switch_mid_stroke_keeps_stroke_category() {
        let mut doc = loaded_document();
        let mut ix = Interaction::new(Category::Component);
        ix.handle(&mut doc, PointerEvent::Down(pt(0.0, 0.0))).unwrap();
        ix.set_active_category(Category::Screw);
        ix.handle(&mut doc, PointerEvent::Move(pt(1.0, 0.0))).unwrap();
        ix.handle(&mut doc, PointerEvent::Move(pt(2.0, 0.0))).unwrap();
        ix.handle(&mut doc, PointerEvent::Up).unwrap();
        assert_eq!(doc.store().markers()[0].category, Category::Component);
        assert_eq!(ix.active_category(), Category::Screw);
    }
}
