//! Ordered marker collection with per-category numbering.

use crate::error::{AnnotateError, Result};
use crate::model::{Category, CategoryCounters, ImagePoint, Marker, MarkerGeometry, ShapeKind};

/// Fewest captured points a freehand path needs before it is committed.
pub const MIN_PATH_POINTS: usize = 3;

/// Markers in creation order plus the next number for each category.
///
/// Creation order is also the step order shown to the user and the order
/// written on export. Only the most recent marker can be edited or undone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    counters: CategoryCounters,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from imported markers.
    ///
    /// Each counter ends up at `max(imported, highest number seen + 1, 1)` so
    /// a stale or missing counter table can never hand out a number twice.
    pub fn from_parts(markers: Vec<Marker>, counters: Option<CategoryCounters>) -> Self {
        let mut counters = counters.unwrap_or_default();
        for category in Category::ALL {
            counters.set(category, counters.get(category));
        }
        for marker in &markers {
            let next = marker.number.saturating_add(1);
            if counters.get(marker.category) < next {
                counters.set(marker.category, next);
            }
        }
        Self { markers, counters }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn counters(&self) -> &CategoryCounters {
        &self.counters
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn last(&self) -> Option<&Marker> {
        self.markers.last()
    }

    pub fn create_point_marker(&mut self, category: Category, point: ImagePoint) -> Result<&Marker> {
        if category.shape() != ShapeKind::Point {
            return Err(AnnotateError::InvalidGeometry {
                category,
                points: 1,
                required: MIN_PATH_POINTS,
            });
        }
        self.push(category, MarkerGeometry::Point(point))
    }

    pub fn create_path_marker(
        &mut self,
        category: Category,
        points: Vec<ImagePoint>,
    ) -> Result<&Marker> {
        let required = match category.shape() {
            ShapeKind::Path => MIN_PATH_POINTS,
            ShapeKind::Point => 1,
        };
        if points.len() < required {
            return Err(AnnotateError::InvalidGeometry {
                category,
                points: points.len(),
                required,
            });
        }
        let geometry = match category.shape() {
            ShapeKind::Path => MarkerGeometry::Path(points),
            ShapeKind::Point => MarkerGeometry::Point(points[0]),
        };
        self.push(category, geometry)
    }

    fn push(&mut self, category: Category, geometry: MarkerGeometry) -> Result<&Marker> {
        let number = self
            .counters
            .take(category)
            .ok_or(AnnotateError::NumberingExhausted { category })?;
        self.markers.push(Marker {
            category,
            number,
            geometry,
            instructions: String::new(),
        });
        let marker = &self.markers[self.markers.len() - 1];
        tracing::debug!(category = %category, number, "marker created");
        Ok(marker)
    }

    /// Attach instructions to the most recent marker. Text is stored trimmed.
    pub fn set_last_instructions(&mut self, text: &str) -> Result<&Marker> {
        let Some(last) = self.markers.last_mut() else {
            return Err(AnnotateError::NoMarkers);
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(AnnotateError::EmptyInstructions);
        }
        last.instructions = text.to_string();
        Ok(&*last)
    }

    /// Remove the most recent marker and give its number back to its category.
    ///
    /// Instruction edits are not tracked, so undo only reverses creation.
    pub fn undo_last(&mut self) -> Result<Marker> {
        let last = self.markers.pop().ok_or(AnnotateError::NoMarkers)?;
        self.counters.set(last.category, last.number.max(1));
        tracing::debug!(category = %last.category, number = last.number, "marker undone");
        Ok(last)
    }

    pub fn reset(&mut self, counters: Option<CategoryCounters>) {
        self.markers.clear();
        self.counters = counters.unwrap_or_default();
    }
}
