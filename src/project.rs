//! Portable project files: JSON with the base image embedded as a data URL.
//!
//! ```json
//! {
//!   "imageSrc": "data:image/png;base64,...",
//!   "canvasWidth": 1600,
//!   "canvasHeight": 1200,
//!   "counters": { "screw": 3, "bolt": 1, "component": 2, "custom": 1 },
//!   "markers": [
//!     { "type": "screw", "number": 1, "points": [{ "x": 10.0, "y": 20.0 }], "instructions": "" }
//!   ]
//! }
//! ```
//!
//! Files written before points were unified carry `x`/`y` (point markers) or
//! `path` (freehand markers) instead of `points`, and may lack the canvas
//! size and counters. Those still import.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::document::{BaseImage, Document};
use crate::error::{AnnotateError, Result};
use crate::geometry::SurfaceSize;
use crate::model::{
    Category, CategoryCounters, ImagePoint, Marker, MarkerGeometry, ShapeKind, MAX_SEQUENCE_NUMBER,
};
use crate::store::MarkerStore;

pub const DEFAULT_FILE_NAME: &str = "jonnybox_project.json";

/// Largest side a recorded canvas may have when it differs from the image.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    image_src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canvas_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canvas_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    counters: Option<CategoryCounters>,
    markers: Vec<MarkerRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarkerRecord {
    #[serde(rename = "type")]
    kind: String,
    number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<Vec<ImagePoint>>,
    #[serde(default, skip_serializing)]
    x: Option<f32>,
    #[serde(default, skip_serializing)]
    y: Option<f32>,
    #[serde(default, skip_serializing)]
    path: Option<Vec<ImagePoint>>,
    #[serde(default)]
    instructions: Option<String>,
}

impl From<&Marker> for MarkerRecord {
    fn from(marker: &Marker) -> Self {
        Self {
            kind: marker.category.name().to_string(),
            number: marker.number,
            points: Some(marker.geometry.points().to_vec()),
            x: None,
            y: None,
            path: None,
            instructions: Some(marker.instructions.clone()),
        }
    }
}

impl MarkerRecord {
    fn into_marker(self, index: usize) -> Result<Marker> {
        let category = Category::from_name(&self.kind).ok_or_else(|| {
            AnnotateError::malformed(format!("marker {index}: unknown type {:?}", self.kind))
        })?;
        if !(1..=MAX_SEQUENCE_NUMBER).contains(&self.number) {
            return Err(AnnotateError::malformed(format!(
                "marker {index}: number must be between 1 and {MAX_SEQUENCE_NUMBER}"
            )));
        }

        let points = match (self.points, self.path, self.x, self.y) {
            (Some(points), _, _, _) => points,
            (None, Some(path), _, _) => path,
            (None, None, Some(x), Some(y)) => vec![ImagePoint::new(x, y)],
            _ => {
                return Err(AnnotateError::malformed(format!(
                    "marker {index}: no points"
                )))
            }
        };

        if points.is_empty() {
            return Err(AnnotateError::malformed(format!(
                "marker {index}: no points"
            )));
        }
        let geometry = match category.shape() {
            ShapeKind::Point if points.len() == 1 => MarkerGeometry::Point(points[0]),
            ShapeKind::Point => {
                return Err(AnnotateError::malformed(format!(
                    "marker {index}: {category} markers take exactly one point"
                )))
            }
            ShapeKind::Path => MarkerGeometry::Path(points),
        };

        Ok(Marker {
            category,
            number: self.number,
            geometry,
            instructions: self.instructions.unwrap_or_default(),
        })
    }
}

/// Encode `document` as a pretty-printed project file.
pub fn serialize(document: &Document) -> Result<Vec<u8>> {
    let image = document.require_image()?;
    let canvas = document.canvas();
    let store = document.store();
    let file = ProjectFile {
        image_src: image.data_url().to_string(),
        canvas_width: Some(canvas.width),
        canvas_height: Some(canvas.height),
        counters: Some(*store.counters()),
        markers: store.markers().iter().map(MarkerRecord::from).collect(),
    };
    Ok(serde_json::to_vec_pretty(&file)?)
}

/// A validated project whose image has not been decoded yet.
///
/// Decoding is the slow part of an import; it happens in
/// [`ParsedProject::into_document`], normally off the UI thread.
#[derive(Debug)]
pub struct ParsedProject {
    image_src: String,
    canvas: Option<SurfaceSize>,
    counters: Option<CategoryCounters>,
    markers: Vec<Marker>,
}

impl ParsedProject {
    /// Decode the embedded image and assemble the Document.
    ///
    /// Without a recorded canvas size the image's native size is used. A
    /// recorded size other than the native one must fit `MAX_CANVAS_SIDE`.
    pub fn into_document(self) -> Result<Document> {
        let image = BaseImage::from_data_url(&self.image_src)?;
        let native = image.native_size();
        let canvas = self.canvas.unwrap_or(native);
        if canvas != native && (canvas.width > MAX_CANVAS_SIDE || canvas.height > MAX_CANVAS_SIDE) {
            return Err(AnnotateError::malformed(format!(
                "canvas {}x{} is too large for a {}x{} image",
                canvas.width, canvas.height, native.width, native.height
            )));
        }
        let store = MarkerStore::from_parts(self.markers, self.counters);
        Ok(Document::from_parts(image, canvas, store))
    }
}

/// Check the shape of a project file without decoding its image.
pub fn parse(bytes: &[u8]) -> Result<ParsedProject> {
    let file: ProjectFile = serde_json::from_slice(bytes)
        .map_err(|e| AnnotateError::malformed(format!("invalid file format: {e}")))?;

    if file.image_src.trim().is_empty() {
        return Err(AnnotateError::malformed("imageSrc is empty"));
    }

    let canvas = match (file.canvas_width, file.canvas_height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Some(SurfaceSize::new(width, height))
        }
        (None, None) => None,
        _ => {
            return Err(AnnotateError::malformed(
                "canvasWidth and canvasHeight must both be positive",
            ))
        }
    };

    if let Some(counters) = &file.counters {
        for category in Category::ALL {
            let next = counters.get(category);
            if !(1..=MAX_SEQUENCE_NUMBER + 1).contains(&next) {
                return Err(AnnotateError::malformed(format!(
                    "counter for {category} is out of range: {next}"
                )));
            }
        }
    }

    let mut seen = HashSet::new();
    let mut markers = Vec::with_capacity(file.markers.len());
    for (index, record) in file.markers.into_iter().enumerate() {
        let marker = record.into_marker(index)?;
        if !seen.insert((marker.category, marker.number)) {
            return Err(AnnotateError::malformed(format!(
                "marker {index}: {} #{} appears twice",
                marker.category, marker.number
            )));
        }
        markers.push(marker);
    }

    Ok(ParsedProject {
        image_src: file.image_src,
        canvas,
        counters: file.counters,
        markers,
    })
}

/// Parse and fully rebuild a Document, decoding the image on this thread.
pub fn deserialize(bytes: &[u8]) -> Result<Document> {
    parse(bytes)?.into_document()
}
