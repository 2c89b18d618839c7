//! Step-by-step disassembly guides drawn over a photograph.
//!
//! A [`Document`] holds one base image and an ordered list of numbered
//! markers. Fasteners (screws, bolts) are single clicks; components and
//! custom parts are freehand strokes. Documents round-trip through a
//! self-contained JSON project file.

pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod glyphs;
pub mod interaction;
pub mod loader;
pub mod model;
pub mod project;
pub mod render;
pub mod store;

pub use document::{BaseImage, Document};
pub use error::{AnnotateError, Result};
pub use interaction::{Interaction, PointerEvent, Response};
pub use model::{Category, ImagePoint, Marker, MarkerGeometry};
pub use store::MarkerStore;
