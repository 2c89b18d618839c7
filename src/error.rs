//! Error taxonomy for annotation operations.
//!
//! Every variant is user-recoverable: the caller reports it and the
//! Document stays as it was before the failed call.

use crate::model::Category;

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("Load an image first.")]
    NoImageLoaded,

    #[error("No steps yet.")]
    NoMarkers,

    #[error("Type instructions first.")]
    EmptyInstructions,

    #[error("A {category} path needs at least {required} points, got {points}")]
    InvalidGeometry {
        category: Category,
        points: usize,
        required: usize,
    },

    #[error("No {category} numbers left")]
    NumberingExhausted { category: Category },

    #[error("Could not load project: {0}")]
    MalformedDocument(String),

    #[error("Another file is still loading")]
    LoadInProgress,

    #[error("Loading was interrupted before it finished")]
    LoadAborted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Could not encode project: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnotateError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
