//! Error types for form access and PDF export.
//!
//! Rendering a view never fails: malformed numbers degrade to zero. Errors
//! only arise at the edges, when a form is read from outside or when the
//! export pipeline touches fonts, images, and files.

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while reading or editing form fields by name.
#[derive(Error, Debug)]
pub enum FormError {
    /// The field name is not one of the invoice form's inputs.
    #[error("unknown form field `{0}`")]
    UnknownField(String),

    /// The form JSON could not be parsed.
    #[error("invalid form JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A `name=value` assignment was missing its `=`.
    #[error("expected `name=value`, got `{0}`")]
    Assignment(String),
}

/// Errors raised by the export pipeline.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Form input could not be read.
    #[error(transparent)]
    Form(#[from] FormError),

    /// Invalid configuration (page geometry, scale, quality).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A font file could not be read or parsed.
    #[error("font error: {0}")]
    Font(String),

    /// The invoice region could not be laid out.
    #[error("layout failed: {0}")]
    Layout(String),

    /// The region could not be rasterized, or a screenshot could not be decoded.
    #[error("rasterization failed: {0}")]
    Raster(String),

    /// JPEG encoding or image decoding failed inside the `image` crate.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// printpdf rejected the raster.
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    /// Reading inputs or writing the exported file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<taffy::TaffyError> for ExportError {
    fn from(err: taffy::TaffyError) -> Self {
        ExportError::Layout(err.to_string())
    }
}
