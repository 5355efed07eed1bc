use crate::config::ConfigError;
use pdf_annotator_core::TransformError;
use pdf_engine::PdfEngineError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to load document: {0}")]
    Load(#[from] PdfEngineError),
    #[error("no document is open")]
    NoDocument,
    #[error("page {page} out of range (page_count={page_count})")]
    InvalidPage { page: u32, page_count: u32 },
    #[error("zoom level {0} is not one of the allowed levels")]
    ZoomNotAllowed(f32),
    #[error("invalid zoom levels: {0}")]
    InvalidZoomLevels(String),
    #[error("invalid key chord {0:?}")]
    InvalidKeyChord(String),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
