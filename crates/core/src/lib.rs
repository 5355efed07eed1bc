//! PDF Annotator Core Library
//!
//! Annotation model, coordinate transforms and pointer-driven controllers for
//! the document viewer. Nothing here renders or performs I/O.

pub mod annotation;
pub mod drawing;
pub mod eraser;
pub mod geometry;
pub mod highlight;
pub mod tool;
pub mod transform;

pub use annotation::{
    AnnotationError, AnnotationSnapshot, AnnotationStore, EraseOutcome, HighlightRegion,
    PageAnnotations, Stroke,
};
pub use drawing::{DrawingController, DrawingState, StrokeOutcome};
pub use eraser::Eraser;
pub use geometry::{Color, PagePoint, PageRect, ParseColorError, ScreenPoint, ScreenRect};
pub use highlight::{commit_selection, HighlightOutcome, TextSelection};
pub use tool::{StrokeStyle, Tool, ToolState};
pub use transform::{Affine, PageTransform, Rotation, TransformError};
