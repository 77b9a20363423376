//! Core domain types, archetype layouts, and the canvas abstraction for
//! slide export.

pub mod archetype;
pub mod canvas;
pub mod downstream;
pub mod error;
pub mod geometry;
pub mod normalize;
pub mod types;

pub use archetype::{render, Archetype, ArchetypeRenderer};
pub use canvas::{Element, ImageBox, ImageFormat, Paragraph, ShapeBox, SlideCanvas, SlideMaster, TextBox};
pub use downstream::{format_for_downstream_use, DownstreamFormatter};
pub use error::{Error, ErrorKind, Result};
pub use geometry::{Density, Layout, LayoutResolver, Rect};
pub use normalize::TextNormalizer;
pub use types::{
    CellValue, ComparisonColumn, ExportArtifact, Metric, Milestone, ParsedTabularData,
    StructuredSlideContent, TemplateProps, DEFAULT_TITLE, PPTX_MIME_TYPE,
};
