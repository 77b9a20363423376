//! PPTX (Office Open XML) writer for archetype slides.
//!
//! A presentation is a ZIP archive of XML parts. [`PptxWriter`] serializes
//! rendered canvases into one; [`SlideExporter`] runs the whole pipeline
//! from template props to a downloadable [`slide_core::ExportArtifact`];
//! [`PptxInspector`] reads exported decks back for verification.

pub mod export;
pub mod inspect;
pub mod parts;
mod slide;
pub mod writer;
mod xml;

pub use export::{ExportConfig, SlideExporter};
pub use inspect::{InspectedDeck, InspectedShape, InspectedSlide, PptxInspector};
pub use parts::DeckProperties;
pub use writer::{PptxWriter, SlideImage};
