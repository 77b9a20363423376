//! Preview surfaces and clipboard snapshots for slide canvases.
//!
//! The snapshot path works on what the user sees: a canvas is drawn to an
//! SVG [`RenderedSurface`], and that surface is rasterized at twice its
//! size onto white before it reaches the clipboard.

pub mod clipboard;
pub mod raster;
pub mod surface;

pub use clipboard::{copy_to_clipboard, ClipboardSink, MemoryClipboard, PNG_MIME_TYPE};
pub use raster::{SnapshotExporter, SnapshotImage, SUPERSAMPLE};
pub use surface::{RenderedSurface, SurfaceRenderer};
