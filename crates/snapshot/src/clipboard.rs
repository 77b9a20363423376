//! Clipboard hand-off for snapshots.

use crate::raster::{SnapshotExporter, SnapshotImage};
use crate::surface::RenderedSurface;
use slide_core::error::Cause;
use slide_core::{Error, Result};

/// MIME type of the single clipboard entry.
pub const PNG_MIME_TYPE: &str = "image/png";

/// Destination for a captured snapshot.
///
/// Implementations receive the whole image in one call.
pub trait ClipboardSink {
    fn write_image(&mut self, mime_type: &str, image: &SnapshotImage) -> std::result::Result<(), Cause>;
}

/// Capture the surface, then write it to the sink in a single call.
///
/// Nothing is written if the capture fails. No retry.
pub fn copy_to_clipboard<S: ClipboardSink + ?Sized>(
    exporter: &SnapshotExporter,
    surface: &RenderedSurface,
    sink: &mut S,
) -> Result<SnapshotImage> {
    let image = exporter.snapshot(surface)?;
    sink.write_image(PNG_MIME_TYPE, &image).map_err(|source| {
        log::warn!("Clipboard write failed: {}", source);
        Error::ClipboardExport {
            message: "Failed to write the snapshot to the clipboard".to_string(),
            source: Some(source),
        }
    })?;
    Ok(image)
}

/// Sink that keeps written entries in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub entries: Vec<(String, Vec<u8>)>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn write_image(&mut self, mime_type: &str, image: &SnapshotImage) -> std::result::Result<(), Cause> {
        self.entries.push((mime_type.to_string(), image.png.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceRenderer;
    use slide_core::{render, Archetype, SlideCanvas, TemplateProps};

    struct FailingSink {
        calls: usize,
    }

    impl ClipboardSink for FailingSink {
        fn write_image(&mut self, _: &str, _: &SnapshotImage) -> std::result::Result<(), Cause> {
            self.calls += 1;
            Err("clipboard busy".into())
        }
    }

    fn title_surface() -> RenderedSurface {
        let mut canvas = SlideCanvas::new();
        render(Archetype::TitleOnly, &TemplateProps::with_title("Hi"), &mut canvas);
        SurfaceRenderer::new().render(&canvas)
    }

    #[test]
    fn test_single_png_entry() {
        let mut sink = MemoryClipboard::new();
        let image = copy_to_clipboard(&SnapshotExporter::new(), &title_surface(), &mut sink).unwrap();

        assert_eq!(sink.entries.len(), 1);
        assert_eq!(sink.entries[0].0, "image/png");
        assert_eq!(sink.entries[0].1, image.png);
        assert_eq!((image.width, image.height), (1920, 1080));
    }

    #[test]
    fn test_sink_failure_is_clipboard_error_without_retry() {
        let mut sink = FailingSink { calls: 0 };
        let err = copy_to_clipboard(&SnapshotExporter::new(), &title_surface(), &mut sink).unwrap_err();

        assert!(matches!(err, Error::ClipboardExport { .. }));
        assert_eq!(sink.calls, 1);
    }

    #[test]
    fn test_capture_failure_never_reaches_sink() {
        let mut sink = MemoryClipboard::new();
        let bad = RenderedSurface {
            svg: "<broken".to_string(),
            width: 10,
            height: 10,
        };

        assert!(copy_to_clipboard(&SnapshotExporter::new(), &bad, &mut sink).is_err());
        assert!(sink.entries.is_empty());
    }
}
