//! Rasterization of a rendered surface into a PNG snapshot.

use crate::surface::RenderedSurface;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use slide_core::{Error, Result};
use std::sync::Arc;

/// Pixel density multiplier applied to the surface's CSS size.
pub const SUPERSAMPLE: f32 = 2.0;

/// An encoded snapshot with its raw pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotImage {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded image.
    pub png: Vec<u8>,
    /// Straight RGBA8 pixels, row-major. Every pixel is opaque.
    pub rgba: Vec<u8>,
}

/// Rasterizes preview surfaces at a fixed supersampling factor onto an
/// opaque white background.
#[derive(Clone)]
pub struct SnapshotExporter {
    options: Arc<usvg::Options<'static>>,
    scale: f32,
}

impl std::fmt::Debug for SnapshotExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotExporter")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl Default for SnapshotExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotExporter {
    /// Create an exporter with system fonts loaded.
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.font_family = slide_core::geometry::FONT_FACE.to_string();
        options.fontdb_mut().load_system_fonts();
        log::debug!("Loaded {} font faces for snapshots", options.fontdb.len());
        Self {
            options: Arc::new(options),
            scale: SUPERSAMPLE,
        }
    }

    /// Capture the full surface.
    pub fn snapshot(&self, surface: &RenderedSurface) -> Result<SnapshotImage> {
        let tree = usvg::Tree::from_str(&surface.svg, &self.options)
            .map_err(|e| Error::clipboard_export("Failed to parse the rendered surface", e))?;

        let width = (surface.width as f32 * self.scale).round() as u32;
        let height = (surface.height as f32 * self.scale).round() as u32;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| Error::ClipboardExport {
            message: format!("Failed to allocate a {}x{} pixmap", width, height),
            source: None,
        })?;
        pixmap.fill(Color::WHITE);

        let sx = width as f32 / tree.size().width();
        let sy = height as f32 / tree.size().height();
        resvg::render(&tree, Transform::from_scale(sx, sy), &mut pixmap.as_mut());

        let png = pixmap
            .encode_png()
            .map_err(|e| Error::clipboard_export("Failed to encode PNG", e))?;
        log::debug!("Captured {}x{} snapshot ({} bytes)", width, height, png.len());

        Ok(SnapshotImage {
            width,
            height,
            png,
            rgba: pixmap.take(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(body: &str) -> RenderedSurface {
        RenderedSurface {
            svg: format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20">{}</svg>"#,
                body
            ),
            width: 40,
            height: 20,
        }
    }

    fn pixel(image: &SnapshotImage, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * image.width + x) * 4) as usize;
        [image.rgba[i], image.rgba[i + 1], image.rgba[i + 2], image.rgba[i + 3]]
    }

    #[test]
    fn test_supersampled_and_opaque_white() {
        let image = SnapshotExporter::new().snapshot(&surface("")).unwrap();

        assert_eq!((image.width, image.height), (80, 40));
        assert_eq!(image.rgba.len(), 80 * 40 * 4);
        assert!(image.rgba.chunks(4).all(|p| p == [255, 255, 255, 255]));
        assert!(image.png.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_shapes_are_drawn_at_scale() {
        let image = SnapshotExporter::new()
            .snapshot(&surface(r##"<rect x="20" y="0" width="20" height="20" fill="#2563EB"/>"##))
            .unwrap();

        assert_eq!(pixel(&image, 10, 10), [255, 255, 255, 255]);
        assert_eq!(pixel(&image, 60, 20), [0x25, 0x63, 0xEB, 255]);
    }

    #[test]
    fn test_invalid_surface() {
        let bad = RenderedSurface {
            svg: "not svg".to_string(),
            width: 10,
            height: 10,
        };
        assert!(matches!(
            SnapshotExporter::new().snapshot(&bad),
            Err(Error::ClipboardExport { .. })
        ));
    }
}
