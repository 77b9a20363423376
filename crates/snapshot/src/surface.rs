//! SVG drawing of a slide canvas: the live preview surface.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use slide_core::canvas::{Element, ImageBox, ShapeBox, SlideCanvas, TextBox};
use slide_core::geometry::{Align, Anchor, Rect};
use std::fmt::Write as _;

/// Preview width in CSS pixels (10 in at 96 dpi).
pub const SURFACE_WIDTH: u32 = 960;
/// Preview height in CSS pixels (16:9).
pub const SURFACE_HEIGHT: u32 = 540;

/// Pixels per typographic point at 96 dpi.
const PX_PER_PT: f64 = 96.0 / 72.0;
const LINE_HEIGHT: f64 = 1.2;
/// Rough advance of an average glyph relative to the font size.
const AVG_GLYPH_WIDTH: f64 = 0.52;
const BULLET_INDENT_PX: f64 = 24.0;

/// A drawn slide, ready to be shown or rasterized.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSurface {
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

/// Draws canvases as SVG documents.
#[derive(Debug, Clone)]
pub struct SurfaceRenderer {
    width: u32,
    height: u32,
}

impl Default for SurfaceRenderer {
    fn default() -> Self {
        Self {
            width: SURFACE_WIDTH,
            height: SURFACE_HEIGHT,
        }
    }
}

impl SurfaceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different preview size. The slide keeps its proportions only
    /// if the caller picks a 16:9 size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn render(&self, canvas: &SlideCanvas) -> RenderedSurface {
        let master = canvas.master();
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        let _ = write!(
            svg,
            r##"<rect x="0" y="0" width="{}" height="{}" fill="#{}"/>"##,
            self.width, self.height, master.background
        );

        for element in canvas.elements() {
            match element {
                Element::Shape(shape) => self.draw_shape(&mut svg, shape),
                Element::Text(text) => self.draw_text(&mut svg, text),
                Element::Image(image) => self.draw_image(&mut svg, image),
            }
        }

        svg.push_str("</svg>");
        RenderedSurface {
            svg,
            width: self.width,
            height: self.height,
        }
    }

    fn px(&self, rect: Rect) -> (f64, f64, f64, f64) {
        let (w, h) = (self.width as f64, self.height as f64);
        (rect.x * w, rect.y * h, rect.w * w, rect.h * h)
    }

    /// Scale from points to pixels, relative to the default surface size.
    fn font_px(&self, size_pt: f64) -> f64 {
        size_pt * PX_PER_PT * self.width as f64 / SURFACE_WIDTH as f64
    }

    fn draw_shape(&self, svg: &mut String, shape: &ShapeBox) {
        let (x, y, w, h) = self.px(shape.rect);
        let _ = write!(
            svg,
            r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="#{}"/>"##,
            x, y, w, h, shape.fill
        );
    }

    fn draw_image(&self, svg: &mut String, image: &ImageBox) {
        let (x, y, w, h) = self.px(image.rect);
        let _ = write!(
            svg,
            r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="none" href="data:{};base64,{}"/>"#,
            x,
            y,
            w,
            h,
            image.format.content_type(),
            STANDARD.encode(&image.data)
        );
    }

    fn draw_text(&self, svg: &mut String, text: &TextBox) {
        let style = &text.style;
        let (x, y, w, h) = self.px(text.rect);
        let size = self.font_px(style.size_pt);
        let line_height = size * LINE_HEIGHT;
        let gap = self.font_px(style.space_after_pt);

        // Lay out lines first so vertical anchoring knows the block height.
        let mut lines: Vec<(f64, f64, String)> = Vec::new();
        let mut block_height = 0.0;
        for (i, paragraph) in text.paragraphs.iter().enumerate() {
            if i > 0 {
                block_height += gap;
            }
            let indent = if paragraph.bullet { BULLET_INDENT_PX } else { 0.0 };
            let mut first = true;
            for source in paragraph.text.split('\n') {
                for line in wrap(source, w - indent, size) {
                    // Continuation lines of a bullet hang under its text.
                    let (shift, line) = if paragraph.bullet && first {
                        (0.0, format!("\u{2022} {}", line))
                    } else {
                        (indent, line)
                    };
                    first = false;
                    lines.push((block_height, shift, line));
                    block_height += line_height;
                }
            }
        }

        let top = match style.anchor {
            Anchor::Top => y,
            Anchor::Middle => y + (h - block_height) / 2.0,
            Anchor::Bottom => y + h - block_height,
        };
        let (anchor, tx) = match style.align {
            Align::Left => ("start", x),
            Align::Center => ("middle", x + w / 2.0),
            Align::Right => ("end", x + w),
        };
        let weight = if style.bold { "bold" } else { "normal" };

        for (offset, shift, line) in lines {
            // Baseline sits roughly 0.8 em below the line top.
            let baseline = top + offset + size * 0.8 + (line_height - size) / 2.0;
            let _ = write!(
                svg,
                r##"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="#{}" text-anchor="{}">{}</text>"##,
                tx + shift,
                baseline,
                style.font_face,
                size,
                weight,
                style.color,
                anchor,
                escape_xml(&line)
            );
        }
    }
}

/// Greedy word wrap on an estimated glyph width.
fn wrap(text: &str, width_px: f64, size_px: f64) -> Vec<String> {
    let max_chars = ((width_px / (size_px * AVG_GLYPH_WIDTH)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::{render, Archetype, Metric, TemplateProps};

    fn surface(archetype: Archetype, props: &TemplateProps) -> RenderedSurface {
        let mut canvas = SlideCanvas::new();
        render(archetype, props, &mut canvas);
        SurfaceRenderer::new().render(&canvas)
    }

    #[test]
    fn test_surface_size_and_background() {
        let s = surface(Archetype::TitleOnly, &TemplateProps::default());

        assert_eq!((s.width, s.height), (960, 540));
        assert!(s.svg.starts_with("<svg"));
        assert!(s.svg.contains(r##"fill="#FFFFFF""##));
        assert!(s.svg.contains(">Untitled Slide</text>"));
    }

    #[test]
    fn test_text_is_escaped_and_centered_metrics() {
        let props = TemplateProps {
            title: Some("R&D <2025>".into()),
            metrics: vec![Metric::new("Spend", "$1M")],
            ..Default::default()
        };
        let s = surface(Archetype::MetricsGrid, &props);

        assert!(s.svg.contains("R&amp;D &lt;2025&gt;"));
        assert!(s.svg.contains(r#"text-anchor="middle""#));
        assert!(s.svg.contains(">$1M</text>"));
    }

    #[test]
    fn test_custom_size_scales_geometry() {
        let mut canvas = SlideCanvas::new();
        render(Archetype::TitleOnly, &TemplateProps::with_title("Big"), &mut canvas);
        let s = SurfaceRenderer::new().with_size(1920, 1080).render(&canvas);

        assert_eq!((s.width, s.height), (1920, 1080));
        assert!(s.svg.contains(r#"width="1920" height="1080" viewBox="0 0 1920 1080""#));
        // 40pt title at twice the default width
        assert!(s.svg.contains(r#"font-size="106.67""#));
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 1000.0, 10.0), vec!["one two three"]);
        assert_eq!(wrap("one two three", 45.0, 10.0), vec!["one two", "three"]);
        assert_eq!(wrap("", 100.0, 10.0), vec![""]);
    }
}
