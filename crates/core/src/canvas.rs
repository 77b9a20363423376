//! Document canvas abstraction.
//!
//! Renderers place elements here; writers and previewers read them back.
//! The canvas knows nothing about any output format.

use crate::geometry::{palette, Rect, TextStyle, FONT_FACE};

/// Slide-level defaults shared by every element.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideMaster {
    pub name: String,
    pub background: &'static str,
    pub font_face: &'static str,
}

impl Default for SlideMaster {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            background: palette::BACKGROUND,
            font_face: FONT_FACE,
        }
    }
}

/// One paragraph inside a text box.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub bullet: bool,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bullet: false,
        }
    }

    pub fn bulleted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bullet: true,
        }
    }
}

/// A positioned text frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub name: String,
    pub rect: Rect,
    pub paragraphs: Vec<Paragraph>,
    pub style: TextStyle,
}

impl TextBox {
    /// Text box holding a single plain paragraph.
    pub fn single(name: impl Into<String>, rect: Rect, text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            name: name.into(),
            rect,
            paragraphs: vec![Paragraph::plain(text)],
            style,
        }
    }

    /// All paragraph text joined with newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A filled rectangle (cards, accent rules).
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeBox {
    pub name: String,
    pub rect: Rect,
    pub fill: &'static str,
}

/// Encoded raster image formats accepted on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        None
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// A positioned raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBox {
    pub name: String,
    pub rect: Rect,
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

/// Anything that can be placed on a slide.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextBox),
    Shape(ShapeBox),
    Image(ImageBox),
}

/// A single slide under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideCanvas {
    master: Option<SlideMaster>,
    elements: Vec<Element>,
}

impl SlideCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the slide master. A later call replaces the earlier one.
    pub fn define_master(&mut self, master: SlideMaster) {
        self.master = Some(master);
    }

    pub fn add_text(&mut self, text: TextBox) {
        self.elements.push(Element::Text(text));
    }

    pub fn add_shape(&mut self, shape: ShapeBox) {
        self.elements.push(Element::Shape(shape));
    }

    pub fn add_image(&mut self, image: ImageBox) {
        self.elements.push(Element::Image(image));
    }

    /// The defined master, or the default one.
    pub fn master(&self) -> SlideMaster {
        self.master.clone().unwrap_or_default()
    }

    /// Elements in paint order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Text boxes in paint order.
    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBox> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(t) => Some(t),
            _ => None,
        })
    }

    /// Find a text box by name.
    pub fn text_box(&self, name: &str) -> Option<&TextBox> {
        self.text_boxes().find(|t| t.name == name)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageBox> {
        self.elements.iter().filter_map(|e| match e {
            Element::Image(i) => Some(i),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LayoutResolver, Density};
    use crate::Archetype;

    #[test]
    fn test_image_format_from_magic() {
        assert_eq!(
            ImageFormat::from_magic(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic(b"GIF89a..."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic(b"BM"), None);
    }

    #[test]
    fn test_image_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), None);
        assert_eq!(ImageFormat::Jpeg.extension(), "jpeg");
    }

    #[test]
    fn test_canvas_keeps_paint_order() {
        let layout = LayoutResolver::new().resolve(Archetype::Narrative, Density::Presentation);
        let mut canvas = SlideCanvas::new();
        canvas.add_shape(ShapeBox {
            name: "Accent".into(),
            rect: layout.accent,
            fill: palette::ACCENT,
        });
        canvas.add_text(TextBox::single("Title", layout.title, "Hello", layout.styles.title.clone()));

        assert_eq!(canvas.elements().len(), 2);
        assert!(matches!(canvas.elements()[0], Element::Shape(_)));
        assert_eq!(canvas.text_box("Title").map(|t| t.text()), Some("Hello".to_string()));
    }

    #[test]
    fn test_master_defaults() {
        let mut canvas = SlideCanvas::new();
        assert_eq!(canvas.master().background, palette::BACKGROUND);

        canvas.define_master(SlideMaster {
            name: "Brief".into(),
            ..Default::default()
        });
        assert_eq!(canvas.master().name, "Brief");
    }
}
