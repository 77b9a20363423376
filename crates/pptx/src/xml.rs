//! Thin event writer over quick-xml for OOXML parts.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use slide_core::{Error, Result};

pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(crate) const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Namespace declarations carried by every presentationml root element.
pub(crate) const PML_NAMESPACES: [(&str, &str); 3] =
    [("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)];

/// Streaming XML writer producing one package part.
pub(crate) struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Start a standalone UTF-8 document.
    pub fn new() -> Result<Self> {
        let mut writer = Self {
            inner: Writer::new(Vec::new()),
        };
        writer.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(writer)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| Error::export_generation("XML serialization failed", e))
    }

    /// Open an element.
    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Start(start))
    }

    /// Write a self-closing element.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.write(Event::Empty(start))
    }

    /// Close an element.
    pub fn close(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Write escaped character data.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.write(Event::Text(BytesText::new(text)))
    }

    /// `<name>text</name>`
    pub fn leaf(&mut self, name: &str, text: &str) -> Result<()> {
        self.open(name, &[])?;
        self.text(text)?;
        self.close(name)
    }

    /// Finish and return the serialized bytes.
    pub fn finish(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

/// One `<Relationship>` entry.
#[derive(Debug, Clone)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: &'static str,
    pub target: String,
}

impl Relationship {
    pub fn new(id: usize, rel_type: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: format!("rId{}", id),
            rel_type,
            target: target.into(),
        }
    }
}

/// Serialize a relationships part.
pub(crate) fn relationships_xml(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open("Relationships", &[("xmlns", NS_RELS)])?;
    for rel in rels {
        w.empty(
            "Relationship",
            &[("Id", rel.id.as_str()), ("Type", rel.rel_type), ("Target", rel.target.as_str())],
        )?;
    }
    w.close("Relationships")?;
    Ok(w.finish())
}
