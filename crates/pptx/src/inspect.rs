//! Read-back of exported presentations.
//!
//! Walks the package the same way a viewer would: slide order from the
//! presentation relationships, then every named shape with its text and
//! offset. Used to verify exports, not to edit them.

use quick_xml::events::Event;
use quick_xml::Reader;
use slide_core::{Error, Result};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A shape found on an inspected slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectedShape {
    pub name: String,
    /// Paragraphs and line breaks joined with `\n`.
    pub text: String,
    /// Offset in EMU.
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectedSlide {
    /// 1-based position in the deck.
    pub number: usize,
    pub shapes: Vec<InspectedShape>,
}

impl InspectedSlide {
    pub fn shape(&self, name: &str) -> Option<&InspectedShape> {
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Text of every shape that has any, in document order.
    pub fn texts(&self) -> Vec<&str> {
        self.shapes
            .iter()
            .filter(|s| !s.text.is_empty())
            .map(|s| s.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectedDeck {
    /// `dc:title` from the core properties, if present.
    pub title: Option<String>,
    pub slides: Vec<InspectedSlide>,
}

/// Reader for presentation packages.
#[derive(Debug, Default)]
pub struct PptxInspector;

impl PptxInspector {
    pub fn new() -> Self {
        Self
    }

    pub fn inspect<R: Read + Seek>(&self, reader: R) -> Result<InspectedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let title = match read_part(&mut archive, "docProps/core.xml") {
            Ok(xml) => element_text(&xml, b"title")?,
            Err(_) => None,
        };

        let mut slides = Vec::new();
        for (idx, path) in slide_order(&mut archive)?.iter().enumerate() {
            let xml = read_part(&mut archive, path)?;
            slides.push(InspectedSlide {
                number: idx + 1,
                shapes: extract_shapes(&xml)?,
            });
        }

        Ok(InspectedDeck { title, slides })
    }
}

/// Slide part paths ordered by relationship id.
fn slide_order<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let rels = read_part(archive, "ppt/_rels/presentation.xml.rels")?;
    let mut slides: Vec<(String, Option<usize>)> = Vec::new();

    let mut reader = Reader::from_str(&rels);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"Id" => id = value,
                        _ => {}
                    }
                }

                if rel_type.ends_with("/slide") {
                    let order = trailing_number(&id).or_else(|| trailing_number(&target));
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("ppt/{}", target),
                    };
                    slides.push((path, order));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing relationships: {}", e))),
            _ => {}
        }
    }

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

/// Shapes and pictures in document order, with their text.
fn extract_shapes(xml: &str) -> Result<Vec<InspectedShape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut current: Option<InspectedShape> = None;
    let mut in_text = false;
    let mut paragraphs = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => current = Some(InspectedShape::default()),
                b"p" => {
                    if let Some(shape) = current.as_mut() {
                        if paragraphs > 0 {
                            shape.text.push('\n');
                        }
                        paragraphs += 1;
                    }
                }
                b"t" => in_text = true,
                b"br" => push_break(&mut current),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"cNvPr" => {
                    if let Some(shape) = current.as_mut() {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"name" {
                                shape.name = String::from_utf8_lossy(&attr.value).to_string();
                            }
                        }
                    }
                }
                b"off" => {
                    if let Some(shape) = current.as_mut() {
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value).parse::<i64>().ok();
                            match (attr.key.as_ref(), value) {
                                (b"x", Some(x)) => shape.x = x,
                                (b"y", Some(y)) => shape.y = y,
                                _ => {}
                            }
                        }
                    }
                }
                b"br" => push_break(&mut current),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(shape) = current.as_mut() {
                    shape.text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" | b"pic" => {
                    if let Some(shape) = current.take() {
                        shapes.push(shape);
                    }
                    paragraphs = 0;
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing slide: {}", e))),
            _ => {}
        }
    }

    Ok(shapes)
}

fn push_break(current: &mut Option<InspectedShape>) {
    if let Some(shape) = current.as_mut() {
        shape.text.push('\n');
    }
}

/// Text of the first element with the given local name.
fn element_text(xml: &str, wanted: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == wanted => inside = true,
            Ok(Event::Text(ref e)) if inside => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(e.to_string()))?;
                return Ok(Some(text.to_string()));
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == wanted => return Ok(None),
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::XmlError(e.to_string())),
            _ => {}
        }
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;
    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Trailing number of strings like "rId2" or "slide3.xml".
fn trailing_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml");
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s[start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SlideExporter;
    use slide_core::{ComparisonColumn, Metric, Milestone, TemplateProps, DEFAULT_TITLE};
    use std::io::Cursor;

    fn export_and_inspect(archetype: &str, props: &TemplateProps) -> InspectedDeck {
        let artifact = SlideExporter::default().export(archetype, props, "deadbeef").unwrap();
        PptxInspector::new().inspect(Cursor::new(artifact.bytes)).unwrap()
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("rId1"), Some(1));
        assert_eq!(trailing_number("rId12"), Some(12));
        assert_eq!(trailing_number("slides/slide3.xml"), Some(3));
        assert_eq!(trailing_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"t"), b"t");
    }

    #[test]
    fn test_missing_title_round_trips_as_default() {
        let deck = export_and_inspect("title-only", &TemplateProps::default());

        assert_eq!(deck.title.as_deref(), Some(DEFAULT_TITLE));
        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.slides[0].shape("Title").unwrap().text, DEFAULT_TITLE);
    }

    #[test]
    fn test_metrics_round_trip_in_grid_order() {
        let props = TemplateProps {
            title: Some("KPIs".into()),
            metrics: (1..=4).map(|i| Metric::new(format!("L{}", i), format!("{}", i * 10))).collect(),
            ..Default::default()
        };
        let deck = export_and_inspect("metrics-grid", &props);
        let slide = &deck.slides[0];

        let first = slide.shape("Metric 1 Value").unwrap();
        let fourth = slide.shape("Metric 4 Value").unwrap();
        assert_eq!(first.text, "10");
        assert_eq!(fourth.text, "40");
        // Fourth metric wraps to the second row, first column.
        assert_eq!(first.x, fourth.x);
        assert!(fourth.y > first.y);
    }

    #[test]
    fn test_comparison_and_timeline_text() {
        let props = TemplateProps {
            left: Some(ComparisonColumn {
                heading: Some("Before".into()),
                points: vec!["slow".into(), "manual".into()],
            }),
            right: Some(ComparisonColumn {
                heading: Some("After".into()),
                points: vec!["fast".into()],
            }),
            ..Default::default()
        };
        let slide = &export_and_inspect("comparison", &props).slides[0];
        assert_eq!(slide.shape("Left Heading").unwrap().text, "Before");
        assert_eq!(slide.shape("Left Points").unwrap().text, "slow\nmanual");

        let props = TemplateProps {
            milestones: vec![Milestone {
                label: "Q1".into(),
                detail: Some("Pilot".into()),
            }],
            ..Default::default()
        };
        let slide = &export_and_inspect("timeline", &props).slides[0];
        assert_eq!(slide.shape("Milestone 1 Label").unwrap().text, "Q1");
        assert_eq!(slide.shape("Milestone 1 Detail").unwrap().text, "Pilot");
    }

    #[test]
    fn test_malformed_slide_is_xml_error() {
        let xml = r#"<p:sld><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/></p:nvSpPr></p:pic></p:sld>"#;
        assert!(matches!(extract_shapes(xml), Err(Error::XmlError(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let result = PptxInspector::new().inspect(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }
}
