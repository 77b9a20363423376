//! OOXML package assembly.

use crate::parts::{self, DeckProperties};
use crate::slide::{slide_rels_xml, slide_xml};
use slide_core::canvas::{ImageBox, ImageFormat, SlideCanvas};
use slide_core::geometry::Rect;
use slide_core::{Error, Result};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// An encoded image destined for a full-bleed slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

impl SlideImage {
    /// Wrap encoded bytes, detecting the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic(&data)
            .ok_or_else(|| Error::UnsupportedFormat("unrecognized image data".to_string()))?;
        Ok(Self { format, data })
    }
}

/// Writer for presentation packages.
///
/// Every part is written with the same fixed timestamp so identical input
/// produces byte-identical output.
#[derive(Debug, Clone)]
pub struct PptxWriter {
    properties: DeckProperties,
}

impl PptxWriter {
    pub fn new(properties: DeckProperties) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &DeckProperties {
        &self.properties
    }

    /// Serialize a single-slide presentation.
    pub fn finalize(&self, canvas: &SlideCanvas) -> Result<Vec<u8>> {
        self.finalize_deck(std::slice::from_ref(canvas))
    }

    /// Serialize several canvases into one presentation, in order.
    ///
    /// The slide master comes from the first canvas.
    pub fn finalize_deck(&self, canvases: &[SlideCanvas]) -> Result<Vec<u8>> {
        if canvases.is_empty() {
            return Err(Error::InvalidRequest("a deck needs at least one slide".to_string()));
        }
        log::debug!("Writing deck '{}' with {} slide(s)", self.properties.title, canvases.len());

        let master = canvases[0].master();
        let mut package = Package::new();

        // Media are numbered across the whole deck.
        let mut media_count = 0;
        let mut slide_media: Vec<Vec<String>> = Vec::with_capacity(canvases.len());
        let mut media_defaults: Vec<(&'static str, &'static str)> = Vec::new();
        let mut media_files: Vec<(String, &[u8])> = Vec::new();
        for canvas in canvases {
            let mut names = Vec::new();
            for image in canvas.images() {
                media_count += 1;
                let name = format!("image{}.{}", media_count, image.format.extension());
                let default = (image.format.extension(), image.format.content_type());
                if !media_defaults.contains(&default) {
                    media_defaults.push(default);
                }
                media_files.push((name.clone(), image.data.as_slice()));
                names.push(name);
            }
            slide_media.push(names);
        }

        let slide_count = canvases.len();
        package.add("[Content_Types].xml", &parts::content_types_xml(slide_count, &media_defaults)?)?;
        package.add("_rels/.rels", &parts::root_rels_xml()?)?;
        package.add("docProps/core.xml", &parts::core_props_xml(&self.properties)?)?;
        package.add("docProps/app.xml", &parts::app_props_xml(&self.properties, slide_count)?)?;
        package.add("ppt/presentation.xml", &parts::presentation_xml(slide_count)?)?;
        package.add(
            "ppt/_rels/presentation.xml.rels",
            &parts::presentation_rels_xml(slide_count)?,
        )?;
        package.add("ppt/presProps.xml", &parts::pres_props_xml()?)?;
        package.add("ppt/viewProps.xml", &parts::view_props_xml()?)?;
        package.add("ppt/tableStyles.xml", &parts::table_styles_xml()?)?;
        package.add("ppt/theme/theme1.xml", &parts::theme_xml(master.font_face)?)?;
        package.add("ppt/slideMasters/slideMaster1.xml", &parts::slide_master_xml(&master)?)?;
        package.add(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &parts::slide_master_rels_xml()?,
        )?;
        package.add("ppt/slideLayouts/slideLayout1.xml", &parts::slide_layout_xml()?)?;
        package.add(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &parts::slide_layout_rels_xml()?,
        )?;

        for (index, (canvas, media)) in canvases.iter().zip(&slide_media).enumerate() {
            let n = index + 1;
            package.add(&format!("ppt/slides/slide{}.xml", n), &slide_xml(canvas)?)?;
            package.add(&format!("ppt/slides/_rels/slide{}.xml.rels", n), &slide_rels_xml(media)?)?;
        }
        for (name, data) in media_files {
            package.add(&format!("ppt/media/{}", name), data)?;
        }

        package.finish()
    }

    /// Serialize one full-slide image per slide.
    pub fn write_image_deck(&self, images: &[SlideImage]) -> Result<Vec<u8>> {
        let canvases: Vec<SlideCanvas> = images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                let mut canvas = SlideCanvas::new();
                canvas.add_image(ImageBox {
                    name: format!("Slide Image {}", i + 1),
                    rect: Rect::full(),
                    format: image.format,
                    data: image.data.clone(),
                });
                canvas
            })
            .collect();
        self.finalize_deck(&canvases)
    }
}

/// Zip archive under construction.
struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
}

impl Package {
    fn new() -> Self {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        }
    }

    fn add(&mut self, path: &str, data: &[u8]) -> Result<()> {
        self.zip
            .start_file(path, self.options)
            .map_err(|e| Error::export_generation(format!("Failed to start part '{}'", path), e))?;
        self.zip
            .write_all(data)
            .map_err(|e| Error::export_generation(format!("Failed to write part '{}'", path), e))
    }

    fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| Error::export_generation("Failed to finish archive", e))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::{render, Archetype, TemplateProps};
    use std::io::Read;
    use zip::ZipArchive;

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    ];

    fn writer() -> PptxWriter {
        PptxWriter::new(DeckProperties::new("Deck", "Tester"))
    }

    fn read_part(bytes: &[u8], path: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(path).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn narrative_canvas(title: &str) -> SlideCanvas {
        let mut canvas = SlideCanvas::new();
        render(Archetype::Narrative, &TemplateProps::with_title(title), &mut canvas);
        canvas
    }

    #[test]
    fn test_finalize_writes_all_parts() {
        let bytes = writer().finalize(&narrative_canvas("Hello")).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();

        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/theme/theme1.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/slides/slide1.xml",
            "ppt/slides/_rels/slide1.xml.rels",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }
    }

    #[test]
    fn test_output_is_deterministic() {
        let canvas = narrative_canvas("Same");
        assert_eq!(writer().finalize(&canvas).unwrap(), writer().finalize(&canvas).unwrap());
    }

    #[test]
    fn test_empty_deck_is_rejected() {
        assert!(matches!(writer().finalize_deck(&[]), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_deck_lists_every_slide() {
        let bytes = writer()
            .finalize_deck(&[narrative_canvas("One"), narrative_canvas("Two")])
            .unwrap();
        let presentation = read_part(&bytes, "ppt/presentation.xml");

        assert!(presentation.contains("<p:sldId id=\"256\" r:id=\"rId2\"/>"));
        assert!(presentation.contains("<p:sldId id=\"257\" r:id=\"rId3\"/>"));
        assert!(read_part(&bytes, "ppt/slides/slide2.xml").contains("<a:t>Two</a:t>"));
    }

    #[test]
    fn test_image_deck_embeds_media() {
        let image = SlideImage::from_bytes(PNG_HEADER.to_vec()).unwrap();
        let bytes = writer().write_image_deck(&[image.clone(), image]).unwrap();

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains("Extension=\"png\""));
        assert!(read_part(&bytes, "ppt/slides/_rels/slide2.xml.rels").contains("../media/image2.png"));
        assert!(read_part(&bytes, "ppt/slides/slide1.xml").contains("r:embed=\"rId2\""));
        assert!(read_part(&bytes, "docProps/core.xml").contains("<dc:title>Deck</dc:title>"));
    }

    #[test]
    fn test_unrecognized_image_bytes() {
        assert!(matches!(
            SlideImage::from_bytes(b"not an image".to_vec()),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
