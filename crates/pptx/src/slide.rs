//! Serialization of one canvas into a slide part.

use crate::parts::{rel_types, write_background, write_group_header};
use crate::xml::{relationships_xml, Relationship, XmlWriter, PML_NAMESPACES};
use slide_core::canvas::{Element, ImageBox, Paragraph, ShapeBox, SlideCanvas, TextBox};
use slide_core::geometry::{Align, Anchor, Rect, TextStyle};
use slide_core::Result;

/// Bullet indent in EMU (0.25 in).
const BULLET_INDENT_EMU: i64 = 228_600;

/// Write `ppt/slides/slideN.xml`.
///
/// Images are referenced as `rId2`, `rId3`, ... in paint order; `rId1` is
/// always the layout.
pub(crate) fn slide_xml(canvas: &SlideCanvas) -> Result<Vec<u8>> {
    let master = canvas.master();
    let mut w = XmlWriter::new()?;
    w.open("p:sld", &PML_NAMESPACES)?;
    w.open("p:cSld", &[])?;
    write_background(&mut w, master.background)?;
    w.open("p:spTree", &[])?;
    write_group_header(&mut w)?;

    let mut next_image_rel = 2;
    for (index, element) in canvas.elements().iter().enumerate() {
        let shape_id = (index + 2).to_string();
        match element {
            Element::Text(text) => write_text_box(&mut w, &shape_id, text)?,
            Element::Shape(shape) => write_shape(&mut w, &shape_id, shape)?,
            Element::Image(image) => {
                let rel_id = format!("rId{}", next_image_rel);
                next_image_rel += 1;
                write_picture(&mut w, &shape_id, &rel_id, image)?;
            }
        }
    }

    w.close("p:spTree")?;
    w.close("p:cSld")?;
    w.open("p:clrMapOvr", &[])?;
    w.empty("a:masterClrMapping", &[])?;
    w.close("p:clrMapOvr")?;
    w.close("p:sld")?;
    Ok(w.finish())
}

/// Write `ppt/slides/_rels/slideN.xml.rels` for the given media file names.
pub(crate) fn slide_rels_xml(media: &[String]) -> Result<Vec<u8>> {
    let mut rels = vec![Relationship::new(
        1,
        rel_types::SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml",
    )];
    for (i, name) in media.iter().enumerate() {
        rels.push(Relationship::new(i + 2, rel_types::IMAGE, format!("../media/{}", name)));
    }
    relationships_xml(&rels)
}

fn write_xfrm(w: &mut XmlWriter, rect: Rect) -> Result<()> {
    let emu = rect.to_emu();
    let (x, y, cx, cy) = (
        emu.x.to_string(),
        emu.y.to_string(),
        emu.cx.to_string(),
        emu.cy.to_string(),
    );
    w.open("a:xfrm", &[])?;
    w.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
    w.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    w.close("a:xfrm")
}

fn write_rect_geometry(w: &mut XmlWriter) -> Result<()> {
    w.open("a:prstGeom", &[("prst", "rect")])?;
    w.empty("a:avLst", &[])?;
    w.close("a:prstGeom")
}

fn write_solid_fill(w: &mut XmlWriter, color: &str) -> Result<()> {
    w.open("a:solidFill", &[])?;
    w.empty("a:srgbClr", &[("val", color)])?;
    w.close("a:solidFill")
}

fn write_text_box(w: &mut XmlWriter, id: &str, text: &TextBox) -> Result<()> {
    let style = &text.style;
    w.open("p:sp", &[])?;
    w.open("p:nvSpPr", &[])?;
    w.empty("p:cNvPr", &[("id", id), ("name", text.name.as_str())])?;
    w.empty("p:cNvSpPr", &[("txBox", "1")])?;
    w.empty("p:nvPr", &[])?;
    w.close("p:nvSpPr")?;

    w.open("p:spPr", &[])?;
    write_xfrm(w, text.rect)?;
    write_rect_geometry(w)?;
    w.empty("a:noFill", &[])?;
    w.close("p:spPr")?;

    w.open("p:txBody", &[])?;
    let anchor = match style.anchor {
        Anchor::Top => "t",
        Anchor::Middle => "ctr",
        Anchor::Bottom => "b",
    };
    w.open(
        "a:bodyPr",
        &[
            ("wrap", "square"),
            ("lIns", "0"),
            ("tIns", "0"),
            ("rIns", "0"),
            ("bIns", "0"),
            ("anchor", anchor),
        ],
    )?;
    w.empty("a:noAutofit", &[])?;
    w.close("a:bodyPr")?;
    w.empty("a:lstStyle", &[])?;

    let size = ((style.size_pt * 100.0).round() as i64).to_string();
    let spacing = ((style.space_after_pt * 100.0).round() as i64).to_string();
    let align = match style.align {
        Align::Left => "l",
        Align::Center => "ctr",
        Align::Right => "r",
    };
    for paragraph in &text.paragraphs {
        write_paragraph(w, paragraph, style, align, &size, &spacing)?;
    }

    w.close("p:txBody")?;
    w.close("p:sp")
}

fn write_paragraph(
    w: &mut XmlWriter,
    paragraph: &Paragraph,
    style: &TextStyle,
    align: &str,
    size: &str,
    spacing: &str,
) -> Result<()> {
    w.open("a:p", &[])?;

    let indent = BULLET_INDENT_EMU.to_string();
    let hanging = (-BULLET_INDENT_EMU).to_string();
    let mut ppr: Vec<(&str, &str)> = vec![("algn", align)];
    if paragraph.bullet {
        ppr.push(("marL", indent.as_str()));
        ppr.push(("indent", hanging.as_str()));
    }
    w.open("a:pPr", &ppr)?;
    if style.space_after_pt > 0.0 {
        w.open("a:spcAft", &[])?;
        w.empty("a:spcPts", &[("val", spacing)])?;
        w.close("a:spcAft")?;
    }
    if paragraph.bullet {
        w.empty("a:buChar", &[("char", "\u{2022}")])?;
    } else {
        w.empty("a:buNone", &[])?;
    }
    w.close("a:pPr")?;

    // Line breaks inside a paragraph become <a:br/> between runs.
    for (i, line) in paragraph.text.split('\n').enumerate() {
        if i > 0 {
            w.open("a:br", &[])?;
            write_run_properties(w, style, size)?;
            w.close("a:br")?;
        }
        w.open("a:r", &[])?;
        write_run_properties(w, style, size)?;
        w.leaf("a:t", line)?;
        w.close("a:r")?;
    }

    w.close("a:p")
}

fn write_run_properties(w: &mut XmlWriter, style: &TextStyle, size: &str) -> Result<()> {
    let bold = if style.bold { "1" } else { "0" };
    w.open(
        "a:rPr",
        &[("lang", "en-US"), ("sz", size), ("b", bold), ("dirty", "0")],
    )?;
    write_solid_fill(w, style.color)?;
    w.empty("a:latin", &[("typeface", style.font_face)])?;
    w.close("a:rPr")
}

fn write_shape(w: &mut XmlWriter, id: &str, shape: &ShapeBox) -> Result<()> {
    w.open("p:sp", &[])?;
    w.open("p:nvSpPr", &[])?;
    w.empty("p:cNvPr", &[("id", id), ("name", shape.name.as_str())])?;
    w.empty("p:cNvSpPr", &[])?;
    w.empty("p:nvPr", &[])?;
    w.close("p:nvSpPr")?;
    w.open("p:spPr", &[])?;
    write_xfrm(w, shape.rect)?;
    write_rect_geometry(w)?;
    write_solid_fill(w, shape.fill)?;
    w.open("a:ln", &[])?;
    w.empty("a:noFill", &[])?;
    w.close("a:ln")?;
    w.close("p:spPr")?;
    w.close("p:sp")
}

fn write_picture(w: &mut XmlWriter, id: &str, rel_id: &str, image: &ImageBox) -> Result<()> {
    w.open("p:pic", &[])?;
    w.open("p:nvPicPr", &[])?;
    w.empty("p:cNvPr", &[("id", id), ("name", image.name.as_str())])?;
    w.open("p:cNvPicPr", &[])?;
    w.empty("a:picLocks", &[("noChangeAspect", "1")])?;
    w.close("p:cNvPicPr")?;
    w.empty("p:nvPr", &[])?;
    w.close("p:nvPicPr")?;
    w.open("p:blipFill", &[])?;
    w.empty("a:blip", &[("r:embed", rel_id)])?;
    w.open("a:stretch", &[])?;
    w.empty("a:fillRect", &[])?;
    w.close("a:stretch")?;
    w.close("p:blipFill")?;
    w.open("p:spPr", &[])?;
    write_xfrm(w, image.rect)?;
    write_rect_geometry(w)?;
    w.close("p:spPr")?;
    w.close("p:pic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::{render, Archetype, Metric, TemplateProps};

    fn xml_for(archetype: Archetype, props: &TemplateProps) -> String {
        let mut canvas = SlideCanvas::new();
        render(archetype, props, &mut canvas);
        String::from_utf8(slide_xml(&canvas).unwrap()).unwrap()
    }

    #[test]
    fn test_title_box_geometry_and_font() {
        let xml = xml_for(Archetype::Narrative, &TemplateProps::with_title("Q3 Review"));

        assert!(xml.contains("name=\"Title\""));
        assert!(xml.contains("<a:off x=\"457200\" y=\"308610\"/>"));
        assert!(xml.contains("<a:ext cx=\"8229600\" cy=\"668655\"/>"));
        assert!(xml.contains("sz=\"3200\" b=\"1\""));
        assert!(xml.contains("<a:t>Q3 Review</a:t>"));
    }

    #[test]
    fn test_metric_cards_are_filled_shapes() {
        let props = TemplateProps {
            metrics: vec![Metric::new("Churn", "2.1%")],
            ..Default::default()
        };
        let xml = xml_for(Archetype::MetricsGrid, &props);

        assert!(xml.contains("name=\"Metric 1 Card\""));
        assert!(xml.contains("<a:srgbClr val=\"F3F4F6\"/>"));
        assert!(xml.contains("<a:t>2.1%</a:t>"));
    }

    #[test]
    fn test_bullets_and_line_breaks() {
        let props = TemplateProps {
            body: Some("line one\nline two".into()),
            bullets: vec!["point".into()],
            ..Default::default()
        };
        let xml = xml_for(Archetype::Narrative, &props);

        assert!(xml.contains("<a:buChar char=\"\u{2022}\"/>"));
        assert!(xml.contains("marL=\"228600\" indent=\"-228600\""));
        assert!(xml.contains("<a:br>"));
        assert!(xml.contains("<a:spcPts val=\"1000\"/>"));
    }

    #[test]
    fn test_slide_rels_reference_media() {
        let xml = String::from_utf8(slide_rels_xml(&["image1.png".to_string()]).unwrap()).unwrap();

        assert!(xml.contains("Target=\"../slideLayouts/slideLayout1.xml\""));
        assert!(xml.contains("Id=\"rId2\""));
        assert!(xml.contains("Target=\"../media/image1.png\""));
    }
}
