//! Package-level parts shared by every exported deck.
//!
//! Everything here is a pure function of its arguments; nothing reads the
//! clock, so identical input yields identical bytes.

use crate::xml::{relationships_xml, Relationship, XmlWriter, NS_A, PML_NAMESPACES};
use slide_core::canvas::SlideMaster;
use slide_core::geometry::{palette, SLIDE_HEIGHT_EMU, SLIDE_WIDTH_EMU};
use slide_core::Result;

/// Relationship type URIs.
pub(crate) mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

/// Content type strings for overrides.
mod content_types {
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
}

/// Document-level metadata written to `docProps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckProperties {
    pub title: String,
    pub author: String,
    pub company: Option<String>,
    /// Application name recorded in `docProps/app.xml`.
    pub application: String,
}

impl DeckProperties {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            company: None,
            application: "slidecraft".to_string(),
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }
}

/// `[Content_Types].xml`
pub(crate) fn content_types_xml(slide_count: usize, media: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open(
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    )?;
    w.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", content_types::RELATIONSHIPS)],
    )?;
    w.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for &(extension, content_type) in media {
        w.empty("Default", &[("Extension", extension), ("ContentType", content_type)])?;
    }

    let mut overrides: Vec<(String, &str)> = vec![
        ("/ppt/presentation.xml".to_string(), content_types::PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), content_types::SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), content_types::SLIDE_LAYOUT),
    ];
    for n in 1..=slide_count {
        overrides.push((format!("/ppt/slides/slide{}.xml", n), content_types::SLIDE));
    }
    overrides.extend([
        ("/ppt/theme/theme1.xml".to_string(), content_types::THEME),
        ("/ppt/presProps.xml".to_string(), content_types::PRES_PROPS),
        ("/ppt/viewProps.xml".to_string(), content_types::VIEW_PROPS),
        ("/ppt/tableStyles.xml".to_string(), content_types::TABLE_STYLES),
        ("/docProps/core.xml".to_string(), content_types::CORE),
        ("/docProps/app.xml".to_string(), content_types::EXTENDED),
    ]);
    for (part, content_type) in &overrides {
        w.empty("Override", &[("PartName", part.as_str()), ("ContentType", *content_type)])?;
    }

    w.close("Types")?;
    Ok(w.finish())
}

/// `_rels/.rels`
pub(crate) fn root_rels_xml() -> Result<Vec<u8>> {
    relationships_xml(&[
        Relationship::new(1, rel_types::OFFICE_DOCUMENT, "ppt/presentation.xml"),
        Relationship::new(2, rel_types::CORE_PROPERTIES, "docProps/core.xml"),
        Relationship::new(3, rel_types::EXTENDED_PROPERTIES, "docProps/app.xml"),
    ])
}

/// `docProps/core.xml`. No timestamps are written.
pub(crate) fn core_props_xml(props: &DeckProperties) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:dcmitype", "http://purl.org/dc/dcmitype/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    w.leaf("dc:title", &props.title)?;
    w.leaf("dc:creator", &props.author)?;
    w.leaf("cp:lastModifiedBy", &props.author)?;
    w.leaf("cp:revision", "1")?;
    w.close("cp:coreProperties")?;
    Ok(w.finish())
}

/// `docProps/app.xml`
pub(crate) fn app_props_xml(props: &DeckProperties, slide_count: usize) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open(
        "Properties",
        &[
            (
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            ),
            (
                "xmlns:vt",
                "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
            ),
        ],
    )?;
    w.leaf("Application", &props.application)?;
    w.leaf("PresentationFormat", "On-screen Show (16:9)")?;
    w.leaf("Slides", &slide_count.to_string())?;
    if let Some(company) = &props.company {
        w.leaf("Company", company)?;
    }
    w.leaf("AppVersion", "16.0000")?;
    w.close("Properties")?;
    Ok(w.finish())
}

/// `ppt/presentation.xml`. Master is rId1, slides follow from rId2.
pub(crate) fn presentation_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    let mut root: Vec<(&str, &str)> = PML_NAMESPACES.to_vec();
    root.push(("saveSubsetFonts", "1"));
    w.open("p:presentation", &root)?;

    w.open("p:sldMasterIdLst", &[])?;
    w.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    w.close("p:sldMasterIdLst")?;

    w.open("p:sldIdLst", &[])?;
    for n in 0..slide_count {
        let id = (256 + n).to_string();
        let rid = format!("rId{}", n + 2);
        w.empty("p:sldId", &[("id", id.as_str()), ("r:id", rid.as_str())])?;
    }
    w.close("p:sldIdLst")?;

    let cx = SLIDE_WIDTH_EMU.to_string();
    let cy = SLIDE_HEIGHT_EMU.to_string();
    w.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    w.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    w.close("p:presentation")?;
    Ok(w.finish())
}

/// `ppt/_rels/presentation.xml.rels`
pub(crate) fn presentation_rels_xml(slide_count: usize) -> Result<Vec<u8>> {
    let mut rels = vec![Relationship::new(
        1,
        rel_types::SLIDE_MASTER,
        "slideMasters/slideMaster1.xml",
    )];
    for n in 1..=slide_count {
        rels.push(Relationship::new(n + 1, rel_types::SLIDE, format!("slides/slide{}.xml", n)));
    }
    let next = slide_count + 2;
    rels.push(Relationship::new(next, rel_types::PRES_PROPS, "presProps.xml"));
    rels.push(Relationship::new(next + 1, rel_types::VIEW_PROPS, "viewProps.xml"));
    rels.push(Relationship::new(next + 2, rel_types::THEME, "theme/theme1.xml"));
    rels.push(Relationship::new(next + 3, rel_types::TABLE_STYLES, "tableStyles.xml"));
    relationships_xml(&rels)
}

pub(crate) fn pres_props_xml() -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.empty("p:presentationPr", &PML_NAMESPACES)?;
    Ok(w.finish())
}

pub(crate) fn view_props_xml() -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open("p:viewPr", &PML_NAMESPACES)?;
    w.empty("p:gridSpacing", &[("cx", "76200"), ("cy", "76200")])?;
    w.close("p:viewPr")?;
    Ok(w.finish())
}

pub(crate) fn table_styles_xml() -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.empty(
        "a:tblStyleLst",
        &[("xmlns:a", NS_A), ("def", "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}")],
    )?;
    Ok(w.finish())
}

/// Empty group properties every `spTree` starts with.
pub(crate) fn write_group_header(w: &mut XmlWriter) -> Result<()> {
    w.open("p:nvGrpSpPr", &[])?;
    w.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    w.empty("p:cNvGrpSpPr", &[])?;
    w.empty("p:nvPr", &[])?;
    w.close("p:nvGrpSpPr")?;
    w.open("p:grpSpPr", &[])?;
    w.open("a:xfrm", &[])?;
    w.empty("a:off", &[("x", "0"), ("y", "0")])?;
    w.empty("a:ext", &[("cx", "0"), ("cy", "0")])?;
    w.empty("a:chOff", &[("x", "0"), ("y", "0")])?;
    w.empty("a:chExt", &[("cx", "0"), ("cy", "0")])?;
    w.close("a:xfrm")?;
    w.close("p:grpSpPr")
}

/// Solid background fill.
pub(crate) fn write_background(w: &mut XmlWriter, color: &str) -> Result<()> {
    w.open("p:bg", &[])?;
    w.open("p:bgPr", &[])?;
    w.open("a:solidFill", &[])?;
    w.empty("a:srgbClr", &[("val", color)])?;
    w.close("a:solidFill")?;
    w.empty("a:effectLst", &[])?;
    w.close("p:bgPr")?;
    w.close("p:bg")
}

/// `ppt/slideMasters/slideMaster1.xml`
pub(crate) fn slide_master_xml(master: &SlideMaster) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open("p:sldMaster", &PML_NAMESPACES)?;
    w.open("p:cSld", &[("name", master.name.as_str())])?;
    write_background(&mut w, master.background)?;
    w.open("p:spTree", &[])?;
    write_group_header(&mut w)?;
    w.close("p:spTree")?;
    w.close("p:cSld")?;
    w.empty(
        "p:clrMap",
        &[
            ("bg1", "lt1"),
            ("tx1", "dk1"),
            ("bg2", "lt2"),
            ("tx2", "dk2"),
            ("accent1", "accent1"),
            ("accent2", "accent2"),
            ("accent3", "accent3"),
            ("accent4", "accent4"),
            ("accent5", "accent5"),
            ("accent6", "accent6"),
            ("hlink", "hlink"),
            ("folHlink", "folHlink"),
        ],
    )?;
    w.open("p:sldLayoutIdLst", &[])?;
    w.empty("p:sldLayoutId", &[("id", "2147483649"), ("r:id", "rId1")])?;
    w.close("p:sldLayoutIdLst")?;
    w.open("p:txStyles", &[])?;
    for style in ["p:titleStyle", "p:bodyStyle", "p:otherStyle"] {
        w.open(style, &[])?;
        w.open("a:lvl1pPr", &[])?;
        w.open("a:defRPr", &[])?;
        w.empty("a:latin", &[("typeface", master.font_face)])?;
        w.close("a:defRPr")?;
        w.close("a:lvl1pPr")?;
        w.close(style)?;
    }
    w.close("p:txStyles")?;
    w.close("p:sldMaster")?;
    Ok(w.finish())
}

pub(crate) fn slide_master_rels_xml() -> Result<Vec<u8>> {
    relationships_xml(&[
        Relationship::new(1, rel_types::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
        Relationship::new(2, rel_types::THEME, "../theme/theme1.xml"),
    ])
}

/// `ppt/slideLayouts/slideLayout1.xml`, a blank layout.
pub(crate) fn slide_layout_xml() -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    let mut root: Vec<(&str, &str)> = PML_NAMESPACES.to_vec();
    root.extend([("type", "blank"), ("preserve", "1")]);
    w.open("p:sldLayout", &root)?;
    w.open("p:cSld", &[("name", "Blank")])?;
    w.open("p:spTree", &[])?;
    write_group_header(&mut w)?;
    w.close("p:spTree")?;
    w.close("p:cSld")?;
    w.open("p:clrMapOvr", &[])?;
    w.empty("a:masterClrMapping", &[])?;
    w.close("p:clrMapOvr")?;
    w.close("p:sldLayout")?;
    Ok(w.finish())
}

pub(crate) fn slide_layout_rels_xml() -> Result<Vec<u8>> {
    relationships_xml(&[Relationship::new(
        1,
        rel_types::SLIDE_MASTER,
        "../slideMasters/slideMaster1.xml",
    )])
}

/// `ppt/theme/theme1.xml`, built from the fixed palette.
pub(crate) fn theme_xml(font_face: &str) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new()?;
    w.open("a:theme", &[("xmlns:a", NS_A), ("name", "Slide Theme")])?;
    w.open("a:themeElements", &[])?;

    w.open("a:clrScheme", &[("name", "Slide Palette")])?;
    let scheme = [
        ("a:dk1", palette::INK),
        ("a:lt1", palette::BACKGROUND),
        ("a:dk2", palette::MUTED),
        ("a:lt2", palette::CARD),
        ("a:accent1", palette::ACCENT),
        ("a:accent2", palette::MUTED),
        ("a:accent3", palette::RULE),
        ("a:accent4", palette::INK),
        ("a:accent5", palette::ACCENT),
        ("a:accent6", palette::MUTED),
        ("a:hlink", palette::ACCENT),
        ("a:folHlink", palette::MUTED),
    ];
    for (slot, color) in scheme {
        w.open(slot, &[])?;
        w.empty("a:srgbClr", &[("val", color)])?;
        w.close(slot)?;
    }
    w.close("a:clrScheme")?;

    w.open("a:fontScheme", &[("name", "Slide Fonts")])?;
    for group in ["a:majorFont", "a:minorFont"] {
        w.open(group, &[])?;
        w.empty("a:latin", &[("typeface", font_face)])?;
        w.empty("a:ea", &[("typeface", "")])?;
        w.empty("a:cs", &[("typeface", "")])?;
        w.close(group)?;
    }
    w.close("a:fontScheme")?;

    w.open("a:fmtScheme", &[("name", "Slide Format")])?;
    w.open("a:fillStyleLst", &[])?;
    for _ in 0..3 {
        write_scheme_fill(&mut w)?;
    }
    w.close("a:fillStyleLst")?;
    w.open("a:lnStyleLst", &[])?;
    for width in ["6350", "12700", "19050"] {
        w.open("a:ln", &[("w", width)])?;
        write_scheme_fill(&mut w)?;
        w.close("a:ln")?;
    }
    w.close("a:lnStyleLst")?;
    w.open("a:effectStyleLst", &[])?;
    for _ in 0..3 {
        w.open("a:effectStyle", &[])?;
        w.empty("a:effectLst", &[])?;
        w.close("a:effectStyle")?;
    }
    w.close("a:effectStyleLst")?;
    w.open("a:bgFillStyleLst", &[])?;
    for _ in 0..3 {
        write_scheme_fill(&mut w)?;
    }
    w.close("a:bgFillStyleLst")?;
    w.close("a:fmtScheme")?;

    w.close("a:themeElements")?;
    w.close("a:theme")?;
    Ok(w.finish())
}

fn write_scheme_fill(w: &mut XmlWriter) -> Result<()> {
    w.open("a:solidFill", &[])?;
    w.empty("a:schemeClr", &[("val", "phClr")])?;
    w.close("a:solidFill")
}
