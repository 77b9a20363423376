//! Export pipeline: archetype id + props in, presentation artifact out.

use crate::parts::DeckProperties;
use crate::writer::{PptxWriter, SlideImage};
use serde::{Deserialize, Serialize};
use slide_core::{
    Archetype, ArchetypeRenderer, ExportArtifact, Result, SlideCanvas, TemplateProps, DEFAULT_TITLE,
};

const DEFAULT_PRODUCT: &str = "slidecraft";

/// Number of slide id characters kept in the download filename.
const SLIDE_ID_PREFIX_LEN: usize = 8;

/// Settings shared by every export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Product name, used as the filename prefix and application name.
    pub product_name: String,
    /// Author recorded in the document properties.
    pub author: String,
    pub company: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            product_name: DEFAULT_PRODUCT.to_string(),
            author: DEFAULT_PRODUCT.to_string(),
            company: None,
        }
    }
}

impl ExportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    fn deck_properties(&self, title: &str) -> DeckProperties {
        let props = DeckProperties::new(title, self.author.as_str())
            .with_application(self.product_name.as_str());
        match &self.company {
            Some(company) => props.with_company(company.as_str()),
            None => props,
        }
    }
}

/// Turns template props into downloadable presentation files.
///
/// Stateless apart from configuration; every call regenerates its output.
#[derive(Debug, Clone, Default)]
pub struct SlideExporter {
    config: ExportConfig,
    renderer: ArchetypeRenderer,
}

impl SlideExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            renderer: ArchetypeRenderer::new(),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export one slide for a string archetype id.
    ///
    /// An unknown id fails before any document is started.
    pub fn export(&self, archetype_id: &str, props: &TemplateProps, slide_id: &str) -> Result<ExportArtifact> {
        let archetype: Archetype = archetype_id.parse()?;
        self.export_archetype(archetype, props, slide_id)
    }

    pub fn export_archetype(
        &self,
        archetype: Archetype,
        props: &TemplateProps,
        slide_id: &str,
    ) -> Result<ExportArtifact> {
        log::debug!("Exporting slide {} as {}", slide_id, archetype);

        let mut canvas = SlideCanvas::new();
        self.renderer.render(archetype, props, &mut canvas);

        let title = canvas
            .text_box("Title")
            .map(|t| t.text())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let bytes = PptxWriter::new(self.config.deck_properties(&title)).finalize(&canvas)?;

        Ok(ExportArtifact::presentation(bytes, self.filename_for(slide_id)))
    }

    /// Export a deck with one full-slide image per slide.
    pub fn export_image_deck(&self, images: &[SlideImage], deck_title: &str) -> Result<ExportArtifact> {
        let title = match deck_title.trim() {
            "" => DEFAULT_TITLE,
            t => t,
        };
        let bytes = PptxWriter::new(self.config.deck_properties(title)).write_image_deck(images)?;
        Ok(ExportArtifact::presentation(
            bytes,
            format!("{}-deck.pptx", self.config.product_name),
        ))
    }

    /// `<product>-<first 8 chars of slide id>.pptx`
    pub fn filename_for(&self, slide_id: &str) -> String {
        let prefix: String = slide_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(SLIDE_ID_PREFIX_LEN)
            .collect();
        let prefix = if prefix.is_empty() { "slide".to_string() } else { prefix };
        format!("{}-{}.pptx", self.config.product_name, prefix)
    }
}
