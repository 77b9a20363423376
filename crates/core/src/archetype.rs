//! Archetype renderer registry.
//!
//! Each archetype is a closed enum variant with its own placement routine;
//! dispatch is an exhaustive match. String identifiers only exist at the
//! boundary, where an unknown id is a fatal error.

use crate::canvas::{Paragraph, ShapeBox, SlideCanvas, SlideMaster, TextBox};
use crate::geometry::{palette, Density, Layout, LayoutResolver};
use crate::normalize::TextNormalizer;
use crate::types::{StructuredSlideContent, TemplateProps};
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Supported slide layout patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    /// Title with an optional key message, nothing else.
    TitleOnly,
    /// Headline numbers in a three-column grid.
    MetricsGrid,
    /// Paragraphs and bullets under a title.
    Narrative,
    /// Two columns side by side.
    Comparison,
    /// Milestones in a four-column grid.
    Timeline,
}

impl Archetype {
    /// Every supported archetype.
    pub const ALL: [Archetype; 5] = [
        Archetype::TitleOnly,
        Archetype::MetricsGrid,
        Archetype::Narrative,
        Archetype::Comparison,
        Archetype::Timeline,
    ];

    /// Wire identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Archetype::TitleOnly => "title-only",
            Archetype::MetricsGrid => "metrics-grid",
            Archetype::Narrative => "narrative",
            Archetype::Comparison => "comparison",
            Archetype::Timeline => "timeline",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Archetype {
    type Err = Error;

    /// Parse an identifier; case and `_`/`-` separators are not significant.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        Archetype::ALL
            .into_iter()
            .find(|a| a.id() == key)
            .ok_or_else(|| Error::UnknownArchetype(s.to_string()))
    }
}

/// Places an archetype's elements onto a canvas.
#[derive(Debug, Clone, Default)]
pub struct ArchetypeRenderer {
    resolver: LayoutResolver,
    normalizer: TextNormalizer,
}

impl ArchetypeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render by wire identifier.
    ///
    /// Fails with [`Error::UnknownArchetype`] before touching the canvas.
    pub fn render_by_id(&self, archetype_id: &str, props: &TemplateProps, canvas: &mut SlideCanvas) -> Result<()> {
        let archetype: Archetype = archetype_id.parse()?;
        self.render(archetype, props, canvas);
        Ok(())
    }

    /// Render one slide in a single pass.
    pub fn render(&self, archetype: Archetype, props: &TemplateProps, canvas: &mut SlideCanvas) {
        let density = Density::resolve(props.density.as_deref());
        let layout = self.resolver.resolve(archetype, density);
        let content = StructuredSlideContent::from_props_with(props, &self.normalizer);

        log::debug!(
            "Rendering {} at {} density ({} metrics)",
            archetype,
            density.as_str(),
            content.metrics.len()
        );

        canvas.define_master(SlideMaster {
            name: archetype.id().to_string(),
            ..Default::default()
        });
        draw_frame(&layout, &content, canvas);

        match archetype {
            Archetype::TitleOnly => {}
            Archetype::MetricsGrid => draw_metrics(&layout, &content, canvas),
            Archetype::Narrative => draw_narrative(&layout, &content, canvas),
            Archetype::Comparison => draw_comparison(&layout, &content, canvas),
            Archetype::Timeline => draw_timeline(&layout, &content, canvas),
        }

        if let Some(footnote) = &content.footnote {
            canvas.add_text(TextBox::single(
                "Footnote",
                layout.footnote,
                footnote,
                layout.styles.footnote.clone(),
            ));
        }
    }
}

/// Render a slide with the default renderer.
pub fn render(archetype: Archetype, props: &TemplateProps, canvas: &mut SlideCanvas) {
    ArchetypeRenderer::new().render(archetype, props, canvas);
}

/// Accent rule, title and subtitle.
fn draw_frame(layout: &Layout, content: &StructuredSlideContent, canvas: &mut SlideCanvas) {
    canvas.add_shape(ShapeBox {
        name: "Accent".to_string(),
        rect: layout.accent,
        fill: palette::ACCENT,
    });
    canvas.add_text(TextBox::single(
        "Title",
        layout.title,
        &content.title,
        layout.styles.title.clone(),
    ));
    if let Some(subtitle) = &content.subtitle {
        canvas.add_text(TextBox::single(
            "Subtitle",
            layout.subtitle,
            subtitle,
            layout.styles.subtitle.clone(),
        ));
    }
}

fn draw_metrics(layout: &Layout, content: &StructuredSlideContent, canvas: &mut SlideCanvas) {
    let Some(grid) = layout.grid else { return };

    for (i, metric) in content.metrics.iter().enumerate() {
        let cell = grid.cell(i);
        let n = i + 1;
        canvas.add_shape(ShapeBox {
            name: format!("Metric {} Card", n),
            rect: cell,
            fill: palette::CARD,
        });
        if !metric.value.is_empty() {
            canvas.add_text(TextBox::single(
                format!("Metric {} Value", n),
                cell.sub(0.05, 0.08, 0.90, 0.52),
                &metric.value,
                layout.styles.metric_value.clone(),
            ));
        }
        if !metric.label.is_empty() {
            canvas.add_text(TextBox::single(
                format!("Metric {} Label", n),
                cell.sub(0.05, 0.62, 0.90, 0.30),
                &metric.label,
                layout.styles.metric_label.clone(),
            ));
        }
    }
}

fn draw_narrative(layout: &Layout, content: &StructuredSlideContent, canvas: &mut SlideCanvas) {
    let paragraphs: Vec<Paragraph> = content
        .paragraphs
        .iter()
        .map(Paragraph::plain)
        .chain(content.bullets.iter().map(Paragraph::bulleted))
        .collect();
    if paragraphs.is_empty() {
        return;
    }

    canvas.add_text(TextBox {
        name: "Body".to_string(),
        rect: layout.body,
        paragraphs,
        style: layout.styles.body.clone(),
    });
}

fn draw_comparison(layout: &Layout, content: &StructuredSlideContent, canvas: &mut SlideCanvas) {
    let Some(grid) = layout.grid else { return };

    let columns = [("Left", content.left.as_ref()), ("Right", content.right.as_ref())];
    for (i, (side, column)) in columns.into_iter().enumerate() {
        let Some(column) = column else { continue };
        let cell = grid.cell(i);

        if let Some(heading) = &column.heading {
            canvas.add_text(TextBox::single(
                format!("{} Heading", side),
                cell.sub(0.0, 0.0, 1.0, 0.16),
                heading,
                layout.styles.heading.clone(),
            ));
        }
        canvas.add_shape(ShapeBox {
            name: format!("{} Rule", side),
            rect: cell.sub(0.0, 0.17, 1.0, 0.006),
            fill: palette::RULE,
        });
        if !column.points.is_empty() {
            canvas.add_text(TextBox {
                name: format!("{} Points", side),
                rect: cell.sub(0.0, 0.21, 1.0, 0.79),
                paragraphs: column.points.iter().map(Paragraph::bulleted).collect(),
                style: layout.styles.body.clone(),
            });
        }
    }
}

fn draw_timeline(layout: &Layout, content: &StructuredSlideContent, canvas: &mut SlideCanvas) {
    let Some(grid) = layout.grid else { return };

    for (i, milestone) in content.milestones.iter().enumerate() {
        let cell = grid.cell(i);
        let n = i + 1;
        canvas.add_shape(ShapeBox {
            name: format!("Milestone {} Marker", n),
            rect: cell.sub(0.0, 0.0, 1.0, 0.04),
            fill: palette::ACCENT,
        });
        canvas.add_text(TextBox::single(
            format!("Milestone {} Label", n),
            cell.sub(0.0, 0.08, 1.0, 0.30),
            &milestone.label,
            layout.styles.heading.clone(),
        ));
        if let Some(detail) = &milestone.detail {
            canvas.add_text(TextBox::single(
                format!("Milestone {} Detail", n),
                cell.sub(0.0, 0.40, 1.0, 0.60),
                detail,
                layout.styles.body.clone(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Element;
    use crate::geometry::Rect;
    use crate::types::{ComparisonColumn, Metric, Milestone, DEFAULT_TITLE};

    fn approx(a: Rect, b: Rect) -> bool {
        (a.x - b.x).abs() < 1e-9
            && (a.y - b.y).abs() < 1e-9
            && (a.w - b.w).abs() < 1e-9
            && (a.h - b.h).abs() < 1e-9
    }

    fn rendered(archetype: Archetype, props: &TemplateProps) -> SlideCanvas {
        let mut canvas = SlideCanvas::new();
        render(archetype, props, &mut canvas);
        canvas
    }

    #[test]
    fn test_parse_archetype_ids() {
        assert_eq!("metrics-grid".parse::<Archetype>().unwrap(), Archetype::MetricsGrid);
        assert_eq!("Title_Only".parse::<Archetype>().unwrap(), Archetype::TitleOnly);
        for archetype in Archetype::ALL {
            assert_eq!(archetype.id().parse::<Archetype>().unwrap(), archetype);
        }
    }

    #[test]
    fn test_unknown_archetype_is_error() {
        let err = "pie-chart".parse::<Archetype>().unwrap_err();
        assert!(matches!(err, Error::UnknownArchetype(ref id) if id == "pie-chart"));
    }

    #[test]
    fn test_render_by_id_unknown_leaves_canvas_untouched() {
        let mut canvas = SlideCanvas::new();
        let result = ArchetypeRenderer::new().render_by_id(
            "waterfall",
            &TemplateProps::with_title("x"),
            &mut canvas,
        );

        assert!(matches!(result, Err(Error::UnknownArchetype(_))));
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_every_archetype_renders_minimal_props() {
        for archetype in Archetype::ALL {
            let canvas = rendered(archetype, &TemplateProps::with_title("Minimal"));
            assert_eq!(canvas.text_box("Title").unwrap().text(), "Minimal");
            assert_eq!(canvas.master().name, archetype.id());
        }
    }

    #[test]
    fn test_missing_title_renders_default_label() {
        for archetype in Archetype::ALL {
            let canvas = rendered(archetype, &TemplateProps::default());
            assert_eq!(canvas.text_box("Title").unwrap().text(), DEFAULT_TITLE);
        }
    }

    #[test]
    fn test_absent_optional_fields_draw_nothing() {
        let canvas = rendered(Archetype::Narrative, &TemplateProps::with_title("Only a title"));

        assert!(canvas.text_box("Subtitle").is_none());
        assert!(canvas.text_box("Footnote").is_none());
        assert!(canvas.text_box("Body").is_none());
    }

    #[test]
    fn test_title_only_reference_geometry() {
        let props = TemplateProps {
            title: Some("Annual Plan".into()),
            subtitle: Some("Focus on retention".into()),
            footnote: Some("Draft".into()),
            ..Default::default()
        };
        let canvas = rendered(Archetype::TitleOnly, &props);

        let title = canvas.text_box("Title").unwrap();
        assert!(approx(title.rect, Rect::new(0.08, 0.33, 0.84, 0.18)));
        assert_eq!(title.style.size_pt, 40.0);
        let subtitle = canvas.text_box("Subtitle").unwrap();
        assert!(approx(subtitle.rect, Rect::new(0.08, 0.53, 0.84, 0.10)));
        let footnote = canvas.text_box("Footnote").unwrap();
        assert!(approx(footnote.rect, Rect::new(0.05, 0.89, 0.90, 0.06)));
    }

    #[test]
    fn test_metrics_grid_reference_geometry() {
        let props = TemplateProps {
            title: Some("KPIs".into()),
            metrics: (1..=4).map(|i| Metric::new(format!("M{}", i), format!("{}%", i * 10))).collect(),
            ..Default::default()
        };
        let canvas = rendered(Archetype::MetricsGrid, &props);

        let card_rects: Vec<Rect> = canvas
            .elements()
            .iter()
            .filter_map(|e| match e {
                Element::Shape(s) if s.name.ends_with("Card") => Some(s.rect),
                _ => None,
            })
            .collect();
        assert_eq!(card_rects.len(), 4);
        assert!(approx(card_rects[0], Rect::new(0.05, 0.31, 0.28, 0.24)));
        assert!(approx(card_rects[3], Rect::new(0.05, 0.59, 0.28, 0.24)));

        let value = canvas.text_box("Metric 2 Value").unwrap();
        assert_eq!(value.text(), "20%");
        assert!(approx(value.rect, Rect::new(0.374, 0.3292, 0.252, 0.1248)));
        let label = canvas.text_box("Metric 2 Label").unwrap();
        assert_eq!(label.text(), "M2");
        assert!(approx(label.rect, Rect::new(0.374, 0.4588, 0.252, 0.072)));
    }

    #[test]
    fn test_metrics_overflow_rendered_not_clipped() {
        let props = TemplateProps {
            metrics: (0..10).map(|i| Metric::new(format!("L{}", i), "1")).collect(),
            ..Default::default()
        };
        let canvas = rendered(Archetype::MetricsGrid, &props);

        let last = canvas.text_box("Metric 10 Label").unwrap();
        assert!(last.rect.y > 1.0);
    }

    #[test]
    fn test_density_switch_changes_scale() {
        let mut props = TemplateProps::with_title("Dense");
        props.density = Some("compact".into());
        let compact = rendered(Archetype::Narrative, &props);

        props.density = Some("cinematic".into());
        let fallback = rendered(Archetype::Narrative, &props);

        assert_eq!(compact.text_box("Title").unwrap().style.size_pt, 26.0);
        assert_eq!(fallback.text_box("Title").unwrap().style.size_pt, 32.0);
    }

    #[test]
    fn test_narrative_body_paragraphs_then_bullets() {
        let props = TemplateProps {
            title: Some("Why now".into()),
            body: Some("Market is shifting.\n\nWe are early.".into()),
            bullets: vec!["Lower CAC".into(), "Faster onboarding".into()],
            ..Default::default()
        };
        let canvas = rendered(Archetype::Narrative, &props);
        let body = canvas.text_box("Body").unwrap();

        assert_eq!(body.paragraphs.len(), 4);
        assert!(!body.paragraphs[1].bullet);
        assert!(body.paragraphs[2].bullet);
        assert_eq!(body.paragraphs[3].text, "Faster onboarding");
    }

    #[test]
    fn test_comparison_keeps_column_positions() {
        let props = TemplateProps {
            right: Some(ComparisonColumn {
                heading: Some("After".into()),
                points: vec!["Automated".into()],
            }),
            ..Default::default()
        };
        let canvas = rendered(Archetype::Comparison, &props);

        assert!(canvas.text_box("Left Heading").is_none());
        let heading = canvas.text_box("Right Heading").unwrap();
        assert!(approx(heading.rect, Rect::new(0.52, 0.31, 0.43, 0.0864)));
        assert_eq!(canvas.text_box("Right Points").unwrap().paragraphs[0].text, "Automated");
    }

    #[test]
    fn test_timeline_milestones() {
        let props = TemplateProps {
            milestones: vec![
                Milestone { label: "Q1".into(), detail: Some("Pilot".into()) },
                Milestone { label: "Q2".into(), detail: None },
            ],
            ..Default::default()
        };
        let canvas = rendered(Archetype::Timeline, &props);

        let label = canvas.text_box("Milestone 2 Label").unwrap();
        assert!(approx(label.rect, Rect::new(0.28, 0.3276, 0.21, 0.066)));
        assert!(canvas.text_box("Milestone 1 Detail").is_some());
        assert!(canvas.text_box("Milestone 2 Detail").is_none());
    }

    #[test]
    fn test_render_is_deterministic() {
        let props = TemplateProps {
            title: Some("Same".into()),
            metrics: vec![Metric::new("a", "1")],
            ..Default::default()
        };
        assert_eq!(
            rendered(Archetype::MetricsGrid, &props),
            rendered(Archetype::MetricsGrid, &props)
        );
    }
}
