//! Geometry and style resolution for slide layouts.
//!
//! Every position is a fraction of the slide width or height, so layouts are
//! resolution-independent. Conversion to EMU happens only at serialization.

use crate::archetype::Archetype;

/// Slide width in EMU (10 in, 16:9).
pub const SLIDE_WIDTH_EMU: i64 = 9_144_000;

/// Slide height in EMU (5.625 in, 16:9).
pub const SLIDE_HEIGHT_EMU: i64 = 5_143_500;

/// EMU per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Font family used for every text run.
pub const FONT_FACE: &str = "Calibri";

/// Fixed color palette (RGB hex, no leading `#`).
pub mod palette {
    pub const BACKGROUND: &str = "FFFFFF";
    pub const INK: &str = "1F2937";
    pub const MUTED: &str = "6B7280";
    pub const ACCENT: &str = "2563EB";
    pub const CARD: &str = "F3F4F6";
    pub const RULE: &str = "D1D5DB";
}

/// Axis-aligned rectangle in slide fractions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering the whole slide.
    pub const fn full() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Sub-rectangle whose coordinates are fractions of this rectangle.
    pub fn sub(&self, fx: f64, fy: f64, fw: f64, fh: f64) -> Rect {
        Rect::new(
            self.x + fx * self.w,
            self.y + fy * self.h,
            fw * self.w,
            fh * self.h,
        )
    }

    /// Offset, size in EMU.
    pub fn to_emu(&self) -> EmuRect {
        EmuRect {
            x: (self.x * SLIDE_WIDTH_EMU as f64).round() as i64,
            y: (self.y * SLIDE_HEIGHT_EMU as f64).round() as i64,
            cx: (self.w * SLIDE_WIDTH_EMU as f64).round() as i64,
            cy: (self.h * SLIDE_HEIGHT_EMU as f64).round() as i64,
        }
    }
}

/// Rectangle in English Metric Units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmuRect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// Compactness setting scaling typography and vertical spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Density {
    #[default]
    Presentation,
    Compact,
}

impl Density {
    /// Resolve a density name, falling back to the default for unknown values.
    pub fn resolve(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            None => Self::default(),
            Some(v) => match v.as_str() {
                "compact" => Density::Compact,
                "presentation" => Density::Presentation,
                other => {
                    log::debug!("Unrecognized density '{}', using default", other);
                    Self::default()
                }
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Presentation => "presentation",
            Density::Compact => "compact",
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Vertical text anchoring inside a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Middle,
    Bottom,
}

/// Resolved text attributes for one element kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_face: &'static str,
    pub size_pt: f64,
    pub color: &'static str,
    pub bold: bool,
    pub align: Align,
    pub anchor: Anchor,
    /// Space after each paragraph, in points.
    pub space_after_pt: f64,
}

impl TextStyle {
    fn new(size_pt: f64, color: &'static str) -> Self {
        Self {
            font_face: FONT_FACE,
            size_pt,
            color,
            bold: false,
            align: Align::Left,
            anchor: Anchor::Top,
            space_after_pt: 0.0,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    fn spaced(mut self, space_after_pt: f64) -> Self {
        self.space_after_pt = space_after_pt;
        self
    }
}

/// Font sizes in points for one density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeScale {
    pub hero: f64,
    pub title: f64,
    pub subtitle: f64,
    pub heading: f64,
    pub body: f64,
    pub metric_value: f64,
    pub metric_label: f64,
    pub footnote: f64,
    pub paragraph_spacing: f64,
}

impl TypeScale {
    pub fn for_density(density: Density) -> Self {
        match density {
            Density::Presentation => TypeScale {
                hero: 40.0,
                title: 32.0,
                subtitle: 18.0,
                heading: 18.0,
                body: 16.0,
                metric_value: 30.0,
                metric_label: 12.0,
                footnote: 10.0,
                paragraph_spacing: 10.0,
            },
            Density::Compact => TypeScale {
                hero: 34.0,
                title: 26.0,
                subtitle: 15.0,
                heading: 15.0,
                body: 13.0,
                metric_value: 24.0,
                metric_label: 10.0,
                footnote: 9.0,
                paragraph_spacing: 6.0,
            },
        }
    }
}

/// Styles for every element kind an archetype can draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Styles {
    pub title: TextStyle,
    pub subtitle: TextStyle,
    pub heading: TextStyle,
    pub body: TextStyle,
    pub metric_value: TextStyle,
    pub metric_label: TextStyle,
    pub footnote: TextStyle,
}

impl Styles {
    fn for_scale(scale: &TypeScale, title_size: f64) -> Self {
        Styles {
            title: TextStyle::new(title_size, palette::INK).bold().anchor(Anchor::Bottom),
            subtitle: TextStyle::new(scale.subtitle, palette::MUTED),
            heading: TextStyle::new(scale.heading, palette::ACCENT).bold(),
            body: TextStyle::new(scale.body, palette::INK).spaced(scale.paragraph_spacing),
            metric_value: TextStyle::new(scale.metric_value, palette::ACCENT)
                .bold()
                .align(Align::Center)
                .anchor(Anchor::Bottom),
            metric_label: TextStyle::new(scale.metric_label, palette::MUTED).align(Align::Center),
            footnote: TextStyle::new(scale.footnote, palette::MUTED).anchor(Anchor::Bottom),
        }
    }
}

/// Fixed-column grid for multi-item content.
///
/// Item `i` occupies column `i % columns` and row `i / columns`. Rows past
/// the body region keep growing downward; nothing is clipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub origin_x: f64,
    pub origin_y: f64,
    pub columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub gap_x: f64,
    pub gap_y: f64,
}

impl Grid {
    /// Grid filling `region` horizontally with `columns` equal cells.
    fn spanning(region: Rect, columns: usize, gap_x: f64, cell_height: f64, gap_y: f64) -> Self {
        let columns = columns.max(1);
        let cell_width = (region.w - gap_x * (columns - 1) as f64) / columns as f64;
        Self {
            origin_x: region.x,
            origin_y: region.y,
            columns,
            cell_width,
            cell_height,
            gap_x,
            gap_y,
        }
    }

    /// Rectangle of the item at `index`.
    pub fn cell(&self, index: usize) -> Rect {
        let column = index % self.columns;
        let row = index / self.columns;
        Rect::new(
            self.origin_x + column as f64 * (self.cell_width + self.gap_x),
            self.origin_y + row as f64 * (self.cell_height + self.gap_y),
            self.cell_width,
            self.cell_height,
        )
    }
}

/// Fully resolved geometry and style for one archetype at one density.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub archetype: Archetype,
    pub density: Density,
    pub title: Rect,
    pub subtitle: Rect,
    pub body: Rect,
    pub footnote: Rect,
    /// Short accent rule drawn above the title.
    pub accent: Rect,
    pub grid: Option<Grid>,
    pub styles: Styles,
}

/// Anchor regions shared by content archetypes.
struct Frame {
    title: Rect,
    subtitle: Rect,
    body: Rect,
    footnote: Rect,
    accent: Rect,
}

impl Frame {
    fn for_density(density: Density) -> Self {
        match density {
            Density::Presentation => Frame {
                title: Rect::new(0.05, 0.06, 0.90, 0.13),
                subtitle: Rect::new(0.05, 0.19, 0.90, 0.08),
                body: Rect::new(0.05, 0.31, 0.90, 0.54),
                footnote: Rect::new(0.05, 0.89, 0.90, 0.06),
                accent: Rect::new(0.05, 0.045, 0.06, 0.008),
            },
            Density::Compact => Frame {
                title: Rect::new(0.05, 0.05, 0.90, 0.10),
                subtitle: Rect::new(0.05, 0.15, 0.90, 0.07),
                body: Rect::new(0.05, 0.25, 0.90, 0.62),
                footnote: Rect::new(0.05, 0.90, 0.90, 0.05),
                accent: Rect::new(0.05, 0.035, 0.06, 0.008),
            },
        }
    }
}

/// Computes layouts from `(archetype, density)`. Pure and stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutResolver;

impl LayoutResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the layout for an archetype at a density.
    pub fn resolve(&self, archetype: Archetype, density: Density) -> Layout {
        let frame = Frame::for_density(density);
        let scale = TypeScale::for_density(density);
        let compact = density == Density::Compact;

        let mut layout = Layout {
            archetype,
            density,
            title: frame.title,
            subtitle: frame.subtitle,
            body: frame.body,
            footnote: frame.footnote,
            accent: frame.accent,
            grid: None,
            styles: Styles::for_scale(&scale, scale.title),
        };

        match archetype {
            Archetype::TitleOnly => {
                let (title, subtitle, accent) = if compact {
                    (
                        Rect::new(0.08, 0.35, 0.84, 0.15),
                        Rect::new(0.08, 0.51, 0.84, 0.09),
                        Rect::new(0.08, 0.32, 0.08, 0.01),
                    )
                } else {
                    (
                        Rect::new(0.08, 0.33, 0.84, 0.18),
                        Rect::new(0.08, 0.53, 0.84, 0.10),
                        Rect::new(0.08, 0.30, 0.08, 0.01),
                    )
                };
                layout.title = title;
                layout.subtitle = subtitle;
                layout.accent = accent;
                layout.styles = Styles::for_scale(&scale, scale.hero);
            }
            Archetype::MetricsGrid => {
                let (cell_height, gap_y) = if compact { (0.19, 0.025) } else { (0.24, 0.04) };
                layout.grid = Some(Grid::spanning(frame.body, 3, 0.03, cell_height, gap_y));
            }
            Archetype::Narrative => {}
            Archetype::Comparison => {
                layout.grid = Some(Grid::spanning(frame.body, 2, 0.04, frame.body.h, 0.0));
            }
            Archetype::Timeline => {
                let (cell_height, gap_y) = if compact { (0.18, 0.025) } else { (0.22, 0.04) };
                layout.grid = Some(Grid::spanning(frame.body, 4, 0.02, cell_height, gap_y));
            }
        }

        layout
    }
}
