//! CLI tool for exporting archetype slides.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slide_core::error::Cause;
use slide_core::{ArchetypeRenderer, DownstreamFormatter, ImageFormat, SlideCanvas, TemplateProps};
use slide_input::InputParser;
use slide_pptx::{ExportConfig, PptxInspector, SlideExporter, SlideImage};
use slide_snapshot::{copy_to_clipboard, ClipboardSink, SnapshotExporter, SnapshotImage, SurfaceRenderer};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Export slides as presentations and images, and inspect uploads.
#[derive(Parser, Debug)]
#[command(name = "slide-export")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Export settings as a JSON file (productName, author, company)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one slide as a .pptx file
    Export {
        /// Archetype id (title-only, metrics-grid, narrative, comparison, timeline)
        #[arg(short, long)]
        archetype: String,

        /// Template props as a JSON file
        #[arg(short, long)]
        props: PathBuf,

        /// Slide id used in the output filename
        #[arg(short, long, default_value = "local")]
        slide_id: String,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a deck with one full-slide image per input image
    Deck {
        /// Image files (.png, .jpg, .gif) or directories of them, one slide each
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Document title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a tabular upload and print it as the downstream text
    Parse {
        /// Input file (.csv, .xlsx, .xls, .json)
        input: PathBuf,

        /// Maximum data rows printed
        #[arg(short = 'n', long, default_value = "50")]
        max_rows: usize,

        /// Print the parsed shape as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Render a slide preview and capture it as PNG
    Snapshot {
        /// Archetype id
        #[arg(short, long)]
        archetype: String,

        /// Template props as a JSON file
        #[arg(short, long)]
        props: PathBuf,

        /// Write the PNG here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the SVG preview surface here
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Preview width in pixels; height keeps 16:9
        #[arg(long, default_value = "960")]
        width: u32,

        /// Copy the PNG to the system clipboard
        #[arg(long)]
        copy: bool,
    },

    /// List the text of every shape in an exported .pptx
    Inspect {
        /// Presentation file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Export {
            archetype,
            props,
            slide_id,
            output,
        } => {
            let props = load_props(&props)?;
            let artifact = SlideExporter::new(config).export(&archetype, &props, &slide_id)?;
            let path = output_dir(output.as_deref())?.join(&artifact.filename);
            write_output(&path, &artifact.bytes)?;
            println!("{}", path.display());
        }
        Command::Deck { images, title, output } => {
            let images = collect_images(&images)?;
            let mut slides = Vec::with_capacity(images.len());
            for path in &images {
                let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
                let image =
                    SlideImage::from_bytes(bytes).with_context(|| format!("Unsupported image {}", path.display()))?;
                slides.push(image);
            }
            let artifact = SlideExporter::new(config).export_image_deck(&slides, &title)?;
            let path = output_dir(output.as_deref())?.join(&artifact.filename);
            write_output(&path, &artifact.bytes)?;
            println!("{}", path.display());
        }
        Command::Parse { input, max_rows, json } => {
            let data = InputParser::new()
                .parse_file(&input)
                .with_context(|| format!("Failed to parse {}", input.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!("{}", DownstreamFormatter::new().with_max_rows(max_rows).format(&data));
            }
        }
        Command::Snapshot {
            archetype,
            props,
            output,
            svg,
            width,
            copy,
        } => {
            let props = load_props(&props)?;
            let mut canvas = SlideCanvas::new();
            ArchetypeRenderer::new().render_by_id(&archetype, &props, &mut canvas)?;
            let surface = SurfaceRenderer::new()
                .with_size(width, preview_height(width))
                .render(&canvas);
            let exporter = SnapshotExporter::new();

            if let Some(path) = &svg {
                write_output(path, surface.svg.as_bytes())?;
            }
            let image = if copy {
                let mut clipboard = SystemClipboard::open()?;
                let image = copy_to_clipboard(&exporter, &surface, &mut clipboard)?;
                if args.verbose {
                    eprintln!("Copied {}x{} snapshot to the clipboard", image.width, image.height);
                }
                image
            } else {
                exporter.snapshot(&surface)?
            };
            if let Some(path) = &output {
                write_output(path, &image.png)?;
                println!("{}", path.display());
            }
        }
        Command::Inspect { input } => {
            let file = File::open(&input).with_context(|| format!("Failed to open {}", input.display()))?;
            let deck = PptxInspector::new().inspect(BufReader::new(file))?;
            print!("{}", describe_deck(&deck));
        }
    }

    Ok(())
}

/// Load export settings, falling back to defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<ExportConfig> {
    match path {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config in {}", path.display()))
        }
        None => Ok(ExportConfig::default()),
    }
}

fn load_props(path: &Path) -> Result<TemplateProps> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid template props in {}", path.display()))
}

/// Expand directories into their image files, sorted by name.
fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            images.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in std::fs::read_dir(input).with_context(|| format!("Failed to read {}", input.display()))? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
                .is_some();
            if path.is_file() && is_image {
                found.push(path);
            }
        }
        found.sort();
        log::debug!("Found {} images in {}", found.len(), input.display());
        images.extend(found);
    }
    if images.is_empty() {
        anyhow::bail!("No images found");
    }
    Ok(images)
}

fn preview_height(width: u32) -> u32 {
    (width as u64 * 9 / 16).max(1) as u32
}

/// Resolve the output directory, creating it if needed.
fn output_dir(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            Ok(dir.to_path_buf())
        }
        None => Ok(PathBuf::from(".")),
    }
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

fn describe_deck(deck: &slide_pptx::InspectedDeck) -> String {
    let mut out = String::new();
    if let Some(title) = &deck.title {
        out.push_str(&format!("Title: {}\n", title));
    }
    for slide in &deck.slides {
        out.push_str(&format!("Slide {}\n", slide.number));
        for shape in slide.shapes.iter().filter(|s| !s.text.is_empty()) {
            out.push_str(&format!("  [{}] {}\n", shape.name, shape.text.replace('\n', " / ")));
        }
    }
    out
}

/// System clipboard backed by `arboard`. Takes raw pixels, not PNG bytes.
struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    fn open() -> Result<Self> {
        let inner = arboard::Clipboard::new().context("Failed to open the system clipboard")?;
        Ok(Self { inner })
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_image(&mut self, mime_type: &str, image: &SnapshotImage) -> std::result::Result<(), Cause> {
        log::debug!("Writing {} ({}x{}) to the clipboard", mime_type, image.width, image.height);
        self.inner.set_image(arboard::ImageData {
            width: image.width as usize,
            height: image.height as usize,
            bytes: Cow::Borrowed(image.rgba.as_slice()),
        })?;
        Ok(())
    }
}
