//! CLI binary for imgpdf.
//!
//! A thin shim over the library crate: loads files into a `FileRegistry`,
//! runs one conversion job, writes the artifacts and prints per-file status.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::ImageFormat;
use imgpdf::{
    ConversionProgressCallback, Converter, FileKind, FileRegistry, FileStatus, ImageToPdfConfig,
    Orientation, PageSize, PdfToImageConfig, ProgressCallback, RasterFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Upload limit for a single image→PDF job.
const MAX_IMAGES: usize = 20;

/// Image formats accepted for image→PDF.
const ACCEPTED_IMAGE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress bar driven by job events.
struct CliProgressCallback {
    bar: ProgressBar,
    /// "images" or "pages".
    unit: &'static str,
}

impl CliProgressCallback {
    fn new(unit: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar, unit })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_items: usize) {
        let style = ProgressStyle::with_template(&format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  {{msg}}",
            self.unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_items as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
    }

    fn on_item_complete(&self, item_num: usize, _total_items: usize, percent: u8) {
        self.bar.set_position(item_num as u64);
        self.bar.set_message(format!("{percent}%"));
    }

    fn on_conversion_complete(&self, total_items: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} {} converted",
            green("✔"),
            bold(&total_items.to_string()),
            self.unit
        );
    }

    fn on_conversion_error(&self, error: &str) {
        self.bar.abandon();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Combine images into converted_images.pdf (A4 portrait, quality 0.8)
  imgpdf to-pdf scan1.jpg scan2.png

  # Letter landscape, custom output path
  imgpdf to-pdf --page-size letter --orientation landscape *.png -o album.pdf

  # Every page of a PDF as PNG at 150 DPI into ./pages/
  imgpdf to-images report.pdf -o pages

  # JPEG pages at 300 DPI, machine-readable summary
  imgpdf to-images --format jpeg --quality 0.9 --dpi 300 --json report.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file, or directory holding it)
  RUST_LOG          Override the log filter (e.g. imgpdf=debug)
"#;

/// Convert images to PDF and PDF pages to images.
#[derive(Parser, Debug)]
#[command(
    name = "imgpdf",
    version,
    about = "Convert images to PDF and PDF pages to images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print the per-file status as JSON on stdout.
    #[arg(long, global = true, env = "IMGPDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "IMGPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMGPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "IMGPDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Combine up to 20 images into one PDF, one page per image.
    ToPdf(ToPdfArgs),
    /// Render every page of one PDF to an image file.
    ToImages(ToImagesArgs),
}

#[derive(Args, Debug)]
struct ToPdfArgs {
    /// Images in page order (jpeg, png, gif, webp, bmp).
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Output PDF path.
    #[arg(short, long, env = "IMGPDF_OUTPUT", default_value = "converted_images.pdf")]
    output: PathBuf,

    /// Page size.
    #[arg(long, env = "IMGPDF_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Page orientation.
    #[arg(long, env = "IMGPDF_ORIENTATION", value_enum, default_value = "portrait")]
    orientation: OrientationArg,

    /// JPEG quality of embedded images (0.0–1.0).
    #[arg(long, env = "IMGPDF_QUALITY", default_value_t = 0.8)]
    quality: f32,
}

#[derive(Args, Debug)]
struct ToImagesArgs {
    /// The PDF to rasterise.
    pdf: PathBuf,

    /// Output directory for page_<n>.<ext> files.
    #[arg(short, long, env = "IMGPDF_OUTPUT_DIR", default_value = ".")]
    output: PathBuf,

    /// Output image format.
    #[arg(long, env = "IMGPDF_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// Quality for lossy formats (0.0–1.0).
    #[arg(long, env = "IMGPDF_QUALITY", default_value_t = 0.8)]
    quality: f32,

    /// Rendering DPI; 72 renders one pixel per point.
    #[arg(long, env = "IMGPDF_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(1..=1200))]
    dpi: u32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum PageSizeArg {
    A4,
    Letter,
    Legal,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum FormatArg {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatArg> for RasterFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => RasterFormat::Png,
            FormatArg::Jpeg => RasterFormat::Jpeg,
            FormatArg::Webp => RasterFormat::Webp,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar gives all the feedback that matters, so library INFO
    // logs are hidden while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let unit = match cli.command {
        Command::ToPdf(_) => "images",
        Command::ToImages(_) => "pages",
    };
    let mut converter = Converter::pdfium();
    if show_progress {
        converter = converter.with_progress_callback(CliProgressCallback::new(unit) as ProgressCallback);
    }

    let mut registry = FileRegistry::new();
    let outcome = match cli.command {
        Command::ToPdf(ref args) => run_to_pdf(args, &converter, &mut registry).await,
        Command::ToImages(ref args) => run_to_images(args, &converter, &mut registry).await,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&registry.summaries())
            .context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        print_status(&registry);
    }

    let written = outcome?;
    if !cli.quiet && !cli.json {
        for path in &written {
            eprintln!("   → {}", bold(&path.display().to_string()));
        }
    }
    Ok(())
}

async fn run_to_pdf(
    args: &ToPdfArgs,
    converter: &Converter,
    registry: &mut FileRegistry,
) -> Result<Vec<PathBuf>> {
    if args.images.len() > MAX_IMAGES {
        bail!(
            "At most {} images per PDF (got {})",
            MAX_IMAGES,
            args.images.len()
        );
    }
    let config = ImageToPdfConfig::builder()
        .page_size(args.page_size.into())
        .orientation(args.orientation.into())
        .quality(args.quality)
        .build()
        .context("Invalid configuration")?;

    let mut blobs = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let data = read_input(path).await?;
        match image::guess_format(&data) {
            Ok(format) if ACCEPTED_IMAGE_FORMATS.contains(&format) => {}
            _ => bail!(
                "{} is not a supported image (jpeg, png, gif, webp, bmp)",
                path.display()
            ),
        }
        blobs.push((display_name(path), data));
    }
    registry.add_files(blobs, FileKind::Image);

    let artifact = converter
        .images_to_pdf(registry, &config)
        .await
        .context("Failed to convert images")?;
    artifact
        .write_to_path(&args.output)
        .context("Failed to write PDF")?;
    Ok(vec![args.output.clone()])
}

async fn run_to_images(
    args: &ToImagesArgs,
    converter: &Converter,
    registry: &mut FileRegistry,
) -> Result<Vec<PathBuf>> {
    let config = PdfToImageConfig::builder()
        .format(args.format.into())
        .quality(args.quality)
        .dpi(args.dpi)
        .build()
        .context("Invalid configuration")?;

    let data = read_input(&args.pdf).await?;
    registry.add_files(vec![(display_name(&args.pdf), data)], FileKind::Document);

    let pages = converter
        .pdf_to_images(registry, &config)
        .await
        .context("Failed to convert PDF")?;

    pages
        .iter()
        .map(|page| {
            page.write_to_dir(&args.output)
                .with_context(|| format!("Failed to write {}", page.file_name))
        })
        .collect()
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One line per tracked file: name, status, and result or error.
fn print_status(registry: &FileRegistry) {
    for file in registry.files() {
        let line = match file.status() {
            FileStatus::Completed(artifacts) => {
                let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
                format!("{} {}  {}", green("✓"), file.name(), dim(&names.join(", ")))
            }
            FileStatus::Error(e) => format!("{} {}  {}", red("✗"), file.name(), red(&e.to_string())),
            other => format!("  {}  {}", file.name(), dim(other.name())),
        };
        eprintln!("{line}");
    }
}
