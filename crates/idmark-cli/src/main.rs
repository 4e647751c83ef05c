//! idmark - watermark identity card scans from the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::executor::block_on;
use idmark_core::compositor::composite_sides;
use idmark_core::{
    assemble, decode_image, export_side, Color, CompositeResult, DecodeError, DecodedImage,
    ExportFormat, ImageSource, Side, WatermarkConfig, WatermarkFont, PRESET_TEXTS,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idmark")]
#[command(author, version, about = "Watermark identity card scans", long_about = None)]
#[command(after_help = "Examples:
  idmark apply --front front.jpg --back back.jpg -o out
  idmark apply --front front.png --text 'FOR ACCOUNT OPENING ONLY' --opacity 0.5
  idmark apply --front front.jpg --back back.jpg --pdf 身分證 --font NotoSansTC.ttf
  idmark defaults > watermark.json")]
struct Cli {
    /// Log each step (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watermark the front and/or back image
    Apply(ApplyArgs),

    /// Print the preset watermark phrases
    Presets,

    /// Print the default settings as JSON
    Defaults,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Image of the card front (PNG or JPEG)
    #[arg(long, required_unless_present = "back")]
    front: Option<PathBuf>,

    /// Image of the card back (PNG or JPEG)
    #[arg(long)]
    back: Option<PathBuf>,

    /// Directory the watermarked files are written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Also stack the images onto A4 pages in a PDF with this name
    #[arg(long)]
    pdf: Option<String>,

    /// JSON settings file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    /// TrueType/OpenType font; needed to draw Chinese text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output image format
    #[arg(long, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = idmark_core::encode::DEFAULT_JPEG_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,
}

/// Per-field settings given on the command line.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Watermark text
    #[arg(long)]
    text: Option<String>,

    /// Font size for an 800px wide image
    #[arg(long)]
    font_size: Option<f32>,

    /// Text opacity (0.0-1.0)
    #[arg(long)]
    opacity: Option<f32>,

    /// Text color as #RGB or #RRGGBB
    #[arg(long)]
    color: Option<Color>,

    /// Rotation in degrees
    #[arg(long, allow_hyphen_values = true)]
    angle: Option<f32>,

    /// Tile density (0.0-1.0)
    #[arg(long)]
    density: Option<f32>,
}

impl Overrides {
    fn apply_to(&self, config: &mut WatermarkConfig) {
        if let Some(text) = &self.text {
            config.text = text.clone();
        }
        if let Some(font_size) = self.font_size {
            config.font_size = font_size;
        }
        if let Some(opacity) = self.opacity {
            config.opacity = opacity;
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(angle) = self.angle {
            config.angle = angle;
        }
        if let Some(density) = self.density {
            config.density = density;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
}

/// An image file read from disk when the compositor asks for it.
struct FileSource {
    path: PathBuf,
}

impl ImageSource for FileSource {
    async fn load(&self) -> Result<DecodedImage, DecodeError> {
        let bytes = fs::read(&self.path)
            .map_err(|e| DecodeError::Io(format!("{}: {}", self.path.display(), e)))?;
        decode_image(&bytes)
    }
}

/// What an `apply` run produced.
#[derive(Debug, Default)]
struct ApplyReport {
    written: Vec<PathBuf>,
    failed: Vec<Side>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Apply(args) => cmd_apply(&args).map(|report| report.failed.is_empty()),
        Commands::Presets => {
            cmd_presets();
            Ok(true)
        }
        Commands::Defaults => cmd_defaults().map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Defaults, then the `--config` file, then individual flags.
fn load_config(args: &ApplyArgs) -> Result<WatermarkConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => WatermarkConfig::default(),
    };
    args.overrides.apply_to(&mut config);
    config.validate().context("Invalid watermark settings")?;
    Ok(config)
}

fn load_font(path: Option<&Path>) -> Result<WatermarkFont> {
    match path {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
            WatermarkFont::from_bytes(bytes)
                .with_context(|| format!("Invalid font {}", path.display()))
        }
        None => Ok(WatermarkFont::embedded()?),
    }
}

fn export_format(args: &ApplyArgs) -> ExportFormat {
    match args.format {
        FormatArg::Png => ExportFormat::Png,
        FormatArg::Jpeg => ExportFormat::Jpeg {
            quality: args.quality,
        },
    }
}

/// Watermark each given side and write it; a failing side is logged and
/// skipped.
fn cmd_apply(args: &ApplyArgs) -> Result<ApplyReport> {
    let config = load_config(args)?;
    let font = load_font(args.font.as_deref())?;
    let format = export_format(args);

    if !config.text.chars().all(|c| c.is_whitespace() || font.has_glyph(c)) {
        warn!("font has no glyph for some characters of {:?}; pass --font", config.text);
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let front = args.front.clone().map(|path| FileSource { path });
    let back = args.back.clone().map(|path| FileSource { path });
    debug!(?config, "compositing");
    let (front, back) = block_on(composite_sides(front.as_ref(), back.as_ref(), &config, &font));

    let mut report = ApplyReport::default();
    let mut results: Vec<Option<CompositeResult>> = Vec::new();

    for (side, outcome) in Side::ALL.into_iter().zip([front, back]) {
        let Some(outcome) = outcome else {
            continue;
        };
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("{} failed: {}", side, e);
                report.failed.push(side);
                continue;
            }
        };

        let path = match write_side(side, &result, format, &args.output) {
            Ok(path) => path,
            Err(e) => {
                error!("{} failed: {:#}", side, e);
                report.failed.push(side);
                continue;
            }
        };
        info!("wrote {} ({}x{})", path.display(), result.width, result.height);

        report.written.push(path);
        results.push(Some(result));
    }

    if let Some(name) = &args.pdf {
        match block_on(assemble(&results, name)).context("Failed to assemble PDF")? {
            Some(doc) => {
                let path = args.output.join(&doc.file_name);
                fs::write(&path, &doc.bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("wrote {} ({} page(s))", path.display(), doc.page_count);
                report.written.push(path);
            }
            None => warn!("no image succeeded; PDF not written"),
        }
    }

    if report.written.is_empty() && report.failed.is_empty() {
        bail!("Nothing to do: pass --front and/or --back");
    }
    Ok(report)
}

/// Encode one side and write it under its standard name in `dir`.
fn write_side(
    side: Side,
    result: &CompositeResult,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let file = export_side(side, result, format)
        .with_context(|| format!("Failed to encode {} image", side))?;
    let path = dir.join(&file.file_name);
    fs::write(&path, &file.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn cmd_presets() {
    for text in PRESET_TEXTS {
        println!("{}", text);
    }
}

fn cmd_defaults() -> Result<()> {
    let json = serde_json::to_string_pretty(&WatermarkConfig::default())?;
    println!("{}", json);
    Ok(())
}
