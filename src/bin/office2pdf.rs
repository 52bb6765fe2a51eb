//! CLI binary for office2pdf.
//!
//! A thin shim over the library crate that maps CLI flags onto
//! `ConversionConfig` / `ServerConfig` and either serves the HTTP API or
//! converts one file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use office2pdf::{
    convert_to_file, serve, ConversionConfig, Converter, DocumentKind, PageSize, ServerConfig,
    SlideRendering,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP API on port 5000
  office2pdf serve

  # Upload a document
  curl -F file=@report.docx http://localhost:5000/convert/word-to-pdf -o report.pdf

  # Convert locally (writes deck.pdf)
  office2pdf convert deck.pptx

  # Selectable slide text instead of bitmaps
  office2pdf convert deck.pptx --slide-rendering vector -o deck.pdf

  # Stats as JSON
  office2pdf convert --json notebook.ipynb

ROUTES:
  POST /convert/word-to-pdf    .docx
  POST /convert/excel-to-pdf   .xlsx .xlsm .xlsb .xls .ods
  POST /convert/ipynb-to-pdf   .ipynb
  POST /convert/ppt-to-pdf     .pptx .ppt
  GET  /health

ENVIRONMENT VARIABLES:
  Every flag reads OFFICE2PDF_<FLAG>, e.g. OFFICE2PDF_BIND, OFFICE2PDF_SLIDE_FONT.
  RUST_LOG overrides the log filter.
"#;

/// Convert Word, Excel, PowerPoint and Jupyter documents to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "office2pdf",
    version,
    about = "Convert Word, Excel, PowerPoint and Jupyter documents to PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "OFFICE2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "OFFICE2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP conversion API.
    Serve(ServeArgs),
    /// Convert a single document.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "OFFICE2PDF_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Parent directory for per-request scratch directories.
    #[arg(long, env = "OFFICE2PDF_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "OFFICE2PDF_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    /// Attempts made to delete each temp file.
    #[arg(long, env = "OFFICE2PDF_CLEANUP_ATTEMPTS", default_value_t = 5)]
    cleanup_attempts: u32,

    /// Pause between deletion attempts.
    #[arg(long, env = "OFFICE2PDF_CLEANUP_DELAY_MS", default_value_t = 200)]
    cleanup_delay_ms: u64,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Document to convert.
    input: PathBuf,

    /// Output PDF path. Default: the input path with a .pdf extension.
    #[arg(short, long, env = "OFFICE2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Document kind. Default: inferred from the input extension.
    #[arg(long, env = "OFFICE2PDF_KIND", value_enum)]
    kind: Option<KindArg>,

    /// Print ConversionStats as JSON on stdout.
    #[arg(long, env = "OFFICE2PDF_JSON")]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Paper size for Word, Excel and notebook output.
    #[arg(long, env = "OFFICE2PDF_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Page margin in points (18–144).
    #[arg(long, env = "OFFICE2PDF_MARGIN", default_value_t = 50.0)]
    margin: f32,

    /// Body font size in points (6–24).
    #[arg(long, env = "OFFICE2PDF_FONT_SIZE", default_value_t = 11.0)]
    font_size: f32,

    /// How slides become pages.
    #[arg(long, env = "OFFICE2PDF_SLIDE_RENDERING", value_enum, default_value = "raster")]
    slide_rendering: SlideRenderingArg,

    /// Slide rasterisation DPI (48–300).
    #[arg(long, env = "OFFICE2PDF_SLIDE_DPI", default_value_t = 96,
          value_parser = clap::value_parser!(u32).range(48..=300))]
    slide_dpi: u32,

    /// TrueType font for raster slides. Default: probe system fonts.
    #[arg(long, env = "OFFICE2PDF_SLIDE_FONT")]
    slide_font: Option<PathBuf>,

    /// Slides rasterised at once.
    #[arg(short, long, env = "OFFICE2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SlideRenderingArg {
    Raster,
    Vector,
}

impl From<SlideRenderingArg> for SlideRendering {
    fn from(v: SlideRenderingArg) -> Self {
        match v {
            SlideRenderingArg::Raster => SlideRendering::Raster,
            SlideRenderingArg::Vector => SlideRendering::Vector,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Word,
    Excel,
    Notebook,
    Powerpoint,
}

impl From<KindArg> for DocumentKind {
    fn from(v: KindArg) -> Self {
        match v {
            KindArg::Word => DocumentKind::Word,
            KindArg::Excel => DocumentKind::Excel,
            KindArg::Notebook => DocumentKind::Notebook,
            KindArg::Powerpoint => DocumentKind::PowerPoint,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    match cli.command {
        Command::Serve(args) => {
            let conversion = build_config(&args.common)?;
            let server = ServerConfig {
                bind: args.bind,
                temp_root: args.temp_dir.unwrap_or_else(std::env::temp_dir),
                max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
                cleanup_attempts: args.cleanup_attempts,
                cleanup_delay_ms: args.cleanup_delay_ms,
            };
            serve(conversion, server).await.context("Server failed")?;
        }
        Command::Convert(args) => {
            let config = build_config(&args.common)?;
            let output_path = args
                .output
                .clone()
                .unwrap_or_else(|| args.input.with_extension("pdf"));
            let converter = Converter::new(config);
            let stats = convert_to_file(
                &converter,
                &args.input,
                args.kind.map(DocumentKind::from),
                &output_path,
            )
            .await
            .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{}  {} pages  {}ms  →  {}",
                    green("✔"),
                    stats.page_count,
                    stats.duration_ms,
                    bold(&output_path.display().to_string()),
                );
                if stats.images_embedded + stats.images_skipped > 0 {
                    eprintln!(
                        "   {} images embedded  /  {} skipped",
                        dim(&stats.images_embedded.to_string()),
                        dim(&stats.images_skipped.to_string()),
                    );
                }
            }
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &CommonArgs) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .page_size(args.page_size.into())
        .margin(args.margin)
        .font_size(args.font_size)
        .slide_rendering(args.slide_rendering.into())
        .slide_dpi(args.slide_dpi)
        .concurrency(args.concurrency);
    if let Some(ref font) = args.slide_font {
        builder = builder.slide_font(font);
    }
    builder.build().context("Invalid configuration")
}
