use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use giftframe::render::OverlayInput;
use giftframe::{
    Canvas, CustomText, ExportJob, FrameConfig, RasterExporter, RasterRenderer, RenderStyle,
    Rgba8, ShapeCatalog, ShapeId, ShapeParams, TextPosition, VectorOverlay,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "giftframe", version)]
struct Cli {
    /// JSON config file; `GIFTFRAME_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the shape catalog.
    Shapes,
    /// Write the live overlay SVG of one shape.
    Svg(SvgArgs),
    /// Write the exported PNG of one shape.
    Export(ExportArgs),
    /// Export every catalog shape into a directory.
    Catalog(CatalogArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Band {
    Top,
    Bottom,
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Catalog shape id.
    #[arg(long)]
    shape: String,
    /// Design canvas width (defaults to the configured design canvas).
    #[arg(long)]
    width: Option<u32>,
    /// Design canvas height.
    #[arg(long)]
    height: Option<u32>,
    /// Border color as `#RRGGBB` or `#RRGGBBAA`.
    #[arg(long, default_value = "#ec4899")]
    color: String,
    /// Border width in design pixels (defaults to the shape's suggestion).
    #[arg(long)]
    border_width: Option<f64>,
    /// Corner radius in design pixels (defaults to the shape's suggestion).
    #[arg(long)]
    border_radius: Option<f64>,
    /// Caption drawn inside the border band.
    #[arg(long)]
    text: Option<String>,
    /// Band hosting the caption.
    #[arg(long, value_enum, default_value_t = Band::Bottom)]
    text_position: Band,
    /// Caption color.
    #[arg(long, default_value = "#ffffff")]
    text_color: String,
    /// Render captions with the dark-theme halo.
    #[arg(long, default_value_t = false)]
    dark: bool,
}

#[derive(Args, Debug)]
struct SvgArgs {
    #[command(flatten)]
    style: StyleArgs,
    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    style: StyleArgs,
    /// Raster width (defaults to the configured export size).
    #[arg(long)]
    out_width: Option<u32>,
    /// Raster height.
    #[arg(long)]
    out_height: Option<u32>,
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct CatalogArgs {
    /// Directory receiving `frames/<shape>/<hash>.png`.
    #[arg(long)]
    out_dir: PathBuf,
    /// Border color for every shape.
    #[arg(long, default_value = "#ec4899")]
    color: String,
    /// Raster width.
    #[arg(long)]
    out_width: Option<u32>,
    /// Raster height.
    #[arg(long)]
    out_height: Option<u32>,
    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => FrameConfig::from_path(path)?,
        None => FrameConfig::default(),
    }
    .with_env_overrides();
    cfg.validate()?;

    match cli.cmd {
        Command::Shapes => cmd_shapes(),
        Command::Svg(args) => cmd_svg(&cfg, args),
        Command::Export(args) => cmd_export(&cfg, args),
        Command::Catalog(args) => cmd_catalog(&cfg, args),
    }
}

fn cmd_shapes() -> anyhow::Result<()> {
    for d in ShapeCatalog::builtin().iter() {
        println!(
            "{:<18} {:<8} width={:<4} radius={:<4} {}",
            d.id,
            d.family.name(),
            d.default_width,
            d.default_radius,
            d.label
        );
    }
    Ok(())
}

struct Resolved {
    shape: ShapeId,
    params: ShapeParams,
    text: Option<CustomText>,
    style: RenderStyle,
}

fn resolve_style(
    cfg: &FrameConfig,
    catalog: &ShapeCatalog,
    a: StyleArgs,
) -> anyhow::Result<Resolved> {
    let shape = ShapeId::new(a.shape);
    let descriptor = catalog.get(&shape)?;
    let canvas = Canvas::new(
        a.width.unwrap_or(cfg.export.design_width),
        a.height.unwrap_or(cfg.export.design_height),
    )?;
    let params = ShapeParams {
        canvas,
        primary_color: Rgba8::parse_hex(&a.color)?,
        border_width: a.border_width.unwrap_or(descriptor.default_width),
        border_radius: a.border_radius.unwrap_or(descriptor.default_radius),
    };
    let text = match a.text {
        Some(text) => Some(CustomText {
            text,
            position: match a.text_position {
                Band::Top => TextPosition::Top,
                Band::Bottom => TextPosition::Bottom,
            },
            color: Rgba8::parse_hex(&a.text_color)?,
            font: "sans-serif".to_owned(),
        }),
        None => None,
    };
    let style = if a.dark {
        RenderStyle::dark()
    } else {
        RenderStyle::light()
    };
    Ok(Resolved {
        shape,
        params,
        text,
        style,
    })
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_svg(cfg: &FrameConfig, args: SvgArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(ShapeCatalog::builtin());
    let r = resolve_style(cfg, &catalog, args.style)?;
    let mut overlay = VectorOverlay::new(catalog, r.style);
    overlay.update(&OverlayInput {
        shape: r.shape,
        params: r.params,
        text: r.text,
    })?;
    write_output(&args.out, overlay.svg().as_bytes())
}

fn batch_exporter(cfg: &FrameConfig, catalog: Arc<ShapeCatalog>) -> anyhow::Result<RasterExporter> {
    let mut ex = RasterExporter::new(catalog, cfg.asset_storage()).with_threads(cfg.export.threads);
    if let Some(font) = cfg.caption_font()? {
        ex = ex.with_caption_font(font);
    }
    Ok(ex)
}

fn output_canvas(cfg: &FrameConfig, w: Option<u32>, h: Option<u32>) -> anyhow::Result<Canvas> {
    Ok(Canvas::new(
        w.unwrap_or(cfg.export.width),
        h.unwrap_or(cfg.export.height),
    )?)
}

fn cmd_export(cfg: &FrameConfig, args: ExportArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(ShapeCatalog::builtin());
    let r = resolve_style(cfg, &catalog, args.style)?;
    let output = output_canvas(cfg, args.out_width, args.out_height)?;
    let ex = RasterExporter::new(catalog, cfg.asset_storage()).with_style(r.style);
    let mut renderer = match cfg.caption_font()? {
        Some(font) => RasterRenderer::with_font_bytes(font),
        None => RasterRenderer::new(),
    };
    let (png, _) = ex.render_png(&mut renderer, &r.shape, &r.params, r.text.as_ref(), output)?;
    write_output(&args.out, &png)
}

fn cmd_catalog(cfg: &FrameConfig, args: CatalogArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(ShapeCatalog::builtin());
    let output = output_canvas(cfg, args.out_width, args.out_height)?;
    let design = cfg.export.design_canvas()?;
    let color = Rgba8::parse_hex(&args.color)?;

    let mut dir_cfg = cfg.clone();
    dir_cfg.assets_root = Some(args.out_dir.clone());
    if args.threads.is_some() {
        dir_cfg.export.threads = args.threads;
    }
    let ex = batch_exporter(&dir_cfg, catalog.clone())?;

    let jobs: Vec<ExportJob> = catalog
        .iter()
        .map(|d| ExportJob {
            shape: d.shape_id(),
            params: ShapeParams {
                canvas: design,
                primary_color: color,
                border_width: d.default_width,
                border_radius: d.default_radius,
            },
            text: None,
            output,
        })
        .collect();

    let mut failed = 0usize;
    for (job, result) in jobs.iter().zip(ex.export_batch(&jobs)?) {
        match result {
            Ok(asset) => println!("{}\t{}", job.shape, args.out_dir.join(&asset.path).display()),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {e}", job.shape);
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} shapes failed to export", jobs.len());
    }
    Ok(())
}
