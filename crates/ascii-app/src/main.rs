// ABOUTME: ascii-post entry point: applies an ASCII post-processing node to an image.
// ABOUTME: Wires config, font, node registry and the CPU or GPU render path together.

mod overrides;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ascii_core::Config;
use ascii_nodes::{NodeRegistry, PassContext, PostNode};
use ascii_renderer::{AtlasError, HeadlessRenderer, RasterBackend, RasterSurface, SoftwareBackend};
use overrides::ParamOverride;

/// Render an image through the colorAscii or vertexAscii effect.
#[derive(Parser, Debug)]
#[command(name = "ascii-post")]
#[command(about = "ASCII-art post-processing for still images")]
struct Args {
    /// Source image
    #[arg(required_unless_present = "list_params")]
    input: Option<PathBuf>,

    /// Where to write the rendered image
    #[arg(required_unless_present = "list_params")]
    output: Option<PathBuf>,

    /// Node type to apply
    #[arg(long, default_value = "colorAscii")]
    node: String,

    /// TTF/OTF or BDF font for the glyph atlas (overrides the config file)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Config file (defaults to ~/.config/ascii-post/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render on the GPU instead of the CPU
    #[arg(long)]
    gpu: bool,

    /// Parameter edit applied after the pass is built, e.g. --set cellSize=8
    #[arg(long = "set", value_name = "NAME=VALUE")]
    sets: Vec<ParamOverride>,

    /// Print the node's parameter declarations as JSON and exit
    #[arg(long)]
    list_params: bool,
}

/// Stands in for a font-backed surface when no font is configured.
struct NoFont;

impl RasterBackend for NoFont {
    fn acquire(&self, _width: u32, _height: u32) -> Result<Box<dyn RasterSurface>, AtlasError> {
        Err(AtlasError::SurfaceUnavailable(
            "no font configured; pass --font or set font_path in the config file".into(),
        ))
    }
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(Config::load_or_default()),
    }
}

fn raster_backend(args: &Args, config: &Config) -> Result<Arc<dyn RasterBackend>> {
    let Some(path) = args.font.as_ref().or(config.font_path.as_ref()) else {
        return Ok(Arc::new(NoFont));
    };
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    let backend = SoftwareBackend::from_font_bytes(&data)
        .with_context(|| format!("Failed to load font {}", path.display()))?;
    tracing::info!("Loaded font {}", path.display());
    Ok(Arc::new(backend))
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let backend = raster_backend(&args, &config)?;
    let registry = NodeRegistry::with_ascii_nodes(backend, &config)?;
    let node = registry.get(&args.node)?;

    let specs = node.params();
    if args.list_params {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        anyhow::bail!("INPUT and OUTPUT are required");
    };

    let source = image::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?
        .to_rgba8();

    let mut values = node.default_values();
    let mut pass = node.build_pass(&PassContext::default(), &values)?;
    if !args.sets.is_empty() {
        overrides::apply(&args.sets, &specs, &mut values)?;
        node.refresh_pass(&mut pass, &values)?;
    }

    let frame = if args.gpu || config.gpu {
        let mut renderer = pollster::block_on(HeadlessRenderer::new())?;
        renderer.render(pass.effect.as_gpu_mut(), &source)?
    } else {
        pass.effect.render(&source)
    };

    frame
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!(
        "Wrote {} ({}x{}) with {}",
        output.display(),
        frame.width(),
        frame.height(),
        node.node_type()
    );
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}
