use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use composer::{BoundingBox, Composer, ComposerContext, ComposerOpts, Document, SourceLoader};

#[derive(Parser, Debug)]
#[command(name = "composer", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten a document to a PNG.
    Flatten(FlattenArgs),
    /// Print the metadata JSON embedded in a PNG.
    Meta(MetaArgs),
}

#[derive(Parser, Debug)]
struct FlattenArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Capture region `x,y,w,h` in scene units; required for infinite canvases.
    #[arg(long, value_parser = parse_region)]
    region: Option<BoundingBox>,

    /// JSON file to embed as PNG metadata.
    #[arg(long)]
    meta: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MetaArgs {
    /// Input PNG.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn parse_region(s: &str) -> Result<BoundingBox, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("region component: {e}"))?;
    match parts.as_slice() {
        &[x, y, w, h] if w > 0.0 && h > 0.0 => Ok(BoundingBox::new(x, y, w, h)),
        &[_, _, _, _] => Err("region width and height must be > 0".to_string()),
        _ => Err("expected x,y,w,h".to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("build tokio runtime")?;
    match cli.cmd {
        Command::Flatten(args) => rt.block_on(cmd_flatten(args)),
        Command::Meta(args) => cmd_meta(args),
    }
}

async fn cmd_flatten(args: FlattenArgs) -> anyhow::Result<()> {
    let doc = Document::from_path(&args.in_path)?;
    let assets_root = args
        .in_path
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."));

    let meta = match &args.meta {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read metadata '{}'", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parse metadata '{}'", path.display()))?;
            Some(value)
        }
        None => None,
    };

    let ctx = ComposerContext::headless()
        .with_loader(Arc::new(SourceLoader::with_root(assets_root)));
    let mut composer = Composer::with_document(doc, ctx, ComposerOpts::default())?;
    let png = composer.flatten(args.region, meta.as_ref()).await?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_meta(args: MetaArgs) -> anyhow::Result<()> {
    let png = std::fs::read(&args.in_path)
        .with_context(|| format!("read png '{}'", args.in_path.display()))?;
    match composer::extract_metadata(&png)? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => eprintln!("no metadata in {}", args.in_path.display()),
    }
    Ok(())
}
