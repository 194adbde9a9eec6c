use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "plakat", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template JSON to a PNG.
    Render(RenderArgs),
    /// Parse and validate a template JSON without rendering.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_template_json(path: &Path) -> anyhow::Result<plakat::Template> {
    let f = File::open(path).with_context(|| format!("open template '{}'", path.display()))?;
    let r = BufReader::new(f);
    let template: plakat::Template =
        serde_json::from_reader(r).with_context(|| "parse template JSON")?;
    Ok(template)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let template = read_template_json(&args.in_path)?;
    template.validate()?;

    let frame = plakat::render(&template)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let template = read_template_json(&args.in_path)?;
    template.validate()?;
    eprintln!(
        "ok: {}x{} canvas, {} layer(s)",
        template.canvas_width,
        template.canvas_height,
        template.layers.len()
    );
    Ok(())
}
