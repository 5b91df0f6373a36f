use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "marionette", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a document at one point in time and print the element tree as JSON.
    Render(RenderArgs),
    /// Render at `--from-ms`, then print the incremental patch at `--to-ms`.
    Patch(PatchArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional runtime config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shared clock time to render at.
    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,

    /// Host container width.
    #[arg(long, default_value_t = 0.0)]
    width: f64,

    /// Host container height.
    #[arg(long, default_value_t = 0.0)]
    height: f64,

    /// Root sizing preset; overrides the config.
    #[arg(long, value_enum)]
    sizing: Option<SizingChoice>,

    /// Print only the output fingerprint.
    #[arg(long)]
    fingerprint: bool,
}

#[derive(Parser, Debug)]
struct PatchArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional runtime config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Time of the initial full render.
    #[arg(long, default_value_t = 0.0)]
    from_ms: f64,

    /// Time of the patch.
    #[arg(long)]
    to_ms: f64,

    /// Host container width.
    #[arg(long, default_value_t = 0.0)]
    width: f64,

    /// Host container height.
    #[arg(long, default_value_t = 0.0)]
    height: f64,

    /// Print only the changed element keys, one per line.
    #[arg(long)]
    keys_only: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SizingChoice {
    Normal,
    Stretch,
    Contain,
    Cover,
}

impl From<SizingChoice> for marionette::Sizing {
    fn from(c: SizingChoice) -> Self {
        match c {
            SizingChoice::Normal => Self::Normal,
            SizingChoice::Stretch => Self::Stretch,
            SizingChoice::Contain => Self::Contain,
            SizingChoice::Cover => Self::Cover,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Patch(args) => cmd_patch(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<marionette::Config> {
    let Some(path) = path else {
        return Ok(marionette::Config::default());
    };
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    Ok(marionette::Config::from_json(&s)?)
}

fn build_runtime(
    in_path: &Path,
    config: Option<&Path>,
    width: f64,
    height: f64,
    start_ms: f64,
) -> anyhow::Result<marionette::Runtime> {
    let doc = marionette::Document::from_path(in_path)
        .with_context(|| format!("load document '{}'", in_path.display()))?;
    Ok(marionette::Runtime::builder(doc)
        .config(read_config(config)?)
        .container(marionette::Size::new(width, height))
        .start_at(start_ms)
        .build())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    // Mount at zero so autoplayed timelines have advanced by `time_ms` when we render.
    let mut rt = build_runtime(
        &args.in_path,
        args.config.as_deref(),
        args.width,
        args.height,
        0.0,
    )?;
    rt.render(marionette::RenderOptions::default())?;
    rt.set_time(args.time_ms);
    let tree = rt.render(marionette::RenderOptions {
        sizing: args.sizing.map(Into::into),
        ..marionette::RenderOptions::default()
    })?;

    if args.fingerprint {
        println!("{:016x}", tree.fingerprint());
    } else {
        println!("{}", serde_json::to_string_pretty(&tree.to_json())?);
    }
    Ok(())
}

fn cmd_patch(args: PatchArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.to_ms >= args.from_ms,
        "--to-ms ({}) must not precede --from-ms ({})",
        args.to_ms,
        args.from_ms
    );
    let mut rt = build_runtime(
        &args.in_path,
        args.config.as_deref(),
        args.width,
        args.height,
        args.from_ms,
    )?;
    rt.render(marionette::RenderOptions::default())?;
    rt.set_time(args.to_ms);
    let patch = rt.patch()?;

    if args.keys_only {
        for key in patch.keys() {
            println!("{key}");
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&patch.to_json())?);
    }
    Ok(())
}
