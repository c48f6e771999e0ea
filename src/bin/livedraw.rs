use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use livedraw::{
    GpuMode, LiveDrawConfig, PipelineController, PipelineState, ScriptCompiler, default_surfaces,
};

#[derive(Parser, Debug)]
#[command(name = "livedraw", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a sketch once and write one PNG per surface.
    Render(RenderArgs),
    /// Poll a sketch file and re-render whenever it changes.
    Watch(WatchArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Sketch source file.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `<stem>-<surface>.png`.
    #[arg(long)]
    out_dir: PathBuf,

    /// JSON config file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Index of the surface configuration to use.
    #[arg(long)]
    configuration: Option<usize>,

    #[arg(long, value_enum)]
    gpu: Option<GpuChoice>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct WatchArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 250)]
    interval_ms: u64,

    /// Stop after this many polls (0 = run until killed).
    #[arg(long, default_value_t = 0)]
    polls: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GpuChoice {
    Offscreen,
    Stub,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args).await,
        Command::Watch(args) => cmd_watch(args).await,
    }
}

fn load_config(args: &CommonArgs) -> anyhow::Result<LiveDrawConfig> {
    let mut config = match &args.config {
        Some(path) => LiveDrawConfig::from_path(path)?,
        None => LiveDrawConfig::default(),
    };
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    if let Some(i) = args.configuration {
        config.selected_configuration = i;
    }
    if let Some(gpu) = args.gpu {
        config.gpu_mode = match gpu {
            GpuChoice::Offscreen => GpuMode::Offscreen,
            GpuChoice::Stub => GpuMode::Stub,
        };
    }
    config.validate()?;
    Ok(config)
}

fn make_controller(config: &LiveDrawConfig) -> anyhow::Result<PipelineController> {
    let compiler = Arc::new(ScriptCompiler::with_limits(config.limits));
    Ok(PipelineController::new(
        compiler,
        default_surfaces(config.gpu_mode),
        config,
    )?)
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read sketch '{}'", path.display()))
}

/// Print diagnostics and write the current images. Returns the number of error diagnostics.
fn publish(controller: &PipelineController, in_path: &Path, out_dir: &Path) -> anyhow::Result<usize> {
    for d in controller.diagnostics() {
        eprintln!("{}: {d}", in_path.display());
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;
    let stem = in_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sketch".to_owned());

    for (kind, image) in controller.images() {
        let out = out_dir.join(format!("{stem}-{kind}.png"));
        image.write_png(&out)?;
        eprintln!("wrote {}", out.display());
    }

    Ok(controller.diagnostics().iter().filter(|d| d.is_error()).count())
}

async fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let common = args.common;
    let config = load_config(&common)?;
    let mut controller = make_controller(&config)?;

    controller.set_source(read_source(&common.in_path)?);
    controller.settle().await;

    let errors = publish(&controller, &common.in_path, &common.out_dir)?;
    if controller.state() == PipelineState::Error {
        anyhow::bail!("compilation failed with {errors} error(s)");
    }
    Ok(())
}

async fn cmd_watch(args: WatchArgs) -> anyhow::Result<()> {
    let common = args.common;
    let config = load_config(&common)?;
    let mut controller = make_controller(&config)?;
    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));

    let mut polls = 0u64;
    loop {
        ticker.tick().await;
        polls += 1;

        match read_source(&common.in_path) {
            Ok(source) if controller.source() != Some(source.as_str()) => {
                controller.set_source(source);
                controller.settle().await;
                let errors = publish(&controller, &common.in_path, &common.out_dir)?;
                eprintln!("[{}] {errors} error(s)", controller.state());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "sketch not readable; keeping last result"),
        }

        if args.polls != 0 && polls >= args.polls {
            return Ok(());
        }
    }
}
