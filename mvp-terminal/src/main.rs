/// MVP Terminal Visualizer
///
/// Renders one scene through the local, world, view and clip stages.
/// Controls:
///   - Alt+0..4: all four stages / a single stage
///   - Arrows, Space, C: move the player (world stage)
///   - WASD / QE: orbit, zoom and climb the focused stage's observer
///   - L: lock/free the observer, M: vertex markers
///   - ":": parameter command line (eye, at, up, fov, near, far, clip, model, reset)
///   - Esc / Ctrl+C: quit
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use mvp_core::{parse_display_mode, DisplayMode, GridShader, VisualizerConfig};
use mvp_terminal::TerminalApp;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mvp-terminal")]
#[command(about = "Model/View/Projection pipeline visualizer for the terminal")]
struct Args {
    /// Frame rate to aim for
    #[arg(long, default_value = "30")]
    fps: u32,

    /// Initial vertical field of view in degrees
    #[arg(long)]
    fov: Option<f32>,

    /// Initial near plane distance
    #[arg(long)]
    near: Option<f32>,

    /// Initial far plane distance
    #[arg(long)]
    far: Option<f32>,

    /// Start in this display mode: all, local, world, view, clip (or 0-4)
    #[arg(long, default_value = "all", value_parser = mode_arg)]
    mode: DisplayMode,

    /// Start with the vertex markers shown
    #[arg(long)]
    markers: bool,

    /// Seed for the enemy's initial heading
    #[arg(long)]
    seed: Option<u64>,

    /// Where log output goes; the terminal itself is taken by the UI
    #[arg(long, default_value = "mvp-terminal.log")]
    log_file: PathBuf,
}

fn mode_arg(value: &str) -> std::result::Result<DisplayMode, String> {
    parse_display_mode(value).map_err(|err| err.to_string())
}

fn init_logging(path: &PathBuf) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let mut config = VisualizerConfig::default();
    // Out-of-range values are clamped by the camera setters
    if let Some(fov) = args.fov {
        config.camera.fov_y_degrees = fov;
    }
    if let Some(near) = args.near {
        config.camera.near = near;
    }
    if let Some(far) = args.far {
        config.camera.far = far;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.show_markers = args.markers;
    let mode = args.mode;

    // A grid that cannot load is fatal before the terminal is taken over
    GridShader::load(config.grid).context("grid shader failed to load")?;

    info!(fps = args.fps, ?mode, "starting terminal visualizer");
    let mut app = TerminalApp::new(config, args.fps)?;
    app.set_mode(mode)?;
    app.run()?;

    info!("terminal visualizer exited");
    Ok(())
}
