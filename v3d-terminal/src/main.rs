/// V3D Terminal Viewer
///
/// Renders the surfaces of a View3D input file in the terminal.
/// Controls:
///   - WASD / Arrow Keys: Rotate the model
///   - F / E: Toggle faces / edge outlines
///   - Space: Toggle idle spin
///   - R: Reload the file
///   - Q/ESC: Quit

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use v3d_terminal::{load_model, summary, TerminalApp, ViewerConfig, ViewerError};

#[derive(Parser, Debug)]
#[command(name = "v3d-view", version, about = "View the geometry of a View3D input file")]
struct Args {
    /// View3D vertex/surface input file
    input: PathBuf,

    /// Viewer settings (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a model summary instead of opening the viewer
    #[arg(short, long)]
    summary: bool,

    /// Target frames per second, overrides the config file
    #[arg(long)]
    fps: Option<u32>,
}

fn run(args: Args) -> Result<(), ViewerError> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load_from_file(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.fps = fps.clamp(1, 240);
    }

    let model = load_model(&args.input)?;

    if args.summary {
        print!("{}", summary(&model)?);
        return Ok(());
    }

    let mut app = TerminalApp::new(args.input, model, config)?;
    app.run()
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("v3d-view: {}", e);
            ExitCode::FAILURE
        }
    }
}
