// SPDX-License-Identifier: GPL-3.0-only

use camera_engine::backends::camera::CaptureLibrary;
use camera_engine::backends::camera::mock::MockLibrary;
use camera_engine::backends::camera::v4l2::V4lLibrary;
use clap::{Parser, Subcommand};
use cli::EngineOptions;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-engine")]
#[command(about = "Capture frames and manage controls of V4L2 cameras")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Settings file (default: ~/.config/camera-engine/camera.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a simulated camera instead of V4L2 devices
    #[arg(long, global = true)]
    mock: bool,

    /// Missed polls before the camera counts as disconnected
    #[arg(long, global = true)]
    timeout: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Show the negotiated format and controls of a camera
    Probe {
        /// Camera index to use (from 'camera-engine list')
        #[arg(short, long)]
        camera: Option<i32>,
    },

    /// Save one frame as PNG
    Snapshot {
        /// Camera index to use (from 'camera-engine list')
        #[arg(short, long)]
        camera: Option<i32>,

        /// Output file path (default: ~/Pictures/Camera/snapshot_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frames to drop before capturing
        #[arg(short, long, default_value = "10")]
        skip: u32,
    },

    /// Change a control and remember it
    Set {
        /// Camera index to use (from 'camera-engine list')
        #[arg(short, long)]
        camera: Option<i32>,

        /// brightness, gain, exposure, sharpness, focus, gamma, white, backlight or hue
        setting: String,

        /// A number, 'auto', 'manual' or 'default'
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Stream frames and report the frame rate
    Watch {
        /// Camera index to use (from 'camera-engine list')
        #[arg(short, long)]
        camera: Option<i32>,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_engine=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    if cli.mock {
        let library =
            MockLibrary::with_devices(&["Simulated Camera", "Simulated Camera (rear)"]).continuous();
        run(library, cli)
    } else {
        run(V4lLibrary::new(), cli)
    }
}

fn run<L: CaptureLibrary>(library: L, cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = |camera: Option<i32>| EngineOptions {
        config: cli.config.clone(),
        camera,
        timeout: cli.timeout,
    };

    match cli.command {
        Commands::List => cli::list_cameras(library),
        Commands::Probe { camera } => cli::probe(library, &options(camera)),
        Commands::Snapshot {
            camera,
            output,
            skip,
        } => cli::snapshot(library, &options(camera), output, skip),
        Commands::Set {
            camera,
            setting,
            value,
        } => cli::set_control(library, &options(camera), &setting, &value),
        Commands::Watch { camera, duration } => cli::watch(library, &options(camera), duration),
    }
}
