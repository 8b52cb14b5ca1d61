//! Devcam CLI: drive the webcam service on a synthetic device.
//!
//! Usage:
//!   devcam run [OPTIONS]         Run the service and stream to a simulated USB host
//!   devcam negotiate [OPTIONS]   Show which preview size a camera would pick
//!   devcam rotation [OPTIONS]    Show encoder and UI rotation for a device pose
//!   devcam check                 Show configuration and synthetic device readiness

use clap::{Parser, Subcommand};
use devcam_platform_core::Size;

mod commands;

#[derive(Parser)]
#[command(
    name = "devcam",
    about = "Use a device camera as a USB webcam",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service and stream frames to a simulated USB host
    Run {
        /// Stream width requested by the host
        #[arg(long, default_value = "1280")]
        width: u32,

        /// Stream height requested by the host
        #[arg(long, default_value = "720")]
        height: u32,

        /// Stream frame rate
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Request MJPEG instead of uncompressed YUYV
        #[arg(long)]
        mjpeg: bool,

        /// Stop after this many seconds instead of waiting for Ctrl+C
        #[arg(long)]
        secs: Option<u64>,

        /// Switch to the front lens before streaming
        #[arg(long)]
        front: bool,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pick a preview size from a list of camera outputs
    Negotiate {
        /// Supported outputs, e.g. 1920x1080,1280x720,640x480
        #[arg(long, value_delimiter = ',', required = true)]
        sizes: Vec<Size>,

        /// Active webcam stream geometry
        #[arg(long)]
        stream: Option<Size>,

        /// Display bound used while no stream is active
        #[arg(long, default_value = "1920x1080")]
        bound: Size,
    },

    /// Compute frame rotation for a device pose
    Rotation {
        /// Device rotation in degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        device: i32,

        /// Sensor orientation in degrees
        #[arg(long, default_value = "90")]
        sensor: u32,

        /// Treat the sensor as front-facing
        #[arg(long)]
        front: bool,
    },

    /// Check configuration and synthetic device readiness
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = devcam_common::config::AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    devcam_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Run {
            width,
            height,
            fps,
            mjpeg,
            secs,
            front,
            json,
        } => {
            let request = commands::run::RunRequest {
                width,
                height,
                fps,
                mjpeg,
                duration: secs.map(std::time::Duration::from_secs),
                front,
                json,
            };
            commands::run::run(&config, request).await?;
        }
        Commands::Negotiate {
            sizes,
            stream,
            bound,
        } => {
            commands::negotiate::run(&sizes, stream, bound)?;
        }
        Commands::Rotation {
            device,
            sensor,
            front,
        } => {
            commands::rotation::run(device, sensor, front)?;
        }
        Commands::Check => {
            commands::check::run(&config)?;
        }
    }

    Ok(())
}
