//! Frameloom CLI — Command-line interface for frame capture and export.
//!
//! Usage:
//!   frameloom export [OPTIONS]     Render a composition to video or a PNG sequence
//!   frameloom command [OPTIONS]    Print the ffmpeg invocation for an encode config
//!   frameloom check                Check host encoding capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "frameloom",
    about = "Deterministic frame capture and video export",
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
    /// Render a composition through the synthetic surface
    Export {
        /// Composition identifier
        #[arg(short, long, default_value = "demo")]
        composition: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Container format: mp4, webm, gif
        #[arg(long, default_value = "mp4")]
        format: String,

        /// Video codec: h264, h265, vp8, vp9
        #[arg(long, default_value = "h264")]
        codec: String,

        /// Frame width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Composition length in frames
        #[arg(long, default_value = "150")]
        frames: u32,

        /// First frame to export (inclusive)
        #[arg(long)]
        start: Option<u32>,

        /// End of the exported range (exclusive)
        #[arg(long)]
        end: Option<u32>,

        /// Constant rate factor override
        #[arg(long)]
        crf: Option<u32>,

        /// Target bitrate in kbit/s; wins over CRF when set
        #[arg(long)]
        bitrate: Option<u32>,

        /// Write a PNG sequence to this directory instead of encoding
        #[arg(long)]
        png_dir: Option<PathBuf>,

        /// Abort the export after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the final job record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the ffmpeg invocation for an encode configuration
    Command {
        /// printf-style input image pattern
        #[arg(long, default_value = "frames/frame_%05d.png")]
        input_pattern: String,

        /// Output file path
        #[arg(short, long, default_value = "out.mp4")]
        output: PathBuf,

        /// Container format: mp4, webm, gif
        #[arg(long, default_value = "mp4")]
        format: String,

        /// Video codec: h264, h265, vp8, vp9
        #[arg(long, default_value = "h264")]
        codec: String,

        /// Frame width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Frames per second
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Composition length in frames
        #[arg(long, default_value = "150")]
        frames: u32,

        /// Constant rate factor override
        #[arg(long)]
        crf: Option<u32>,

        /// Target bitrate in kbit/s; wins over CRF when set
        #[arg(long)]
        bitrate: Option<u32>,
    },

    /// Check host encoding capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    frameloom_common::logging::init_logging(&frameloom_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Export {
            composition,
            output,
            format,
            codec,
            width,
            height,
            fps,
            frames,
            start,
            end,
            crf,
            bitrate,
            png_dir,
            timeout_secs,
            json,
        } => {
            commands::export::run(
                composition,
                output,
                format,
                codec,
                width,
                height,
                fps,
                frames,
                start,
                end,
                crf,
                bitrate,
                png_dir,
                timeout_secs,
                json,
            )
            .await
        }
        Commands::Command {
            input_pattern,
            output,
            format,
            codec,
            width,
            height,
            fps,
            frames,
            crf,
            bitrate,
        } => commands::command::run(
            input_pattern,
            output,
            format,
            codec,
            width,
            height,
            fps,
            frames,
            crf,
            bitrate,
        ),
        Commands::Check => commands::check::run(),
    }
}
