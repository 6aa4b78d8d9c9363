//! Print the ffmpeg invocation for an encode configuration.

use std::path::PathBuf;

use frameloom_common::config::{OutputFormat, PixelFormat, RendererConfig, VideoCodec, VideoConfig};
use frameloom_export::build_encode_command;

#[allow(clippy::too_many_arguments)]
pub fn run(
    input_pattern: String,
    output: PathBuf,
    format: String,
    codec: String,
    width: u32,
    height: u32,
    fps: u32,
    frames: u32,
    crf: Option<u32>,
    bitrate: Option<u32>,
) -> anyhow::Result<()> {
    let format: OutputFormat = format.parse()?;
    let codec: VideoCodec = codec.parse()?;

    let video = VideoConfig {
        width,
        height,
        fps,
        duration_in_frames: frames,
    };
    let renderer = RendererConfig {
        format,
        codec,
        crf,
        bitrate_kbps: bitrate,
        pixel_format: PixelFormat::default(),
    };

    let args = build_encode_command(&input_pattern, &output, &video, &renderer)?;
    println!("ffmpeg {}", args.join(" "));
    Ok(())
}
