//! Pure planning of the ffmpeg invocation that encodes a frame sequence.
//!
//! Nothing here touches the filesystem or spawns a process; the command
//! is assembled and validated up front so callers can inspect, log, or
//! reject it before any frame has been rendered.

use std::path::Path;

use frameloom_common::{
    FrameloomError, FrameloomResult, OutputFormat, RendererConfig, VideoConfig,
};

/// Every problem with the combined video and renderer configuration,
/// collected so a caller sees all of them at once instead of fixing one
/// per attempt.
pub fn encode_validation_errors(video: &VideoConfig, renderer: &RendererConfig) -> Vec<String> {
    let mut messages = video.validation_errors();
    messages.extend(renderer.validation_errors());

    if renderer.pixel_format.requires_even_dimensions()
        && (video.width % 2 != 0 || video.height % 2 != 0)
    {
        messages.push(format!(
            "width and height must be even for {} output, got {}x{}",
            renderer.pixel_format.as_str(),
            video.width,
            video.height
        ));
    }

    messages
}

/// Assemble the ffmpeg argument list that turns an image sequence into
/// the configured container.
///
/// `input_pattern` is an ffmpeg sequence pattern such as
/// `frames/frame_%05d.png`. When both a bitrate and a CRF are configured,
/// the bitrate wins and the CRF is ignored.
pub fn build_encode_command(
    input_pattern: &str,
    output: &Path,
    video: &VideoConfig,
    renderer: &RendererConfig,
) -> FrameloomResult<Vec<String>> {
    let mut messages = encode_validation_errors(video, renderer);
    if input_pattern.trim().is_empty() {
        messages.push("input pattern must not be empty".to_string());
    }
    if output.as_os_str().is_empty() {
        messages.push("output path must not be empty".to_string());
    }
    if !messages.is_empty() {
        return Err(FrameloomError::config(messages));
    }

    let mut args = vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-framerate".to_string(),
        video.fps.to_string(),
        "-i".to_string(),
        input_pattern.to_string(),
    ];

    match renderer.format {
        OutputFormat::Gif => {
            // two-pass palette keeps gif colors stable
            args.push("-vf".to_string());
            args.push(format!(
                "fps={},split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
                video.fps
            ));
        }
        _ => {
            args.push("-an".to_string());
            args.push("-c:v".to_string());
            args.push(renderer.codec.ffmpeg_encoder().to_string());

            // bitrate wins over CRF whenever both are configured
            match renderer.bitrate_kbps {
                Some(bitrate) => {
                    args.push("-b:v".to_string());
                    args.push(format!("{bitrate}k"));
                }
                None => {
                    args.push("-crf".to_string());
                    args.push(renderer.effective_crf().to_string());
                }
            }

            args.push("-pix_fmt".to_string());
            args.push(renderer.pixel_format.as_str().to_string());

            if renderer.format == OutputFormat::Mp4 {
                args.push("-movflags".to_string());
                args.push("+faststart".to_string());
            }
        }
    }

    args.push("-frames:v".to_string());
    args.push(video.duration_in_frames.to_string());
    args.push("-r".to_string());
    args.push(video.fps.to_string());
    args.push(output.display().to_string());

    Ok(args)
}
