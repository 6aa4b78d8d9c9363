//! Application and export configuration.

use crate::error::{FrameloomError, FrameloomResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output container format for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Webm,
    Gif,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Gif => "gif",
        }
    }

    pub fn all() -> &'static [OutputFormat] {
        &[Self::Mp4, Self::Webm, Self::Gif]
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FrameloomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "gif" => Ok(Self::Gif),
            other => Err(FrameloomError::config_one(format!(
                "unknown output format '{other}' (expected mp4, webm, or gif)"
            ))),
        }
    }
}

/// Video codec used by the external encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    H265,
    Vp8,
    Vp9,
}

impl VideoCodec {
    /// The ffmpeg encoder name for this codec.
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp8 => "libvpx",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// Valid CRF range for this codec, inclusive.
    pub fn crf_range(&self) -> (u32, u32) {
        match self {
            Self::H264 | Self::H265 => (0, 51),
            Self::Vp8 | Self::Vp9 => (0, 63),
        }
    }

    /// Whether this codec can be muxed into the given container.
    pub fn supports_format(&self, format: OutputFormat) -> bool {
        match format {
            OutputFormat::Mp4 => matches!(self, Self::H264 | Self::H265),
            OutputFormat::Webm => matches!(self, Self::Vp8 | Self::Vp9),
            // GIF has its own palette path; the codec field is ignored.
            OutputFormat::Gif => true,
        }
    }
}

impl std::fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::H264 => "h264",
            Self::H265 => "h265",
            Self::Vp8 => "vp8",
            Self::Vp9 => "vp9",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for VideoCodec {
    type Err = FrameloomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            "vp8" => Ok(Self::Vp8),
            "vp9" => Ok(Self::Vp9),
            other => Err(FrameloomError::config_one(format!(
                "unknown codec '{other}' (expected h264, h265, vp8, or vp9)"
            ))),
        }
    }
}

/// Pixel format handed to the external encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    #[default]
    Yuv420p,
    Yuv422p,
    Yuv444p,
}

impl PixelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
        }
    }

    /// Chroma-subsampled formats require even frame dimensions.
    pub fn requires_even_dimensions(&self) -> bool {
        matches!(self, Self::Yuv420p | Self::Yuv422p)
    }
}

/// Timing and geometry of the composition being exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Total number of frames in the composition.
    pub duration_in_frames: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            duration_in_frames: 150,
        }
    }
}

impl VideoConfig {
    /// Collect every validation failure, not just the first.
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.width == 0 {
            errors.push("width must be greater than zero".to_string());
        }
        if self.height == 0 {
            errors.push("height must be greater than zero".to_string());
        }
        if self.fps == 0 {
            errors.push("fps must be greater than zero".to_string());
        }
        if self.duration_in_frames == 0 {
            errors.push("duration_in_frames must be greater than zero".to_string());
        }
        errors
    }

    pub fn validate(&self) -> FrameloomResult<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FrameloomError::config(errors))
        }
    }

    /// Display delay of a single frame in milliseconds.
    pub fn frame_delay_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }

    /// Total composition duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration_in_frames as f64 * self.frame_delay_ms()
    }

    /// Bytes in one uncompressed RGBA frame at this geometry.
    pub fn frame_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }
}

/// Encoder-facing configuration for the produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    pub format: OutputFormat,

    pub codec: VideoCodec,

    /// Constant rate factor. `None` means [`RendererConfig::DEFAULT_CRF`].
    /// Ignored whenever `bitrate_kbps` is set.
    #[serde(default)]
    pub crf: Option<u32>,

    /// Target bitrate in kbps. Takes precedence over `crf` when set.
    #[serde(default)]
    pub bitrate_kbps: Option<u32>,

    #[serde(default)]
    pub pixel_format: PixelFormat,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp4,
            codec: VideoCodec::H264,
            crf: None,
            bitrate_kbps: None,
            pixel_format: PixelFormat::Yuv420p,
        }
    }
}

impl RendererConfig {
    pub const DEFAULT_CRF: u32 = 23;

    /// The CRF the encoder will actually receive when no bitrate is set.
    pub fn effective_crf(&self) -> u32 {
        self.crf.unwrap_or(Self::DEFAULT_CRF)
    }

    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.codec.supports_format(self.format) {
            errors.push(format!(
                "codec {} cannot be muxed into {} output",
                self.codec, self.format
            ));
        }
        if let Some(crf) = self.crf {
            let (lo, hi) = self.codec.crf_range();
            if crf < lo || crf > hi {
                errors.push(format!(
                    "crf {crf} out of range for codec {} ({lo}-{hi})",
                    self.codec
                ));
            }
        }
        if let Some(bitrate) = self.bitrate_kbps {
            if bitrate == 0 {
                errors.push("bitrate must be greater than zero when set".to_string());
            }
        }
        errors
    }

    pub fn validate(&self) -> FrameloomResult<()> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FrameloomError::config(errors))
        }
    }
}

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Frame cache sizing defaults.
    #[serde(default)]
    pub cache: CacheDefaults,

    /// Default export parameters.
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default frame cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheDefaults {
    /// Maximum cumulative payload size in bytes.
    pub max_size_bytes: u64,

    /// Entry lifetime in milliseconds, measured from insertion.
    pub max_age_ms: u64,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            max_size_bytes: 100 * 1024 * 1024,
            max_age_ms: 5 * 60 * 1000,
        }
    }
}

/// Default export parameters used when a caller does not supply its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_in_frames: u32,
    pub format: OutputFormat,
    pub codec: VideoCodec,
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            duration_in_frames: 150,
            format: OutputFormat::Mp4,
            codec: VideoCodec::H264,
        }
    }
}

impl ExportDefaults {
    pub fn video_config(&self) -> VideoConfig {
        VideoConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            duration_in_frames: self.duration_in_frames,
        }
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            format: self.format,
            codec: self.codec,
            ..RendererConfig::default()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "frameloom=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("frameloom").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_config_collects_all_errors() {
        let config = VideoConfig {
            width: 0,
            height: 1080,
            fps: 0,
            duration_in_frames: 0,
        };
        let errors = config.validation_errors();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("width"));
        assert!(errors[1].contains("fps"));
        assert!(errors[2].contains("duration_in_frames"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_video_config_defaults_are_valid() {
        let config = VideoConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.frame_delay_ms() - 33.333).abs() < 0.01);
        assert_eq!(config.frame_bytes(), 1920 * 1080 * 4);
    }

    #[test]
    fn test_codec_format_compatibility() {
        let mut config = RendererConfig {
            format: OutputFormat::Webm,
            codec: VideoCodec::H264,
            ..RendererConfig::default()
        };
        assert_eq!(config.validation_errors().len(), 1);

        config.codec = VideoCodec::Vp9;
        assert!(config.validate().is_ok());

        // GIF ignores the codec field entirely
        config.format = OutputFormat::Gif;
        config.codec = VideoCodec::H264;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_crf_range_per_codec() {
        let config = RendererConfig {
            crf: Some(60),
            ..RendererConfig::default()
        };
        assert_eq!(config.validation_errors().len(), 1);

        let config = RendererConfig {
            format: OutputFormat::Webm,
            codec: VideoCodec::Vp9,
            crf: Some(60),
            ..RendererConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(RendererConfig::default().effective_crf(), 23);
    }

    #[test]
    fn test_format_round_trip() {
        for format in OutputFormat::all() {
            let parsed: OutputFormat = format.to_string().parse().unwrap();
            assert_eq!(parsed, *format);
        }
        assert!("avi".parse::<OutputFormat>().is_err());
    }
}
