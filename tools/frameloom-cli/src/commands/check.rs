//! Check host encoding capabilities.

use frameloom_capture::is_ffmpeg_available;
use frameloom_common::config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    println!("Frameloom System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = is_ffmpeg_available();
    if ffmpeg {
        println!("[OK] ffmpeg found on PATH");
    } else {
        println!("[WARN] ffmpeg not found; exports fall back to --png-dir sequences");
    }

    let config = AppConfig::load();
    println!(
        "[OK] Frame cache: {} MiB budget, {}s entry lifetime",
        config.cache.max_size_bytes / (1024 * 1024),
        config.cache.max_age_ms / 1000
    );
    println!(
        "[OK] Default export: {}x{} @ {} fps, {} frames ({}/{})",
        config.export.width,
        config.export.height,
        config.export.fps,
        config.export.duration_in_frames,
        config.export.format,
        config.export.codec
    );

    println!();
    if ffmpeg {
        println!("Video encoding is available. Frameloom is ready.");
    } else {
        println!("Install ffmpeg to enable video encoding.");
    }

    Ok(())
}
