//! Control over FFmpeg's own console output.
//!
//! FFmpeg writes warnings to stderr on its own, independently of the `log`
//! facade the rest of the crate uses. Decoding many uploads makes that
//! noisy, so the CLI exposes this as `--log-level`.

use ffmpeg_next::util::log::Level;

/// Threshold below which FFmpeg stays silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfmpegLogLevel {
    Quiet,
    Error,
    Warning,
    Info,
    Debug,
}

impl FfmpegLogLevel {
    /// Parse a level name, ignoring case. `warn` is accepted for `warning`.
    pub fn parse(name: &str) -> Option<Self> {
        let level = match name.trim().to_ascii_lowercase().as_str() {
            "quiet" => FfmpegLogLevel::Quiet,
            "error" => FfmpegLogLevel::Error,
            "warning" | "warn" => FfmpegLogLevel::Warning,
            "info" => FfmpegLogLevel::Info,
            "debug" => FfmpegLogLevel::Debug,
            _ => return None,
        };
        Some(level)
    }
}

/// Apply `level` process-wide.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(match level {
        FfmpegLogLevel::Quiet => Level::Quiet,
        FfmpegLogLevel::Error => Level::Error,
        FfmpegLogLevel::Warning => Level::Warning,
        FfmpegLogLevel::Info => Level::Info,
        FfmpegLogLevel::Debug => Level::Debug,
    });
}
