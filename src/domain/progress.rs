//! Progress arithmetic and ffmpeg diagnostic parsing.
//!
//! Everything here is pure so it can be tested without a subprocess.

use once_cell::sync::Lazy;
use regex::Regex;

/// Progress reported once the resolver starts.
pub const RESOLVING_PROGRESS: u8 = 10;
/// Progress reported when the transcoder is launched.
pub const TRANSCODE_FLOOR: u8 = 30;
/// Transcode progress never exceeds this; the rest is left for finalization.
pub const TRANSCODE_CEILING: u8 = 90;
/// Maximum number of characters of tool output surfaced to clients.
pub const EXCERPT_LIMIT: usize = 200;

static TIME_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap());

/// Extract the elapsed output time from an ffmpeg stats line such as
/// `frame=  48 fps=0.0 q=28.0 size=0kB time=00:00:01.92 bitrate=0.2kbits/s`.
pub fn parse_time_marker(line: &str) -> Option<f64> {
    let caps = TIME_MARKER.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Fraction of the clip already encoded, in `[0, 1]`.
pub fn transcode_fraction(elapsed_seconds: f64, total_seconds: f64) -> f64 {
    if total_seconds <= 0.0 || !elapsed_seconds.is_finite() {
        return 0.0;
    }
    (elapsed_seconds / total_seconds).clamp(0.0, 1.0)
}

/// Map encoder progress onto the job's `[TRANSCODE_FLOOR, TRANSCODE_CEILING]` band.
pub fn transcode_percent(elapsed_seconds: f64, total_seconds: f64) -> u8 {
    let band = f64::from(TRANSCODE_CEILING - TRANSCODE_FLOOR);
    let fraction = transcode_fraction(elapsed_seconds, total_seconds);
    let percent = f64::from(TRANSCODE_FLOOR) + (fraction * band).floor();
    (percent as u8).min(TRANSCODE_CEILING)
}

/// Keep the last `limit` characters of diagnostic output, where the tool
/// prints its actual error.
pub fn excerpt(text: &str, limit: usize) -> String {
    let text = text.trim();
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(limit)).collect()
}
