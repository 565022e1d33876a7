//! Configuration loaded from the environment (and an optional `.env` file).

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct ClipperConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Flat directory holding finished clips
    pub storage_dir: PathBuf,
    pub ffmpeg_bin: PathBuf,
    pub ytdlp_bin: PathBuf,
    /// Artifacts older than this are evicted
    pub artifact_max_age: Duration,
    pub sweep_interval: Duration,
    /// Upper bound on a single ffmpeg run
    pub transcode_timeout: Duration,
    /// Upper bound on a single yt-dlp run
    pub resolve_timeout: Duration,
    /// How long a tool availability probe is trusted
    pub probe_cache_ttl: Duration,
    /// Resolution cap handed to the resolver
    pub max_height: u32,
    /// Cookie jar contents supplied inline; written to `cookies_file` at startup
    pub cookies: Option<String>,
    pub cookies_file: PathBuf,
}

impl ClipperConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: u64| match lookup(key) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!(key, value = %raw, default, "ignoring unparseable setting");
                default
            }),
            None => default,
        };

        Self {
            addr: string("ADDR", "0.0.0.0"),
            port: string("PORT", "5000"),
            storage_dir: PathBuf::from(string("STORAGE_DIR", "temp_videos")),
            ffmpeg_bin: PathBuf::from(string("FFMPEG_BIN", "ffmpeg")),
            ytdlp_bin: PathBuf::from(string("YTDLP_BIN", "yt-dlp")),
            artifact_max_age: Duration::from_secs(number("ARTIFACT_MAX_AGE_SECS", 3600)),
            sweep_interval: Duration::from_secs(number("SWEEP_INTERVAL_SECS", 1800).max(1)),
            transcode_timeout: Duration::from_secs(number("TRANSCODE_TIMEOUT_SECS", 900)),
            resolve_timeout: Duration::from_secs(number("RESOLVE_TIMEOUT_SECS", 120)),
            probe_cache_ttl: Duration::from_secs(number("PROBE_CACHE_SECS", 30)),
            max_height: u32::try_from(number("MAX_HEIGHT", 720)).unwrap_or(720),
            cookies: lookup("YTDLP_COOKIES").filter(|c| !c.trim().is_empty()),
            cookies_file: PathBuf::from(string("COOKIES_FILE", "cookies.txt")),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    /// Write inline cookies (if any) over `cookies_file`. The environment
    /// always wins over whatever file is already there.
    pub fn materialize_cookies(&self) -> io::Result<()> {
        if let Some(cookies) = &self.cookies {
            write_cookies(&self.cookies_file, cookies)?;
            info!(path = ?self.cookies_file, "wrote cookies from environment");
        }
        Ok(())
    }
}

fn write_cookies(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
