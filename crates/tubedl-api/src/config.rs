//! API configuration.

use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory holding one subdirectory per job (log + metadata)
    pub jobs_dir: PathBuf,
    /// Default output directory when the request omits one
    pub output_dir: PathBuf,
    /// External downloader executable, invoked as `<bin> <url> -o <dir>`
    pub downloader_bin: String,
    /// Tools that must be on PATH before a job is accepted
    pub required_tools: Vec<String>,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let downloader_bin = "yt-dlp".to_string();
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            jobs_dir: PathBuf::from("jobs"),
            output_dir: PathBuf::from("downloads"),
            required_tools: vec![downloader_bin.clone(), "ffmpeg".to_string()],
            downloader_bin,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB; requests are tiny JSON bodies
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let downloader_bin =
            std::env::var("DOWNLOADER_BIN").unwrap_or(defaults.downloader_bin);
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            jobs_dir: std::env::var("JOBS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            required_tools: std::env::var("REQUIRED_TOOLS")
                .map(|s| s.split(',').map(|t| t.trim().to_string()).collect())
                .unwrap_or_else(|_| vec![downloader_bin.clone(), "ffmpeg".to_string()]),
            downloader_bin,
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
        }
    }
}
