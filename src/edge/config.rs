/**
 * Edge Configuration
 *
 * Loaded from environment variables with defaults suited to running the
 * edge next to a local trivia server:
 *
 * - `EDGE_UPSTREAM_URL` (default `http://127.0.0.1:3000`)
 * - `EDGE_BIND_ADDR` (default `127.0.0.1:8080`)
 * - `EDGE_CACHE_NAME` (default `trivia-cache-v1`); bump it to retire every
 *   asset cached under the previous name on the next start
 * - `EDGE_CACHE_PATH` (default `<data dir>/trivia/edge-cache.db`)
 * - `EDGE_UPSTREAM_TIMEOUT_SECS` (default 10)
 */
use crate::shared::config::{ConfigError, DEFAULT_SERVER_URL};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_CACHE_NAME: &str = "trivia-cache-v1";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Placeholder served for images that are neither cached nor reachable
pub const IMAGE_PLACEHOLDER: &str = "/images/ui/placeholder.png";

/// Static assets fetched into the cache at install time
pub const PRECACHE_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/play.html",
    "/profile.html",
    "/leaderboard.html",
    "/css/main.css",
    "/css/mobile.css",
    "/css/fonts.css",
    "/js/main.js",
    "/js/auth.js",
    "/js/game.js",
    "/js/profile.js",
    "/js/leaderboard.js",
    "/js/font-loader.js",
    "/js/local-questions.js",
    "/js/offline-mode.js",
    "/fonts/runescape.woff2",
    "/fonts/runescape.woff",
    "/fonts/runescape_bold.woff2",
    "/fonts/runescape_bold.woff",
    "/images/ui/clue_scroll.png",
    "/images/ui/beginner_clue.png",
    "/images/ui/easy_clue.png",
    "/images/ui/medium_clue.png",
    "/images/ui/hard_clue.png",
    "/images/ui/elite_clue.png",
    "/images/ui/master_clue.png",
    "/images/ui/correct_icon.png",
    "/images/ui/incorrect_icon.png",
    "/images/ui/level_icon.png",
    "/images/ui/xp_icon.png",
    "/images/ui/questions_icon.png",
    "/images/ui/xp_lamp.png",
    "/images/ui/level_up.png",
    IMAGE_PLACEHOLDER,
    "/images/ui/item_placeholder.png",
    "/images/ui/npc_placeholder.png",
    "/images/ui/location_placeholder.png",
    "/images/ui/skill_placeholder.png",
    "/images/ui/background.jpg",
    "/images/ui/wise_old_man.png",
];

/// Edge configuration
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Origin every request is forwarded to
    pub upstream_url: String,
    pub bind_addr: SocketAddr,
    /// Current cache generation
    pub cache_name: String,
    /// `None` keeps the cache in memory
    pub cache_path: Option<PathBuf>,
    pub upstream_timeout: Duration,
    pub precache: Vec<String>,
}

impl EdgeConfig {
    /// Defaults for the given upstream, with an in-memory cache
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            cache_path: None,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            precache: PRECACHE_ASSETS.iter().map(|path| path.to_string()).collect(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let upstream_url =
            std::env::var("EDGE_UPSTREAM_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        if !(upstream_url.starts_with("http://") || upstream_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(upstream_url));
        }

        let bind_addr = std::env::var("EDGE_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "EDGE_BIND_ADDR",
                message: e.to_string(),
            })?;

        let upstream_timeout = match std::env::var("EDGE_UPSTREAM_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "EDGE_UPSTREAM_TIMEOUT_SECS",
                    message: format!("expected a positive number of seconds, got '{}'", raw),
                })?,
            Err(_) => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        let cache_path = std::env::var("EDGE_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
                path.push("trivia");
                path.push("edge-cache.db");
                path
            });

        Ok(Self {
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            bind_addr,
            cache_name: std::env::var("EDGE_CACHE_NAME")
                .unwrap_or_else(|_| DEFAULT_CACHE_NAME.to_string()),
            cache_path: Some(cache_path),
            upstream_timeout,
            precache: PRECACHE_ASSETS.iter().map(|path| path.to_string()).collect(),
        })
    }
}
