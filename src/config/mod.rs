use std::env;
use std::str::FromStr;

use crate::db::round_repo::StoreKeys;
use crate::models::PhaseDurations;
use crate::round::MachineConfig;
use crate::viewer::Camera;

const DEFAULT_VIEWER_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token guarding admin routes; unset disables the check.
    pub api_token: Option<String>,

    // Storage (Redis wins over Postgres; neither means in-memory)
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub store_key_prefix: String,

    // Round timing
    pub betting_duration_ms: i64,
    pub revealing_duration_ms: i64,
    pub settled_duration_ms: i64,
    pub history_len: usize,
    pub max_catch_up_steps: usize,
    pub future_tolerance_ms: i64,

    // Background driver
    pub round_driver_enabled: bool,
    pub round_driver_interval_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_env("PORT", "8080")?,
            api_token: non_empty_env("API_TOKEN"),

            database_url: non_empty_env("DATABASE_URL"),
            redis_url: non_empty_env("REDIS_URL"),
            store_key_prefix: env::var("STORE_KEY_PREFIX").unwrap_or_else(|_| "game".into()),

            betting_duration_ms: parse_env("BETTING_DURATION_MS", "7000")?,
            revealing_duration_ms: parse_env("REVEALING_DURATION_MS", "15000")?,
            settled_duration_ms: parse_env("SETTLED_DURATION_MS", "2500")?,
            history_len: parse_env("HISTORY_LEN", "8")?,
            max_catch_up_steps: parse_env("MAX_CATCH_UP_STEPS", "100")?,
            future_tolerance_ms: parse_env("FUTURE_TOLERANCE_MS", "2000")?,

            round_driver_enabled: env::var("ROUND_DRIVER_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            round_driver_interval_ms: parse_env("ROUND_DRIVER_INTERVAL_MS", "250")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the round machine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let d = self.durations();
        if !d.all_positive() {
            anyhow::bail!("phase durations must be positive, got {d:?}");
        }
        if self.history_len == 0 {
            anyhow::bail!("HISTORY_LEN must be at least 1");
        }
        if self.max_catch_up_steps == 0 {
            anyhow::bail!("MAX_CATCH_UP_STEPS must be at least 1");
        }
        Ok(())
    }

    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations {
            betting_duration_ms: self.betting_duration_ms,
            revealing_duration_ms: self.revealing_duration_ms,
            settled_duration_ms: self.settled_duration_ms,
        }
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            durations: self.durations(),
            history_len: self.history_len,
            max_catch_up_steps: self.max_catch_up_steps,
            future_tolerance_ms: self.future_tolerance_ms,
        }
    }

    pub fn store_keys(&self) -> StoreKeys {
        StoreKeys::with_prefix(&self.store_key_prefix)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let machine = MachineConfig::default();
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            api_token: None,
            database_url: None,
            redis_url: None,
            store_key_prefix: "game".into(),
            betting_duration_ms: machine.durations.betting_duration_ms,
            revealing_duration_ms: machine.durations.revealing_duration_ms,
            settled_duration_ms: machine.durations.settled_duration_ms,
            history_len: machine.history_len,
            max_catch_up_steps: machine.max_catch_up_steps,
            future_tolerance_ms: machine.future_tolerance_ms,
            round_driver_enabled: false,
            round_driver_interval_ms: 250,
        }
    }
}

/// Settings for the terminal viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub frame_interval_ms: u64,
    /// Emit one frame log every N frames.
    pub log_every_frames: u64,
    /// Visible time span of the chart, ms.
    pub window_ms: f64,
    /// Height the logged head row is measured against.
    pub plot_rows: f64,
}

impl ViewerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server_url: env::var("VIEWER_SERVER_URL")
                .unwrap_or_else(|_| DEFAULT_VIEWER_SERVER_URL.into()),
            poll_interval_ms: parse_env("VIEWER_POLL_INTERVAL_MS", "500")?,
            frame_interval_ms: parse_env("VIEWER_FRAME_INTERVAL_MS", "16")?,
            log_every_frames: parse_env("VIEWER_LOG_EVERY_FRAMES", "30")?,
            window_ms: parse_env("VIEWER_WINDOW_MS", "26000")?,
            plot_rows: parse_env("VIEWER_PLOT_ROWS", "24")?,
        })
    }

    pub fn camera(&self) -> Camera {
        let mut camera = Camera::default();
        if self.window_ms.is_finite() && self.window_ms > 0.0 {
            camera.window_ms = self.window_ms;
        }
        camera
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.into());
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("{key} has invalid value {raw:?}: {e}"))
}
