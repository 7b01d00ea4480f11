//! Tile Scheduler configuration.
//!
//! Configuration is loaded from environment variables. Every variable is
//! optional; unset variables fall back to the defaults below, while values
//! that are present but malformed are rejected.

use crate::layout::DEFAULT_ASPECT_RATIO;
use crate::subscription::Budget;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Maximum tiles rendered on one page of the paginated grid.
pub const DEFAULT_MAX_TILES_PER_PAGE: usize = 12;

/// Narrowest tile the paginated grid will lay out, in pixels.
pub const DEFAULT_MIN_TILE_WIDTH: u32 = 280;

/// Tile width used by the continuous-scroll list, in pixels.
pub const DEFAULT_SCROLL_TILE_WIDTH: u32 = 280;

/// Vertical gap between tiles in the continuous-scroll list, in pixels.
pub const DEFAULT_TILE_GAP: u32 = 8;

/// Upper bound on the number of off-screen items kept materialized while
/// scrolling.
pub const DEFAULT_MAX_SCROLL_BUFFER: usize = 10;

/// Below this many remote participants nobody is unsubscribed.
pub const DEFAULT_SMALL_CALL_THRESHOLD: usize = 9;

/// Fewer visible participants than this receive high quality.
pub const DEFAULT_QUALITY_HIGH_BELOW: usize = 5;

/// Fewer visible participants than this (and not high) receive mid quality.
pub const DEFAULT_QUALITY_MID_BELOW: usize = 10;

/// Delay between the last trigger and emitting subscription instructions.
pub const DEFAULT_RECOMPUTE_DEBOUNCE_MS: u64 = 50;

/// How the visible window is derived from the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewModeKind {
    /// Fixed-size pages navigated by page number.
    #[default]
    Paged,
    /// A virtualized list navigated by scroll offset.
    Scroll,
}

impl FromStr for ViewModeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paged" | "grid" => Ok(ViewModeKind::Paged),
            "scroll" | "list" => Ok(ViewModeKind::Scroll),
            other => Err(ConfigError::InvalidValue(format!(
                "TS_VIEW_MODE must be 'paged' or 'scroll', got '{other}'"
            ))),
        }
    }
}

/// Tunables consumed by the pure scheduling functions.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub aspect_ratio: f64,
    pub max_tiles_per_page: usize,
    pub min_tile_width: u32,
    pub scroll_tile_width: u32,
    pub tile_gap: u32,
    pub max_scroll_buffer: usize,
    pub small_call_threshold: usize,
    pub quality_high_below: usize,
    pub quality_mid_below: usize,
    /// Whether the local participant occupies a tile in the grid layout.
    pub include_local_tile: bool,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            max_tiles_per_page: DEFAULT_MAX_TILES_PER_PAGE,
            min_tile_width: DEFAULT_MIN_TILE_WIDTH,
            scroll_tile_width: DEFAULT_SCROLL_TILE_WIDTH,
            tile_gap: DEFAULT_TILE_GAP,
            max_scroll_buffer: DEFAULT_MAX_SCROLL_BUFFER,
            small_call_threshold: DEFAULT_SMALL_CALL_THRESHOLD,
            quality_high_below: DEFAULT_QUALITY_HIGH_BELOW,
            quality_mid_below: DEFAULT_QUALITY_MID_BELOW,
            include_local_tile: true,
        }
    }
}

/// Tile Scheduler configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pure scheduling tunables.
    pub settings: SchedulerSettings,

    /// Subscription budget; unbounded derives three pages' worth.
    pub budget: Budget,

    /// Initial view mode.
    pub view_mode: ViewModeKind,

    /// Debounce delay before subscription instructions are emitted.
    pub recompute_debounce: Duration,

    /// Optional Prometheus exporter address (e.g., "0.0.0.0:9464").
    pub metrics_bind_address: Option<SocketAddr>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Parse an optional variable, rejecting malformed values.
fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{name} has invalid value '{raw}'"))),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let aspect_ratio: f64 = parse_var(vars, "TS_ASPECT_RATIO", DEFAULT_ASPECT_RATIO)?;
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "TS_ASPECT_RATIO must be a positive number, got {aspect_ratio}"
            )));
        }

        let max_tiles_per_page =
            parse_var(vars, "TS_MAX_TILES_PER_PAGE", DEFAULT_MAX_TILES_PER_PAGE)?;
        if max_tiles_per_page == 0 {
            return Err(ConfigError::InvalidValue(
                "TS_MAX_TILES_PER_PAGE must be at least 1".to_string(),
            ));
        }

        let min_tile_width = parse_var(vars, "TS_MIN_TILE_WIDTH", DEFAULT_MIN_TILE_WIDTH)?;
        let scroll_tile_width = parse_var(vars, "TS_SCROLL_TILE_WIDTH", DEFAULT_SCROLL_TILE_WIDTH)?;
        if min_tile_width == 0 || scroll_tile_width == 0 {
            return Err(ConfigError::InvalidValue(
                "tile widths must be at least 1 pixel".to_string(),
            ));
        }

        let tile_gap = parse_var(vars, "TS_TILE_GAP", DEFAULT_TILE_GAP)?;
        let max_scroll_buffer = parse_var(vars, "TS_MAX_SCROLL_BUFFER", DEFAULT_MAX_SCROLL_BUFFER)?;
        let small_call_threshold =
            parse_var(vars, "TS_SMALL_CALL_THRESHOLD", DEFAULT_SMALL_CALL_THRESHOLD)?;

        let quality_high_below =
            parse_var(vars, "TS_QUALITY_HIGH_BELOW", DEFAULT_QUALITY_HIGH_BELOW)?;
        let quality_mid_below = parse_var(vars, "TS_QUALITY_MID_BELOW", DEFAULT_QUALITY_MID_BELOW)?;
        if quality_mid_below <= quality_high_below {
            return Err(ConfigError::InvalidValue(format!(
                "TS_QUALITY_MID_BELOW ({quality_mid_below}) must exceed TS_QUALITY_HIGH_BELOW ({quality_high_below})"
            )));
        }

        let budget = match vars.get("TS_SUBSCRIPTION_BUDGET").map(|s| s.trim()) {
            None | Some("" | "unbounded") => Budget::Unbounded,
            Some(raw) => raw.parse().map(Budget::Limited).map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "TS_SUBSCRIPTION_BUDGET has invalid value '{raw}'"
                ))
            })?,
        };

        let view_mode = match vars.get("TS_VIEW_MODE") {
            Some(raw) => raw.parse()?,
            None => ViewModeKind::default(),
        };

        let recompute_debounce = Duration::from_millis(parse_var(
            vars,
            "TS_RECOMPUTE_DEBOUNCE_MS",
            DEFAULT_RECOMPUTE_DEBOUNCE_MS,
        )?);

        let metrics_bind_address = match vars.get("TS_METRICS_BIND_ADDRESS").map(|s| s.trim()) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("TS_METRICS_BIND_ADDRESS '{raw}': {e}"))
            })?),
        };

        Ok(Config {
            settings: SchedulerSettings {
                aspect_ratio,
                max_tiles_per_page,
                min_tile_width,
                scroll_tile_width,
                tile_gap,
                max_scroll_buffer,
                small_call_threshold,
                quality_high_below,
                quality_mid_below,
                include_local_tile: true,
            },
            budget,
            view_mode,
            recompute_debounce,
            metrics_bind_address,
        })
    }
}
