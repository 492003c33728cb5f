#![forbid(unsafe_code)]

//! List engine configuration (deterministic, env-overridable).
//!
//! # Environment Variables
//! - `DAYLOG_DENSITY` = compact|regular
//! - `DAYLOG_DEFAULT_ROW_HEIGHT` (u32, px)
//! - `DAYLOG_BATCH_SIZE` (usize, rows per frame)
//! - `DAYLOG_OVERSCAN` (usize, rows)
//! - `DAYLOG_SELECTION_MODE` (bool)
//! - `DAYLOG_HEADER_HEIGHT` (u32, px)
//! - `DAYLOG_TABLE_HEADER_HEIGHT` (u32, px)
//! - `DAYLOG_RECORD_ROW_HEIGHT` (u32, px)
//! - `DAYLOG_TABLE_PADDING` (u32, px)
//! - `DAYLOG_SCROLL_MARGIN` (u32, px)
//! - `DAYLOG_SMOOTH_SCROLL_FRAMES` (u32)
//! - `DAYLOG_METRICS_CACHE_CAPACITY` (usize)
//! - `DAYLOG_DAILY_GOAL` (f64, earnings target per day)

use std::env;
use std::fmt;

const ENV_DENSITY: &str = "DAYLOG_DENSITY";
const ENV_DEFAULT_ROW_HEIGHT: &str = "DAYLOG_DEFAULT_ROW_HEIGHT";
const ENV_BATCH_SIZE: &str = "DAYLOG_BATCH_SIZE";
const ENV_OVERSCAN: &str = "DAYLOG_OVERSCAN";
const ENV_SELECTION_MODE: &str = "DAYLOG_SELECTION_MODE";
const ENV_HEADER_HEIGHT: &str = "DAYLOG_HEADER_HEIGHT";
const ENV_TABLE_HEADER_HEIGHT: &str = "DAYLOG_TABLE_HEADER_HEIGHT";
const ENV_RECORD_ROW_HEIGHT: &str = "DAYLOG_RECORD_ROW_HEIGHT";
const ENV_TABLE_PADDING: &str = "DAYLOG_TABLE_PADDING";
const ENV_SCROLL_MARGIN: &str = "DAYLOG_SCROLL_MARGIN";
const ENV_SMOOTH_SCROLL_FRAMES: &str = "DAYLOG_SMOOTH_SCROLL_FRAMES";
const ENV_METRICS_CACHE_CAPACITY: &str = "DAYLOG_METRICS_CACHE_CAPACITY";
const ENV_DAILY_GOAL: &str = "DAYLOG_DAILY_GOAL";

/// Display density of the host surface.
///
/// Constrained (mobile-sized) viewports render fewer overscan rows and switch
/// to virtualization earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Density {
    Compact,
    #[default]
    Regular,
}

impl Density {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Regular => "regular",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "mobile" => Some(Self::Compact),
            "regular" | "desktop" => Some(Self::Regular),
            _ => None,
        }
    }

    /// Overscan rows used when the config does not override it.
    #[must_use]
    pub const fn default_overscan(self) -> usize {
        match self {
            Self::Compact => 2,
            Self::Regular => 5,
        }
    }

    /// Record and group counts above which the list should be virtualized.
    #[must_use]
    pub const fn thresholds(self) -> VirtualizationThresholds {
        match self {
            Self::Compact => VirtualizationThresholds {
                records: 500,
                groups: 100,
            },
            Self::Regular => VirtualizationThresholds {
                records: 1_000,
                groups: 200,
            },
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts beyond which rendering every group eagerly gets too expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualizationThresholds {
    pub records: usize,
    pub groups: usize,
}

impl VirtualizationThresholds {
    /// `true` if either the record count or the group count exceeds its threshold.
    #[must_use]
    pub const fn exceeded(&self, records: usize, groups: usize) -> bool {
        records > self.records || (groups > 0 && groups > self.groups)
    }
}

/// Decide whether a collection is large enough to need the virtualized list.
#[must_use]
pub fn should_virtualize(records: usize, groups: usize, density: Density) -> bool {
    density.thresholds().exceeded(records, groups)
}

/// Configuration for the grouped list engine.
///
/// Pixel values describe the accordion layout: a closed group is
/// `header_height` tall; an open one adds the optional table header, one
/// `record_row_height` per record, and `table_padding`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListConfig {
    pub density: Density,
    pub default_row_height: u32,
    pub batch_size: usize,
    /// Explicit overscan; `None` falls back to [`Density::default_overscan`].
    pub overscan: Option<usize>,
    pub selection_mode: bool,
    pub header_height: u32,
    pub table_header_height: u32,
    pub record_row_height: u32,
    pub table_padding: u32,
    /// Gap left above a freshly opened group after corrective scrolling.
    pub scroll_margin: u32,
    pub smooth_scroll_frames: u32,
    pub metrics_cache_capacity: usize,
    pub daily_goal: Option<f64>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            density: Density::Regular,
            default_row_height: 60,
            batch_size: 50,
            overscan: None,
            selection_mode: false,
            header_height: 60,
            table_header_height: 40,
            record_row_height: 48,
            table_padding: 16,
            scroll_margin: 20,
            smooth_scroll_frames: 12,
            metrics_cache_capacity: 1_000,
            daily_goal: None,
        }
    }
}

impl ListConfig {
    #[must_use]
    pub fn with_density(mut self, density: Density) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub fn with_default_row_height(mut self, height: u32) -> Self {
        self.default_row_height = height;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = Some(overscan);
        self
    }

    #[must_use]
    pub fn with_selection_mode(mut self, enabled: bool) -> Self {
        self.selection_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_daily_goal(mut self, goal: Option<f64>) -> Self {
        self.daily_goal = goal;
        self
    }

    #[must_use]
    pub fn with_smooth_scroll_frames(mut self, frames: u32) -> Self {
        self.smooth_scroll_frames = frames;
        self
    }

    #[must_use]
    pub fn with_metrics_cache_capacity(mut self, capacity: usize) -> Self {
        self.metrics_cache_capacity = capacity;
        self
    }

    /// Overscan actually applied by the windowing resolver.
    #[must_use]
    pub fn effective_overscan(&self) -> usize {
        self.overscan
            .unwrap_or_else(|| self.density.default_overscan())
    }

    /// Rows assigned per frame during batch initialization (never zero).
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> ListConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ListConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        validate_positive("default_row_height", self.default_row_height as usize, &mut errors);
        validate_positive("batch_size", self.batch_size, &mut errors);
        validate_positive("header_height", self.header_height as usize, &mut errors);
        validate_positive("record_row_height", self.record_row_height as usize, &mut errors);
        validate_positive("smooth_scroll_frames", self.smooth_scroll_frames as usize, &mut errors);
        validate_positive("metrics_cache_capacity", self.metrics_cache_capacity, &mut errors);
        if let Some(goal) = self.daily_goal
            && (!goal.is_finite() || goal < 0.0)
        {
            errors.push(ConfigError::new(
                "daily_goal",
                goal.to_string(),
                "must be a finite, non-negative amount",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Short human-readable summary for debug output.
    #[must_use]
    pub fn summary_short(&self) -> String {
        let selection = if self.selection_mode { "select" } else { "browse" };
        format!(
            "daylog: {} · overscan {} · batch {} · {selection}",
            self.density,
            self.effective_overscan(),
            self.effective_batch_size()
        )
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct ListConfigParse {
    pub config: ListConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn from_env_with<F>(mut get: F) -> ListConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = ListConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_DENSITY) {
        match Density::parse(&value) {
            Some(parsed) => config.density = parsed,
            None => errors.push(ConfigError::new(
                "density",
                value,
                "expected compact|regular",
            )),
        }
    }

    parse_field(&mut get, ENV_DEFAULT_ROW_HEIGHT, "default_row_height", &mut errors, |v| {
        config.default_row_height = v;
    });
    parse_field(&mut get, ENV_BATCH_SIZE, "batch_size", &mut errors, |v| {
        config.batch_size = v;
    });
    parse_field(&mut get, ENV_OVERSCAN, "overscan", &mut errors, |v| {
        config.overscan = Some(v);
    });
    parse_field(&mut get, ENV_HEADER_HEIGHT, "header_height", &mut errors, |v| {
        config.header_height = v;
    });
    parse_field(&mut get, ENV_TABLE_HEADER_HEIGHT, "table_header_height", &mut errors, |v| {
        config.table_header_height = v;
    });
    parse_field(&mut get, ENV_RECORD_ROW_HEIGHT, "record_row_height", &mut errors, |v| {
        config.record_row_height = v;
    });
    parse_field(&mut get, ENV_TABLE_PADDING, "table_padding", &mut errors, |v| {
        config.table_padding = v;
    });
    parse_field(&mut get, ENV_SCROLL_MARGIN, "scroll_margin", &mut errors, |v| {
        config.scroll_margin = v;
    });
    parse_field(&mut get, ENV_SMOOTH_SCROLL_FRAMES, "smooth_scroll_frames", &mut errors, |v| {
        config.smooth_scroll_frames = v;
    });
    parse_field(
        &mut get,
        ENV_METRICS_CACHE_CAPACITY,
        "metrics_cache_capacity",
        &mut errors,
        |v| config.metrics_cache_capacity = v,
    );

    if let Some(value) = get(ENV_SELECTION_MODE) {
        match parse_bool(&value) {
            Some(parsed) => config.selection_mode = parsed,
            None => errors.push(ConfigError::new(
                "selection_mode",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    if let Some(value) = get(ENV_DAILY_GOAL) {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            config.daily_goal = None;
        } else {
            match trimmed.parse::<f64>() {
                Ok(parsed) => config.daily_goal = Some(parsed),
                Err(_) => errors.push(ConfigError::new(
                    "daily_goal",
                    value,
                    "expected number or none",
                )),
            }
        }
    }

    if let Err(mut invalid) = config.validate() {
        errors.append(&mut invalid);
    }

    ListConfigParse { config, errors }
}

fn parse_field<F, T, S>(
    get: &mut F,
    key: &str,
    field: &'static str,
    errors: &mut Vec<ConfigError>,
    set: S,
) where
    F: FnMut(&str) -> Option<String>,
    T: std::str::FromStr,
    S: FnOnce(T),
{
    if let Some(value) = get(key) {
        match value.trim().parse::<T>() {
            Ok(parsed) => set(parsed),
            Err(_) => errors.push(ConfigError::new(
                field,
                value,
                "expected non-negative integer",
            )),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn validate_positive(field: &'static str, value: usize, errors: &mut Vec<ConfigError>) {
    if value == 0 {
        errors.push(ConfigError::new(field, value.to_string(), "must be > 0"));
    }
}
