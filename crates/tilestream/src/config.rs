//! # Configuration
//!
//! One TOML file, loaded once at startup, with a `[tilemap]` table for the
//! solver and a `[streaming]` table for the scheduler. Every field has a
//! default, so a partial (or empty) file is valid.
//!
//! ```toml
//! [tilemap]
//! seed = 42
//! cluster_size = { x = 8, y = 1, z = 8 }
//! fillers = [{ tile_id = 1, rotation = 0 }]
//!
//! [streaming]
//! multithreaded = false
//! max_generation_distance = 32.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tilestream_shared::constants::{
    DEFAULT_EVICTION_FACING_THRESHOLD, DEFAULT_FADE_OUT_DISTANCE, DEFAULT_IDLE_SLEEP_MS,
    DEFAULT_MAX_GENERATION_DISTANCE, DEFAULT_MAX_TIME_PER_FRAME_MS, DEFAULT_RESET_ANGLE_DEGREES,
    DEFAULT_RESET_CHECK_INTERVAL_MS, DEFAULT_RESET_DISTANCE, DEFAULT_STEPS_PER_RADIUS,
};
use tilestream_shared::Vec3;
use tilestream_wfc::TilemapConfig;

use crate::error::{ConfigError, ConfigResult};

/// Scheduler configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Run generation on a dedicated worker thread.
    pub multithreaded: bool,
    /// Radius (world units) up to which tiles are generated.
    pub max_generation_distance: f32,
    /// Clusters farther than this and behind the viewpoint are evicted.
    pub fade_out_distance: f32,
    /// Wall-clock budget of one synchronous update.
    pub max_time_per_frame_ms: u64,
    /// Generation steps per radius before the radius is re-evaluated.
    pub steps_per_radius: u32,
    /// Facing dot product below which a cluster counts as behind.
    pub eviction_facing_threshold: f32,
    /// Viewpoint translation that restarts a threaded pass.
    pub reset_distance: f32,
    /// Viewpoint rotation (degrees) that restarts a threaded pass.
    pub reset_angle_degrees: f32,
    /// Pass time after which the worker starts polling for resets.
    pub reset_check_interval_ms: u64,
    /// Worker sleep after a pass with no work.
    pub idle_sleep_ms: u64,
    /// Container-local position of the corner of tile (0, 0, 0).
    pub tile_origin: Vec3,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            multithreaded: true,
            max_generation_distance: DEFAULT_MAX_GENERATION_DISTANCE,
            fade_out_distance: DEFAULT_FADE_OUT_DISTANCE,
            max_time_per_frame_ms: DEFAULT_MAX_TIME_PER_FRAME_MS,
            steps_per_radius: DEFAULT_STEPS_PER_RADIUS,
            eviction_facing_threshold: DEFAULT_EVICTION_FACING_THRESHOLD,
            reset_distance: DEFAULT_RESET_DISTANCE,
            reset_angle_degrees: DEFAULT_RESET_ANGLE_DEGREES,
            reset_check_interval_ms: DEFAULT_RESET_CHECK_INTERVAL_MS,
            idle_sleep_ms: DEFAULT_IDLE_SLEEP_MS,
            tile_origin: Vec3::ZERO,
        }
    }
}

impl StreamingConfig {
    /// Checks that distances, budgets and step counts are usable.
    ///
    /// # Errors
    ///
    /// Returns the first non-positive field.
    pub fn validate(&self) -> Result<(), tilestream_wfc::ConfigError> {
        #[allow(clippy::cast_precision_loss)]
        let budget_ms = self.max_time_per_frame_ms as f64;
        let positive = [
            ("max_generation_distance", f64::from(self.max_generation_distance)),
            ("fade_out_distance", f64::from(self.fade_out_distance)),
            ("reset_distance", f64::from(self.reset_distance)),
            ("reset_angle_degrees", f64::from(self.reset_angle_degrees)),
            ("max_time_per_frame_ms", budget_ms),
            ("steps_per_radius", f64::from(self.steps_per_radius)),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(tilestream_wfc::ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

/// Complete configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WfcConfig {
    /// Solver settings.
    pub tilemap: TilemapConfig,
    /// Scheduler settings.
    pub streaming: StreamingConfig,
}

impl WfcConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// for values that parse but cannot be used.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Validates both tables.
    ///
    /// # Errors
    ///
    /// The first violated constraint.
    pub fn validate(&self) -> Result<(), tilestream_wfc::ConfigError> {
        self.tilemap.validate()?;
        self.streaming.validate()
    }
}
