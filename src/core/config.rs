use crate::models::exercise::{ExerciseKind, Thresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Trainer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Exercise analysed when none is given on the command line
    pub exercise: ExerciseKind,
    /// Elbow angle thresholds for curls (degrees)
    pub curl_thresholds: Thresholds,
    /// Knee angle thresholds for squats (degrees)
    pub squat_thresholds: Thresholds,
    /// Frame size the normalised landmarks are projected onto
    pub frame_width: u32,
    pub frame_height: u32,
    /// Landmarks below this visibility count as missing (0.0 disables gating)
    pub min_visibility: f32,
    /// Log level: "trace", "debug", "info", "warn" or "error"
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exercise: ExerciseKind::Curl,
            curl_thresholds: Thresholds::CURL,
            squat_thresholds: Thresholds::SQUAT,
            frame_width: 1280,
            frame_height: 720,
            min_visibility: 0.0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load and validate configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.curl_thresholds
            .validate()
            .map_err(|e| format!("Invalid curl thresholds: {}", e))?;

        self.squat_thresholds
            .validate()
            .map_err(|e| format!("Invalid squat thresholds: {}", e))?;

        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(format!(
                "Invalid frame size: {}x{}. Width and height must be non-zero",
                self.frame_width, self.frame_height
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(format!(
                "Invalid minimum visibility: {}. Must be between 0.0 and 1.0",
                self.min_visibility
            )
            .into());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )
            .into());
        }

        Ok(())
    }

    /// Get the configuration file path
    fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".rep_trainer");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}
