use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisParams;
use crate::errors::LapTraceError;
use crate::session::JsonlSessionSource;

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub grid_resolution: usize,
    pub full_throttle_pct: f64,
    pub min_straight_fraction: f64,
    pub race_pace_window_s: f64,
    /// Session cache directory, the platform data directory when unset
    pub data_dir: Option<PathBuf>,
    pub first_year: i32,
    pub last_year: i32,
    pub default_lap: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let params = AnalysisParams::default();
        Self {
            grid_resolution: params.grid_resolution,
            full_throttle_pct: params.full_throttle_pct,
            min_straight_fraction: params.min_straight_fraction,
            race_pace_window_s: params.race_pace_window_s,
            data_dir: None,
            first_year: 2021,
            last_year: 2025,
            default_lap: 58,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf, LapTraceError> {
        Ok(dirs::config_dir()
            .ok_or(LapTraceError::NoConfigDir)?
            .join("laptrace")
            .join(CONFIG_FILE_NAME))
    }

    /// Config from the user's config directory, defaults when none was saved
    pub fn load() -> Result<Self, LapTraceError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self, LapTraceError> {
        if !config_path.exists() {
            debug!("No config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }
        let file =
            File::open(config_path).map_err(|e| LapTraceError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| LapTraceError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), LapTraceError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), LapTraceError> {
        if let Some(parent) = config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| LapTraceError::ConfigIOError { source: e })?;
            }
        }

        let file =
            File::create(config_path).map_err(|e| LapTraceError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| LapTraceError::ConfigSerializeError { source: e })?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    pub fn analysis_params(&self) -> Result<AnalysisParams, LapTraceError> {
        let params = AnalysisParams {
            grid_resolution: self.grid_resolution,
            full_throttle_pct: self.full_throttle_pct,
            min_straight_fraction: self.min_straight_fraction,
            race_pace_window_s: self.race_pace_window_s,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn data_dir(&self) -> Result<PathBuf, LapTraceError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => JsonlSessionSource::default_data_dir(),
        }
    }

    pub fn years(&self) -> Vec<i32> {
        (self.first_year..=self.last_year).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.grid_resolution, 2000);
        assert_eq!(config.years(), vec![2021, 2022, 2023, 2024, 2025]);
    }

    #[test]
    fn test_config_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = AppConfig {
            grid_resolution: 500,
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.data_dir().unwrap(), temp_dir.path().to_path_buf());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"full_throttle_pct": 95.0}"#).unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.full_throttle_pct, 95.);
        assert_eq!(loaded.default_lap, 58);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let config = AppConfig {
            min_straight_fraction: 2.,
            ..Default::default()
        };
        assert!(matches!(
            config.analysis_params(),
            Err(LapTraceError::InvalidUserInput { .. })
        ));
        assert!(AppConfig::default().analysis_params().is_ok());
    }
}
