//=========================================================================
// Host Configuration
//=========================================================================
//
// TOML-backed settings for the native host.
//
// Layout:
// ```toml
// module_path = "sim.wasm"
//
// [window]
// title = "Simulation Host"
// width = 1280
// height = 720
//
// [pacing]
// max_frames_to_drop = 3
//
// [snapshot]
// props = ["Plat 1", "Plat 2"]
// player_body = true
//
// [settings]
// left_right_look_sensitivity = 5
// up_down_look_sensitivity = 5
// master_volume = 1.0
// perf_statistics_enabled = false
// ```
//
// Every table and field is optional; missing values take their defaults.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::pacer::MAX_FRAMES_TO_DROP;
use crate::core::sync::SnapshotPlan;
use crate::error::ConfigError;

//=== GameSettings ========================================================

/// Values mirrored between the host UI and the simulation.
///
/// Sensitivities are pushed into the simulation, which owns them from
/// then on. Volume and the statistics overlay stay host-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub up_down_look_sensitivity: u8,
    pub left_right_look_sensitivity: u8,
    /// Linear gain in `[0, 1]`.
    pub master_volume: f32,
    pub perf_statistics_enabled: bool,
}

impl GameSettings {
    /// Stores `volume` clamped to `[0, 1]`. NaN mutes.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            up_down_look_sensitivity: 5,
            left_right_look_sensitivity: 5,
            master_volume: 1.0,
            perf_statistics_enabled: false,
        }
    }
}

//=== Sections ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Simulation Host".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Most simulation steps one host frame may run.
    pub max_frames_to_drop: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            max_frames_to_drop: MAX_FRAMES_TO_DROP,
        }
    }
}

//=== HostConfig ==========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Compiled simulation module (`.wasm` or `.wat`).
    pub module_path: PathBuf,
    pub window: WindowConfig,
    pub pacing: PacingConfig,
    pub snapshot: SnapshotPlan,
    pub settings: GameSettings,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            module_path: PathBuf::from("sim.wasm"),
            window: WindowConfig::default(),
            pacing: PacingConfig::default(),
            snapshot: SnapshotPlan::default(),
            settings: GameSettings::default(),
        }
    }
}

impl HostConfig {
    //--- Loading ----------------------------------------------------------

    /// Reads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&text)?;
        debug!(target: "session", "Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates TOML text. Out-of-range volume is clamped.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        let volume = config.settings.master_volume;
        config.settings.set_master_volume(volume);
        config.validate()?;
        Ok(config)
    }

    //--- Saving -----------------------------------------------------------

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.to_toml_string()?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    //--- validate() -------------------------------------------------------

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.pacing.max_frames_to_drop == 0 {
            return Err(ConfigError::Invalid(
                "pacing.max_frames_to_drop must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    //=====================================================================
    // Parsing Tests
    //=====================================================================

    #[test]
    fn empty_document_yields_defaults() {
        let config = HostConfig::from_toml_str("").unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.settings.left_right_look_sensitivity, 5);
        assert_eq!(config.pacing.max_frames_to_drop, 3);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = HostConfig::from_toml_str(
            r#"
            module_path = "levels/2/sim.wasm"

            [snapshot]
            car_cabin = true
            player_body = false
            wheel_count = 4

            [settings]
            up_down_look_sensitivity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.module_path, PathBuf::from("levels/2/sim.wasm"));
        assert_eq!(config.snapshot, SnapshotPlan::vehicle(4));
        assert_eq!(config.settings.up_down_look_sensitivity, 8);
        assert_eq!(config.settings.left_right_look_sensitivity, 5);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn volume_is_clamped() {
        let config = HostConfig::from_toml_str("[settings]\nmaster_volume = 3.5").unwrap();
        assert_eq!(config.settings.master_volume, 1.0);

        let mut settings = GameSettings::default();
        settings.set_master_volume(-0.2);
        assert_eq!(settings.master_volume, 0.0);
        settings.set_master_volume(f32::NAN);
        assert_eq!(settings.master_volume, 0.0);
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let result = HostConfig::from_toml_str("module_path = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    //=====================================================================
    // Validation Tests
    //=====================================================================

    #[test]
    fn zero_window_is_rejected() {
        let result = HostConfig::from_toml_str("[window]\nwidth = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_frame_drop_is_rejected() {
        let result = HostConfig::from_toml_str("[pacing]\nmax_frames_to_drop = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    //=====================================================================
    // File Tests
    //=====================================================================

    #[test]
    fn save_then_load_preserves_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");

        let mut config = HostConfig::default();
        config.snapshot = SnapshotPlan::on_foot(["Plat 1", "Plat 2"]);
        config.settings.perf_statistics_enabled = true;
        config.save(&path).unwrap();

        assert_eq!(HostConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        match HostConfig::load(&path) {
            Err(ConfigError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected read error, got {:?}", other),
        }
    }
}
