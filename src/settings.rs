use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::segmentation::SegmentationConfig;

pub const DB_PATH_ENV: &str = "PRESENCE_DB";
pub const DATASET_PATH_ENV: &str = "PRESENCE_DATASET";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: PathBuf,
    /// CSV loaded into an empty store at startup.
    pub dataset_path: Option<PathBuf>,
    pub default_timezone: String,
    pub segmentation: SegmentationConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("presence.sqlite3"),
            dataset_path: None,
            default_timezone: "UTC".into(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    /// Apply `PRESENCE_DB` / `PRESENCE_DATASET` overrides.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var_os(DB_PATH_ENV).map(PathBuf::from),
            std::env::var_os(DATASET_PATH_ENV).map(PathBuf::from),
        )
    }

    pub fn with_overrides(mut self, database: Option<PathBuf>, dataset: Option<PathBuf>) -> Self {
        if let Some(path) = database {
            self.database_path = path;
        }
        if dataset.is_some() {
            self.dataset_path = dataset;
        }
        self
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/presence.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.segmentation.baseline_confidence, 70);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = std::env::temp_dir().join(format!("presence-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        fs::write(
            &path,
            r#"{"default_timezone": "+02:00", "segmentation": {"max_gap_secs": 300}}"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_timezone, "+02:00");
        assert_eq!(settings.segmentation.max_gap_secs, Some(300));
        assert_eq!(settings.segmentation.confidence_step, 5);
        assert_eq!(settings.database_path, PathBuf::from("presence.sqlite3"));

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);

        fs::write(&path, "{not json").unwrap();
        assert!(Settings::load(&path).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn overrides_replace_paths() {
        let settings = Settings::default()
            .with_overrides(Some(PathBuf::from("/tmp/other.db")), None);
        assert_eq!(settings.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(settings.dataset_path, None);

        let settings = settings.with_overrides(None, Some(PathBuf::from("data.csv")));
        assert_eq!(settings.database_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(settings.dataset_path, Some(PathBuf::from("data.csv")));
    }
}
