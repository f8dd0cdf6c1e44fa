use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::GeometryError, model::TimePeriod, momentum::MomentumParams,
    projection::ViewportGeometry, provider::GeocoderId,
};

/// Credentials for a single external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Where the dashboard backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_interval_secs: u64,
    pub search_debounce_ms: u64,
    pub default_period: TimePeriod,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 300,
            search_debounce_ms: 300,
            default_period: TimePeriod::Today,
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Raw viewport sizes as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub width_px: f64,
    pub height_px: f64,
    pub texture_width_px: f64,
    pub texture_height_px: f64,
}

impl GeometryConfig {
    pub fn geometry(&self) -> Result<ViewportGeometry, GeometryError> {
        ViewportGeometry::new(
            self.width_px,
            self.height_px,
            self.texture_width_px,
            self.texture_height_px,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub thumbnail: GeometryConfig,
    pub modal: GeometryConfig,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            thumbnail: GeometryConfig {
                width_px: 250.0,
                height_px: 250.0,
                texture_width_px: 500.0,
                texture_height_px: 250.0,
            },
            modal: GeometryConfig {
                width_px: 500.0,
                height_px: 500.0,
                texture_width_px: 1000.0,
                texture_height_px: 500.0,
            },
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Optional default geocoder id, "backend" or "openweather".
    pub default_geocoder: Option<String>,

    pub backend: BackendConfig,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    pub dashboard: DashboardConfig,

    pub globe: GlobeConfig,

    pub momentum: MomentumParams,
}

impl Config {
    /// The geocoder to use; the backend when nothing is configured.
    pub fn default_geocoder_id(&self) -> Result<GeocoderId> {
        match self.default_geocoder.as_deref() {
            Some(s) => GeocoderId::try_from(s),
            None => Ok(GeocoderId::Backend),
        }
    }

    pub fn set_default_geocoder(&mut self, id: GeocoderId) {
        self.default_geocoder = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "climate-explorer", "climate-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key; the first keyed geocoder becomes the default.
    pub fn upsert_provider_api_key(&mut self, id: GeocoderId, api_key: String) {
        self.providers
            .insert(id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_geocoder.is_none() {
            self.default_geocoder = Some(id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, id: GeocoderId) -> Option<&str> {
        self.providers.get(id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, id: GeocoderId) -> bool {
        !id.needs_api_key() || self.provider_api_key(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geocoder_is_backend() {
        let cfg = Config::default();
        assert_eq!(cfg.default_geocoder_id().expect("default"), GeocoderId::Backend);
        assert!(cfg.is_provider_configured(GeocoderId::Backend));
        assert!(!cfg.is_provider_configured(GeocoderId::OpenWeather));
    }

    #[test]
    fn unknown_default_geocoder_errors() {
        let cfg = Config {
            default_geocoder: Some("carrier-pigeon".into()),
            ..Config::default()
        };
        assert!(cfg.default_geocoder_id().is_err());
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(GeocoderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_geocoder_id().expect("default geocoder must exist");
        assert_eq!(default, GeocoderId::OpenWeather);

        let key = cfg.provider_api_key(GeocoderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(GeocoderId::OpenWeather));
    }

    #[test]
    fn set_default_geocoder_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(GeocoderId::OpenWeather, "OPEN_KEY".into());
        cfg.set_default_geocoder(GeocoderId::Backend);

        let default = cfg.default_geocoder_id().expect("default geocoder must exist");
        assert_eq!(default, GeocoderId::Backend);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [dashboard]
            default_period = "30days"

            [momentum]
            friction = 0.9
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.dashboard.default_period, TimePeriod::ThirtyDay);
        assert_eq!(cfg.dashboard.refresh_interval_secs, 300);
        assert_eq!(cfg.momentum.friction, 0.9);
        assert_eq!(cfg.momentum.drag_gain, 1.5);
        assert_eq!(cfg.backend.base_url, "http://127.0.0.1:5000");
        assert!(cfg.globe.thumbnail.geometry().is_ok());
    }

    #[test]
    fn zero_geometry_fails_fast() {
        let mut cfg = Config::default();
        cfg.globe.modal.width_px = 0.0;
        assert!(cfg.globe.modal.geometry().is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.backend.base_url = "http://example.test".into();
        cfg.upsert_provider_api_key(GeocoderId::OpenWeather, "KEY".into());
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.backend.base_url, "http://example.test");
        assert_eq!(loaded.provider_api_key(GeocoderId::OpenWeather), Some("KEY"));
        assert_eq!(loaded.default_geocoder_id().expect("default"), GeocoderId::OpenWeather);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("defaults");
        assert!(cfg.default_geocoder.is_none());
    }
}
