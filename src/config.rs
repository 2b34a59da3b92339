//! Configuration loader - YAML render config + .env settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::RenderSettings;
use crate::fractals::escape_time::DEFAULT_MAX_ITER;
use crate::fractals::{FractalState, Limits};

pub const DEFAULT_CONFIG_PATH: &str = "fractal.yaml";

/// Render configuration loaded from fractal.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub max_iter: u32,
    pub pan_scale: f64,
    pub line_width: f64,
    pub limits: Limits,
    /// Start from this state instead of a randomized one
    pub initial: Option<FractalState>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            max_iter: DEFAULT_MAX_ITER,
            pan_scale: 0.01,
            line_width: 2.0,
            limits: Limits::default(),
            initial: None,
        }
    }
}

/// Environment settings loaded from .env
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub log_dir: String,
    pub output_dir: String,
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            max_iter: self.max_iter,
            line_width: self.line_width,
            pan_scale: self.pan_scale,
            limits: self.limits,
        }
    }
}

impl Settings {
    /// Load settings from .env and the process environment
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        Settings {
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            output_dir: lookup("OUTPUT_DIR").unwrap_or_else(|| "renders".to_string()),
            seed: lookup("FRACTAL_SEED").and_then(|s| s.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractals::Family;
    use std::collections::HashMap;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "width: 320\nlimits:\n  max_koch_depth: 4\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.limits.max_koch_depth, 4);
        assert_eq!(config.limits.max_sierpinski_depth, 10);
        assert!(config.initial.is_none());
    }

    #[test]
    fn test_initial_state() {
        let yaml = "initial:\n  family: koch\n  koch:\n    depth: 2\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let initial = config.initial.unwrap();
        assert_eq!(initial.family, Family::Koch);
        assert_eq!(initial.koch.depth, 2);
        assert_eq!(initial.mandelbrot, FractalState::default().mandelbrot);
    }

    #[test]
    fn test_render_settings() {
        let settings = Config::default().render_settings();
        assert_eq!(settings, RenderSettings::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("fractal_config_{}.yaml", std::process::id()));
        std::fs::write(&path, "max_iter: 250\npan_scale: 0.02\n").unwrap();
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.max_iter, 250);
        assert_eq!(config.pan_scale, 0.02);
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("fractal_config_does_not_exist.yaml");
        assert!(Config::load(&path).is_err());
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_settings_from_lookup() {
        let vars = HashMap::from([("OUTPUT_DIR", "out"), ("FRACTAL_SEED", "17")]);
        let settings = Settings::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(settings.log_dir, "logs");
        assert_eq!(settings.output_dir, "out");
        assert_eq!(settings.seed, Some(17));

        let bad = Settings::from_lookup(|k| (k == "FRACTAL_SEED").then(|| "abc".to_string()));
        assert_eq!(bad.seed, None);
    }
}
