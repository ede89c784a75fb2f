//! Configuration loading and validation

use aorta_core::glam::Vec3;
use aorta_core::interaction::InteractionSettings;
use aorta_core::normalize::Normalizer;
use aorta_core::parts::{PartCatalog, PartSpec};
use aorta_core::session::SessionSettings;
use aorta_loader::DEFAULT_MESH_SCALE;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
    /// Part catalog; empty means the built-in aorta segmentation
    #[serde(default, rename = "part", skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<PartSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Asset base: an http(s) URL or a local directory
    #[serde(default = "default_base")]
    pub base: String,
    /// Cache directory for parts with a pinned SHA (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Uniform scale applied to every part
    #[serde(default = "default_mesh_scale")]
    pub mesh_scale: f32,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            cache_dir: None,
            mesh_scale: default_mesh_scale(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AssetsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base() -> String {
    "./assets/aorta".to_string()
}

fn default_mesh_scale() -> f32 {
    DEFAULT_MESH_SCALE
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Where the model's bounding-box center is placed
    #[serde(default = "default_anchor")]
    pub anchor: [f32; 3],
    /// Rotation about X that stands the model upright
    #[serde(default = "default_upright")]
    pub upright_degrees: f32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            anchor: default_anchor(),
            upright_degrees: default_upright(),
        }
    }
}

fn default_anchor() -> [f32; 3] {
    [0.0, 1.7, -1.0]
}

fn default_upright() -> f32 {
    -90.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    #[serde(default = "default_shrink")]
    pub shrink_factor: f32,
    #[serde(default = "default_grow")]
    pub grow_factor: f32,
    /// Lower limit on the cumulative squeeze factor (unlimited when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<f32>,
    /// Upper limit on the cumulative squeeze factor (unlimited when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<f32>,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            shrink_factor: default_shrink(),
            grow_factor: default_grow(),
            min_scale: None,
            max_scale: None,
        }
    }
}

fn default_shrink() -> f32 {
    0.98
}

fn default_grow() -> f32 {
    1.02
}

impl Config {
    /// The configured catalog, or the built-in one when no parts are listed
    pub fn catalog(&self) -> Result<PartCatalog> {
        if self.parts.is_empty() {
            return Ok(PartCatalog::aorta());
        }
        let catalog = PartCatalog {
            part: self.parts.clone(),
            ..PartCatalog::default()
        };
        catalog.validate().context("Invalid part list")?;
        Ok(catalog)
    }

    /// Reject scale factors, limits and timeouts that are not finite and positive
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("assets.mesh_scale", Some(self.assets.mesh_scale)),
            ("interaction.shrink_factor", Some(self.interaction.shrink_factor)),
            ("interaction.grow_factor", Some(self.interaction.grow_factor)),
            ("interaction.min_scale", self.interaction.min_scale),
            ("interaction.max_scale", self.interaction.max_scale),
        ];
        for (key, value) in positive {
            if let Some(value) = value {
                if !(value.is_finite() && value > 0.0) {
                    bail!("{} must be finite and positive, got {}", key, value);
                }
            }
        }
        if self.assets.timeout_secs == 0 {
            bail!("assets.timeout_secs must be positive");
        }
        if let (Some(min), Some(max)) = (self.interaction.min_scale, self.interaction.max_scale) {
            if min > max {
                bail!("interaction.min_scale {} exceeds max_scale {}", min, max);
            }
        }
        Ok(())
    }

    pub fn session_settings(&self, expected_parts: usize) -> SessionSettings {
        SessionSettings {
            expected_parts,
            normalizer: Normalizer::new(
                self.normalize.upright_degrees,
                Vec3::from_array(self.normalize.anchor),
            ),
            interaction: InteractionSettings {
                shrink_factor: self.interaction.shrink_factor,
                grow_factor: self.interaction.grow_factor,
                min_scale: self.interaction.min_scale,
                max_scale: self.interaction.max_scale,
            },
        }
    }
}

/// Load configuration from file, falling back to defaults when it is absent
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration, with the built-in part list spelled out
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        parts: PartCatalog::aorta().part,
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
