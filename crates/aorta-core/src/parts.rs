//! Part catalog - the static list of anatomical segments that make up the model
//!
//! Each part maps one STL resource to a display name, the alias reported by the
//! hover label, a base color and its default visibility. Catalogs are read from
//! `[[part]]` tables in TOML, or taken from the built-in aorta segmentation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read part catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse part catalog: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize part catalog: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Part catalog contains no parts")]
    Empty,
    #[error("Duplicate part alias: {0}")]
    DuplicateAlias(String),
    #[error("Invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
    #[error("Invalid SHA {sha:?} for part {alias}, expected 8 to 64 hex characters")]
    InvalidSha { alias: String, sha: String },
}

/// sRGB color with components in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self, CatalogError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(CatalogError::InvalidColor(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| CatalogError::InvalidColor(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(f, "#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}

impl TryFrom<String> for Rgb {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A single anatomical segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSpec {
    /// Resource path relative to the asset base (e.g., "Segmentation preview_Segment_1.stl")
    pub resource: String,
    /// Human-readable name, used in load errors and listings
    pub name: String,
    /// Mesh name shown by the hover label
    pub alias: String,
    /// Base material color
    pub color: Rgb,
    /// Whether the part is visible after loading
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// SHA256 of the resource (full hex or a prefix of at least 8 characters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

fn default_visible() -> bool {
    true
}

impl PartSpec {
    pub fn new(resource: &str, name: &str, alias: &str, color: Rgb) -> Self {
        Self {
            resource: resource.to_string(),
            name: name.to_string(),
            alias: alias.to_string(),
            color,
            visible: true,
            sha: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// The part catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartCatalog {
    /// Version of the catalog format
    #[serde(default = "default_version")]
    pub version: String,
    /// Parts in load order
    #[serde(default)]
    pub part: Vec<PartSpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Built-in segmentation: (display name, alias, color)
const AORTA_SEGMENTS: [(&str, &str, &str); 15] = [
    ("Aortic root", "AoRoot", "#d94f4f"),
    ("Ascending aorta", "AAo", "#e0663a"),
    ("Aortic arch", "Arch", "#e8893c"),
    ("Brachiocephalic trunk", "BCT", "#c2a23e"),
    ("Left common carotid artery", "LCCA", "#9bb940"),
    ("Left subclavian artery", "LSA", "#5fb35a"),
    ("Descending thoracic aorta", "DTA", "#3fae8c"),
    ("Abdominal aorta", "AbAo", "#3d9fbf"),
    ("Celiac trunk", "CT", "#4b7fd1"),
    ("Superior mesenteric artery", "SMA", "#6a64d6"),
    ("Right renal artery", "RRA", "#8d55c9"),
    ("Left renal artery", "LRA", "#b04fb4"),
    ("Inferior mesenteric artery", "IMA", "#c9508e"),
    ("Right common iliac artery", "RCIA", "#d6606a"),
    ("Left common iliac artery", "LCIA", "#a8a8a8"),
];

impl Default for PartCatalog {
    fn default() -> Self {
        Self {
            version: default_version(),
            part: Vec::new(),
        }
    }
}

impl PartCatalog {
    /// The fifteen-segment aorta model
    pub fn aorta() -> Self {
        let part = AORTA_SEGMENTS
            .iter()
            .enumerate()
            .map(|(i, (name, alias, color))| PartSpec {
                resource: format!("Segmentation preview_Segment_{}.stl", i + 1),
                name: name.to_string(),
                alias: alias.to_string(),
                // Table values are literal and always parse
                color: Rgb::from_hex(color).unwrap_or(Rgb::WHITE),
                visible: true,
                sha: None,
            })
            .collect();

        Self {
            version: default_version(),
            part,
        }
    }

    /// Load a catalog from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a catalog from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: PartCatalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject empty catalogs, duplicate aliases and malformed SHA pins
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.part.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for part in &self.part {
            if !seen.insert(part.alias.as_str()) {
                return Err(CatalogError::DuplicateAlias(part.alias.clone()));
            }
            if let Some(sha) = &part.sha {
                if !is_sha_pin(sha) {
                    return Err(CatalogError::InvalidSha {
                        alias: part.alias.clone(),
                        sha: sha.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.part.len()
    }

    pub fn is_empty(&self) -> bool {
        self.part.is_empty()
    }

    pub fn find(&self, alias: &str) -> Option<&PartSpec> {
        self.part.iter().find(|p| p.alias == alias)
    }

    /// Save the catalog to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), CatalogError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 8 to 64 hex digits: a SHA-256 or a prefix long enough to mean something
fn is_sha_pin(sha: &str) -> bool {
    (8..=64).contains(&sha.len()) && sha.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_catalog_parsing() {
        let toml = r##"
version = "1.0"

[[part]]
resource = "Segmentation preview_Segment_1.stl"
name = "Aortic root"
alias = "AoRoot"
color = "#ff0000"

[[part]]
resource = "Segmentation preview_Segment_2.stl"
name = "Ascending aorta"
alias = "AAo"
color = "00ff80"
visible = false
sha = "b94d27b9"
"##;

        let catalog = PartCatalog::from_toml(toml).unwrap();
        assert_eq!(catalog.len(), 2);

        let root = catalog.find("AoRoot").unwrap();
        assert!(root.visible);
        assert_eq!(root.color, Rgb::new(1.0, 0.0, 0.0));
        assert!(root.sha.is_none());

        let aao = catalog.find("AAo").unwrap();
        assert!(!aao.visible);
        assert_eq!(aao.sha.as_deref(), Some("b94d27b9"));
        assert!((aao.color.b - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_color_rejected() {
        let toml = r##"
[[part]]
resource = "a.stl"
name = "A"
alias = "A"
color = "#12345"
"##;
        let err = PartCatalog::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("#12345"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let toml = r##"
[[part]]
resource = "a.stl"
name = "A"
alias = "X"
color = "#000000"

[[part]]
resource = "b.stl"
name = "B"
alias = "X"
color = "#ffffff"
"##;
        assert!(matches!(
            PartCatalog::from_toml(toml),
            Err(CatalogError::DuplicateAlias(alias)) if alias == "X"
        ));
    }

    #[test]
    fn test_malformed_sha_rejected() {
        let with_sha = |sha: &str| {
            format!(
                "[[part]]\nresource = \"a.stl\"\nname = \"A\"\nalias = \"A\"\ncolor = \"#000000\"\nsha = \"{sha}\"\n"
            )
        };

        let too_long = "a".repeat(65);
        for sha in ["b", "b94d27b", "b94d27bz", too_long.as_str()] {
            assert!(
                matches!(
                    PartCatalog::from_toml(&with_sha(sha)),
                    Err(CatalogError::InvalidSha { ref alias, .. }) if alias == "A"
                ),
                "accepted {sha:?}"
            );
        }
        assert!(PartCatalog::from_toml(&with_sha("B94D27B9")).is_ok());
        assert!(PartCatalog::from_toml(&with_sha(&"f".repeat(64))).is_ok());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            PartCatalog::from_toml("version = \"1.0\""),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_builtin_aorta_catalog() {
        let catalog = PartCatalog::aorta();
        assert_eq!(catalog.len(), 15);
        catalog.validate().unwrap();
        assert_eq!(catalog.part[0].resource, "Segmentation preview_Segment_1.stl");
        assert_eq!(catalog.part[14].resource, "Segmentation preview_Segment_15.stl");
        assert!(catalog.part.iter().all(|p| p.visible));
    }

    #[test]
    fn test_catalog_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("parts.toml");

        let catalog = PartCatalog::aorta();
        catalog.to_file(&path).unwrap();

        let loaded = PartCatalog::from_file(&path).unwrap();
        assert_eq!(loaded.len(), catalog.len());
        assert_eq!(loaded.part[2].color.to_string(), "#e8893c");
    }

    #[test]
    fn test_hex_display() {
        assert_eq!(Rgb::from_hex("#0A0b0C").unwrap().to_string(), "#0a0b0c");
    }
}
