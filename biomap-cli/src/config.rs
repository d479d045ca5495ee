//! Configuration handling for the BioMap CLI
//!
//! Supports loading configuration from biomap.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use biomap_render::{Colormap, MapStyle};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub style: MapStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Data directory holding biomass/, map_files/ and the unit directories
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Static unit table prefixes drawn on every map
    #[serde(default)]
    pub static_units: Vec<String>,

    /// Value-driven unit table prefixes drawn on every map
    #[serde(default)]
    pub dynamic_units: Vec<String>,

    /// Give static unit layers their own legend key
    #[serde(default = "default_true")]
    pub unit_legends: bool,
}

fn default_root() -> PathBuf { PathBuf::from("data") }
fn default_true() -> bool { true }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            static_units: Vec::new(),
            dynamic_units: Vec::new(),
            unit_legends: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from("biomap.toml");
                if default_path.exists() {
                    log::info!("Loading configuration from: biomap.toml");
                    Self::load_from_file(&default_path)?
                } else {
                    log::info!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Colormap::by_name(&config.style.choropleth.colormap)
            .with_context(|| format!("Invalid [style.choropleth] in {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Generate example configuration file content
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to serialize default configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.root, PathBuf::from("data"));
        assert!(config.data.unit_legends);
        assert_eq!(config.style.choropleth.colormap, "Oranges");
        assert_eq!(config.style.markers.bucket_count, 5);
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.data.static_units = vec!["usinas".to_string()];
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded = Config::load_from_file(temp_file.path())?;

        assert_eq!(config, loaded);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        std::fs::write(
            temp_file.path(),
            "[data]\nroot = \"/srv/biomap\"\n\n[style.choropleth]\ncolormap = \"Greens\"\nedge_color = \"#333333\"\n",
        )?;
        let config = Config::load_from_file(temp_file.path())?;
        assert_eq!(config.data.root, PathBuf::from("/srv/biomap"));
        assert_eq!(config.style.choropleth.colormap, "Greens");
        assert_eq!(config.style.choropleth.edge_color.to_hex(), "#333333");
        assert_eq!(config.style.choropleth.outline_width, 0.5);
        assert_eq!(config.style.figure.width, 800);
        Ok(())
    }

    #[test]
    fn test_invalid_values_fail_at_load() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        std::fs::write(temp_file.path(), "[style.choropleth]\nedge_color = \"greyish\"\n")?;
        assert!(Config::load_from_file(temp_file.path()).is_err());

        std::fs::write(temp_file.path(), "[style.choropleth]\ncolormap = \"Rainbow\"\n")?;
        assert!(Config::load_from_file(temp_file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_example_toml_generation() -> Result<()> {
        let example = Config::example_toml()?;
        assert!(example.contains("[data]"));
        assert!(example.contains("[style.figure]"));
        assert!(example.contains("[style.choropleth]"));
        Ok(())
    }
}
