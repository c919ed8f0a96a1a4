//! Explorer settings.
//!
//! Every field has a default, so a settings file only needs to name what it
//! changes: loading a partial JSON or TOML document merges it over the
//! defaults.
//!
//! ```ignore
//! use olexp::settings::ExplorerSettings;
//!
//! // explorer.toml:
//! //   overlays_node_id = "markers"
//! //   [icons]
//! //   vector = "icon-shapes"
//! let settings = ExplorerSettings::load("explorer.toml")?;
//! assert_eq!(settings.layers_node_id, "layers");
//! ```

use std::io::Write;
use std::path::Path;

use olexp_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layer::LayerKind;

/// On-disk settings format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Icon classes per layer kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Icons {
    pub group: String,
    pub heatmap: String,
    pub image: String,
    pub overlay: String,
    pub tile: String,
    pub vector: String,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            group: "icon-folder".into(),
            heatmap: "icon-heatmap".into(),
            image: "icon-image".into(),
            overlay: "icon-overlay".into(),
            tile: "icon-tile".into(),
            vector: "icon-vector".into(),
        }
    }
}

impl Icons {
    pub fn for_kind(&self, kind: LayerKind) -> &str {
        match kind {
            LayerKind::Group => &self.group,
            LayerKind::Heatmap => &self.heatmap,
            LayerKind::Image => &self.image,
            LayerKind::Overlay => &self.overlay,
            LayerKind::Tile => &self.tile,
            LayerKind::Vector => &self.vector,
        }
    }

    fn merge(&mut self, other: &Icons) {
        let defaults = Icons::default();
        for kind in LayerKind::ALL {
            let value = other.for_kind(kind);
            if value != defaults.for_kind(kind) {
                *self.slot(kind) = value.to_string();
            }
        }
    }

    fn slot(&mut self, kind: LayerKind) -> &mut String {
        match kind {
            LayerKind::Group => &mut self.group,
            LayerKind::Heatmap => &mut self.heatmap,
            LayerKind::Image => &mut self.image,
            LayerKind::Overlay => &mut self.overlay,
            LayerKind::Tile => &mut self.tile,
            LayerKind::Vector => &mut self.vector,
        }
    }
}

/// Configuration of the layer explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerSettings {
    /// Outline id of the layers root node; also the id prefix of every layer item.
    pub layers_node_id: String,
    /// Outline id of the overlays root node; also the id prefix of every overlay item.
    pub overlays_node_id: String,
    pub layers_node_text: String,
    pub overlays_node_text: String,
    /// Name prefix for layers without a `name` property (`"Item 3"`).
    pub default_item_name: String,
    /// Layers whose property of this name is truthy are never shown.
    pub hidden_property: String,
    /// Expand group nodes when they are added.
    pub expand_groups: bool,
    pub icons: Icons,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            layers_node_id: "layers".into(),
            overlays_node_id: "overlays".into(),
            layers_node_text: "Layers".into(),
            overlays_node_text: "Overlays".into(),
            default_item_name: "Item".into(),
            hidden_property: "olexp_hidden".into(),
            expand_groups: true,
            icons: Icons::default(),
        }
    }
}

impl ExplorerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Icon class for items of `kind`.
    pub fn icon_for(&self, kind: LayerKind) -> &str {
        self.icons.for_kind(kind)
    }

    /// Overlays every value of `other` that differs from the default.
    pub fn merge(&mut self, other: &ExplorerSettings) {
        let defaults = ExplorerSettings::default();
        macro_rules! take {
            ($($field:ident),*) => {
                $(
                    if other.$field != defaults.$field {
                        self.$field = other.$field.clone();
                    }
                )*
            };
        }
        take!(
            layers_node_id,
            overlays_node_id,
            layers_node_text,
            overlays_node_text,
            default_item_name,
            hidden_property,
            expand_groups
        );
        self.icons.merge(&other.icons);
    }

    /// Loads settings from a `.json` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match SettingsFormat::from_path(path) {
            Some(SettingsFormat::Json) => Self::load_json(path),
            Some(SettingsFormat::Toml) => Self::load_toml(path),
            None => Err(Error::unsupported_format(path)),
        }
    }

    /// Saves settings to a `.json` or `.toml` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match SettingsFormat::from_path(path) {
            Some(SettingsFormat::Json) => self.save_json(path),
            Some(SettingsFormat::Toml) => self.save_toml(path),
            None => Err(Error::unsupported_format(path)),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_text(path.as_ref())?;
        let settings = Self::from_json_str(&content)?;
        tracing::debug!(target: targets::SETTINGS, path = %path.as_ref().display(), "loaded JSON settings");
        Ok(settings)
    }

    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_text(path.as_ref())?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(target: targets::SETTINGS, path = %path.as_ref().display(), "loaded TOML settings");
        Ok(settings)
    }

    /// Saves settings to a JSON file, written atomically.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path.as_ref(), json.as_bytes())
    }

    /// Saves settings to a TOML file, written atomically.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        atomic_write(path.as_ref(), toml_str.as_bytes())
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    file.write_all(bytes).map_err(|e| Error::io(path, e))?;
    file.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let settings =
            ExplorerSettings::from_json_str(r#"{"overlays_node_id":"markers","icons":{"tile":"icon-map"}}"#)
                .unwrap();
        assert_eq!(settings.overlays_node_id, "markers");
        assert_eq!(settings.layers_node_id, "layers");
        assert_eq!(settings.icon_for(LayerKind::Tile), "icon-map");
        assert_eq!(settings.icon_for(LayerKind::Group), "icon-folder");
    }

    #[test]
    fn test_partial_toml() {
        let settings = ExplorerSettings::from_toml_str(
            "default_item_name = \"Layer\"\nexpand_groups = false\n[icons]\nvector = \"icon-shapes\"\n",
        )
        .unwrap();
        assert_eq!(settings.default_item_name, "Layer");
        assert!(!settings.expand_groups);
        assert_eq!(settings.icons.vector, "icon-shapes");
        assert_eq!(settings.icons.heatmap, "icon-heatmap");
    }

    #[test]
    fn test_merge_only_takes_non_defaults() {
        let mut base = ExplorerSettings::default();
        base.default_item_name = "Layer".into();

        let mut user = ExplorerSettings::default();
        user.hidden_property = "internal".into();
        user.icons.overlay = "icon-pin".into();

        base.merge(&user);
        assert_eq!(base.default_item_name, "Layer");
        assert_eq!(base.hidden_property, "internal");
        assert_eq!(base.icons.overlay, "icon-pin");
        assert_eq!(base.icons.tile, "icon-tile");
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ExplorerSettings::default();
        settings.layers_node_id = "base".into();

        let json = dir.path().join("explorer.json");
        settings.save(&json).unwrap();
        assert_eq!(ExplorerSettings::load(&json).unwrap(), settings);

        let toml_path = dir.path().join("explorer.toml");
        settings.save(&toml_path).unwrap();
        assert_eq!(ExplorerSettings::load(&toml_path).unwrap(), settings);
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(ExplorerSettings::load(&missing), Err(Error::Io { .. })));

        let yaml = dir.path().join("explorer.yaml");
        assert!(matches!(
            ExplorerSettings::load(&yaml),
            Err(Error::UnsupportedFormat { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(ExplorerSettings::load(&bad), Err(Error::Json(_))));

        let bad_toml = dir.path().join("bad.toml");
        std::fs::write(&bad_toml, "expand_groups = ").unwrap();
        assert!(matches!(ExplorerSettings::load(&bad_toml), Err(Error::TomlParse(_))));
    }
}
