//! Per-extension sections of the user config file.
//!
//! The file lives at `$CONFIG_DIR/qport/config.json` unless `QPORT_CONFIG`
//! names another path. Each extension owns one section:
//!
//! ```json
//! { "extensions": { "ionq": { "api_key": "..." } } }
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{HalError, HalResult};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "QPORT_CONFIG";

const EXTENSIONS_KEY: &str = "extensions";

/// Location of the config file.
pub fn default_config_path() -> HalResult<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("qport").join("config.json"))
        .ok_or_else(|| HalError::Configuration("no config directory on this platform".into()))
}

fn read_document(path: &Path) -> HalResult<Map<String, Value>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => {
            return Err(HalError::Configuration(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(HalError::Configuration(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}

fn write_document(path: &Path, document: &Map<String, Value>) -> HalResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            HalError::Configuration(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)
        .map_err(|e| HalError::Configuration(format!("failed to write {}: {e}", path.display())))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(|e| {
            HalError::Configuration(format!("failed to set permissions: {e}"))
        })?;
    }
    Ok(())
}

/// Settings an extension persists in its own section of the config file.
pub trait ExtensionConfig: Default + Serialize + DeserializeOwned {
    /// Section name under `extensions`.
    const SECTION: &'static str;

    /// Load from `path`. A missing file or section gives the default.
    fn from_config_file(path: &Path) -> HalResult<Self> {
        let document = read_document(path)?;
        match document
            .get(EXTENSIONS_KEY)
            .and_then(|ext| ext.get(Self::SECTION))
        {
            Some(section) => Ok(serde_json::from_value(section.clone())?),
            None => Ok(Self::default()),
        }
    }

    /// Load from the default config file.
    fn from_default_config_file() -> HalResult<Self> {
        Self::from_config_file(&default_config_path()?)
    }

    /// Write this section to `path`, keeping every other section.
    fn update_config_file(&self, path: &Path) -> HalResult<()> {
        let mut document = read_document(path)?;
        let extensions = document
            .entry(EXTENSIONS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !extensions.is_object() {
            *extensions = Value::Object(Map::new());
        }
        if let Value::Object(sections) = extensions {
            sections.insert(Self::SECTION.to_string(), serde_json::to_value(self)?);
        }
        write_document(path, &document)?;
        debug!(section = Self::SECTION, path = %path.display(), "updated config file");
        Ok(())
    }

    /// Write this section to the default config file.
    fn update_default_config_file(&self) -> HalResult<()> {
        self.update_config_file(&default_config_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct DemoConfig {
        token: Option<String>,
    }

    impl ExtensionConfig for DemoConfig {
        const SECTION: &'static str = "demo";
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct OtherConfig {
        level: u8,
    }

    impl ExtensionConfig for OtherConfig {
        const SECTION: &'static str = "other";
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DemoConfig::from_config_file(&dir.path().join("none.json")).unwrap();
        assert_eq!(cfg, DemoConfig::default());
    }

    #[test]
    fn test_sections_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        DemoConfig {
            token: Some("abc".into()),
        }
        .update_config_file(&path)
        .unwrap();
        OtherConfig { level: 2 }.update_config_file(&path).unwrap();

        let demo = DemoConfig::from_config_file(&path).unwrap();
        assert_eq!(demo.token.as_deref(), Some("abc"));
        assert_eq!(OtherConfig::from_config_file(&path).unwrap().level, 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        DemoConfig::default().update_config_file(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(DemoConfig::from_config_file(&path).is_err());
    }
}
