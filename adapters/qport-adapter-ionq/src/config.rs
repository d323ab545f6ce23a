//! IonQ section of the qport config file.

use serde::{Deserialize, Serialize};

use qport_hal::{ExtensionConfig, HalResult};

use crate::error::{IonQError, IonQResult};

/// Environment variable holding an API key.
pub const API_KEY_ENV: &str = "IONQ_API_KEY";

/// Persisted IonQ settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IonQConfig {
    /// API key.
    pub api_key: Option<String>,
}

impl ExtensionConfig for IonQConfig {
    const SECTION: &'static str = "ionq";
}

impl IonQConfig {
    /// Pick the key to use: `explicit`, then this config, then `env_key`.
    pub fn resolve_api_key(
        &self,
        explicit: Option<String>,
        env_key: Option<String>,
    ) -> IonQResult<String> {
        explicit
            .or_else(|| self.api_key.clone())
            .or(env_key)
            .filter(|key| !key.is_empty())
            .ok_or(IonQError::Authentication)
    }
}

/// Store an API key in the default config file.
pub fn set_ionq_config(api_key: Option<String>) -> HalResult<()> {
    let mut config = IonQConfig::from_default_config_file()?;
    config.api_key = api_key;
    config.update_default_config_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let config = IonQConfig {
            api_key: Some("from-file".into()),
        };
        assert_eq!(
            config
                .resolve_api_key(Some("explicit".into()), Some("from-env".into()))
                .unwrap(),
            "explicit"
        );
        assert_eq!(
            config.resolve_api_key(None, Some("from-env".into())).unwrap(),
            "from-file"
        );
        assert_eq!(
            IonQConfig::default()
                .resolve_api_key(None, Some("from-env".into()))
                .unwrap(),
            "from-env"
        );
    }

    #[test]
    fn test_missing_key() {
        let err = IonQConfig::default().resolve_api_key(None, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No IonQ api key provided or found in config file."
        );
    }

    #[test]
    fn test_section_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert_eq!(
            IonQConfig::from_config_file(&path).unwrap(),
            IonQConfig::default()
        );

        let config = IonQConfig {
            api_key: Some("abc123".into()),
        };
        config.update_config_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["extensions"]["ionq"]["api_key"], "abc123");
        assert_eq!(IonQConfig::from_config_file(&path).unwrap(), config);
    }
}
