//! Machine-key configuration file parsing and generation
//!
//! Key material reaches the tool through an INI-style file with a single
//! `[machine_key]` section:
//!
//! ```text
//! [machine_key]
//! decryption_key = 00112233445566778899AABBCCDDEEFF
//! validation_key = 000102030405060708090A0B0C0D0E0F...
//! compatibility_mode = modern
//! ```

use formsauth::{CompatibilityMode, KeyMaterial};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(#[from] formsauth::TicketError),
}

/// Section header holding the key material
const MACHINE_KEY_SECTION: &str = "machine_key";

/// Parsed machine-key configuration
pub struct MachineKeyConfig {
    pub keys: KeyMaterial,
    pub mode: CompatibilityMode,
}

impl MachineKeyConfig {
    /// Load configuration from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_string(&content)
    }

    /// Parse configuration from string content
    pub fn from_string(content: &str) -> Result<Self, ConfigError> {
        let mut current_section: Option<String> = None;
        let mut decryption_key: Option<String> = None;
        let mut validation_key: Option<String> = None;
        let mut mode: Option<CompatibilityMode> = None;

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Section header [name]
            if line.starts_with('[') && line.ends_with(']') {
                let section = line[1..line.len() - 1].to_string();
                debug!("Found config section: {}", section);
                current_section = Some(section);
                continue;
            }

            let Some(section) = &current_section else {
                return Err(ConfigError::Parse(format!(
                    "Key-value pair outside any section: {}",
                    line
                )));
            };
            if section != MACHINE_KEY_SECTION {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "decryption_key" => decryption_key = Some(value.to_string()),
                    "validation_key" => validation_key = Some(value.to_string()),
                    "compatibility_mode" => mode = Some(parse_mode(value)?),
                    _ => {
                        warn!("Unknown config field: {}", key);
                    }
                }
            }
        }

        let decryption_key = decryption_key
            .ok_or_else(|| ConfigError::MissingOption("decryption_key".to_string()))?;
        let validation_key = validation_key
            .ok_or_else(|| ConfigError::MissingOption("validation_key".to_string()))?;

        Ok(Self {
            keys: KeyMaterial::from_hex(&decryption_key, &validation_key)?,
            mode: mode.unwrap_or(CompatibilityMode::Modern),
        })
    }
}

/// Parse a compatibility mode name
pub fn parse_mode(s: &str) -> Result<CompatibilityMode, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "legacy" => Ok(CompatibilityMode::Legacy),
        "modern" => Ok(CompatibilityMode::Modern),
        other => Err(ConfigError::Parse(format!(
            "Unknown compatibility mode: {}",
            other
        ))),
    }
}

/// Render a machine-key configuration file
pub fn render_config(
    decryption_key: &str,
    validation_key: &str,
    mode: CompatibilityMode,
) -> String {
    format!(
        "[{}]\ndecryption_key = {}\nvalidation_key = {}\ncompatibility_mode = {}\n",
        MACHINE_KEY_SECTION, decryption_key, validation_key, mode
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEC_HEX: &str = "00112233445566778899AABBCCDDEEFF";
    const VAL_HEX: &str = "000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F";

    #[test]
    fn test_parse_config() {
        let content = format!(
            r#"
# machine keys for the staging environment
[machine_key]
    decryption_key = {}
    validation_key = {}
    compatibility_mode = legacy
"#,
            DEC_HEX, VAL_HEX
        );

        let config = MachineKeyConfig::from_string(&content).expect("parse");
        assert_eq!(config.mode, CompatibilityMode::Legacy);
        assert_eq!(config.keys.decryption_key().len(), 16);
        assert_eq!(config.keys.validation_key().len(), 32);
    }

    #[test]
    fn test_mode_defaults_to_modern() {
        let content = format!(
            "[machine_key]\ndecryption_key = {}\nvalidation_key = {}\n",
            DEC_HEX, VAL_HEX
        );
        let config = MachineKeyConfig::from_string(&content).expect("parse");
        assert_eq!(config.mode, CompatibilityMode::Modern);
    }

    #[test]
    fn test_missing_key_reported() {
        let content = format!("[machine_key]\ndecryption_key = {}\n", DEC_HEX);
        let result = MachineKeyConfig::from_string(&content);
        assert!(matches!(result, Err(ConfigError::MissingOption(_))));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let content = format!(
            "[machine_key]\ndecryption_key = {}\nvalidation_key = {}\ncompatibility_mode = framework45\n",
            DEC_HEX, VAL_HEX
        );
        let result = MachineKeyConfig::from_string(&content);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rendered_config_parses_back() {
        let rendered = render_config(DEC_HEX, VAL_HEX, CompatibilityMode::Legacy);
        let config = MachineKeyConfig::from_string(&rendered).expect("parse rendered");
        assert_eq!(config.mode, CompatibilityMode::Legacy);
    }

    #[test]
    fn test_pair_outside_section_rejected() {
        let result = MachineKeyConfig::from_string("decryption_key = 00FF\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
