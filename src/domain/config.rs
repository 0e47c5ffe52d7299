//! Modem configuration and saved profiles
//!
//! A `ModemConfig` carries every setup-time parameter of a modem instance.
//! Profiles are stored as pretty-printed JSON files, one per name, in a
//! caller-chosen directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{below_nyquist, check_frequency, is_positive, ModemError, ModemResult};
use super::types::{ModeKind, DEFAULT_SAMPLE_RATE};

/// Modem configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Sample rate of the core in Hz (typically 8000)
    pub sample_rate: f64,
    /// Which digital mode to run
    pub mode: ModeKind,
    /// Audio carrier frequency in Hz
    pub frequency: f64,
    /// Symbol rate in baud
    pub symbol_rate: f64,
    /// Quality factor of the carrier tracker's arm lowpass filters
    pub q: f64,
    /// Raised-cosine rolloff for transmit pulse shaping
    pub rolloff: f64,
    /// Costas loop bandwidth in Hz
    pub loop_bandwidth: f64,
    /// Automatic frequency control on/off
    pub afc: bool,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            mode: ModeKind::Qam16,
            frequency: 1200.0,
            symbol_rate: 600.0,
            q: 0.707,
            rolloff: 0.35,
            loop_bandwidth: DEFAULT_SAMPLE_RATE / 400.0,
            afc: false,
        }
    }
}

impl ModemConfig {
    /// Reject a configuration that would produce unstable or meaningless
    /// filters before any sample is processed.
    pub fn validate(&self) -> ModemResult<()> {
        if !is_positive(self.sample_rate) {
            return Err(ModemError::Config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        check_frequency(self.frequency, self.sample_rate)?;
        if !below_nyquist(self.symbol_rate, self.sample_rate) {
            return Err(ModemError::InvalidSymbolRate {
                symbol_rate: self.symbol_rate,
                sample_rate: self.sample_rate,
            });
        }
        if !is_positive(self.q) {
            return Err(ModemError::InvalidQ(self.q));
        }
        if !is_positive(self.rolloff) || self.rolloff > 1.0 {
            return Err(ModemError::Config(format!(
                "rolloff must be within (0, 1], got {}",
                self.rolloff
            )));
        }
        if !is_positive(self.loop_bandwidth) {
            return Err(ModemError::Config(format!(
                "loop bandwidth must be positive, got {}",
                self.loop_bandwidth
            )));
        }
        Ok(())
    }

    /// Read a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ModemResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> ModemResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Named configuration profiles kept as `<name>.json` in one directory
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    /// Open (and create if needed) a profile directory
    pub fn open(dir: impl Into<PathBuf>) -> ModemResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn save(&self, name: &str, config: &ModemConfig) -> ModemResult<()> {
        let path = self.path_for(name)?;
        config.save(path)
    }

    pub fn load(&self, name: &str) -> ModemResult<ModemConfig> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(ModemError::Config(format!("profile '{name}' not found")));
        }
        ModemConfig::load(path)
    }

    /// Profile names, sorted
    pub fn list(&self) -> ModemResult<Vec<String>> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.extension()?.to_str()? == "json" {
                    path.file_stem()?.to_str().map(String::from)
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> ModemResult<()> {
        let path = self.path_for(name)?;
        if profile_stem(name)? == "Default" {
            return Err(ModemError::Config(
                "cannot delete the Default profile".to_string(),
            ));
        }
        if !path.exists() {
            return Err(ModemError::Config(format!("profile '{name}' not found")));
        }
        std::fs::remove_file(&path)?;
        Ok(())
    }

    fn path_for(&self, name: &str) -> ModemResult<PathBuf> {
        let name = profile_stem(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }
}

/// A profile name doubles as its file stem. Only alphanumerics, space,
/// `-` and `_` are accepted, which also keeps separators and `..` out.
fn profile_stem(name: &str) -> ModemResult<&str> {
    let stem = name.trim();
    if stem.is_empty() {
        return Err(ModemError::Config("profile name cannot be empty".to_string()));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_');
    match stem.chars().find(|&c| !allowed(c)) {
        Some(c) => Err(ModemError::Config(format!(
            "profile name '{stem}' contains '{c}'"
        ))),
        None => Ok(stem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        let config = ModemConfig::default();
        assert_eq!(config.sample_rate, 8000.0);
        assert_eq!(config.symbol_rate, 600.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_nyquist_carrier() {
        let config = ModemConfig {
            frequency: 4000.0,
            ..ModemConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModemError::InvalidFrequency { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_symbol_rate_and_q() {
        let config = ModemConfig {
            symbol_rate: 0.0,
            ..ModemConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ModemError::InvalidSymbolRate { .. })
        ));

        let config = ModemConfig {
            q: -1.0,
            ..ModemConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModemError::InvalidQ(_))));
    }

    #[test]
    fn validate_rejects_nan_fields() {
        for config in [
            ModemConfig { sample_rate: f64::NAN, ..ModemConfig::default() },
            ModemConfig { symbol_rate: f64::NAN, ..ModemConfig::default() },
            ModemConfig { q: f64::NAN, ..ModemConfig::default() },
            ModemConfig { loop_bandwidth: f64::NAN, ..ModemConfig::default() },
        ] {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ModemConfig = serde_json::from_str(r#"{"frequency": 1500.0}"#).unwrap();
        assert_eq!(config.frequency, 1500.0);
        assert_eq!(config.symbol_rate, 600.0);
        assert!(!config.afc);
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modem.json");
        let config = ModemConfig {
            frequency: 1000.0,
            afc: true,
            ..ModemConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ModemConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn profile_store_save_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::open(dir.path().join("profiles")).unwrap();

        store.save("Default", &ModemConfig::default()).unwrap();
        store
            .save(
                "fast qam",
                &ModemConfig {
                    symbol_rate: 1200.0,
                    ..ModemConfig::default()
                },
            )
            .unwrap();

        assert_eq!(store.list().unwrap(), vec!["Default", "fast qam"]);
        assert_eq!(store.load("fast qam").unwrap().symbol_rate, 1200.0);

        assert!(store.delete("Default").is_err());
        store.delete("fast qam").unwrap();
        assert_eq!(store.list().unwrap(), vec!["Default"]);
        assert!(store.load("fast qam").is_err());
    }

    #[test]
    fn profile_names_cannot_leave_the_directory() {
        for name in ["../evil", "a/b", "a\\b", "  ", "config;drop", "x.json"] {
            assert!(profile_stem(name).is_err(), "{name}");
        }
        assert_eq!(profile_stem(" my_profile-2 ").unwrap(), "my_profile-2");
        let err = profile_stem("..").unwrap_err();
        assert!(err.to_string().contains("'.'"));
    }
}
