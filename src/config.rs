use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tauri_plugin_global_shortcut::{Code, Modifiers, Shortcut};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no per-user config directory available")]
    NoConfigDir,
    #[error("unrecognized key code {0:?}")]
    UnknownKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] serde_json::Error),
}

/// Modifier bitmask + primary key defining the global show/hide shortcut.
///
/// `modifiers` holds the raw bits of [`Modifiers`]; `key` is the key-code
/// name (e.g. `"Space"`, `"KeyG"`) so the file stays human-editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCombination {
    pub modifiers: u32,
    pub key: String,
}

impl Default for TriggerCombination {
    fn default() -> Self {
        Self {
            modifiers: Modifiers::ALT.bits(),
            key: Code::Space.to_string(),
        }
    }
}

impl TriggerCombination {
    pub fn new(modifiers: Modifiers, code: Code) -> Self {
        Self {
            modifiers: modifiers.bits(),
            key: code.to_string(),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers::from_bits_truncate(self.modifiers)
    }

    pub fn code(&self) -> Result<Code, ConfigError> {
        self.key
            .parse()
            .map_err(|_| ConfigError::UnknownKey(self.key.clone()))
    }

    pub fn to_shortcut(&self) -> Result<Shortcut, ConfigError> {
        let mods = self.modifiers();
        let mods = (!mods.is_empty()).then_some(mods);
        Ok(Shortcut::new(mods, self.code()?))
    }

    /// Whether an incoming key event matches this combination.
    pub fn matches(&self, modifiers: Modifiers, code: Code) -> bool {
        self.modifiers() == modifiers && self.code().is_ok_and(|c| c == code)
    }

    /// Human-readable form for the log, e.g. `Alt+Space`.
    pub fn label(&self) -> String {
        let mods = self.modifiers();
        let mut parts = Vec::new();
        for (flag, name) in [
            (Modifiers::SUPER, "Super"),
            (Modifiers::CONTROL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
        ] {
            if mods.contains(flag) {
                parts.push(name);
            }
        }
        parts.push(&self.key);
        parts.join("+")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub trigger: TriggerCombination,
}

impl AppConfig {
    fn config_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("gemini-overlay").join("config.json"))
    }

    /// Read the persisted config, falling back to defaults on first run.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("[config] falling back to defaults: {e}");
                Self::default()
            }),
            Err(e) => {
                log::warn!("[config] {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trigger_is_alt_space() {
        let trigger = TriggerCombination::default();
        assert_eq!(trigger.modifiers(), Modifiers::ALT);
        assert_eq!(trigger.code().unwrap(), Code::Space);
        assert_eq!(trigger.label(), "Alt+Space");
    }

    #[test]
    fn to_shortcut_round_trips_through_matches() {
        let trigger = TriggerCombination::new(Modifiers::SUPER | Modifiers::SHIFT, Code::KeyG);
        let shortcut = trigger.to_shortcut().unwrap();
        assert!(shortcut.matches(Modifiers::SUPER | Modifiers::SHIFT, Code::KeyG));
        assert!(!shortcut.matches(Modifiers::SUPER, Code::KeyG));
        assert!(trigger.matches(Modifiers::SUPER | Modifiers::SHIFT, Code::KeyG));
        assert!(!trigger.matches(Modifiers::SUPER | Modifiers::SHIFT, Code::KeyH));
    }

    #[test]
    fn unknown_key_name_is_rejected() {
        let trigger = TriggerCombination {
            modifiers: Modifiers::ALT.bits(),
            key: "NotAKey".into(),
        };
        assert!(matches!(trigger.code(), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    // A captured trigger written to disk must drive match comparisons after
    // reload, replacing the built-in default.
    #[test]
    fn saved_trigger_survives_reload_and_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let cfg = AppConfig {
            trigger: TriggerCombination::new(Modifiers::CONTROL | Modifiers::ALT, Code::KeyK),
        };
        cfg.save_to(&path).unwrap();

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded, cfg);
        assert!(reloaded
            .trigger
            .matches(Modifiers::CONTROL | Modifiers::ALT, Code::KeyK));
        assert!(!reloaded.trigger.matches(Modifiers::ALT, Code::Space));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("config.json");
        AppConfig::default().save_to(&path).unwrap();
        assert!(path.exists());
    }
}
