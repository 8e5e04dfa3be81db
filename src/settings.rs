//! Game settings and preferences
//!
//! A flat JSON object owned by the host page. The session reads it once at
//! creation and again whenever the host calls `apply_settings`.

use serde::{Deserialize, Serialize};

/// Scale the hit sounds are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MusicalScale {
    #[default]
    Major,
    Minor,
    Pentatonic,
    Blues,
    Dorian,
}

impl MusicalScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicalScale::Major => "Major",
            MusicalScale::Minor => "Minor",
            MusicalScale::Pentatonic => "Pentatonic",
            MusicalScale::Blues => "Blues",
            MusicalScale::Dorian => "Dorian",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "major" => Some(MusicalScale::Major),
            "minor" => Some(MusicalScale::Minor),
            "pentatonic" | "penta" => Some(MusicalScale::Pentatonic),
            "blues" => Some(MusicalScale::Blues),
            "dorian" => Some(MusicalScale::Dorian),
            _ => None,
        }
    }

    /// Semitone offsets from the root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            MusicalScale::Major => &[0, 2, 4, 5, 7, 9, 11],
            MusicalScale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            MusicalScale::Pentatonic => &[0, 2, 4, 7, 9],
            MusicalScale::Blues => &[0, 3, 5, 6, 7, 10],
            MusicalScale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
        }
    }
}

/// Root note of the hit-sound scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BaseKey {
    #[default]
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl BaseKey {
    /// Semitones above C
    pub fn semitone(&self) -> u8 {
        match self {
            BaseKey::C => 0,
            BaseKey::CSharp => 1,
            BaseKey::D => 2,
            BaseKey::DSharp => 3,
            BaseKey::E => 4,
            BaseKey::F => 5,
            BaseKey::FSharp => 6,
            BaseKey::G => 7,
            BaseKey::GSharp => 8,
            BaseKey::A => 9,
            BaseKey::ASharp => 10,
            BaseKey::B => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoundSettings {
    pub sound_enabled: bool,
    pub musical_scale: MusicalScale,
    pub base_key: BaseKey,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            musical_scale: MusicalScale::Major,
            base_key: BaseKey::C,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// On-screen controls for touch devices
    pub show_virtual_pad: bool,
    /// Physics debug drawing; only takes effect when the session is recreated
    pub debug_mode: bool,
    pub sound: SoundSettings,
}

/// What applying new settings requires from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    /// Applied to the live session
    Applied,
    /// `debug_mode` changed; tear the session down and create a new one
    RecreateRequired,
}

impl Settings {
    /// Parse the host's settings blob; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored blob, falling back to defaults when absent or malformed
    pub fn load_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Some(Err(err)) => {
                log::warn!("Ignoring malformed settings ({err}), using defaults");
                Self::default()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Whether moving from `self` to `next` needs a fresh session
    pub fn requires_recreate(&self, next: &Settings) -> bool {
        self.debug_mode != next.debug_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camel_case_blob() {
        let json = r#"{
            "showVirtualPad": true,
            "debugMode": false,
            "sound": { "soundEnabled": false, "musicalScale": "pentatonic", "baseKey": "F#" }
        }"#;
        let settings = Settings::from_json(json).expect("valid settings");
        assert!(settings.show_virtual_pad);
        assert!(!settings.sound.sound_enabled);
        assert_eq!(settings.sound.musical_scale, MusicalScale::Pentatonic);
        assert_eq!(settings.sound.base_key, BaseKey::FSharp);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = Settings::from_json(r#"{"debugMode": true}"#).expect("valid settings");
        assert!(settings.debug_mode);
        assert!(!settings.show_virtual_pad);
        assert_eq!(settings.sound, SoundSettings::default());
    }

    #[test]
    fn test_load_or_default() {
        assert_eq!(Settings::load_or_default(None), Settings::default());
        assert_eq!(Settings::load_or_default(Some("not json")), Settings::default());
        let roundtrip = Settings {
            show_virtual_pad: true,
            ..Default::default()
        };
        let json = roundtrip.to_json().expect("serializable");
        assert_eq!(Settings::load_or_default(Some(&json)), roundtrip);
    }

    #[test]
    fn test_requires_recreate() {
        let current = Settings::default();
        let mut next = current.clone();
        next.show_virtual_pad = true;
        next.sound.sound_enabled = false;
        assert!(!current.requires_recreate(&next));
        next.debug_mode = true;
        assert!(current.requires_recreate(&next));
    }

    #[test]
    fn test_scale_names() {
        assert_eq!(MusicalScale::from_str("PENTA"), Some(MusicalScale::Pentatonic));
        assert_eq!(MusicalScale::Blues.as_str(), "Blues");
        assert_eq!(MusicalScale::from_str("lydian"), None);
    }
}
