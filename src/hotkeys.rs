//! Keyboard shortcuts.
//!
//! Bindings map an action to a physical key code using the names of the W3C
//! `KeyboardEvent.code` values (`Space`, `KeyR`, `ArrowLeft`, `Digit1`, ...),
//! so a binding names a key position rather than the character it produces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotkeyAction {
    PlayPause,
    Replay,
    SeekBack,
    SeekForward,
    /// Reserved for recording; currently only logged.
    ToggleRecord,
    AddMarker,
    ToggleAbRepeat,
    NextTrack,
    PrevTrack,
}

impl HotkeyAction {
    pub const ALL: [HotkeyAction; 9] = [
        HotkeyAction::PlayPause,
        HotkeyAction::Replay,
        HotkeyAction::SeekBack,
        HotkeyAction::SeekForward,
        HotkeyAction::ToggleRecord,
        HotkeyAction::AddMarker,
        HotkeyAction::ToggleAbRepeat,
        HotkeyAction::NextTrack,
        HotkeyAction::PrevTrack,
    ];

    /// The camelCase name used in settings files.
    pub fn name(&self) -> &'static str {
        match self {
            HotkeyAction::PlayPause => "playPause",
            HotkeyAction::Replay => "replay",
            HotkeyAction::SeekBack => "seekBack",
            HotkeyAction::SeekForward => "seekForward",
            HotkeyAction::ToggleRecord => "toggleRecord",
            HotkeyAction::AddMarker => "addMarker",
            HotkeyAction::ToggleAbRepeat => "toggleAbRepeat",
            HotkeyAction::NextTrack => "nextTrack",
            HotkeyAction::PrevTrack => "prevTrack",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HotkeyAction::PlayPause => "Play / pause",
            HotkeyAction::Replay => "Replay from start",
            HotkeyAction::SeekBack => "Seek back",
            HotkeyAction::SeekForward => "Seek forward",
            HotkeyAction::ToggleRecord => "Toggle recording",
            HotkeyAction::AddMarker => "Add marker",
            HotkeyAction::ToggleAbRepeat => "A-B repeat",
            HotkeyAction::NextTrack => "Next track",
            HotkeyAction::PrevTrack => "Previous track",
        }
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HotkeyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HotkeyAction::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown hotkey action: {s}"))
    }
}

/// Action to key code bindings. An action without an entry is unbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap(BTreeMap<HotkeyAction, String>);

impl Default for KeyMap {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(HotkeyAction::PlayPause, "Space".to_string());
        map.insert(HotkeyAction::Replay, "KeyR".to_string());
        map.insert(HotkeyAction::SeekBack, "ArrowLeft".to_string());
        map.insert(HotkeyAction::SeekForward, "ArrowRight".to_string());
        map.insert(HotkeyAction::ToggleRecord, "KeyM".to_string());
        map.insert(HotkeyAction::AddMarker, "KeyP".to_string());
        Self(map)
    }
}

impl KeyMap {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, action: HotkeyAction) -> Option<&str> {
        self.0.get(&action).map(String::as_str)
    }

    pub fn bind(&mut self, action: HotkeyAction, code: impl Into<String>) {
        self.0.insert(action, code.into());
    }

    pub fn unbind(&mut self, action: HotkeyAction) {
        self.0.remove(&action);
    }

    pub fn iter(&self) -> impl Iterator<Item = (HotkeyAction, &str)> {
        self.0.iter().map(|(action, code)| (*action, code.as_str()))
    }
}

/// Resolves key codes to actions.
#[derive(Debug, Clone)]
pub struct HotkeyDispatcher {
    key_map: KeyMap,
}

impl HotkeyDispatcher {
    pub fn new(key_map: KeyMap) -> Self {
        Self { key_map }
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    /// The action bound to `code`. When several actions share a code the
    /// first in [`HotkeyAction::ALL`] order wins.
    pub fn resolve(&self, code: &str) -> Option<HotkeyAction> {
        HotkeyAction::ALL
            .into_iter()
            .find(|action| self.key_map.get(*action) == Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let dispatcher = HotkeyDispatcher::new(KeyMap::default());
        assert_eq!(dispatcher.resolve("Space"), Some(HotkeyAction::PlayPause));
        assert_eq!(dispatcher.resolve("KeyR"), Some(HotkeyAction::Replay));
        assert_eq!(dispatcher.resolve("ArrowLeft"), Some(HotkeyAction::SeekBack));
        assert_eq!(dispatcher.resolve("ArrowRight"), Some(HotkeyAction::SeekForward));
        assert_eq!(dispatcher.resolve("KeyM"), Some(HotkeyAction::ToggleRecord));
        assert_eq!(dispatcher.resolve("KeyP"), Some(HotkeyAction::AddMarker));
        assert_eq!(dispatcher.resolve("KeyZ"), None);
    }

    #[test]
    fn test_unbound_action_never_resolves() {
        let mut map = KeyMap::default();
        map.unbind(HotkeyAction::Replay);
        let dispatcher = HotkeyDispatcher::new(map);
        assert_eq!(dispatcher.resolve("KeyR"), None);
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        let dispatcher = HotkeyDispatcher::new(KeyMap::default());
        assert_eq!(dispatcher.resolve("space"), None);
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in HotkeyAction::ALL {
            assert_eq!(action.name().parse::<HotkeyAction>(), Ok(action));
        }
        assert!("nope".parse::<HotkeyAction>().is_err());
    }

    #[test]
    fn test_key_map_serializes_camel_case() {
        let json = serde_json::to_string(&KeyMap::default()).unwrap();
        assert!(json.contains("\"playPause\":\"Space\""));
        let back: KeyMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, KeyMap::default());
    }
}
