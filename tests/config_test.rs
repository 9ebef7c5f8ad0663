use shadow_studio::config::Settings;
use shadow_studio::hotkeys::HotkeyAction;
use tempfile::TempDir;

#[test]
fn test_settings_lifecycle() {
    let temp_dir = TempDir::new().unwrap();

    // Only test in this binary touching the environment
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    assert!(!Settings::exists().unwrap());

    let settings = Settings::new();
    settings.save().unwrap();
    assert!(Settings::exists().unwrap());

    let loaded = Settings::load().unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.keys.get(HotkeyAction::SeekBack), Some("ArrowLeft"));

    let mut settings = Settings::load().unwrap();
    settings.set_value("auto_replay.count", "4").unwrap();
    settings.set_value("auto_replay.interval", "2").unwrap();
    settings.set_value("keys.toggleAbRepeat", "KeyB").unwrap();
    settings.set_value("library_dir", "~/study").unwrap();
    settings.save().unwrap();

    let reloaded = Settings::load().unwrap();
    assert_eq!(reloaded.auto_replay.count, 4);
    assert_eq!(reloaded.auto_replay.interval_seconds, 2.0);
    assert_eq!(reloaded.keys.get(HotkeyAction::ToggleAbRepeat), Some("KeyB"));
    assert!(reloaded.library_path().ends_with("study"));

    let mut settings = Settings::load().unwrap();
    assert!(settings.set_value("invalid_key", "value").is_err());
}
