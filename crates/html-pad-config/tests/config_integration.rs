use html_pad_config::EditorConfig;

#[test]
fn test_load_creates_default_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("html-pad.json");
    assert!(!path.exists());

    let config = EditorConfig::load_or_create(&path);
    assert!(path.exists());
    assert_eq!(config, EditorConfig::default());

    // File should contain valid JSON
    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert!(parsed.is_object());
}

#[test]
fn test_load_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("html-pad.json");
    let json = r#"{
        "history_capacity": 8,
        "merge_typing": false,
        "block_tags": ["div", "p"],
        "log_filter": "debug"
    }"#;
    std::fs::write(&path, json).unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert_eq!(config.history_capacity, 8);
    assert!(!config.merge_typing);
    assert_eq!(config.block_tags, vec!["div", "p"]);
    assert_eq!(config.log_filter, "debug");
}

#[test]
fn test_broken_json_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("html-pad.json");
    std::fs::write(&path, "{ this is not valid json }}}").unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert_eq!(config, EditorConfig::default());

    // The broken file is left untouched
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("not valid json"));
}

#[test]
fn test_loaded_config_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("html-pad.json");
    std::fs::write(&path, r#"{"history_capacity": 1, "block_tags": ["DIV"]}"#).unwrap();

    let config = EditorConfig::load_or_create(&path);
    assert_eq!(config.history_capacity, 2);
    assert_eq!(config.block_tags, vec!["div"]);
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("html-pad.json");

    let config = EditorConfig {
        history_capacity: 32,
        mergeable_op_types: vec!["insertText".to_string()],
        ..Default::default()
    };
    config.save(&path).unwrap();

    let loaded = EditorConfig::load_or_create(&path);
    assert_eq!(loaded, config);
}
