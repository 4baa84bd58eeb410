use anyhow::Result;
use pytta_defaults::{FactoryConfig, LocalStorage, PropertyStore, SnapshotStorage};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_factory_file_and_snapshot_round_trip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config_path = temp_dir.path().join("pytta.toml");
    std::fs::write(
        &config_path,
        r#"
[defaults]
samplingRate = 96000
maxFreq = 40000
out_channel = [1, 2]
startMargin = 0.5

[[devices]]
index = 0
name = "Studio Interface"
max_input_channels = 2
max_output_channels = 2
default_sample_rate = 96000.0

[logging]
level = "warn"
"#,
    )?;

    let config = FactoryConfig::from_file(&config_path)?;
    config.validate_config()?;
    assert_eq!(config.log_level(), Some("warn"));

    let mut store = config.build_store()?;
    assert_eq!(store.factory().sampling_rate(), 96000);
    assert_eq!(store.factory().out_channel(), &[1, 2]);
    assert_eq!(store.get("margins")?, json!({"start": 0.5, "stop": 0.7}));

    store.set_values([("comment", json!("session 1")), ("stopMargin", json!(1.2))])?;

    let storage = LocalStorage::new(temp_dir.path().join("state/session.json"));
    storage.save(&store.to_json()?)?;

    let mut restored: PropertyStore = config.build_store()?;
    let snapshot = storage.load()?.expect("snapshot was saved");
    restored.load_json(&snapshot)?;
    assert_eq!(restored.properties(), store.properties());

    // reset 回到設定檔的出廠值，而不是內建值
    restored.reset()?;
    assert_eq!(restored.properties().sampling_rate(), 96000);
    assert_eq!(restored.properties().comment(), "No comments.");

    Ok(())
}

#[test]
fn test_partial_snapshot_ignores_extra_keys() -> Result<()> {
    let mut store = FactoryConfig::default().build_store()?;
    let changed = store.load_json(
        r#"{"fftDegree": 14, "exportedAt": "2026-01-01T00:00:00Z", "freqLims": {"min": 1}}"#,
    )?;
    assert_eq!(changed.len(), 1);
    assert_eq!(store.properties().fft_degree(), 14);
    Ok(())
}

#[test]
fn test_missing_config_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = FactoryConfig::from_file(temp_dir.path().join("missing.toml"));
    assert!(matches!(result, Err(pytta_defaults::PropsError::IoError(_))));
}
