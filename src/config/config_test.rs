use std::error::Error;

use crate::config::{path, LoadError, XInputConfig};

const DEVICE_CONFIG_DIR: &str = "./rootfs/usr/share/xinput-gadget/devices";

#[test]
fn test_load_yaml() -> Result<(), Box<dyn Error>> {
    let content = r#"
version: 1
kind: XInputDevice
name: Arcade Stick
manufacturer: ACME
product: Fight Stick
serial: "0042"
report_interval_ms: 8
"#;
    let config = XInputConfig::from_yaml(content.to_string())?;
    assert_eq!(config.name, "Arcade Stick");
    assert_eq!(config.manufacturer, "ACME");
    assert_eq!(config.product, "Fight Stick");
    assert_eq!(config.serial, "0042");
    assert_eq!(config.report_interval_ms, 8);

    Ok(())
}

#[test]
fn test_load_partial_yaml() -> Result<(), Box<dyn Error>> {
    let config = XInputConfig::from_yaml("product: Pad\n".to_string())?;
    let defaults = XInputConfig::default();
    assert_eq!(config.product, "Pad");
    assert_eq!(config.manufacturer, defaults.manufacturer, "missing fields use defaults");
    assert_eq!(config.serial, "1.0");

    Ok(())
}

#[test]
fn test_load_invalid_yaml() {
    let result = XInputConfig::from_yaml("report_interval_ms: soon\n".to_string());
    assert!(matches!(result, Err(LoadError::DeserializeError(_))));

    let result = XInputConfig::from_yaml_file("/nonexistent/xinput.yaml".to_string());
    assert!(matches!(result, Err(LoadError::IoError(_))));
}

/// Every shipped device config should load and keep the wire strings
#[test]
fn test_shipped_configs() -> Result<(), Box<dyn Error>> {
    let files = path::get_multidir_sorted_files(&[DEVICE_CONFIG_DIR.into()], |entry| {
        entry.path().extension().is_some_and(|ext| ext == "yaml")
    });
    assert!(!files.is_empty(), "no device configs found in {DEVICE_CONFIG_DIR}");

    for file in files {
        let config = XInputConfig::from_yaml_path(&file)?;
        assert_eq!(config.version, 1, "{file:?} has an unexpected version");
        assert_eq!(config, XInputConfig::default(), "{file:?} should match the defaults");
    }

    Ok(())
}
