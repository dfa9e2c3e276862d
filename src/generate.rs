use std::fs::File;
use std::io::Write;

use schemars::schema_for;
use xinput_gadget::config::{path::get_schema_path, XInputConfig};

fn main() {
    let xinput_device_v1_schema = schema_for!(XInputConfig);
    let path = get_schema_path().join("xinput_device_v1.json");
    let mut file = File::create(path).expect("Failed to create schema file");
    write!(
        file,
        "{}",
        serde_json::to_string_pretty(&xinput_device_v1_schema).unwrap()
    )
    .expect("Failed to write schema");
}
