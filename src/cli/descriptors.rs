use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use xinput_gadget::{
    config::XInputConfig,
    drivers::xinput::descriptor::{
        Descriptors, StringTable, STRING_LANGUAGE, STRING_MANUFACTURER, STRING_PRODUCT,
        STRING_SERIAL,
    },
    usb::descriptor::DescriptorIter,
};

use super::to_hex;

#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "Offset")]
    offset: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Bytes")]
    bytes: String,
}

#[derive(Tabled)]
struct StringRow {
    #[tabled(rename = "Index")]
    index: u8,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Descriptor")]
    descriptor: String,
}

pub fn handle_descriptors(config: &XInputConfig) -> Result<(), Box<dyn Error>> {
    let descriptors = Descriptors::new(StringTable::from(config));

    // Device descriptor
    let device = descriptors.device_descriptor();
    let rows = vec![DescriptorRow {
        offset: 0,
        kind: format!("Device {:04x}:{:04x}", device.vendor_id, device.product_id),
        bytes: to_hex(&descriptors.device_descriptor_bytes()?),
    }];
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Device Descriptor"));
    println!("{table}");

    // Configuration descriptor, split into its sub-descriptors
    let mut rows = Vec::new();
    for descriptor in DescriptorIter::new(descriptors.configuration_descriptor()) {
        let descriptor = descriptor?;
        rows.push(DescriptorRow {
            offset: descriptor.offset,
            kind: format!("{:?}", descriptor.descriptor_type()),
            bytes: to_hex(descriptor.bytes),
        });
    }
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Configuration Descriptor"));
    println!("{table}");

    // String descriptors
    let indices = [
        STRING_LANGUAGE,
        STRING_MANUFACTURER,
        STRING_PRODUCT,
        STRING_SERIAL,
    ];
    let rows: Vec<StringRow> = indices
        .into_iter()
        .map(|index| StringRow {
            index,
            value: descriptors
                .string(index)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "(languages)".to_string()),
            descriptor: to_hex(&descriptors.string_descriptor(index).unwrap_or_default()),
        })
        .collect();
    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("String Descriptors"));
    println!("{table}");

    Ok(())
}
