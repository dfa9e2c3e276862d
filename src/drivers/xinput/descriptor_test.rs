use std::error::Error;

use packed_struct::PackedStructSlice;

use crate::{
    drivers::xinput::descriptor::{
        Descriptors, StringTable, CONFIGURATION_DESCRIPTOR, DEVICE_DESCRIPTOR, INTERFACE_OFFSET,
        PID, VID,
    },
    usb::descriptor::{
        ConfigurationDescriptor, DescriptorIter, DescriptorType, Direction, TransferType,
        CONFIGURATION_DESCRIPTOR_SIZE,
    },
};

#[test]
fn test_device_descriptor() -> Result<(), Box<dyn Error>> {
    assert_eq!(DEVICE_DESCRIPTOR.vendor_id, 0x045e);
    assert_eq!(DEVICE_DESCRIPTOR.product_id, 0x028e);
    assert_eq!(DEVICE_DESCRIPTOR.device_class, 0xff);
    assert_eq!(DEVICE_DESCRIPTOR.device_version, 0x0572);

    let descriptors = Descriptors::default();
    let bytes = descriptors.device_descriptor_bytes()?;
    #[rustfmt::skip]
    let expected = [
        0x12, 0x01, 0x00, 0x02, 0xff, 0xff, 0xff, 0x40,
        0x5e, 0x04, 0x8e, 0x02, 0x72, 0x05, 0x01, 0x02,
        0x03, 0x01,
    ];
    assert_eq!(bytes, expected, "device descriptor should match the wire format");
    assert_eq!(descriptors.device_descriptor().vendor_id, VID);
    assert_eq!(descriptors.device_descriptor().product_id, PID);

    Ok(())
}

#[test]
fn test_configuration_total_length() -> Result<(), Box<dyn Error>> {
    let header = ConfigurationDescriptor::unpack_from_slice(
        &CONFIGURATION_DESCRIPTOR[..CONFIGURATION_DESCRIPTOR_SIZE],
    )?;
    assert_eq!(header.total_length, 48);
    assert_eq!(header.total_length as usize, CONFIGURATION_DESCRIPTOR.len());
    assert_eq!(header.num_interfaces, 1);
    assert_eq!(header.max_power, 0xfa);

    Ok(())
}

#[test]
fn test_configuration_layout() -> Result<(), Box<dyn Error>> {
    let descriptors = DescriptorIter::new(&CONFIGURATION_DESCRIPTOR).collect::<Result<Vec<_>, _>>()?;
    let types: Vec<DescriptorType> = descriptors.iter().map(|d| d.descriptor_type()).collect();
    assert_eq!(
        types,
        vec![
            DescriptorType::Configuration,
            DescriptorType::Interface,
            DescriptorType::ClassSpecific,
            DescriptorType::Endpoint,
            DescriptorType::Endpoint,
        ],
        "descriptors should appear in the order the host parses them"
    );
    assert_eq!(descriptors[1].offset, INTERFACE_OFFSET);
    assert_eq!(descriptors[2].len(), 16);

    let interface = descriptors[1].as_interface()?;
    assert_eq!(interface.num_endpoints, 2);
    assert_eq!(interface.interface_class, 0xff);
    assert_eq!(interface.interface_subclass, 0x5d);
    assert_eq!(interface.interface_protocol, 0x01);

    let ep_in = descriptors[3].as_endpoint()?;
    assert_eq!(ep_in.address, 0x81);
    assert_eq!(ep_in.direction(), Direction::In);
    assert_eq!(ep_in.transfer_type(), TransferType::Interrupt);
    assert_eq!(ep_in.max_packet_size, 32);
    assert_eq!(ep_in.interval, 4);

    let ep_out = descriptors[4].as_endpoint()?;
    assert_eq!(ep_out.address, 0x02);
    assert_eq!(ep_out.direction(), Direction::Out);
    assert_eq!(ep_out.transfer_type(), TransferType::Interrupt);
    assert_eq!(ep_out.max_packet_size, 32);
    assert_eq!(ep_out.interval, 8);

    Ok(())
}

#[test]
fn test_string_table() {
    let descriptors = Descriptors::default();
    assert_eq!(descriptors.string(0), None);
    assert_eq!(descriptors.string(1), Some("GENERIC"));
    assert_eq!(descriptors.string(2), Some("XINPUT CONTROLLER"));
    assert_eq!(descriptors.string(3), Some("1.0"));
    assert_eq!(descriptors.string(4), None);

    assert_eq!(
        descriptors.string_descriptor(0),
        Some(vec![0x04, 0x03, 0x09, 0x04]),
        "index zero should list English (0x0409)"
    );
    let serial = descriptors.string_descriptor(3).unwrap_or_default();
    assert_eq!(serial, vec![0x08, 0x03, b'1', 0x00, b'.', 0x00, b'0', 0x00]);
    assert_eq!(descriptors.string_descriptor(9), None);
}

#[test]
fn test_custom_strings() {
    let descriptors = Descriptors::new(StringTable {
        manufacturer: "ACME".to_string(),
        product: "Pad".to_string(),
        serial: "42".to_string(),
    });
    assert_eq!(descriptors.string(1), Some("ACME"));
    assert_eq!(descriptors.string(2), Some("Pad"));
    assert_eq!(descriptors.string(3), Some("42"));
}
