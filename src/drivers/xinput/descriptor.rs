//! Descriptor tables of a wired Xbox 360 controller.
//!
//! Values can be compared against a real device with "sudo lsusb -v -d 045e:028e"
use packed_struct::prelude::*;

use crate::{
    config::XInputConfig,
    usb::descriptor::{
        encode_language_descriptor, encode_string_descriptor, DeviceDescriptor,
        DEVICE_DESCRIPTOR_SIZE,
    },
};

// Hardware ID's
pub const VID: u16 = 0x045e;
pub const PID: u16 = 0x028e;
pub const DEVICE_VERSION: u16 = 0x0572;

/// Max packet size of the control endpoint
pub const CONTROL_PACKET_SIZE: u8 = 64;

/// Size of the undocumented vendor block between the interface header and the
/// endpoint descriptors
pub const VENDOR_DESCRIPTOR_SIZE: usize = 16;

/// Max packet size of both interrupt endpoints
pub const ENDPOINT_PACKET_SIZE: usize = 32;

// String descriptor indices
pub const STRING_LANGUAGE: u8 = 0;
pub const STRING_MANUFACTURER: u8 = 1;
pub const STRING_PRODUCT: u8 = 2;
pub const STRING_SERIAL: u8 = 3;

/// English (United States)
pub const LANG_ID_EN_US: u16 = 0x0409;

pub const DEFAULT_MANUFACTURER: &str = "GENERIC";
pub const DEFAULT_PRODUCT: &str = "XINPUT CONTROLLER";
pub const DEFAULT_SERIAL: &str = "1.0";

pub const DEVICE_DESCRIPTOR: DeviceDescriptor = DeviceDescriptor {
    length: DEVICE_DESCRIPTOR_SIZE as u8,
    descriptor_type: 0x01,
    usb_version: 0x0200,
    device_class: 0xff,
    device_subclass: 0xff,
    device_protocol: 0xff,
    max_packet_size_0: CONTROL_PACKET_SIZE,
    vendor_id: VID,
    product_id: PID,
    device_version: DEVICE_VERSION,
    manufacturer_index: STRING_MANUFACTURER,
    product_index: STRING_PRODUCT,
    serial_number_index: STRING_SERIAL,
    num_configurations: 1,
};

/// Full configuration descriptor: one vendor interface with an IN and an OUT
/// interrupt endpoint
#[rustfmt::skip]
pub const CONFIGURATION_DESCRIPTOR: [u8; 48] = [
    // Configuration
    0x09, // bLength
    0x02, // bDescriptorType
    0x30, 0x00, // wTotalLength (48 bytes)
    0x01, // bNumInterfaces
    0x01, // bConfigurationValue
    0x00, // iConfiguration
    0x80, // bmAttributes (Bus powered)
    0xfa, // bMaxPower (500 mA)

    // Interface
    0x09, // bLength
    0x04, // bDescriptorType
    0x00, // bInterfaceNumber
    0x00, // bAlternateSetting
    0x02, // bNumEndpoints
    0xff, // bInterfaceClass (Vendor specific)
    0x5d, // bInterfaceSubClass
    0x01, // bInterfaceProtocol
    0x00, // iInterface

    // Vendor block. Windows expects it verbatim; its fields are undocumented.
    0x10, 0x21, 0x10, 0x01, 0x01, 0x24, 0x81, 0x14,
    0x03, 0x00, 0x03, 0x13, 0x02, 0x00, 0x03, 0x00,

    // Endpoint 1 IN
    0x07, // bLength
    0x05, // bDescriptorType
    0x81, // bEndpointAddress
    0x03, // bmAttributes (Interrupt)
    0x20, 0x00, // wMaxPacketSize (32 bytes)
    0x04, // bInterval (4 frames)

    // Endpoint 2 OUT
    0x07, // bLength
    0x05, // bDescriptorType
    0x02, // bEndpointAddress
    0x03, // bmAttributes (Interrupt)
    0x20, 0x00, // wMaxPacketSize (32 bytes)
    0x08, // bInterval (8 frames)
];

/// Offset of the interface descriptor inside [CONFIGURATION_DESCRIPTOR]
pub const INTERFACE_OFFSET: usize = 9;

/// Human readable strings reported by the device
#[derive(Debug, Clone, PartialEq)]
pub struct StringTable {
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
}

impl Default for StringTable {
    fn default() -> Self {
        Self {
            manufacturer: DEFAULT_MANUFACTURER.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            serial: DEFAULT_SERIAL.to_string(),
        }
    }
}

impl From<&XInputConfig> for StringTable {
    fn from(config: &XInputConfig) -> Self {
        Self {
            manufacturer: config.manufacturer.clone(),
            product: config.product.clone(),
            serial: config.serial.clone(),
        }
    }
}

/// Serves the descriptor tables to the stack's enumeration machinery
#[derive(Debug, Clone, Default)]
pub struct Descriptors {
    strings: StringTable,
}

impl Descriptors {
    pub fn new(strings: StringTable) -> Self {
        Self { strings }
    }

    pub fn device_descriptor(&self) -> &DeviceDescriptor {
        &DEVICE_DESCRIPTOR
    }

    /// Device descriptor as sent on the wire
    pub fn device_descriptor_bytes(&self) -> Result<[u8; DEVICE_DESCRIPTOR_SIZE], PackingError> {
        DEVICE_DESCRIPTOR.pack()
    }

    pub fn configuration_descriptor(&self) -> &'static [u8] {
        &CONFIGURATION_DESCRIPTOR
    }

    /// Returns the string at the given descriptor index. Index zero holds the
    /// language list rather than a string, see [Descriptors::string_descriptor].
    pub fn string(&self, index: u8) -> Option<&str> {
        match index {
            STRING_MANUFACTURER => Some(self.strings.manufacturer.as_str()),
            STRING_PRODUCT => Some(self.strings.product.as_str()),
            STRING_SERIAL => Some(self.strings.serial.as_str()),
            _ => None,
        }
    }

    /// Returns the encoded string descriptor for the given index
    pub fn string_descriptor(&self, index: u8) -> Option<Vec<u8>> {
        if index == STRING_LANGUAGE {
            return Some(encode_language_descriptor(&[LANG_ID_EN_US]));
        }
        self.string(index).map(encode_string_descriptor)
    }
}
