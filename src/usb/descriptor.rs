//! Standard USB descriptor records and helpers for walking a configuration
//! buffer one descriptor at a time.
//!
//! Reference: USB 2.0 specification, chapter 9.6
use std::fmt;

use packed_struct::{prelude::*, PackedStructSlice};
use thiserror::Error;

/// Size of a [DeviceDescriptor] on the wire
pub const DEVICE_DESCRIPTOR_SIZE: usize = 18;
/// Size of a [ConfigurationDescriptor] on the wire
pub const CONFIGURATION_DESCRIPTOR_SIZE: usize = 9;
/// Size of an [InterfaceDescriptor] on the wire
pub const INTERFACE_DESCRIPTOR_SIZE: usize = 9;
/// Size of an [EndpointDescriptor] on the wire
pub const ENDPOINT_DESCRIPTOR_SIZE: usize = 7;

/// Descriptor type tags found in the second byte of every descriptor
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum DescriptorType {
    Unknown = 0x00,
    Device = 0x01,
    Configuration = 0x02,
    String = 0x03,
    Interface = 0x04,
    Endpoint = 0x05,
    DeviceQualifier = 0x06,
    InterfaceAssociation = 0x0b,
    /// Class specific descriptor. XInput uses this tag for its vendor block.
    ClassSpecific = 0x21,
}

impl From<u8> for DescriptorType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Device,
            0x02 => Self::Configuration,
            0x03 => Self::String,
            0x04 => Self::Interface,
            0x05 => Self::Endpoint,
            0x06 => Self::DeviceQualifier,
            0x0b => Self::InterfaceAssociation,
            0x21 => Self::ClassSpecific,
            _ => Self::Unknown,
        }
    }
}

/// Direction of a transfer, relative to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host to device
    Out,
    /// Device to host
    In,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Out => write!(f, "OUT"),
            Direction::In => write!(f, "IN"),
        }
    }
}

/// Endpoint transfer type from the low bits of bmAttributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

/// An endpoint address as found in bEndpointAddress. Bit 7 is the direction
/// and bits 0..=3 are the endpoint number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointAddress(u8);

impl EndpointAddress {
    const DIRECTION_MASK: u8 = 0x80;
    const NUMBER_MASK: u8 = 0x0f;

    pub const fn new(address: u8) -> Self {
        Self(address)
    }

    pub const fn from_parts(number: u8, direction: Direction) -> Self {
        let number = number & Self::NUMBER_MASK;
        match direction {
            Direction::In => Self(number | Self::DIRECTION_MASK),
            Direction::Out => Self(number),
        }
    }

    pub const fn to_u8(&self) -> u8 {
        self.0
    }

    pub const fn number(&self) -> u8 {
        self.0 & Self::NUMBER_MASK
    }

    pub const fn direction(&self) -> Direction {
        if self.0 & Self::DIRECTION_MASK != 0 {
            Direction::In
        } else {
            Direction::Out
        }
    }
}

impl From<u8> for EndpointAddress {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x} ({} {})", self.0, self.direction(), self.number())
    }
}

/// Device Descriptor
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "18")]
pub struct DeviceDescriptor {
    #[packed_field(bytes = "0")]
    pub length: u8,
    #[packed_field(bytes = "1")]
    pub descriptor_type: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub usb_version: u16,
    #[packed_field(bytes = "4")]
    pub device_class: u8,
    #[packed_field(bytes = "5")]
    pub device_subclass: u8,
    #[packed_field(bytes = "6")]
    pub device_protocol: u8,
    #[packed_field(bytes = "7")]
    pub max_packet_size_0: u8,
    #[packed_field(bytes = "8..=9", endian = "lsb")]
    pub vendor_id: u16,
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub product_id: u16,
    #[packed_field(bytes = "12..=13", endian = "lsb")]
    pub device_version: u16,
    #[packed_field(bytes = "14")]
    pub manufacturer_index: u8,
    #[packed_field(bytes = "15")]
    pub product_index: u8,
    #[packed_field(bytes = "16")]
    pub serial_number_index: u8,
    #[packed_field(bytes = "17")]
    pub num_configurations: u8,
}

/// Configuration Descriptor header. The interface, class and endpoint
/// descriptors follow it in the same buffer, up to `total_length` bytes.
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct ConfigurationDescriptor {
    #[packed_field(bytes = "0")]
    pub length: u8,
    #[packed_field(bytes = "1")]
    pub descriptor_type: u8,
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub total_length: u16,
    #[packed_field(bytes = "4")]
    pub num_interfaces: u8,
    #[packed_field(bytes = "5")]
    pub configuration_value: u8,
    #[packed_field(bytes = "6")]
    pub configuration_index: u8,
    #[packed_field(bytes = "7")]
    pub attributes: u8,
    /// Maximum power in 2mA units
    #[packed_field(bytes = "8")]
    pub max_power: u8,
}

/// Interface Descriptor
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct InterfaceDescriptor {
    #[packed_field(bytes = "0")]
    pub length: u8,
    #[packed_field(bytes = "1")]
    pub descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub interface_number: u8,
    #[packed_field(bytes = "3")]
    pub alternate_setting: u8,
    #[packed_field(bytes = "4")]
    pub num_endpoints: u8,
    #[packed_field(bytes = "5")]
    pub interface_class: u8,
    #[packed_field(bytes = "6")]
    pub interface_subclass: u8,
    #[packed_field(bytes = "7")]
    pub interface_protocol: u8,
    #[packed_field(bytes = "8")]
    pub interface_index: u8,
}

/// Endpoint Descriptor
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "7")]
pub struct EndpointDescriptor {
    #[packed_field(bytes = "0")]
    pub length: u8,
    #[packed_field(bytes = "1")]
    pub descriptor_type: u8,
    #[packed_field(bytes = "2")]
    pub address: u8,
    #[packed_field(bytes = "3")]
    pub attributes: u8,
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub max_packet_size: u16,
    #[packed_field(bytes = "6")]
    pub interval: u8,
}

impl EndpointDescriptor {
    pub fn endpoint_address(&self) -> EndpointAddress {
        EndpointAddress::new(self.address)
    }

    pub fn direction(&self) -> Direction {
        self.endpoint_address().direction()
    }

    pub fn transfer_type(&self) -> TransferType {
        match self.attributes & 0x03 {
            0b00 => TransferType::Control,
            0b01 => TransferType::Isochronous,
            0b10 => TransferType::Bulk,
            _ => TransferType::Interrupt,
        }
    }
}

/// Errors encountered while walking a descriptor buffer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("descriptor at offset {offset} declares a zero length")]
    ZeroLength { offset: usize },
    #[error("descriptor at offset {offset} declares {length} bytes but only {remaining} remain")]
    Truncated {
        offset: usize,
        length: usize,
        remaining: usize,
    },
    #[error("expected a {expected:?} descriptor at offset {offset} but found {found:?}")]
    UnexpectedType {
        offset: usize,
        expected: DescriptorType,
        found: DescriptorType,
    },
    #[error("unable to unpack descriptor: {0:?}")]
    PackingError(#[from] PackingError),
}

/// A single descriptor borrowed out of a larger buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDescriptor<'a> {
    /// Byte offset of this descriptor from the start of the walked buffer
    pub offset: usize,
    /// The descriptor bytes, including the length and type header
    pub bytes: &'a [u8],
}

impl<'a> RawDescriptor<'a> {
    /// The declared bLength
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn descriptor_type(&self) -> DescriptorType {
        self.bytes
            .get(1)
            .copied()
            .map(DescriptorType::from)
            .unwrap_or(DescriptorType::Unknown)
    }

    /// Decode this descriptor as an [EndpointDescriptor]. Trailing bytes past
    /// the standard seven (e.g. audio class extensions) are ignored.
    pub fn as_endpoint(&self) -> Result<EndpointDescriptor, DescriptorError> {
        self.expect_type(DescriptorType::Endpoint, ENDPOINT_DESCRIPTOR_SIZE)?;
        let endpoint = EndpointDescriptor::unpack_from_slice(
            &self.bytes[..ENDPOINT_DESCRIPTOR_SIZE],
        )?;
        Ok(endpoint)
    }

    /// Decode this descriptor as an [InterfaceDescriptor]
    pub fn as_interface(&self) -> Result<InterfaceDescriptor, DescriptorError> {
        self.expect_type(DescriptorType::Interface, INTERFACE_DESCRIPTOR_SIZE)?;
        let interface = InterfaceDescriptor::unpack_from_slice(
            &self.bytes[..INTERFACE_DESCRIPTOR_SIZE],
        )?;
        Ok(interface)
    }

    fn expect_type(&self, expected: DescriptorType, size: usize) -> Result<(), DescriptorError> {
        let found = self.descriptor_type();
        if found != expected {
            return Err(DescriptorError::UnexpectedType {
                offset: self.offset,
                expected,
                found,
            });
        }
        if self.bytes.len() < size {
            return Err(DescriptorError::Truncated {
                offset: self.offset,
                length: size,
                remaining: self.bytes.len(),
            });
        }
        Ok(())
    }
}

/// Iterates over consecutive descriptors in a buffer using each descriptor's
/// bLength to find the next one. Yields at most one error, after which the
/// iterator is exhausted.
#[derive(Debug, Clone)]
pub struct DescriptorIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> DescriptorIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = Result<RawDescriptor<'a>, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.buf.get(self.offset..)?;
        let length = *remaining.first()? as usize;

        if length == 0 {
            let err = DescriptorError::ZeroLength {
                offset: self.offset,
            };
            self.offset = self.buf.len();
            return Some(Err(err));
        }
        if length > remaining.len() {
            let err = DescriptorError::Truncated {
                offset: self.offset,
                length,
                remaining: remaining.len(),
            };
            self.offset = self.buf.len();
            return Some(Err(err));
        }

        let descriptor = RawDescriptor {
            offset: self.offset,
            bytes: &remaining[..length],
        };
        self.offset += length;

        Some(Ok(descriptor))
    }
}

/// Largest number of UTF-16 code units that fit into a string descriptor
const MAX_STRING_UNITS: usize = (u8::MAX as usize - 2) / 2;

/// Encode the given string as a USB string descriptor (UTF-16LE payload).
/// Strings too long for a single descriptor are truncated on a character
/// boundary, so a surrogate pair is never split.
pub fn encode_string_descriptor(value: &str) -> Vec<u8> {
    let mut units: Vec<u16> = Vec::with_capacity(MAX_STRING_UNITS);
    let mut buf = [0; 2];
    for c in value.chars() {
        let encoded = c.encode_utf16(&mut buf);
        if units.len() + encoded.len() > MAX_STRING_UNITS {
            break;
        }
        units.extend_from_slice(encoded);
    }
    encode_units(&units)
}

/// Encode string descriptor zero, which lists the supported language ids
pub fn encode_language_descriptor(lang_ids: &[u16]) -> Vec<u8> {
    let units: Vec<u16> = lang_ids.iter().copied().take(MAX_STRING_UNITS).collect();
    encode_units(&units)
}

fn encode_units(units: &[u16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(2 + units.len() * 2);
    data.push((2 + units.len() * 2) as u8);
    data.push(DescriptorType::String as u8);
    for unit in units {
        data.extend_from_slice(&unit.to_le_bytes());
    }
    data
}
