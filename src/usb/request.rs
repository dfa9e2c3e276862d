use packed_struct::prelude::*;

use super::descriptor::Direction;

/// Size of a SETUP packet
pub const SETUP_PACKET_SIZE: usize = 8;

/// Request type from bits 5..=6 of bmRequestType
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RequestType {
    Standard = 0,
    Class = 1,
    Vendor = 2,
    Reserved = 3,
}

/// Recipient from bits 0..=4 of bmRequestType
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved(u8),
}

impl From<u8> for Recipient {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Device,
            1 => Self::Interface,
            2 => Self::Endpoint,
            3 => Self::Other,
            v => Self::Reserved(v),
        }
    }
}

/// Standard bRequest codes
pub mod standard {
    pub const GET_STATUS: u8 = 0x00;
    pub const CLEAR_FEATURE: u8 = 0x01;
    pub const SET_FEATURE: u8 = 0x03;
    pub const SET_ADDRESS: u8 = 0x05;
    pub const GET_DESCRIPTOR: u8 = 0x06;
    pub const SET_DESCRIPTOR: u8 = 0x07;
    pub const GET_CONFIGURATION: u8 = 0x08;
    pub const SET_CONFIGURATION: u8 = 0x09;
    pub const GET_INTERFACE: u8 = 0x0a;
    pub const SET_INTERFACE: u8 = 0x0b;
}

/// A control request as delivered in a SETUP packet
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct ControlRequest {
    // BYTE 0: bmRequestType
    /// True for device to host requests
    #[packed_field(bits = "0")]
    pub device_to_host: bool,
    #[packed_field(bits = "1..=2", ty = "enum")]
    pub request_type: RequestType,
    #[packed_field(bits = "3..=7")]
    pub recipient: Integer<u8, packed_bits::Bits<5>>,
    // BYTE 1
    #[packed_field(bytes = "1")]
    pub request: u8,
    // BYTES 2-3
    #[packed_field(bytes = "2..=3", endian = "lsb")]
    pub value: u16,
    // BYTES 4-5
    #[packed_field(bytes = "4..=5", endian = "lsb")]
    pub index: u16,
    // BYTES 6-7
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub length: u16,
}

impl ControlRequest {
    pub fn new(
        direction: Direction,
        request_type: RequestType,
        recipient: Recipient,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
    ) -> Self {
        let recipient = match recipient {
            Recipient::Device => 0,
            Recipient::Interface => 1,
            Recipient::Endpoint => 2,
            Recipient::Other => 3,
            Recipient::Reserved(v) => v,
        };
        Self {
            device_to_host: direction == Direction::In,
            request_type,
            recipient: Integer::from_primitive(recipient),
            request,
            value,
            index,
            length,
        }
    }

    pub fn direction(&self) -> Direction {
        if self.device_to_host {
            Direction::In
        } else {
            Direction::Out
        }
    }

    pub fn recipient(&self) -> Recipient {
        Recipient::from(self.recipient.to_primitive())
    }

    /// One line summary of the request for logging
    pub fn describe(&self) -> String {
        format!(
            "{} {:?} to {:?}: bRequest=0x{:02x} wValue=0x{:04x} wIndex=0x{:04x} wLength={}",
            self.direction(),
            self.request_type,
            self.recipient(),
            self.request,
            self.value,
            self.index,
            self.length
        )
    }
}
