//! Reference: https://www.partsnotincluded.com/understanding-the-xbox-360-wired-controllers-usb-data/
use packed_struct::prelude::*;
use thiserror::Error;

/// Size of the input report sent on the IN endpoint
pub const INPUT_REPORT_SIZE: usize = 20;

/// Message types found in the first byte of XInput reports
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug)]
pub enum ReportType {
    /// Input state (device to host) or rumble (host to device)
    Data = 0x00,
    /// LED pattern (host to device)
    Led = 0x01,
}

/// Input state report
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "20")]
pub struct XInputReport {
    // BYTE 0
    #[packed_field(bytes = "0")]
    pub report_id: u8,
    // BYTE 1
    #[packed_field(bytes = "1")]
    pub report_size: u8,

    // Buttons
    // BYTE 2
    #[packed_field(bits = "16")]
    pub thumb_r: bool,
    #[packed_field(bits = "17")]
    pub thumb_l: bool,
    #[packed_field(bits = "18")]
    pub back: bool,
    #[packed_field(bits = "19")]
    pub start: bool,
    #[packed_field(bits = "20")]
    pub dpad_right: bool,
    #[packed_field(bits = "21")]
    pub dpad_left: bool,
    #[packed_field(bits = "22")]
    pub dpad_down: bool,
    #[packed_field(bits = "23")]
    pub dpad_up: bool,
    // BYTE 3
    #[packed_field(bits = "24")]
    pub y: bool,
    #[packed_field(bits = "25")]
    pub x: bool,
    #[packed_field(bits = "26")]
    pub b: bool,
    #[packed_field(bits = "27")]
    pub a: bool,
    #[packed_field(bits = "29")]
    pub guide: bool,
    #[packed_field(bits = "30")]
    pub rb: bool,
    #[packed_field(bits = "31")]
    pub lb: bool,

    // Triggers
    // BYTE 4
    #[packed_field(bytes = "4")]
    pub trigger_l: u8,
    // BYTE 5
    #[packed_field(bytes = "5")]
    pub trigger_r: u8,

    // Axes
    // BYTES 6-7
    #[packed_field(bytes = "6..=7", endian = "lsb")]
    pub l_stick_x: Integer<i16, packed_bits::Bits<16>>,
    // BYTES 8-9
    #[packed_field(bytes = "8..=9", endian = "lsb")]
    pub l_stick_y: Integer<i16, packed_bits::Bits<16>>,
    // BYTES 10-11
    #[packed_field(bytes = "10..=11", endian = "lsb")]
    pub r_stick_x: Integer<i16, packed_bits::Bits<16>>,
    // BYTES 12-13
    #[packed_field(bytes = "12..=13", endian = "lsb")]
    pub r_stick_y: Integer<i16, packed_bits::Bits<16>>,

    // BYTES 14-19
    #[packed_field(bytes = "14..=19")]
    pub reserved: [u8; 6],
}

impl Default for XInputReport {
    fn default() -> Self {
        Self {
            report_id: ReportType::Data as u8,
            report_size: INPUT_REPORT_SIZE as u8,
            thumb_r: false,
            thumb_l: false,
            back: false,
            start: false,
            dpad_right: false,
            dpad_left: false,
            dpad_down: false,
            dpad_up: false,
            y: false,
            x: false,
            b: false,
            a: false,
            guide: false,
            rb: false,
            lb: false,
            trigger_l: 0,
            trigger_r: 0,
            l_stick_x: Integer::from_primitive(0),
            l_stick_y: Integer::from_primitive(0),
            r_stick_x: Integer::from_primitive(0),
            r_stick_y: Integer::from_primitive(0),
            reserved: [0; 6],
        }
    }
}

/// Rumble command from the host
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct RumbleReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub report_type: ReportType,
    #[packed_field(bytes = "1")]
    pub report_size: u8,
    #[packed_field(bytes = "3")]
    pub left_speed: u8,
    #[packed_field(bytes = "4")]
    pub right_speed: u8,
}

/// Ring light animations the host can select
#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug)]
pub enum LedPattern {
    Off = 0x00,
    BlinkAll = 0x01,
    FlashOne = 0x02,
    FlashTwo = 0x03,
    FlashThree = 0x04,
    FlashFour = 0x05,
    OnOne = 0x06,
    OnTwo = 0x07,
    OnThree = 0x08,
    OnFour = 0x09,
    Rotate = 0x0a,
    BlinkPrevious = 0x0b,
    SlowBlinkPrevious = 0x0c,
    Alternate = 0x0d,
}

/// LED command from the host
#[derive(PackedStruct, Debug, Copy, Clone, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct LedReport {
    #[packed_field(bytes = "0", ty = "enum")]
    pub report_type: ReportType,
    #[packed_field(bytes = "1")]
    pub report_size: u8,
    #[packed_field(bytes = "2", ty = "enum")]
    pub pattern: LedPattern,
}

/// A decoded message received on the OUT endpoint
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum OutputReport {
    Rumble(RumbleReport),
    Led(LedReport),
}

/// Possible errors decoding an [OutputReport]
#[derive(Error, Debug, PartialEq)]
pub enum OutputReportError {
    #[error("output report is empty")]
    Empty,
    #[error("unknown output report type `{0:#04x}`")]
    UnknownType(u8),
    #[error("output report of type `{report_type:?}` needs {expected} bytes but got {actual}")]
    InvalidSize {
        report_type: ReportType,
        expected: usize,
        actual: usize,
    },
    #[error("unable to unpack output report: {0:?}")]
    PackingError(#[from] PackingError),
}

impl OutputReport {
    /// Decode a message received from the host. Trailing bytes past the
    /// declared report are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, OutputReportError> {
        let Some(first_byte) = data.first() else {
            return Err(OutputReportError::Empty);
        };
        let Some(report_type) = ReportType::from_primitive(*first_byte) else {
            return Err(OutputReportError::UnknownType(*first_byte));
        };

        match report_type {
            ReportType::Data => {
                let buf = Self::sized::<8>(report_type, data)?;
                Ok(Self::Rumble(RumbleReport::unpack(buf)?))
            }
            ReportType::Led => {
                let buf = Self::sized::<3>(report_type, data)?;
                Ok(Self::Led(LedReport::unpack(buf)?))
            }
        }
    }

    fn sized<const N: usize>(
        report_type: ReportType,
        data: &[u8],
    ) -> Result<&[u8; N], OutputReportError> {
        data.get(..N)
            .and_then(|buf| buf.try_into().ok())
            .ok_or(OutputReportError::InvalidSize {
                report_type,
                expected: N,
                actual: data.len(),
            })
    }
}
