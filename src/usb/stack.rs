//! Seams between a USB device stack and the class drivers registered with it.
//!
//! The stack owns enumeration, endpoint zero and transfer scheduling. It
//! calls into a [ClassDriver] at fixed lifecycle points and the driver calls
//! back into the stack through [UsbStack] to open endpoints and move data.
use std::fmt;

use thiserror::Error;

use super::{
    descriptor::{EndpointAddress, EndpointDescriptor},
    request::ControlRequest,
};

/// Errors reported by a USB device stack
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StackError {
    #[error("endpoint {0} could not be opened")]
    EndpointUnavailable(EndpointAddress),
    #[error("endpoint {0} is not open")]
    EndpointClosed(EndpointAddress),
    #[error("endpoint {0} already has a transfer in progress")]
    EndpointBusy(EndpointAddress),
    #[error("endpoint {0} is not waiting for data")]
    EndpointNotArmed(EndpointAddress),
    #[error("transfer of {size} bytes exceeds max packet size {max} on endpoint {endpoint}")]
    PacketTooLarge {
        endpoint: EndpointAddress,
        size: usize,
        max: usize,
    },
}

/// Completion status of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Success,
    Failed,
    Stalled,
    Timeout,
    Invalid,
}

impl fmt::Display for TransferResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferResult::Success => "success",
            TransferResult::Failed => "failed",
            TransferResult::Stalled => "stalled",
            TransferResult::Timeout => "timeout",
            TransferResult::Invalid => "invalid",
        };
        write!(f, "{name}")
    }
}

/// Successful outcome of a driver callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The driver acted on the event
    Processed,
    /// The event is acknowledged but intentionally unhandled. No state changed
    /// and nothing was verified; the stack should fall back to its default.
    Ignored,
}

/// Endpoint primitives a USB device stack offers to class drivers
pub trait UsbStack {
    /// Configure the hardware for the given endpoint
    fn open_endpoint(&mut self, descriptor: &EndpointDescriptor) -> Result<(), StackError>;
    /// Queue `data` for the host on an IN endpoint
    fn transmit(&mut self, endpoint: EndpointAddress, data: &[u8]) -> Result<(), StackError>;
    /// Arm an OUT endpoint to accept up to `len` bytes from the host
    fn receive(&mut self, endpoint: EndpointAddress, len: usize) -> Result<(), StackError>;
    /// Copy the data of a completed OUT transfer into `buf`, returning the
    /// number of bytes copied
    fn read(&mut self, endpoint: EndpointAddress, buf: &mut [u8]) -> Result<usize, StackError>;
}

/// Entry points every class driver provides to the stack
pub trait ClassDriver {
    type Error: std::error::Error;

    /// Name used by the stack when logging
    fn name(&self) -> &str;

    /// Called once when the stack starts
    fn init(&mut self);

    /// Called on USB bus reset
    fn reset(&mut self);

    /// Called when the host selects a configuration containing an interface
    /// this driver may claim. `interface` starts at the interface descriptor
    /// and `max_len` is the number of configuration bytes available from
    /// there. Returns the number of bytes the stack should skip.
    fn open(
        &mut self,
        stack: &mut dyn UsbStack,
        interface: &[u8],
        max_len: u16,
    ) -> Result<u16, Self::Error>;

    /// Called for control requests addressed to the claimed interface
    fn control_request(
        &mut self,
        stack: &mut dyn UsbStack,
        request: &ControlRequest,
    ) -> Result<Disposition, Self::Error>;

    /// Called when the data stage of a control request completes
    fn control_complete(&mut self, request: &ControlRequest) -> Result<Disposition, Self::Error>;

    /// Called when a transfer on one of the driver's endpoints completes
    fn xfer_complete(
        &mut self,
        stack: &mut dyn UsbStack,
        endpoint: EndpointAddress,
        result: TransferResult,
        bytes: u32,
    ) -> Result<Disposition, Self::Error>;
}
