use packed_struct::prelude::*;
use thiserror::Error;

use crate::{
    config::XInputConfig,
    usb::{
        descriptor::{
            DescriptorError, DescriptorIter, DescriptorType, Direction, EndpointAddress,
            ENDPOINT_DESCRIPTOR_SIZE, INTERFACE_DESCRIPTOR_SIZE,
        },
        request::{ControlRequest, Recipient, RequestType},
        stack::{ClassDriver, Disposition, StackError, TransferResult, UsbStack},
    },
};

use super::{
    descriptor::{Descriptors, StringTable, ENDPOINT_PACKET_SIZE, VENDOR_DESCRIPTOR_SIZE},
    report::{OutputReport, XInputReport},
};

/// Name reported to the stack
pub const DRIVER_NAME: &str = "XINPUT";

/// Possible errors raised by the [Driver]
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("interface needs {required} bytes but only {available} are available")]
    InsufficientLength { required: u16, available: u16 },
    #[error("malformed interface descriptor: {0}")]
    MalformedDescriptor(#[from] DescriptorError),
    #[error("failed to open endpoint {endpoint}: {source}")]
    EndpointOpen {
        endpoint: EndpointAddress,
        source: StackError,
    },
    #[error("descriptors ran out after finding {found} of {declared} endpoints")]
    EndpointsExhausted { declared: u8, found: u8 },
    #[error("interface does not declare an {0} endpoint")]
    MissingEndpoint(Direction),
    #[error("interface declares more than one {0} endpoint")]
    DuplicateEndpoint(Direction),
    #[error("unsupported control request: {}", .0.describe())]
    UnsupportedControlRequest(ControlRequest),
    #[error("transfer on endpoint {endpoint} did not succeed: {result}")]
    TransferFailed {
        endpoint: EndpointAddress,
        result: TransferResult,
    },
    #[error("endpoint {0} does not belong to this interface")]
    UnknownEndpoint(EndpointAddress),
    #[error("interface has not been opened")]
    NotConfigured,
    #[error("endpoint {0} still has a report in flight")]
    EndpointBusy(EndpointAddress),
    #[error("usb stack error: {0}")]
    Stack(#[from] StackError),
    #[error("unable to pack report: {0:?}")]
    Packing(#[from] PackingError),
}

/// Endpoint addresses discovered when the interface was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndpointRegistration {
    pub endpoint_in: Option<EndpointAddress>,
    pub endpoint_out: Option<EndpointAddress>,
}

impl EndpointRegistration {
    /// The slot matching the endpoint's direction bit
    fn slot(&mut self, endpoint: EndpointAddress) -> &mut Option<EndpointAddress> {
        match endpoint.direction() {
            Direction::In => &mut self.endpoint_in,
            Direction::Out => &mut self.endpoint_out,
        }
    }

    pub fn contains(&self, endpoint: EndpointAddress) -> bool {
        self.endpoint_in == Some(endpoint) || self.endpoint_out == Some(endpoint)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint_in.is_none() && self.endpoint_out.is_none()
    }
}

/// Class driver for the XInput interface. Owns the descriptor tables, the
/// endpoint registration and the controller state that is sent to the host.
#[derive(Debug)]
pub struct Driver {
    descriptors: Descriptors,
    endpoints: EndpointRegistration,
    interface_number: Option<u8>,
    /// Current controller state
    state: XInputReport,
    /// An input report was queued and the stack has not completed it yet
    in_flight: bool,
    /// Last command received from the host
    output: Option<OutputReport>,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Self::new_with_strings(StringTable::default())
    }

    /// Create a driver reporting the strings from the given configuration
    pub fn new_with_config(config: &XInputConfig) -> Self {
        Self::new_with_strings(StringTable::from(config))
    }

    fn new_with_strings(strings: StringTable) -> Self {
        Self {
            descriptors: Descriptors::new(strings),
            endpoints: EndpointRegistration::default(),
            interface_number: None,
            state: XInputReport::default(),
            in_flight: false,
            output: None,
        }
    }

    pub fn descriptors(&self) -> &Descriptors {
        &self.descriptors
    }

    pub fn endpoints(&self) -> EndpointRegistration {
        self.endpoints
    }

    /// Interface number of the last successfully opened interface
    pub fn interface_number(&self) -> Option<u8> {
        self.interface_number
    }

    pub fn state(&self) -> &XInputReport {
        &self.state
    }

    /// Replace the controller state sent with the next report
    pub fn update_state(&mut self, state: XInputReport) {
        self.state = state;
    }

    /// Returns and clears the last command received from the host
    pub fn take_output(&mut self) -> Option<OutputReport> {
        self.output.take()
    }

    /// Send the current controller state on the IN endpoint
    pub fn send_report(&mut self, stack: &mut dyn UsbStack) -> Result<(), DriverError> {
        let Some(endpoint) = self.endpoints.endpoint_in else {
            return Err(DriverError::NotConfigured);
        };
        if self.in_flight {
            return Err(DriverError::EndpointBusy(endpoint));
        }

        let data = self.state.pack()?;
        stack.transmit(endpoint, &data)?;
        self.in_flight = true;
        log::trace!("Queued input report on endpoint {endpoint}");

        Ok(())
    }

    /// Length claimed by an interface with the given number of endpoints: the
    /// interface header, the vendor block and one descriptor per endpoint.
    pub fn claimed_length(num_endpoints: u8) -> u16 {
        (INTERFACE_DESCRIPTOR_SIZE
            + VENDOR_DESCRIPTOR_SIZE
            + num_endpoints as usize * ENDPOINT_DESCRIPTOR_SIZE) as u16
    }

    /// Walk the sub-descriptors after the interface header, opening every
    /// endpoint until `declared` endpoints were found.
    fn discover_endpoints(
        stack: &mut dyn UsbStack,
        descriptors: &[u8],
        declared: u8,
    ) -> Result<EndpointRegistration, DriverError> {
        let mut registration = EndpointRegistration::default();
        let mut found = 0;
        let mut iter = DescriptorIter::new(descriptors);

        while found < declared {
            let Some(descriptor) = iter.next() else {
                break;
            };
            let descriptor = match descriptor {
                Ok(descriptor) => descriptor,
                // A descriptor running past the available bytes means the
                // buffer was exhausted before all endpoints were seen
                Err(DescriptorError::Truncated { .. }) => break,
                Err(e) => return Err(e.into()),
            };

            match descriptor.descriptor_type() {
                DescriptorType::Endpoint => {
                    let endpoint = descriptor.as_endpoint()?;
                    let address = endpoint.endpoint_address();
                    let slot = registration.slot(address);
                    if slot.is_some() {
                        return Err(DriverError::DuplicateEndpoint(address.direction()));
                    }
                    stack
                        .open_endpoint(&endpoint)
                        .map_err(|source| DriverError::EndpointOpen {
                            endpoint: address,
                            source,
                        })?;
                    *slot = Some(address);
                    found += 1;
                    log::debug!("Opened XInput endpoint {address}");
                }
                // The next interface starts here
                DescriptorType::Interface => break,
                other => {
                    log::trace!(
                        "Skipping {other:?} descriptor of {} bytes at offset {}",
                        descriptor.len(),
                        descriptor.offset
                    );
                }
            }
        }

        if found < declared {
            return Err(DriverError::EndpointsExhausted { declared, found });
        }
        if declared > 0 {
            if registration.endpoint_in.is_none() {
                return Err(DriverError::MissingEndpoint(Direction::In));
            }
            if registration.endpoint_out.is_none() {
                return Err(DriverError::MissingEndpoint(Direction::Out));
            }
        }

        Ok(registration)
    }
}

impl ClassDriver for Driver {
    type Error = DriverError;

    fn name(&self) -> &str {
        DRIVER_NAME
    }

    fn init(&mut self) {
        log::trace!("XInput driver init");
    }

    fn reset(&mut self) {
        log::trace!("XInput driver reset");
    }

    fn open(
        &mut self,
        stack: &mut dyn UsbStack,
        interface: &[u8],
        max_len: u16,
    ) -> Result<u16, DriverError> {
        let Some(header) = DescriptorIter::new(interface).next() else {
            return Err(DescriptorError::Truncated {
                offset: 0,
                length: INTERFACE_DESCRIPTOR_SIZE,
                remaining: interface.len(),
            }
            .into());
        };
        let header = header?;
        let itf = header.as_interface()?;

        let drv_len = Self::claimed_length(itf.num_endpoints);
        if max_len < drv_len {
            log::warn!("XInput interface needs {drv_len} bytes but only {max_len} are available");
            return Err(DriverError::InsufficientLength {
                required: drv_len,
                available: max_len,
            });
        }

        let end = interface.len().min(max_len as usize);
        let sub_descriptors = interface.get(header.len()..end).unwrap_or_default();
        let registration = Self::discover_endpoints(stack, sub_descriptors, itf.num_endpoints)?;

        // Wait for the first command from the host
        if let Some(endpoint) = registration.endpoint_out {
            stack.receive(endpoint, ENDPOINT_PACKET_SIZE)?;
        }

        log::debug!(
            "Opened XInput interface {} with endpoints IN={:02x?} OUT={:02x?}",
            itf.interface_number,
            registration.endpoint_in.map(|e| e.to_u8()),
            registration.endpoint_out.map(|e| e.to_u8())
        );
        self.endpoints = registration;
        self.interface_number = Some(itf.interface_number);
        self.in_flight = false;
        self.output = None;

        Ok(drv_len)
    }

    fn control_request(
        &mut self,
        _stack: &mut dyn UsbStack,
        request: &ControlRequest,
    ) -> Result<Disposition, DriverError> {
        log::trace!("Got control request: {}", request.describe());
        let addressed_here = request.recipient() == Recipient::Interface
            && self.interface_number == Some((request.index & 0xff) as u8);
        if !addressed_here {
            return Err(DriverError::UnsupportedControlRequest(*request));
        }
        match request.request_type {
            // Vendor and class requests are left to the host's default
            // behavior; the controller does not need to answer them.
            RequestType::Vendor | RequestType::Class => Ok(Disposition::Ignored),
            RequestType::Standard | RequestType::Reserved => {
                Err(DriverError::UnsupportedControlRequest(*request))
            }
        }
    }

    fn control_complete(&mut self, request: &ControlRequest) -> Result<Disposition, DriverError> {
        log::trace!("Control request complete: {}", request.describe());
        Ok(Disposition::Ignored)
    }

    fn xfer_complete(
        &mut self,
        stack: &mut dyn UsbStack,
        endpoint: EndpointAddress,
        result: TransferResult,
        bytes: u32,
    ) -> Result<Disposition, DriverError> {
        if !self.endpoints.contains(endpoint) {
            return Err(DriverError::UnknownEndpoint(endpoint));
        }

        if endpoint.direction() == Direction::In {
            self.in_flight = false;
            if result != TransferResult::Success {
                return Err(DriverError::TransferFailed { endpoint, result });
            }
            log::trace!("Sent {bytes} bytes on endpoint {endpoint}");
            return Ok(Disposition::Processed);
        }

        if result != TransferResult::Success {
            stack.receive(endpoint, ENDPOINT_PACKET_SIZE)?;
            return Err(DriverError::TransferFailed { endpoint, result });
        }

        let mut buf = [0; ENDPOINT_PACKET_SIZE];
        let count = stack.read(endpoint, &mut buf)?;
        match OutputReport::parse(&buf[..count]) {
            Ok(report) => {
                log::debug!("Got output report: {report:?}");
                self.output = Some(report);
            }
            Err(e) => {
                log::warn!("Dropping {count} byte output report: {e}");
            }
        }
        stack.receive(endpoint, ENDPOINT_PACKET_SIZE)?;

        Ok(Disposition::Processed)
    }
}
