use std::collections::HashSet;

use super::{
    descriptor::{EndpointAddress, EndpointDescriptor},
    stack::{StackError, UsbStack},
};

#[derive(Debug, Clone)]
struct EndpointState {
    descriptor: EndpointDescriptor,
    /// An IN transfer was queued and has not been completed by the host
    in_flight: bool,
    /// Number of bytes an OUT endpoint is armed to accept
    armed: Option<usize>,
    /// Data of the last completed OUT transfer, until read by the driver
    received: Option<Vec<u8>>,
}

/// In-memory USB device stack where the "host" is driven directly by the
/// caller. Used to exercise class drivers without real hardware.
#[derive(Debug, Default)]
pub struct LoopbackStack {
    endpoints: Vec<EndpointState>,
    unavailable: HashSet<EndpointAddress>,
    transmitted: Vec<(EndpointAddress, Vec<u8>)>,
}

impl LoopbackStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make any future attempt to open the given endpoint fail
    pub fn reject_endpoint(&mut self, endpoint: EndpointAddress) {
        self.unavailable.insert(endpoint);
    }

    /// Endpoints opened so far, in the order they were opened
    pub fn opened_endpoints(&self) -> Vec<EndpointDescriptor> {
        self.endpoints.iter().map(|e| e.descriptor).collect()
    }

    /// Every packet queued on an IN endpoint, oldest first
    pub fn transmitted(&self) -> &[(EndpointAddress, Vec<u8>)] {
        self.transmitted.as_slice()
    }

    /// Returns true if the OUT endpoint is waiting for host data
    pub fn is_armed(&self, endpoint: EndpointAddress) -> bool {
        self.state(endpoint).and_then(|e| e.armed).is_some()
    }

    /// Acknowledge the pending IN transfer on the given endpoint as the host
    /// would. Returns the number of bytes transferred, or None if nothing was
    /// in flight.
    pub fn host_ack(&mut self, endpoint: EndpointAddress) -> Option<usize> {
        let state = self.state_mut(endpoint)?;
        if !state.in_flight {
            return None;
        }
        state.in_flight = false;
        self.transmitted
            .iter()
            .rev()
            .find(|(ep, _)| *ep == endpoint)
            .map(|(_, data)| data.len())
    }

    /// Deliver host data to an armed OUT endpoint. Data beyond the armed
    /// length is dropped. Returns the number of bytes accepted.
    pub fn host_write(
        &mut self,
        endpoint: EndpointAddress,
        data: &[u8],
    ) -> Result<usize, StackError> {
        let state = self
            .state_mut(endpoint)
            .ok_or(StackError::EndpointClosed(endpoint))?;
        let Some(len) = state.armed.take() else {
            return Err(StackError::EndpointNotArmed(endpoint));
        };
        let accepted = len.min(data.len());
        state.received = Some(data[..accepted].to_vec());
        Ok(accepted)
    }

    fn state(&self, endpoint: EndpointAddress) -> Option<&EndpointState> {
        self.endpoints
            .iter()
            .find(|e| e.descriptor.endpoint_address() == endpoint)
    }

    fn state_mut(&mut self, endpoint: EndpointAddress) -> Option<&mut EndpointState> {
        self.endpoints
            .iter_mut()
            .find(|e| e.descriptor.endpoint_address() == endpoint)
    }
}

impl UsbStack for LoopbackStack {
    fn open_endpoint(&mut self, descriptor: &EndpointDescriptor) -> Result<(), StackError> {
        let address = descriptor.endpoint_address();
        if self.unavailable.contains(&address) {
            return Err(StackError::EndpointUnavailable(address));
        }
        log::trace!("Opening loopback endpoint {address}");

        // Reopening an endpoint replaces its configuration
        self.endpoints
            .retain(|e| e.descriptor.endpoint_address() != address);
        self.endpoints.push(EndpointState {
            descriptor: *descriptor,
            in_flight: false,
            armed: None,
            received: None,
        });

        Ok(())
    }

    fn transmit(&mut self, endpoint: EndpointAddress, data: &[u8]) -> Result<(), StackError> {
        let state = self
            .state_mut(endpoint)
            .ok_or(StackError::EndpointClosed(endpoint))?;
        if state.in_flight {
            return Err(StackError::EndpointBusy(endpoint));
        }
        let max = state.descriptor.max_packet_size as usize;
        if data.len() > max {
            return Err(StackError::PacketTooLarge {
                endpoint,
                size: data.len(),
                max,
            });
        }
        state.in_flight = true;
        self.transmitted.push((endpoint, data.to_vec()));

        Ok(())
    }

    fn receive(&mut self, endpoint: EndpointAddress, len: usize) -> Result<(), StackError> {
        let state = self
            .state_mut(endpoint)
            .ok_or(StackError::EndpointClosed(endpoint))?;
        // Re-arming an armed endpoint only updates the accepted length
        state.armed = Some(len);

        Ok(())
    }

    fn read(&mut self, endpoint: EndpointAddress, buf: &mut [u8]) -> Result<usize, StackError> {
        let state = self
            .state_mut(endpoint)
            .ok_or(StackError::EndpointClosed(endpoint))?;
        let Some(data) = state.received.take() else {
            return Ok(0);
        };
        let count = data.len().min(buf.len());
        buf[..count].copy_from_slice(&data[..count]);

        Ok(count)
    }
}
