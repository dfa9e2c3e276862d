use std::error::Error;

use crate::usb::{
    descriptor::{EndpointAddress, EndpointDescriptor},
    loopback::LoopbackStack,
    request::{ControlRequest, Recipient, RequestType, SETUP_PACKET_SIZE},
    stack::{StackError, UsbStack},
};

use packed_struct::PackedStruct;

const EP_IN: EndpointAddress = EndpointAddress::new(0x81);
const EP_OUT: EndpointAddress = EndpointAddress::new(0x02);

fn endpoint(address: u8) -> EndpointDescriptor {
    EndpointDescriptor {
        length: 7,
        descriptor_type: 5,
        address,
        attributes: 0x03,
        max_packet_size: 8,
        interval: 4,
    }
}

#[test]
fn test_transmit() -> Result<(), Box<dyn Error>> {
    let mut stack = LoopbackStack::new();
    assert_eq!(
        stack.transmit(EP_IN, &[1, 2]),
        Err(StackError::EndpointClosed(EP_IN))
    );

    stack.open_endpoint(&endpoint(0x81))?;
    stack.transmit(EP_IN, &[1, 2])?;
    assert_eq!(
        stack.transmit(EP_IN, &[3]),
        Err(StackError::EndpointBusy(EP_IN)),
        "second transmit should wait for the host"
    );
    assert_eq!(stack.host_ack(EP_IN), Some(2));
    assert_eq!(stack.host_ack(EP_IN), None);

    let result = stack.transmit(EP_IN, &[0; 9]);
    assert!(matches!(result, Err(StackError::PacketTooLarge { .. })));
    assert_eq!(stack.transmitted().len(), 1);

    Ok(())
}

#[test]
fn test_receive() -> Result<(), Box<dyn Error>> {
    let mut stack = LoopbackStack::new();
    stack.open_endpoint(&endpoint(0x02))?;
    assert_eq!(
        stack.host_write(EP_OUT, &[1]),
        Err(StackError::EndpointNotArmed(EP_OUT))
    );

    stack.receive(EP_OUT, 4)?;
    assert!(stack.is_armed(EP_OUT));
    assert_eq!(stack.host_write(EP_OUT, &[1, 2, 3, 4, 5, 6])?, 4);
    assert!(!stack.is_armed(EP_OUT));

    let mut buf = [0; 8];
    assert_eq!(stack.read(EP_OUT, &mut buf)?, 4);
    assert_eq!(&buf[..4], &[1, 2, 3, 4]);
    assert_eq!(stack.read(EP_OUT, &mut buf)?, 0, "data is only read once");

    Ok(())
}

#[test]
fn test_reject_endpoint() {
    let mut stack = LoopbackStack::new();
    stack.reject_endpoint(EP_IN);
    assert_eq!(
        stack.open_endpoint(&endpoint(0x81)),
        Err(StackError::EndpointUnavailable(EP_IN))
    );
    assert!(stack.opened_endpoints().is_empty());
}

#[test]
fn test_control_request_unpack() -> Result<(), Box<dyn Error>> {
    // Vendor device-to-host request to the interface
    let buf: [u8; SETUP_PACKET_SIZE] = [0xc1, 0x01, 0x00, 0x01, 0x00, 0x00, 0x14, 0x00];
    let request = ControlRequest::unpack(&buf)?;
    assert!(request.device_to_host);
    assert_eq!(request.request_type, RequestType::Vendor);
    assert_eq!(request.recipient(), Recipient::Interface);
    assert_eq!(request.request, 0x01);
    assert_eq!(request.value, 0x0100);
    assert_eq!(request.length, 20);
    assert_eq!(
        request.describe(),
        "IN Vendor to Interface: bRequest=0x01 wValue=0x0100 wIndex=0x0000 wLength=20"
    );

    // Standard SET_INTERFACE
    let buf: [u8; SETUP_PACKET_SIZE] = [0x01, 0x0b, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let request = ControlRequest::unpack(&buf)?;
    assert!(!request.device_to_host);
    assert_eq!(request.request_type, RequestType::Standard);
    assert_eq!(request.pack()?, buf);

    Ok(())
}
