use std::{error::Error, time::Duration};

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};
use tokio::sync::mpsc;

use xinput_gadget::{
    config::XInputConfig,
    drivers::xinput::{
        descriptor::{CONFIGURATION_DESCRIPTOR, INTERFACE_OFFSET},
        driver::{Driver, DriverError},
        report::XInputReport,
    },
    usb::{
        loopback::LoopbackStack,
        stack::{ClassDriver, TransferResult},
    },
};

use super::to_hex;

/// Number of controller snapshots that can be queued for the driver
const BUFFER_SIZE: usize = 32;

/// Rumble command the simulated host sends halfway through
const RUMBLE_COMMAND: [u8; 8] = [0x00, 0x08, 0x00, 0x80, 0x40, 0x00, 0x00, 0x00];

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Transfer")]
    transfer: String,
    #[tabled(rename = "Max Packet")]
    max_packet_size: u16,
    #[tabled(rename = "Interval")]
    interval: u8,
}

/// Open the XInput interface on the given stack
fn open_driver(
    config: &XInputConfig,
    stack: &mut LoopbackStack,
    max_len: Option<u16>,
) -> Result<Driver, DriverError> {
    let mut driver = Driver::new_with_config(config);
    driver.init();
    driver.reset();

    let interface = &CONFIGURATION_DESCRIPTOR[INTERFACE_OFFSET..];
    let max_len = max_len.unwrap_or(interface.len() as u16);
    let consumed = driver.open(stack, interface, max_len)?;
    log::info!("{} driver claimed {consumed} bytes", driver.name());

    Ok(driver)
}

pub fn handle_enumerate(config: &XInputConfig, max_len: Option<u16>) -> Result<(), Box<dyn Error>> {
    let mut stack = LoopbackStack::new();
    let driver = match open_driver(config, &mut stack, max_len) {
        Ok(driver) => driver,
        Err(e) => {
            log::error!("Failed to open XInput interface: {e}");
            return Err(e.into());
        }
    };

    let rows: Vec<EndpointRow> = stack
        .opened_endpoints()
        .iter()
        .map(|endpoint| EndpointRow {
            address: format!("0x{:02x}", endpoint.address),
            direction: endpoint.direction().to_string(),
            transfer: format!("{:?}", endpoint.transfer_type()),
            max_packet_size: endpoint.max_packet_size,
            interval: endpoint.interval,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::modern_rounded()).with(Panel::header(format!(
        "Interface {} Endpoints",
        driver.interface_number().unwrap_or_default()
    )));
    println!("{table}");

    Ok(())
}

pub async fn handle_simulate(config: &XInputConfig, count: usize) -> Result<(), Box<dyn Error>> {
    let mut stack = LoopbackStack::new();
    let mut driver = open_driver(config, &mut stack, None)?;
    let registration = driver.endpoints();
    let (Some(endpoint_in), Some(endpoint_out)) =
        (registration.endpoint_in, registration.endpoint_out)
    else {
        return Err("XInput interface did not register its endpoints".into());
    };

    // Controller state is produced on its own task and handed to the driver
    // owner over a channel.
    let (tx, mut rx) = mpsc::channel::<XInputReport>(BUFFER_SIZE);
    let interval = Duration::from_millis(config.report_interval_ms.max(1));
    let producer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut pressed = false;
        loop {
            ticker.tick().await;
            pressed = !pressed;
            let report = XInputReport {
                a: pressed,
                ..Default::default()
            };
            if tx.send(report).await.is_err() {
                log::debug!("Report receiver closed, stopping producer");
                break;
            }
        }
    });

    let mut sent = 0;
    while sent < count {
        let Some(report) = rx.recv().await else {
            break;
        };
        driver.update_state(report);
        match driver.send_report(&mut stack) {
            Ok(()) => (),
            Err(DriverError::EndpointBusy(_)) => {
                log::debug!("Previous report still in flight, dropping snapshot");
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        // The loopback host acknowledges every report right away
        if let Some(bytes) = stack.host_ack(endpoint_in) {
            driver.xfer_complete(&mut stack, endpoint_in, TransferResult::Success, bytes as u32)?;
        }
        sent += 1;
        if let Some((_, data)) = stack.transmitted().last() {
            println!("{sent:>4} IN  {}", to_hex(data));
        }

        if sent == count / 2 {
            let bytes = stack.host_write(endpoint_out, &RUMBLE_COMMAND)?;
            driver.xfer_complete(&mut stack, endpoint_out, TransferResult::Success, bytes as u32)?;
            if let Some(output) = driver.take_output() {
                println!("     OUT {output:?}");
            }
        }
    }

    drop(rx);
    producer.await?;
    log::info!("Sent {sent} input reports");

    Ok(())
}
