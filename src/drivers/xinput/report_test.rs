use std::error::Error;

use packed_struct::prelude::*;

use crate::drivers::xinput::report::{
    LedPattern, OutputReport, OutputReportError, ReportType, XInputReport, INPUT_REPORT_SIZE,
};

#[test]
fn test_pack_default_report() -> Result<(), Box<dyn Error>> {
    let report = XInputReport::default();
    let data = report.pack()?;
    assert_eq!(data.len(), INPUT_REPORT_SIZE);
    assert_eq!(data[0], 0x00, "report id");
    assert_eq!(data[1], 0x14, "report size");
    assert!(data[2..].iter().all(|b| *b == 0), "idle report should be zeroed");

    Ok(())
}

#[test]
fn test_pack_buttons() -> Result<(), Box<dyn Error>> {
    let report = XInputReport {
        dpad_up: true,
        start: true,
        ..Default::default()
    };
    let data = report.pack()?;
    assert_eq!(data[2], 0b0001_0001, "dpad up is bit 0 and start is bit 4");
    assert_eq!(data[3], 0x00);

    let report = XInputReport {
        a: true,
        lb: true,
        y: true,
        ..Default::default()
    };
    let data = report.pack()?;
    assert_eq!(data[2], 0x00);
    assert_eq!(data[3], 0b1001_0001, "lb is bit 0, a is bit 4 and y is bit 7");

    Ok(())
}

#[test]
fn test_pack_axes() -> Result<(), Box<dyn Error>> {
    let report = XInputReport {
        trigger_l: 0xff,
        trigger_r: 0x10,
        l_stick_x: Integer::from_primitive(-32768),
        l_stick_y: Integer::from_primitive(32767),
        r_stick_x: Integer::from_primitive(-1),
        r_stick_y: Integer::from_primitive(0x0102),
        ..Default::default()
    };
    let data = report.pack()?;
    assert_eq!(data[4], 0xff);
    assert_eq!(data[5], 0x10);
    assert_eq!(&data[6..8], &[0x00, 0x80], "axes are little endian");
    assert_eq!(&data[8..10], &[0xff, 0x7f]);
    assert_eq!(&data[10..12], &[0xff, 0xff]);
    assert_eq!(&data[12..14], &[0x02, 0x01]);
    assert_eq!(&data[14..], &[0; 6]);

    let unpacked = XInputReport::unpack(&data)?;
    assert_eq!(unpacked.l_stick_x.to_primitive(), -32768);

    Ok(())
}

#[test]
fn test_parse_rumble() -> Result<(), Box<dyn Error>> {
    let data = [0x00, 0x08, 0x00, 0x40, 0xc0, 0x00, 0x00, 0x00];
    let OutputReport::Rumble(rumble) = OutputReport::parse(&data)? else {
        return Err("expected a rumble report".into());
    };
    assert_eq!(rumble.report_type, ReportType::Data);
    assert_eq!(rumble.left_speed, 0x40);
    assert_eq!(rumble.right_speed, 0xc0);

    Ok(())
}

#[test]
fn test_parse_led() -> Result<(), Box<dyn Error>> {
    // Trailing bytes after the command are ignored
    let data = [0x01, 0x03, 0x06, 0xaa, 0xbb];
    let report = OutputReport::parse(&data)?;
    let OutputReport::Led(led) = report else {
        return Err("expected an LED report".into());
    };
    assert_eq!(led.pattern, LedPattern::OnOne);

    Ok(())
}

#[test]
fn test_parse_invalid() {
    assert_eq!(OutputReport::parse(&[]), Err(OutputReportError::Empty));
    assert_eq!(
        OutputReport::parse(&[0x05, 0x03]),
        Err(OutputReportError::UnknownType(0x05))
    );
    assert_eq!(
        OutputReport::parse(&[0x00, 0x08, 0x00]),
        Err(OutputReportError::InvalidSize {
            report_type: ReportType::Data,
            expected: 8,
            actual: 3,
        })
    );
    assert!(
        matches!(
            OutputReport::parse(&[0x01, 0x03, 0x7f]),
            Err(OutputReportError::PackingError(_))
        ),
        "unknown LED patterns should be rejected"
    );
}
