//! HAT EEPROM write / clear / dump against the fake sysfs tree.
//!
//! The write-protect line must end up high after every operation that
//! lowered it, successful or not.

use std::fs;
use std::time::Duration;

use revpi_provisioning::error::{Error, HatEepromError};
use revpi_provisioning::hat::{EepromImage, HatEeprom, Overlay};
use revpi_provisioning::sysfs::Sysfs;

use crate::mock_hw::{Fixture, MockGpio, MockRunner};

fn eeprom(fx: &Fixture, gpio: &MockGpio) -> HatEeprom<MockGpio> {
    HatEeprom::new(28, gpio.clone())
        .with_sysfs(Sysfs::new(fx.sysfs_root()))
        .with_settle_delay(Duration::ZERO)
}

fn image() -> Vec<u8> {
    b"R-Pi\x01\x00\x03\x00revpi-connect-4".to_vec()
}

#[test]
fn write_loads_overlay_writes_and_reprotects() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(256);
    let mut hat = eeprom(&fx, &gpio);

    hat.write(&EepromImage::from(image()), &mut runner).unwrap();

    // requested high, lowered for the write, raised again
    assert_eq!(gpio.requests(), vec![("gpiochip0".to_owned(), 28)]);
    assert_eq!(gpio.levels(), vec![true, false, true]);

    assert_eq!(runner.overlay_loads(), 1);
    assert_eq!(runner.loaded_overlays, vec!["revpi-hat-eeprom"]);

    let contents = fx.read(&fx.eeprom_node());
    assert_eq!(contents.len(), 256);
    assert_eq!(&contents[..image().len()], image().as_slice());
    assert!(contents[image().len()..].iter().all(|&b| b == 0xff));
}

#[test]
fn write_from_image_file() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(128);
    let path = fx.write_file("hat.eep", &image());

    eeprom(&fx, &gpio)
        .write(&EepromImage::from(path.as_path()), &mut runner)
        .unwrap();

    assert_eq!(&fx.read(&fx.eeprom_node())[..image().len()], image().as_slice());
}

#[test]
fn already_loaded_overlay_is_not_reloaded() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(64);
    runner.loaded_overlays.push("revpi-hat-eeprom".to_owned());
    fs::create_dir_all(fx.eeprom_node().parent().unwrap()).unwrap();
    fs::write(fx.eeprom_node(), vec![0xff; 64]).unwrap();

    eeprom(&fx, &gpio)
        .write(&EepromImage::from(image()), &mut runner)
        .unwrap();

    assert_eq!(runner.overlay_loads(), 0);
}

#[test]
fn pi5_overlay_is_loaded_by_name() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(64);

    eeprom(&fx, &gpio)
        .with_overlay(Overlay::RevpiHatEepromPi5)
        .with_gpio_chip("gpiochip4")
        .write(&EepromImage::from(image()), &mut runner)
        .unwrap();

    assert_eq!(runner.loaded_overlays, vec!["revpi-hat-eeprom-pi5"]);
    assert_eq!(gpio.requests(), vec![("gpiochip4".to_owned(), 28)]);
}

#[test]
fn oversized_image_is_rejected_and_reprotected() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(16);

    let err = eeprom(&fx, &gpio)
        .write(&EepromImage::from(vec![0x42; 17]), &mut runner)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::HatEeprom(HatEepromError::ImageTooLarge { image: 17, capacity: 16 })
    ));
    assert_eq!(err.exit_code(), 3);
    assert_eq!(gpio.level(), Some(true));
    // nothing written
    assert!(fx.read(&fx.eeprom_node()).iter().all(|&b| b == 0xff));
}

#[test]
fn missing_node_after_overlay_load_fails_protected() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = MockRunner::new();

    let err = eeprom(&fx, &gpio)
        .write(&EepromImage::from(image()), &mut runner)
        .unwrap_err();

    assert!(matches!(err, Error::HatEeprom(HatEepromError::PathResolution)));
    assert_eq!(gpio.levels(), vec![true, false, true]);
}

#[test]
fn overlay_tool_missing() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(64);
    runner.missing.push("dtoverlay".to_owned());

    let err = eeprom(&fx, &gpio)
        .write(&EepromImage::from(image()), &mut runner)
        .unwrap_err();

    assert!(matches!(err, Error::HatEeprom(HatEepromError::OverlayList(_))));
    assert_eq!(gpio.level(), Some(true));
}

#[test]
fn unreadable_image_file_fails_protected() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(64);

    let err = eeprom(&fx, &gpio)
        .write(&EepromImage::from(fx.dir.path().join("missing.eep")), &mut runner)
        .unwrap_err();

    assert!(matches!(err, Error::HatEeprom(HatEepromError::ImageRead { .. })));
    assert_eq!(gpio.levels(), vec![true, false, true]);
}

#[test]
fn gpio_failure_stops_before_touching_anything() {
    let fx = Fixture::new();
    let gpio = MockGpio::failing();
    let mut runner = fx.runner_with_eeprom(64);

    let err = eeprom(&fx, &gpio)
        .write(&EepromImage::from(image()), &mut runner)
        .unwrap_err();

    assert!(matches!(err, Error::HatEeprom(HatEepromError::GpioAcquire(_))));
    assert!(err.to_string().contains("no such device"));
    assert!(runner.calls.is_empty());
}

#[test]
fn fixed_eeprom_path_skips_scanning() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let node = fx.write_file("eeprom", &[0xff; 64]);
    let mut runner = MockRunner::new();

    let mut hat = eeprom(&fx, &gpio).with_eeprom_path(&node);
    assert_eq!(hat.resolve_eeprom_path().unwrap(), node);
    hat.write(&EepromImage::from(image()), &mut runner).unwrap();

    assert_eq!(&fx.read(&node)[..image().len()], image().as_slice());
}

#[test]
fn eeprom_path_pattern_is_matched() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let devices = fx.sysfs_root().join("bus/i2c/devices");
    for bus in ["12-0050", "4-0050"] {
        fs::create_dir_all(devices.join(bus)).unwrap();
        fs::write(devices.join(bus).join("eeprom"), [0xff; 64]).unwrap();
    }
    let mut runner = MockRunner::new();

    let mut hat = eeprom(&fx, &gpio).with_eeprom_path(devices.join("*-0050/eeprom"));
    assert_eq!(hat.resolve_eeprom_path().unwrap(), devices.join("4-0050/eeprom"));
    hat.write(&EepromImage::from(image()), &mut runner).unwrap();
    let written = fx.read(&devices.join("4-0050/eeprom"));
    assert_eq!(&written[..image().len()], image().as_slice());

    let hat = eeprom(&fx, &gpio).with_eeprom_path(devices.join("?-0051/eeprom"));
    let err = hat.resolve_eeprom_path().unwrap_err();
    assert!(matches!(err, Error::HatEeprom(HatEepromError::PathResolution)));
}

#[test]
fn lowest_one_digit_bus_wins() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    for bus in ["11-0050", "3-0050", "1-0051"] {
        let dir = fx.sysfs_root().join("bus/i2c/devices").join(bus);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("eeprom"), [0xff; 8]).unwrap();
    }

    let hat = eeprom(&fx, &gpio);
    assert_eq!(
        hat.resolve_eeprom_path().unwrap(),
        fx.sysfs_root().join("bus/i2c/devices/3-0050/eeprom")
    );
}

#[test]
fn clear_fills_with_ff() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(32);
    let mut hat = eeprom(&fx, &gpio);

    hat.write(&EepromImage::from(image()), &mut runner).unwrap();
    hat.clear_content(&mut runner).unwrap();

    assert_eq!(fx.read(&fx.eeprom_node()), vec![0xff; 32]);
    // one request, two unprotect/protect cycles
    assert_eq!(gpio.requests().len(), 1);
    assert_eq!(gpio.levels(), vec![true, false, true, false, true]);
}

#[test]
fn dump_copies_contents_without_touching_protection() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(48);
    let output = fx.dir.path().join("dump.eep");

    eeprom(&fx, &gpio).dump(&output, &mut runner).unwrap();

    assert_eq!(fx.read(&output), vec![0xff; 48]);
    assert!(gpio.levels().is_empty());
}

#[test]
fn dump_to_unwritable_output() {
    let fx = Fixture::new();
    let gpio = MockGpio::new();
    let mut runner = fx.runner_with_eeprom(48);
    let output = fx.dir.path().join("no/such/dir/dump.eep");

    let err = eeprom(&fx, &gpio).dump(&output, &mut runner).unwrap_err();
    assert!(matches!(err, Error::HatEeprom(HatEepromError::Dump(_))));
}
