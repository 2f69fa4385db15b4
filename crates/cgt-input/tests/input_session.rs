//! End-to-end input sessions: client ─▶ transport ─▶ mock HID device.
//!
//! Every assertion decodes the control reports that actually reached the
//! mock device's control interface.

use cgt_core::hid::{AbsoluteMouseReport, ControlReport, HidError, HidReport, KeyboardReport, MouseButton, Viewport};
use cgt_core::keymap::HidKeyCode;
use cgt_input::infrastructure::hid_transport::mock::{MockHidBackend, VIRTUAL_CONTROL, VIRTUAL_MESSAGE};
use cgt_input::{Command, VirtualHidClient, VirtualHidTransport};

fn open_client(backend: &MockHidBackend) -> VirtualHidClient<VirtualHidTransport> {
    let transport = VirtualHidTransport::open(&Default::default(), backend, backend).unwrap();
    VirtualHidClient::new(transport, Viewport::default()).unwrap()
}

fn reports(backend: &MockHidBackend) -> Vec<HidReport> {
    backend
        .written(VIRTUAL_CONTROL)
        .iter()
        .map(|bytes| ControlReport::parse(bytes).unwrap())
        .collect()
}

fn keyboard(modifiers: u8, key_codes: [u8; 6]) -> HidReport {
    HidReport::Keyboard(KeyboardReport { modifiers, key_codes })
}

fn absolute(buttons: u8, x: u16, y: u16) -> HidReport {
    HidReport::AbsoluteMouse(AbsoluteMouseReport {
        buttons,
        x,
        y,
        hwheel: 0,
        vwheel: 0,
    })
}

#[test]
fn test_shifted_key_press_and_release() {
    // Arrange
    let backend = MockHidBackend::with_virtual_device();
    let mut client = open_client(&backend);
    client.reset().unwrap();

    // Act
    client.press(HidKeyCode::ShiftLeft).unwrap();
    client.press(HidKeyCode::KeyA).unwrap();
    let after_press = *reports(&backend).last().unwrap();
    client.release(HidKeyCode::KeyA).unwrap();
    let after_release = *reports(&backend).last().unwrap();

    // Assert
    assert_eq!(after_press, keyboard(0x02, [HidKeyCode::KeyA.as_u8(), 0, 0, 0, 0, 0]));
    assert_eq!(after_release, keyboard(0x02, [0; 6]));
    assert!(backend.written(VIRTUAL_MESSAGE).is_empty());
}

#[test]
fn test_drag_keeps_button_held_across_moves() {
    // Arrange
    let backend = MockHidBackend::with_virtual_device();
    let mut client = open_client(&backend);
    let before = reports(&backend).len();

    // Act
    let mut pointer = client.absolute();
    pointer.move_to(1000, 1000).unwrap();
    pointer.button_press(MouseButton::Left, 1000, 1000).unwrap();
    pointer.move_to(1200, 1000).unwrap();

    // Assert
    let written = reports(&backend);
    assert_eq!(
        written[before..],
        [absolute(0, 1000, 1000), absolute(1, 1000, 1000), absolute(1, 1200, 1000)]
    );
}

#[test]
fn test_dropping_client_releases_held_input() {
    let backend = MockHidBackend::with_virtual_device();
    let mut client = open_client(&backend);
    client.press(HidKeyCode::KeyW).unwrap();
    client.absolute().button_press(MouseButton::Right, 50, 60).unwrap();

    drop(client);

    let written = reports(&backend);
    let tail = &written[written.len() - 2..];
    assert_eq!(tail, [keyboard(0, [0; 6]), absolute(0, 0, 0)]);
}

#[test]
fn test_commands_drive_the_device() {
    // Arrange
    let backend = MockHidBackend::with_virtual_device();
    let mut client = open_client(&backend);
    let script = "press 0xA0\npress 0x41\nrelease 0x41\nrelease 0xA0\nmove 1919 1079\nclick left\n";

    // Act
    for line in script.lines() {
        let command = Command::parse(line).unwrap().unwrap();
        command.apply(&mut client).unwrap();
    }

    // Assert
    let written = reports(&backend);
    let a = HidKeyCode::KeyA.as_u8();
    assert_eq!(
        written[1..],
        [
            keyboard(0x02, [0; 6]),
            keyboard(0x02, [a, 0, 0, 0, 0, 0]),
            keyboard(0x02, [0; 6]),
            keyboard(0, [0; 6]),
            absolute(0, 0x7FFF, 0x7FFF),
            absolute(1, 0x7FFF, 0x7FFF),
            absolute(0, 0x7FFF, 0x7FFF),
        ]
    );
}

#[test]
fn test_failed_write_reports_os_code_and_recovers() {
    // Arrange
    let backend = MockHidBackend::with_virtual_device();
    let mut client = open_client(&backend);
    backend.fail_writes(Some(31));

    // Act
    let failed = client.press(HidKeyCode::KeyG);
    backend.fail_writes(None);
    client.press(HidKeyCode::KeyQ).unwrap();

    // Assert: the failed press stayed in the state and rides along.
    assert_eq!(failed, Err(HidError::Transport { code: 31 }));
    assert_eq!(
        *reports(&backend).last().unwrap(),
        keyboard(0, [HidKeyCode::KeyG.as_u8(), HidKeyCode::KeyQ.as_u8(), 0, 0, 0, 0])
    );
}
