//! Integration tests for the keyboard and mouse state machines.
//!
//! These go through the public API only and check the properties the virtual
//! HID driver relies on: rollover limits, idempotent release, and reports
//! that depend on nothing but the resulting state.

use cgt_core::hid::{
    ControlReport, HidError, HidReport, KeyboardReport, KeyboardState, MouseButton, MouseState, Viewport,
    MAX_KEY_CODES,
};
use cgt_core::keymap::{HidKeyCode, KeyMapper};

/// Applies a press/release script and returns the final control report.
fn replay(script: &[(bool, HidKeyCode)]) -> [u8; 64] {
    let mut state = KeyboardState::new();
    state.reset();
    for &(down, key) in script {
        if down {
            let _ = state.press(key);
        } else {
            state.release(key);
        }
    }
    ControlReport::wrap(&HidReport::Keyboard(state.report()))
}

#[test]
fn test_scenario_shift_a() {
    // Arrange
    let mut state = KeyboardState::new();
    state.reset();

    // Act
    state.press(HidKeyCode::ShiftLeft).unwrap();
    state.press(HidKeyCode::KeyA).unwrap();
    let held = state.report();
    state.release(HidKeyCode::KeyA);
    let released = state.report();

    // Assert
    assert_eq!(
        held,
        KeyboardReport {
            modifiers: 0x02,
            key_codes: [0x04, 0, 0, 0, 0, 0]
        }
    );
    assert_eq!(
        released,
        KeyboardReport {
            modifiers: 0x02,
            key_codes: [0; MAX_KEY_CODES]
        }
    );
}

#[test]
fn test_scenario_absolute_drag() {
    let mut mouse = MouseState::new(Viewport::default());

    mouse.set_position(1000, 1000);
    mouse.press(MouseButton::Left);
    mouse.set_position(1000, 1000);
    mouse.set_position(1200, 1000);

    let report = mouse.absolute_report(0, 0);
    assert_eq!(report.buttons & MouseButton::Left.bit(), MouseButton::Left.bit());
    assert_eq!((report.x, report.y), (1200, 1000));
}

#[test]
fn test_release_of_any_unheld_scancode_is_a_no_op() {
    for raw in 0u8..=255 {
        let key = HidKeyCode::from_u8(raw);
        let mut state = KeyboardState::new();
        state.press(HidKeyCode::KeyQ).unwrap();
        state.press(HidKeyCode::AltLeft).unwrap();
        if state.is_held(key) {
            continue;
        }
        let before = state;

        state.release(key);

        assert_eq!(state, before, "releasing {key:?} changed the state");
    }
}

#[test]
fn test_releasing_a_modifier_with_none_held_is_a_no_op() {
    let mut state = KeyboardState::new();
    state.release(HidKeyCode::ControlRight);
    assert_eq!(state.modifiers(), 0);
}

#[test]
fn test_rollover_boundary_is_six_keys() {
    let keys = [
        HidKeyCode::KeyA,
        HidKeyCode::KeyS,
        HidKeyCode::KeyD,
        HidKeyCode::KeyF,
        HidKeyCode::KeyJ,
        HidKeyCode::KeyK,
    ];
    let mut state = KeyboardState::new();
    for key in keys {
        assert!(state.press(key).is_ok());
    }
    let full = state;

    assert_eq!(
        state.press(HidKeyCode::KeyL),
        Err(HidError::Rollover {
            rejected: HidKeyCode::KeyL
        })
    );
    assert_eq!(state, full);
}

#[test]
fn test_reports_are_a_pure_function_of_the_script() {
    let script = [
        (true, HidKeyCode::ControlLeft),
        (true, HidKeyCode::KeyC),
        (true, HidKeyCode::KeyV),
        (false, HidKeyCode::KeyC),
        (true, HidKeyCode::Enter),
        (false, HidKeyCode::Unknown),
        (true, HidKeyCode::KeyC),
    ];

    let first = replay(&script);
    let second = replay(&script);

    // Enter refills the slot C vacated; the second C takes the next free one.
    assert_eq!(first, second);
    assert_eq!(
        ControlReport::parse(&first),
        Ok(HidReport::Keyboard(KeyboardReport {
            modifiers: 0x01,
            key_codes: [
                HidKeyCode::Enter.as_u8(),
                HidKeyCode::KeyV.as_u8(),
                HidKeyCode::KeyC.as_u8(),
                0,
                0,
                0
            ],
        }))
    );
}

#[test]
fn test_every_host_code_maps_to_a_valid_scancode_or_nothing() {
    for vk in 0u8..=255 {
        let key = KeyMapper::host_to_scancode(vk);
        let mut state = KeyboardState::new();

        let result = state.press(key);

        assert!(result.is_ok(), "vk 0x{vk:02X} failed to press");
        if key == HidKeyCode::Unknown {
            assert_eq!(state, KeyboardState::new(), "vk 0x{vk:02X} should be absorbed");
        } else {
            assert!(state.is_held(key), "vk 0x{vk:02X} should hold {key:?}");
        }
    }
}
