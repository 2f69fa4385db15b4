//! Criterion benchmarks for HID state updates and report serialization.
//!
//! Each input event costs one state update plus one control report, so this
//! is the full per-event cost on the client before the OS write.
//!
//! Run with:
//! ```bash
//! cargo bench --package cgt-core --bench report_bench
//! ```

use cgt_core::hid::{ControlReport, HidReport, KeyboardState, MouseButton, MouseState, Viewport};
use cgt_core::keymap::HidKeyCode;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_keyboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_keyboard");

    group.bench_function("press_release_wrap", |b| {
        let mut state = KeyboardState::new();
        b.iter(|| {
            let _ = state.press(black_box(HidKeyCode::KeyA));
            let pressed = ControlReport::wrap(&HidReport::Keyboard(state.report()));
            state.release(black_box(HidKeyCode::KeyA));
            let released = ControlReport::wrap(&HidReport::Keyboard(state.report()));
            (pressed, released)
        })
    });

    group.bench_function("full_rollover", |b| {
        let keys = [
            HidKeyCode::KeyA,
            HidKeyCode::KeyS,
            HidKeyCode::KeyD,
            HidKeyCode::KeyF,
            HidKeyCode::KeyJ,
            HidKeyCode::KeyK,
            HidKeyCode::KeyL,
        ];
        b.iter(|| {
            let mut state = KeyboardState::new();
            for key in keys {
                let _ = state.press(black_box(key));
            }
            ControlReport::wrap(&HidReport::Keyboard(state.report()))
        })
    });

    group.finish();
}

fn bench_mouse(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_mouse");

    group.bench_function("absolute_move_wrap", |b| {
        let mut mouse = MouseState::new(Viewport::default());
        mouse.press(MouseButton::Left);
        b.iter(|| {
            let pos = mouse.to_logical(black_box(960), black_box(540));
            mouse.set_position(pos.x, pos.y);
            ControlReport::wrap(&HidReport::AbsoluteMouse(mouse.absolute_report(0, 0)))
        })
    });

    group.bench_function("relative_move_wrap", |b| {
        let mouse = MouseState::new(Viewport::default());
        b.iter(|| {
            ControlReport::wrap(&HidReport::RelativeMouse(
                mouse.relative_report(black_box(-12), black_box(7), 0, 0),
            ))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_keyboard, bench_mouse);
criterion_main!(benches);
