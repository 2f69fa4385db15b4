//! Criterion benchmarks for host virtual-key translation.
//!
//! Every remote key event goes through one lookup, so the forward direction
//! must stay a single table index.  The reverse direction is a linear scan
//! used only for diagnostics.
//!
//! Run with:
//! ```bash
//! cargo bench --package cgt-core --bench keymap_bench
//! ```

use cgt_core::keymap::hid::HidKeyCode;
use cgt_core::keymap::KeyMapper;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Windows VK codes covering letters, controls, modifiers and an unmapped code.
const BENCH_VK_CODES: &[u8] = &[
    0x41, // 'A'
    0x5A, // 'Z'
    0x0D, // VK_RETURN
    0x1B, // VK_ESCAPE
    0x20, // VK_SPACE
    0x70, // VK_F1
    0x87, // VK_F24
    0x10, // VK_SHIFT
    0xA3, // VK_RCONTROL
    0x25, // VK_LEFT
    0x60, // VK_NUMPAD0
    0xE2, // VK_OEM_102
    0xE5, // VK_PROCESSKEY, unmapped
];

fn bench_host_to_scancode(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_host_to_scancode");

    group.bench_function("single", |b| {
        b.iter(|| KeyMapper::host_to_scancode(black_box(0x41)))
    });

    group.bench_function("batch_13", |b| {
        b.iter(|| {
            BENCH_VK_CODES
                .iter()
                .map(|&vk| KeyMapper::host_to_scancode(black_box(vk)))
                .collect::<Vec<_>>()
        })
    });

    group.bench_function("full_code_space", |b| {
        b.iter(|| (0u8..=255).map(|vk| KeyMapper::host_to_scancode(black_box(vk))).count())
    });

    group.finish();
}

fn bench_scancode_to_host(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_scancode_to_host");

    for (label, hid) in [
        ("KeyA", HidKeyCode::KeyA),
        ("MetaRight", HidKeyCode::MetaRight),
        ("Unknown", HidKeyCode::Unknown),
    ] {
        group.bench_with_input(BenchmarkId::new("hid_to_vk", label), &hid, |b, &hid| {
            b.iter(|| KeyMapper::scancode_to_host(black_box(hid)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_host_to_scancode, bench_scancode_to_host);
criterion_main!(benches);
