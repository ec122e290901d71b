use std::time::Instant;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use chips::emu::Chip8;

/// Counts V0 up forever, drawing a digit glyph every pass.
#[rustfmt::skip]
const COUNTER_ROM: [u8; 14] = [
    0x70, 0x01, // 200: ADD V0, 0x01
    0xF0, 0x29, // 202: LD F, V0
    0xD1, 0x25, // 204: DRW V1, V2, 5
    0x81, 0x04, // 206: ADD V1, V0
    0x30, 0xFF, // 208: SE V0, 0xFF
    0x12, 0x00, // 20A: JP 0x200
    0x12, 0x00, // 20C: JP 0x200
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut chip8 = Chip8::with_seed(0);
    chip8.load(&COUNTER_ROM).unwrap();
    let now = Instant::now();

    c.bench_function("counter 1000 ticks", |b| {
        b.iter(|| {
            for _ in 0..black_box(1000_usize) {
                black_box(chip8.tick_at(now).unwrap());
            }
        })
    });

    c.bench_function("load and init", |b| {
        b.iter(|| {
            chip8.init();
            black_box(chip8.load(black_box(&COUNTER_ROM)).unwrap());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
