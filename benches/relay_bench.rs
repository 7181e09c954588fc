//! Benchmarks for the per-beat hot path.
//!
//! Run with: cargo bench
//!
//! The clock thread pays for `notify` and the hit-beat check on every beat;
//! the renderer pays for draining and laying out markers every frame. Both
//! should be far below a millisecond.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use metrognome::beat::BeatFilter;
use metrognome::display::{beat_marker, DisplayBuffer};
use metrognome::engine::{Click, ClickVoice, Sound};
use metrognome::meter::TimeSignature;
use metrognome::relay::TickRelay;

/// Common buffer sizes used in audio applications.
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

fn bench_relay(c: &mut Criterion) {
    let mut group = c.benchmark_group("relay");
    let signature = Arc::new(TimeSignature::new(4, 4, 120));

    let (mut notifier, mut receiver) = TickRelay::new(4, Arc::clone(&signature)).unwrap();
    group.bench_function("notify_drain", |b| {
        b.iter(|| {
            for beat in 1..=4 {
                notifier.notify(black_box(beat));
            }
            receiver.drain(|event| {
                black_box(event);
            })
        })
    });

    // Queue stays full: every notify takes the drop path
    let (mut notifier, _receiver) = TickRelay::new(1, signature).unwrap();
    notifier.notify(1);
    group.bench_function("notify_full", |b| b.iter(|| notifier.notify(black_box(2))));

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("beat_filter");

    for measure in [4u32, 12] {
        let filter = BeatFilter::every_beat(measure).into_tick_filter();
        group.bench_with_input(BenchmarkId::new("matches", measure), &measure, |b, &m| {
            b.iter(|| (1..=m).filter(|&beat| filter(black_box(beat))).count())
        });
    }

    group.finish();
}

fn bench_display(c: &mut Criterion) {
    let mut group = c.benchmark_group("display");

    let mut buffer = DisplayBuffer::new(80);
    group.bench_function("append", |b| {
        b.iter(|| {
            for beat in 1..=4u32 {
                buffer.append(black_box(&beat_marker(beat, beat == 4)));
            }
        })
    });

    let mut buffer = DisplayBuffer::new(16);
    for _ in 0..8 {
        buffer.append("1 ");
    }
    group.bench_function("wrapped", |b| b.iter(|| black_box(buffer.wrapped().len())));

    group.finish();
}

fn bench_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("click");

    for &size in BLOCK_SIZES {
        for sound in Sound::ALL {
            let mut voice = ClickVoice::new(sound, 48_000.0);
            let mut output = vec![0.0f32; size * 2];
            group.bench_with_input(BenchmarkId::new(sound.name(), size), &size, |b, _| {
                b.iter(|| {
                    voice.trigger(Click {
                        accent: true,
                        pan: 0.0,
                    });
                    voice.render_interleaved(black_box(&mut output), 2)
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_relay, bench_filter, bench_display, bench_click);
criterion_main!(benches);
