use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use eventemitter::{Event, EventEmitter, Nil};

const TEST: Event<(Option<String>, i32, String)> = Event::new("test");

fn bench_emit(c: &mut Criterion) {
    let emitter = EventEmitter::new();
    emitter
        .on(&TEST, |err: Option<String>, num: i32, name: String| {
            let mut name = name;
            for _ in 0..100 {
                name = match &err {
                    None => format!("{name}{num}"),
                    Some(err) => format!("{err}{num}"),
                };
            }
            black_box(name);
        })
        .expect("register benchmark listener");

    c.bench_function("emit_without_error", |b| {
        b.iter(|| emitter.emit_event(&TEST, (Nil, 10, "fun".to_string())))
    });

    c.bench_function("emit_with_error", |b| {
        b.iter(|| emitter.emit_event(&TEST, (Some("Not Fun".to_string()), 10, "fun".to_string())))
    });
}

fn bench_fan_out(c: &mut Criterion) {
    let emitter = EventEmitter::new();
    emitter.set_max_listeners(-1);
    for _ in 0..16 {
        emitter
            .on("wide", |n: u64| {
                black_box(n.wrapping_mul(31));
            })
            .expect("register benchmark listener");
    }

    c.bench_function("emit_16_listeners", |b| b.iter(|| emitter.emit("wide", (black_box(7_u64),))));
}

criterion_group!(benches, bench_emit, bench_fan_out);
criterion_main!(benches);
