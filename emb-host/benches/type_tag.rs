// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Compares the host's `type-of` with reading the tag out of the handle.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use emb_host::{Env, Value};
use emb_mock::MockHost;

fn samples(env: &Env) -> Vec<Value<'_>> {
    vec![
        env.intern("foo").into_value(),
        env.make_integer(42).into_value(),
        env.make_string("foo").into_value(),
        env.vector((1, "foo", 1.2)).into_value(),
        env.make_float(1.2).into_value(),
    ]
}

fn bench_type_of(c: &mut Criterion) {
    let host = MockHost::new();
    let env = unsafe { Env::from_raw(host.env()) };
    let values = samples(&env);

    let mut group = c.benchmark_group("type_tag");
    group.bench_function("type_of", |b| {
        b.iter(|| {
            for value in &values {
                black_box(black_box(*value).type_of());
            }
        });
    });
    group.bench_function("lisp_type", |b| {
        b.iter(|| {
            for value in &values {
                black_box(black_box(*value).lisp_type());
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_type_of);
criterion_main!(benches);
