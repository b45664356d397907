//! Criterion benchmarks for Excellon parsing, geometry synthesis and meshing.

use std::fmt::Write as _;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use drillview_wasm::excellon::{parse, ExcellonDocument};
use drillview_wasm::geometry::{fill_geometry, GeometryBuilder};

fn drill_file(hits_per_tool: usize) -> String {
    let mut text = String::from("M48\nMETRIC,LZ,000.000\nT1C0.300\nT2C0.800\nT3C1.200\n%\n");
    for tool in 1..=3 {
        let _ = writeln!(text, "T{tool}");
        for i in 0..hits_per_tool {
            let _ = writeln!(text, "X{:06}Y{:06}", (i % 100) * 2_000, tool * 200_000 + (i / 100) * 2_000);
        }
    }
    text.push_str("T3\nX010000Y010000G85X050000Y010000\nM30\n");
    text
}

fn parse_bench(c: &mut Criterion) {
    let data = drill_file(2_000);
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    group.bench_function("excellon_parse", |b| {
        b.iter(|| black_box(parse(black_box(data.as_bytes()))));
    });

    let Ok(doc) = parse(data.as_bytes()) else {
        return;
    };

    group.bench_function("synthesize", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut d: ExcellonDocument| black_box(d.synthesize()),
            criterion::BatchSize::LargeInput,
        );
    });

    let solid = doc.solid_geometry();
    group.bench_function("mesh", |b| {
        b.iter(|| {
            let mut builder = GeometryBuilder::new();
            black_box(fill_geometry(&mut builder, black_box(&solid)))
        });
    });

    group.finish();
}

criterion_group!(benches, parse_bench);
criterion_main!(benches);
