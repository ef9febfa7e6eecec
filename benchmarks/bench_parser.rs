use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use bulkmt::bulk::Bulk;
use bulkmt::debug::DebugConfig;
use bulkmt::parser::BulkParser;
use bulkmt::worker::Worker;

const LINES: usize = 10_000;

fn flat_input() -> Vec<String> {
    (0..LINES).map(|i| format!("cmd{}", i)).collect()
}

fn nested_input() -> Vec<String> {
    let mut lines = Vec::with_capacity(LINES);
    let mut i = 0;
    while lines.len() < LINES {
        lines.push("{".to_string());
        lines.push(format!("cmd{}", i));
        lines.push("{".to_string());
        lines.push(format!("cmd{}", i + 1));
        lines.push("}".to_string());
        lines.push("}".to_string());
        i += 2;
    }
    lines
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Elements(LINES as u64));

    for (name, input) in [("flat", flat_input()), ("nested", nested_input())] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || input.clone(),
                |lines| {
                    let mut published = 0usize;
                    let mut parser = BulkParser::new(16);
                    parser.subscribe(|bulk: &Bulk| published += bulk.len());
                    let stats = parser.exec(lines);
                    drop(parser);
                    black_box((stats, published))
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_worker_fan_out(c: &mut Criterion) {
    let bulks: Vec<Bulk> = flat_input()
        .chunks(16)
        .map(|chunk| Bulk::from_commands(chunk.to_vec()))
        .collect();

    let mut group = c.benchmark_group("worker");
    group.throughput(Throughput::Elements(bulks.len() as u64));
    group.bench_function("submit_and_drain", |b| {
        b.iter(|| {
            let mut worker = Worker::new("bench", DebugConfig::default(), |_, bulk: Bulk| {
                black_box(bulk.render());
                Ok(())
            })
            .unwrap();
            for bulk in &bulks {
                worker.submit(bulk.clone()).unwrap();
            }
            worker.stop();
            black_box(worker.processed())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_parser, bench_worker_fan_out);
criterion_main!(benches);
