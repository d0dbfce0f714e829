//! Performance benchmarks for the link benchmark engine
//!
//! Measures the hot paths of a test run: latency accumulation, wire
//! encoding, result summarising and a complete simulated exchange.

use clap::Parser;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use link_benchmark::{
    cli::Cli,
    config::ConfigParser,
    logging::Logger,
    models::{BenchmarkResult, Config, MacCounters, TestConfiguration, TestResults, TestStatus},
    sim::{run_simulation, SimulationOptions},
    stats::{LatencyStats, TestSummary},
    transport::{Envelope, Frame},
    types::{NetworkAddress, TestMode},
};
use std::hint::black_box;

fn sample_results(count: u32) -> TestResults {
    let mut status = TestStatus::default();
    for i in 0..count {
        status.latency.update(1_000 + i % 500);
    }
    status.acks_lost = count / 100;
    TestResults {
        configuration: Some(TestConfiguration {
            payload_length: 64,
            ack_timeout_ms: 200,
            packet_count: count,
            mode: TestMode::Ack,
        }),
        status,
        local: BenchmarkResult {
            duration_ms: 2_500,
            cpu_utilization: 1_250,
            mac_tx_counters: MacCounters::new(count, count / 50),
            ..BenchmarkResult::default()
        },
        remote: Some(BenchmarkResult {
            duration_ms: 2_500,
            mac_tx_counters: MacCounters::new(count, 0),
            ..BenchmarkResult::default()
        }),
    }
}

/// Benchmark latency accumulation
fn benchmark_latency_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_stats");

    for size in [100u32, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("update", size), size, |b, &size| {
            b.iter(|| {
                let mut stats = LatencyStats::new();
                for sample in 0..size {
                    stats.update(black_box(800 + sample % 700));
                }
                black_box(stats.average())
            })
        });
    }

    group.bench_function("summarise_results", |b| {
        let results = sample_results(1_000);
        b.iter(|| black_box(TestSummary::from_results(black_box(&results))))
    });

    group.finish();
}

/// Benchmark the JSON envelope codec
fn benchmark_wire_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");

    let ping = Envelope {
        src: NetworkAddress(0x0001),
        dst: NetworkAddress(0x0002),
        frame: Frame::Ping {
            sequence: 42,
            ack: true,
            echo: false,
            payload: (0..64u16).map(|i| i as u8).collect(),
        },
    };

    group.bench_function("encode_ping", |b| b.iter(|| black_box(ping.encode())));

    let bytes = ping.encode().unwrap_or_default();
    group.bench_function("decode_ping", |b| b.iter(|| black_box(Envelope::decode(black_box(&bytes)))));

    group.finish();
}

/// Benchmark configuration loading from CLI arguments
fn benchmark_config_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");

    group.bench_function("parse_cli_args", |b| {
        b.iter(|| {
            black_box(Cli::try_parse_from([
                "lbm", "--no-color", "simulate", "--mode", "echo", "-n", "500", "-l", "32",
            ]))
        })
    });

    group.bench_function("validate_config", |b| {
        let config = Config::default();
        b.iter(|| black_box(config.validate()))
    });

    group.bench_function("parse_from_cli", |b| {
        b.iter(|| {
            let cli = Cli::parse_from(["lbm", "--no-color", "simulate", "-n", "10"]);
            black_box(ConfigParser::new(cli).parse())
        })
    });

    group.finish();
}

/// Benchmark complete simulated runs
fn benchmark_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    group.sample_size(10);

    let config = Config::default();
    let logger = Logger::silent("bench");

    for mode in [TestMode::Unidirectional, TestMode::Ack, TestMode::Echo] {
        let options = SimulationOptions {
            test: TestConfiguration {
                payload_length: 64,
                ack_timeout_ms: 50,
                packet_count: 200,
                mode,
            },
            ..SimulationOptions::from_config(&config)
        };
        group.bench_with_input(BenchmarkId::new("run_200", mode.name()), &options, |b, options| {
            b.iter(|| black_box(run_simulation(&config, options, &logger)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_latency_stats,
    benchmark_wire_codec,
    benchmark_config_parsing,
    benchmark_simulation
);
criterion_main!(benches);
