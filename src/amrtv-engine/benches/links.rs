// Copyright 2026 The AMR-TV Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Link layout benchmarks on synthetic sample tables.
//!
//! ## Benchmark groups
//!
//! - `generate_view`: table to view, three link groups, no day limit
//! - `generate_view_mst`: the same with spanning-forest reduction

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use amrtv_engine::{Config, LinkConfig, SampleTable, generate_view};

const SIZES: &[usize] = &[100, 500, 2000];

/// Deterministic table: samples spread over 90 days and 8 wards, sharing
/// values of three link attributes at different cluster sizes.
fn synthetic_table(n: usize) -> SampleTable {
    let header = ["sample_id", "ward", "date", "st", "plasmid", "snp_cluster"].map(String::from);
    let rows: Vec<Vec<String>> = (0..n)
        .map(|i| {
            let day = (i * 37) % 90;
            vec![
                format!("S{i:05}"),
                format!("ward-{}", i % 8),
                format!("2021-{:02}-{:02}", 1 + day / 30, 1 + day % 28),
                format!("{}", i % 11),
                format!("{}", i % 23),
                format!("{}", i % 47),
            ]
        })
        .collect();
    SampleTable::from_rows(&header, "sample_id", &rows)
}

fn config(minimize_loops: bool) -> Config {
    let mut config = Config::new("sample_id", &["ward"], "date");
    config.attr_link_list = ["st", "plasmid", "snp_cluster"]
        .iter()
        .map(|attr| {
            let mut link = LinkConfig::new(attr);
            link.minimize_loops = minimize_loops;
            link
        })
        .collect();
    config
}

fn bench_generate_view(c: &mut Criterion) {
    for (name, minimize_loops) in [("generate_view", false), ("generate_view_mst", true)] {
        let mut group = c.benchmark_group(name);
        group.sample_size(20);
        let config = config(minimize_loops);
        for &n in SIZES {
            let table = synthetic_table(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, table| {
                b.iter(|| generate_view(black_box(table), black_box(&config)));
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_generate_view);
criterion_main!(benches);
