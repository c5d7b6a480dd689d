//! ipsbench Example Benchmarks
//!
//! This example demonstrates ipsbench features and serves as a template for
//! creating your own benchmark binary.
//!
//! Run with:
//!   cargo run --release --example benchmarks                    # Run all groups
//!   cargo run --release --example benchmarks -- --compare       # Add comparisons
//!   cargo run --release --example benchmarks -- --help          # Show all options
//!   cargo run --release --example benchmarks -- list            # List groups and items
//!   cargo run --release --example benchmarks -- "^sort"         # Only items matching a regex

use ipsbench::IpsError;
use ipsbench::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::hint::black_box;

fn main() -> anyhow::Result<()> {
    Harness::new()
        // ====================================================================
        // Single-call items: the harness repeats the closure
        // ====================================================================
        .group("arithmetic", |job| {
            let (x, y) = (42u64, 17u64);
            job.report("add", move || black_box(x) + black_box(y))
                .report("mul", move || black_box(x) * black_box(y))
                .report("div", move || black_box(x) / black_box(y));
        })
        // ====================================================================
        // Batch-aware items: the closure runs its own loop
        // ====================================================================
        .group("collections", |job| {
            job.report_counted("vec_push", |n| {
                let mut v = Vec::new();
                for i in 0..n {
                    v.push(i);
                }
                black_box(v);
            })
            .report_counted("vec_with_capacity", |n| {
                let mut v = Vec::with_capacity(n as usize);
                for i in 0..n {
                    v.push(i);
                }
                black_box(v);
            })
            .compare();
        })
        .group("maps", |job| {
            let keys: Vec<u64> = (0..1_000).collect();
            let hash: HashMap<u64, u64> = keys.iter().map(|&k| (k, k * 2)).collect();
            let btree: BTreeMap<u64, u64> = keys.iter().map(|&k| (k, k * 2)).collect();

            job.report("hashmap_get", move || hash.get(&black_box(500)).copied())
                .report("btreemap_get", move || btree.get(&black_box(500)).copied())
                .compare();
        })
        // ====================================================================
        // Inline source bodies
        // ====================================================================
        .try_group("sorting", sorting)
        .run()
}

/// Inline source bodies; registration can fail, so it lives in its own function
fn sorting(job: &mut BenchmarkJob<'static>) -> Result<(), IpsError> {
    let data: Vec<u64> = (0..256).rev().collect();
    let unstable = data.clone();

    job.report_source("sort", source!(data.clone().sort()))?
        .report_source("sort_unstable", source!(unstable.clone().sort_unstable()))?
        .compare();
    Ok(())
}
