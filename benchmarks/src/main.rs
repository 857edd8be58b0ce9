//! Figlens Benchmark Runner
//!
//! Times the pipeline on generated designs and reports how much smaller the
//! simplified output is than the raw response.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::{Duration, Instant};

use figlens_benchmarks::{generate_file_response, generated_node_count};
use figlens_core::{simplify, DedupMode, SimplifyOptions};

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub nodes: u64,
    pub iterations: u32,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub raw_bytes: usize,
    pub json_bytes: usize,
    pub yaml_bytes: usize,
}

impl BenchmarkResult {
    fn reduction(&self, bytes: usize) -> f64 {
        100.0 * (1.0 - bytes as f64 / self.raw_bytes as f64)
    }
}

#[derive(Debug, Serialize)]
pub struct BenchmarkReport {
    pub version: String,
    pub results: Vec<BenchmarkResult>,
}

fn run_case(
    rt: &tokio::runtime::Runtime,
    name: &str,
    pages: u32,
    cards: u32,
    dedup: DedupMode,
    iterations: u32,
) -> Result<BenchmarkResult> {
    let raw = generate_file_response(pages, cards, 7);
    let options = SimplifyOptions {
        dedup,
        seed: Some(42),
        ..Default::default()
    };

    // Warmup, and the output we measure
    let wire = rt.block_on(simplify(raw.clone(), None, &options))?;
    let raw_bytes = serde_json::to_string(&raw)?.len();
    let json_bytes = serde_json::to_string(&wire)?.len();
    let yaml_bytes = serde_yaml::to_string(&wire)?.len();

    let mut times: Vec<Duration> = Vec::with_capacity(iterations as usize);
    for _ in 0..iterations {
        let input = raw.clone();
        let start = Instant::now();
        let wire = rt.block_on(simplify(input, None, &options))?;
        times.push(start.elapsed());
        std::hint::black_box(wire);
    }

    let times_ms: Vec<f64> = times.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
    let mean_ms = times_ms.iter().sum::<f64>() / times_ms.len().max(1) as f64;
    let min_ms = times_ms.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_ms = times_ms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Ok(BenchmarkResult {
        name: name.to_string(),
        nodes: generated_node_count(pages, cards),
        iterations,
        mean_ms,
        min_ms,
        max_ms,
        raw_bytes,
        json_bytes,
        yaml_bytes,
    })
}

fn print_report(report: &BenchmarkReport) {
    println!("\n======== Figlens Benchmark Report ========");
    println!("Version: {}", report.version);
    println!();
    for r in &report.results {
        println!(
            "  {:<28} {:>6} nodes {:>9.3}ms (min {:.3}, max {:.3})",
            r.name, r.nodes, r.mean_ms, r.min_ms, r.max_ms
        );
        println!(
            "  {:<28} raw {} B -> json {} B ({:.1}% smaller), yaml {} B ({:.1}% smaller)",
            "",
            r.raw_bytes,
            r.json_bytes,
            r.reduction(r.json_bytes),
            r.yaml_bytes,
            r.reduction(r.yaml_bytes)
        );
    }
    println!("\nTotal: {} benchmarks", report.results.len());
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let json_only = args.iter().any(|a| a == "--json-only");

    let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let cases = [
        ("small", 1, 10, DedupMode::InsertionOrder, 50),
        ("medium", 2, 100, DedupMode::InsertionOrder, 20),
        ("large", 4, 500, DedupMode::InsertionOrder, 5),
        ("large (canonical dedup)", 4, 500, DedupMode::Canonical, 5),
    ];

    let mut results = Vec::new();
    for (name, pages, cards, dedup, iterations) in cases {
        if !json_only {
            println!("Running {}...", name);
        }
        results.push(run_case(&rt, name, pages, cards, dedup, iterations)?);
    }

    let report = BenchmarkReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        results,
    };

    if json_only {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
