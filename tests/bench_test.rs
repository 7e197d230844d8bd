//! Throughput checks for the URL store
//!
//! Run with: cargo test --release -- --ignored --nocapture bench

use std::time::Instant;

use tempfile::NamedTempFile;

use url_shortener::database::UrlStore;
use url_shortener::random::generate_alias;

/// Benchmark helper to measure execution time
fn benchmark<F>(name: &str, iterations: usize, mut f: F)
where
    F: FnMut(usize),
{
    let start = Instant::now();

    for i in 0..iterations {
        f(i);
    }

    let duration = start.elapsed();
    let avg_ms = duration.as_secs_f64() * 1000.0 / iterations as f64;
    let ops_per_sec = (iterations as f64 / duration.as_secs_f64()) as u64;

    println!("  {} ({} iterations)", name, iterations);
    println!("    Total time: {:?}", duration);
    println!("    Avg time: {:.3}ms", avg_ms);
    println!("    Throughput: {} ops/sec\n", ops_per_sec);
}

#[test]
#[ignore] // Run explicitly with: cargo test bench --release -- --ignored --nocapture
fn bench_save_and_get() {
    println!("\n=== Benchmark: URL store ===\n");

    let temp_db = NamedTempFile::new().unwrap();
    let store = UrlStore::open(temp_db.path().to_str().unwrap()).unwrap();

    let iterations = 1000;
    let aliases: Vec<String> = (0..iterations).map(|i| format!("{}{i}", generate_alias(6))).collect();

    benchmark("Save", iterations, |i| {
        store
            .save_url("https://example.com/bench", &aliases[i])
            .unwrap();
    });

    benchmark("Get", iterations, |i| {
        store.get_url(&aliases[i]).unwrap();
    });
}
