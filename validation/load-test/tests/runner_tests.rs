//! End-to-end runs against in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use geo_common::{GeoBounds, GeoError};
use geo_load_test::{BenchConfig, LoadRunner, ResultsReport};
use storage::GeoBackend;
use test_utils::{assert_coords_within, FailingGeoBackend, FlakyGeoBackend, MemoryGeoBackend};

fn config(num: u64, concurrency: u32) -> BenchConfig {
    BenchConfig {
        name: "integration".to_string(),
        addr: "memory".to_string(),
        num,
        concurrency,
        sleep_us: 1_000,
        seed: Some(17),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_seed_then_bench() {
    let backend = Arc::new(MemoryGeoBackend::new());
    let runner = LoadRunner::new(config(3_000, 8));

    let summary = runner
        .run_with(backend.clone(), tokio::time::sleep(Duration::from_millis(3_500)))
        .await
        .unwrap();

    assert_eq!(summary.seeded, 3_000);
    assert_eq!(summary.seed_failures, 0);
    assert_eq!(backend.add_calls(), 3_000);
    assert!(summary.total_requests > 0);
    assert_eq!(summary.total_errors, 0);
    assert!(summary.peak_qps > 0);
    assert!(summary.duration_secs >= 3.5);

    // Every seeded member sits inside the default box.
    let bounds = GeoBounds::default();
    for coord in backend.members(&summary.key) {
        assert_coords_within!(&coord, &bounds);
    }
}

#[tokio::test(start_paused = true)]
async fn test_total_seed_failure_aborts_before_bench() {
    let backend = Arc::new(FailingGeoBackend::new());
    let runner = LoadRunner::new(config(500, 4));

    let err = runner
        .run_with(backend.clone(), tokio::time::sleep(Duration::from_secs(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, GeoError::SeedFailed { attempted: 500, .. }));
    // No GEORADIUS was ever sent.
    assert_eq!(backend.calls(), 500);
}

#[tokio::test(start_paused = true)]
async fn test_errors_are_counted_not_fatal() {
    let backend = Arc::new(FlakyGeoBackend::new(5));
    let runner = LoadRunner::new(config(1_000, 2));

    let summary = runner
        .run_with(backend, tokio::time::sleep(Duration::from_millis(2_200)))
        .await
        .unwrap();

    assert_eq!(summary.seed_failures, 200);
    assert_eq!(summary.seeded, 800);
    assert!(summary.total_errors > 0);
    assert!(summary.total_errors < summary.total_requests);
}

#[tokio::test(start_paused = true)]
async fn test_runs_against_trait_object() {
    let backend: Arc<dyn GeoBackend> = Arc::new(MemoryGeoBackend::new());
    let runner = LoadRunner::new(config(100, 1));

    let summary = runner
        .run_with(backend, tokio::time::sleep(Duration::from_millis(1_100)))
        .await
        .unwrap();

    assert_eq!(summary.seeded, 100);
    let table = ResultsReport::format_table(&summary);
    assert!(table.contains("integration"));
}
