//! Seeding, request workers, and load test orchestration.

use crate::config::BenchConfig;
use crate::generator::CoordinateGenerator;
use crate::metrics::{qps, Counters, RunTotals};
use crate::report::BenchSummary;
use chrono::Utc;
use geo_common::{GeoBounds, GeoError, GeoResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage::{GeoBackend, GeoPool, GeoStore, RadiusQuery};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Reporting interval for the throughput line.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Coordinates handled by each seeding worker, before the cap.
const SEED_BATCH: u64 = 1000;

/// Upper bound on seeding workers.
const MAX_SEED_WORKERS: u64 = 100;

/// A fresh key for this run: the current Unix time in nanoseconds.
pub fn bench_key() -> String {
    let now = Utc::now();
    match now.timestamp_nanos_opt() {
        Some(nanos) => nanos.to_string(),
        None => format!("{}000", now.timestamp_micros()),
    }
}

/// Split `num` inserts across seeding workers.
///
/// One worker per thousand coordinates, between 1 and 100 workers. The
/// shares add up to exactly `num`; the first `num % workers` get one extra.
pub fn seed_plan(num: u64) -> Vec<u64> {
    let workers = (num / SEED_BATCH).clamp(1, MAX_SEED_WORKERS);
    let base = num / workers;
    let extra = num % workers;
    (0..workers)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

/// Outcome of the seeding phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedReport {
    pub key: String,
    pub inserted: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

/// Insert `num` random coordinates into the geo set at `key`.
///
/// Failed inserts are logged and counted. Fails only when every insert failed,
/// or when there is nothing to insert.
pub async fn setup<B>(
    backend: Arc<B>,
    key: &str,
    num: u64,
    bounds: GeoBounds,
    seed: Option<u64>,
) -> GeoResult<SeedReport>
where
    B: GeoBackend + ?Sized + 'static,
{
    if num == 0 {
        return Err(GeoError::InvalidConfig("nothing to seed: num must be > 0".to_string()));
    }

    let begin = Instant::now();
    let failed = Arc::new(AtomicU64::new(0));
    let key: Arc<str> = Arc::from(key);

    let plan = seed_plan(num);
    info!(key = %key, num, workers = plan.len(), "Seeding coordinates");

    let handles: Vec<JoinHandle<()>> = plan
        .into_iter()
        .enumerate()
        .map(|(worker, share)| {
            let backend = backend.clone();
            let key = key.clone();
            let failed = failed.clone();
            tokio::spawn(async move {
                let mut gen = CoordinateGenerator::for_worker(bounds, seed, worker);
                for _ in 0..share {
                    let coord = gen.next_coordinate();
                    if let Err(e) = backend.geo_add(&key, &coord).await {
                        warn!(
                            key = %key,
                            longitude = coord.longitude,
                            latitude = coord.latitude,
                            name = %coord.name,
                            error = %e,
                            "GEOADD failed"
                        );
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    let mut lost = 0u64;
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Seeding worker aborted");
            lost += 1;
        }
    }
    if lost > 0 {
        return Err(GeoError::Internal(format!("{} seeding workers aborted", lost)));
    }

    let failed = failed.load(Ordering::Relaxed);
    if failed == num {
        return Err(GeoError::SeedFailed {
            key: key.to_string(),
            attempted: num,
        });
    }

    let elapsed = begin.elapsed();
    if failed > 0 {
        warn!(key = %key, failed, num, "Seeding finished with failures");
    }
    info!(key = %key, cost = ?elapsed, "Setup finished");

    Ok(SeedReport {
        key: key.to_string(),
        inserted: num - failed,
        failed,
        elapsed,
    })
}

/// Settings shared by every request worker.
#[derive(Debug, Clone, Copy)]
pub struct BenchSettings {
    pub concurrency: u32,
    pub sleep: Duration,
    pub query: RadiusQuery,
    pub bounds: GeoBounds,
    pub seed: Option<u64>,
}

impl From<&BenchConfig> for BenchSettings {
    fn from(config: &BenchConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            sleep: config.sleep(),
            query: config.query,
            bounds: config.bounds,
            seed: config.seed,
        }
    }
}

/// Spawn `concurrency` workers that query `key` forever.
///
/// Each worker issues one radius query at a time, counts the outcome, and
/// sleeps `settings.sleep` between requests. Abort the returned handles to stop.
pub fn bench<B>(
    backend: Arc<B>,
    key: &str,
    settings: BenchSettings,
    counters: Arc<Counters>,
) -> Vec<JoinHandle<()>>
where
    B: GeoBackend + ?Sized + 'static,
{
    let key: Arc<str> = Arc::from(key);
    (0..settings.concurrency as usize)
        .map(|worker| {
            let backend = backend.clone();
            let key = key.clone();
            let counters = counters.clone();
            tokio::spawn(async move {
                // Offset so request workers do not replay the seeding streams.
                let mut gen = CoordinateGenerator::for_worker(
                    settings.bounds,
                    settings.seed,
                    worker + MAX_SEED_WORKERS as usize,
                );
                loop {
                    let center = gen.next_coordinate();
                    match backend
                        .geo_radius(&key, center.longitude, center.latitude, &settings.query)
                        .await
                    {
                        Ok(_) => counters.record_success(),
                        Err(e) => {
                            counters.record_error();
                            warn!(key = %key, error = %e, "Request failed");
                        }
                    }

                    if settings.sleep.is_zero() {
                        // Small yield to prevent tight loop
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(settings.sleep).await;
                    }
                }
            })
        })
        .collect()
}

/// Logs throughput once per interval and resets the counters.
pub struct Reporter {
    counters: Arc<Counters>,
    interval: Duration,
    totals: RunTotals,
}

impl Reporter {
    pub fn new(counters: Arc<Counters>, interval: Duration) -> Self {
        Self {
            counters,
            interval,
            totals: RunTotals::default(),
        }
    }

    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    /// Drain the counters and log one report line.
    pub fn tick(&mut self) {
        let snapshot = self.counters.take();
        let rate = qps(snapshot, self.interval);
        self.totals.record_tick(snapshot, rate);

        let timestamp = Utc::now().to_rfc3339();
        info!(
            timestamp = %timestamp,
            qps = rate,
            err = snapshot.errors,
            "{} qps: {}, err: {}",
            timestamp,
            rate,
            snapshot.errors
        );
    }

    /// Report every interval until `stop` resolves, then return the run totals.
    pub async fn run_until<F>(mut self, stop: F) -> RunTotals
    where
        F: Future<Output = ()>,
    {
        let start = tokio::time::Instant::now();
        let mut ticker = report_ticker(start, self.interval);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = &mut stop => break,
            }
        }

        // Requests finished since the last tick still count towards the totals.
        self.totals.absorb(self.counters.take());
        self.totals.elapsed = start.elapsed();
        self.totals
    }
}

/// Ticks once per `period`, first at `start + period`.
///
/// Ticks missed while the runtime was busy are skipped, not replayed.
fn report_ticker(start: tokio::time::Instant, period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(start + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Resolves after `duration` (if set) or on Ctrl-C, whichever comes first.
pub async fn shutdown_signal(duration: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    match duration {
        Some(d) => {
            tokio::select! {
                _ = tokio::time::sleep(d) => info!(duration = ?d, "Duration elapsed"),
                _ = ctrl_c => info!("Interrupted"),
            }
        }
        None => {
            ctrl_c.await;
            info!("Interrupted");
        }
    }
}

/// Runs a complete seed-then-bench cycle.
pub struct LoadRunner {
    config: BenchConfig,
}

impl LoadRunner {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run against the configured store until the duration elapses or Ctrl-C.
    pub async fn run(&self) -> anyhow::Result<BenchSummary> {
        let pool = GeoPool::new(self.config.pool_config())?;
        let store = Arc::new(GeoStore::new(pool.clone()));

        let stop = shutdown_signal(self.config.duration());
        let mut summary = self.run_with(store, stop).await?;
        summary.pool = Some(pool.stats());
        Ok(summary)
    }

    /// Run against any backend, stopping when `stop` resolves.
    pub async fn run_with<B, F>(&self, backend: Arc<B>, stop: F) -> GeoResult<BenchSummary>
    where
        B: GeoBackend + ?Sized + 'static,
        F: Future<Output = ()>,
    {
        let config = &self.config;
        info!(
            addr = %config.addr,
            concurrency = config.concurrency,
            num = config.num,
            sleep_us = config.sleep_us,
            "redis: {}, concurrency: {}, init coordinates: {}, sleep: {} microsecond",
            config.addr,
            config.concurrency,
            config.num,
            config.sleep_us
        );

        let key = bench_key();
        let seed = match setup(backend.clone(), &key, config.num, config.bounds, config.seed).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Setup failed");
                return Err(e);
            }
        };
        info!("Setup success");

        let counters = Arc::new(Counters::new());
        let workers = bench(backend, &key, BenchSettings::from(config), counters.clone());
        let totals = Reporter::new(counters, REPORT_INTERVAL).run_until(stop).await;

        for worker in &workers {
            worker.abort();
        }

        Ok(BenchSummary::new(config, seed, totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{FailingGeoBackend, FlakyGeoBackend, MemoryGeoBackend};

    #[test]
    fn test_seed_plan_small() {
        assert_eq!(seed_plan(1), vec![1]);
        assert_eq!(seed_plan(999), vec![999]);
    }

    #[test]
    fn test_seed_plan_scales_workers() {
        let plan = seed_plan(5_500);
        assert_eq!(plan.len(), 5);
        assert_eq!(plan.iter().sum::<u64>(), 5_500);
        assert_eq!(plan, vec![1100; 5]);
    }

    #[test]
    fn test_seed_plan_caps_workers_and_keeps_remainder() {
        let plan = seed_plan(100_050);
        assert_eq!(plan.len(), 100);
        assert_eq!(plan.iter().sum::<u64>(), 100_050);
        assert_eq!(plan[0], 1001);
        assert_eq!(plan[49], 1001);
        assert_eq!(plan[50], 1000);
    }

    #[test]
    fn test_bench_key_is_numeric() {
        let key = bench_key();
        assert!(key.parse::<i64>().is_ok());
    }

    #[tokio::test]
    async fn test_setup_inserts_everything() {
        let backend = Arc::new(MemoryGeoBackend::new());
        let report = setup(backend.clone(), "k", 2_500, GeoBounds::default(), Some(11))
            .await
            .unwrap();

        assert_eq!(report.inserted, 2_500);
        assert_eq!(report.failed, 0);
        assert_eq!(backend.add_calls(), 2_500);
    }

    #[tokio::test]
    async fn test_setup_fails_when_every_insert_fails() {
        let backend = Arc::new(FailingGeoBackend::new());
        let err = setup(backend.clone(), "k", 1_200, GeoBounds::default(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, GeoError::SeedFailed { attempted: 1_200, .. }));
        assert_eq!(backend.calls(), 1_200);
    }

    #[tokio::test]
    async fn test_setup_tolerates_partial_failure() {
        let backend = Arc::new(FlakyGeoBackend::new(4));
        let report = setup(backend, "k", 400, GeoBounds::default(), None)
            .await
            .unwrap();

        assert_eq!(report.failed, 100);
        assert_eq!(report.inserted, 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporter_ticks_and_resets() {
        let counters = Arc::new(Counters::new());
        for _ in 0..10 {
            counters.record_success();
        }
        counters.record_error();

        let reporter = Reporter::new(counters.clone(), Duration::from_secs(1));
        let stop = {
            let counters = counters.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(1_500)).await;
                counters.record_success();
                counters.record_success();
                tokio::time::sleep(Duration::from_millis(1_000)).await;
            }
        };
        let totals = reporter.run_until(stop).await;

        assert_eq!(totals.ticks, 2);
        assert_eq!(totals.requests, 13);
        assert_eq!(totals.errors, 1);
        assert_eq!(totals.peak_qps, 11);
        assert_eq!(counters.snapshot().requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bench_workers_count_outcomes() {
        let backend = Arc::new(FlakyGeoBackend::new(2));
        let counters = Arc::new(Counters::new());
        let settings = BenchSettings {
            concurrency: 4,
            sleep: Duration::from_millis(10),
            query: RadiusQuery::default(),
            bounds: GeoBounds::default(),
            seed: Some(1),
        };

        let workers = bench(backend.clone(), "k", settings, counters.clone());
        tokio::time::sleep(Duration::from_millis(95)).await;
        for w in &workers {
            w.abort();
        }

        let snap = counters.snapshot();
        assert_eq!(workers.len(), 4);
        assert!(snap.requests >= 4);
        assert_eq!(snap.requests, backend.calls());
        assert_eq!(snap.errors, backend.calls() / 2);
    }

    #[tokio::test]
    async fn test_setup_nothing_to_seed() {
        let backend = Arc::new(MemoryGeoBackend::new());
        let err = setup(backend.clone(), "k", 0, GeoBounds::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::InvalidConfig(_)));
        assert_eq!(backend.add_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_ticker_skips_missed_ticks() {
        let start = tokio::time::Instant::now();
        let mut ticker = report_ticker(start, Duration::from_secs(1));
        assert_eq!(ticker.missed_tick_behavior(), MissedTickBehavior::Skip);

        // Three ticks are overdue; only one fires right away
        tokio::time::advance(Duration::from_millis(3_500)).await;
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_millis(3_500));

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }
}
