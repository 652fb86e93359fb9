//! Configuration loading and management.

use geo_common::{DistanceUnit, GeoBounds};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use storage::{PoolConfig, RadiusQuery};

/// Coordinates seeded when none (or zero) is configured.
pub const DEFAULT_NUM: u64 = 100_000;

/// Benchmark configuration, loadable from a YAML scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub name: String,
    pub description: String,
    /// Store address, `host:port` or a `redis://` URL
    pub addr: String,
    pub password: String,
    /// Number of coordinates seeded before the benchmark starts
    pub num: u64,
    /// Concurrent request workers
    pub concurrency: u32,
    /// Pause after each request, in microseconds
    pub sleep_us: u64,
    pub bounds: GeoBounds,
    pub query: RadiusQuery,
    pub seed: Option<u64>, // Optional RNG seed for reproducible runs
    /// Stop after this many seconds; run until interrupted when unset
    pub duration_secs: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            name: "georadius".to_string(),
            description: String::new(),
            addr: String::new(),
            password: String::new(),
            num: DEFAULT_NUM,
            concurrency: 1,
            sleep_us: 0,
            bounds: GeoBounds::default(),
            query: RadiusQuery::default(),
            seed: None,
            duration_secs: None,
        }
    }
}

/// Values given on the command line. Anything set here wins over the scenario.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub addr: Option<String>,
    pub password: Option<String>,
    pub num: Option<u64>,
    pub concurrency: Option<u32>,
    pub sleep_us: Option<u64>,
    pub radius: Option<f64>,
    pub unit: Option<DistanceUnit>,
    pub count: Option<u32>,
    pub seed: Option<u64>,
    pub duration_secs: Option<u64>,
}

impl BenchConfig {
    /// Load configuration from YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BenchConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Layer command-line values on top of this config.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(addr) = overrides.addr {
            self.addr = addr;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(num) = overrides.num {
            self.num = num;
        }
        if let Some(c) = overrides.concurrency {
            self.concurrency = c;
        }
        if let Some(sleep) = overrides.sleep_us {
            self.sleep_us = sleep;
        }
        if let Some(radius) = overrides.radius {
            self.query.radius = radius;
        }
        if let Some(unit) = overrides.unit {
            self.query.unit = unit;
        }
        if let Some(count) = overrides.count {
            self.query.count = count;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        if overrides.duration_secs.is_some() {
            self.duration_secs = overrides.duration_secs;
        }
    }

    /// Zero means "use the default" for the coordinate count and concurrency.
    pub fn normalize(&mut self) {
        if self.num == 0 {
            self.num = DEFAULT_NUM;
        }
        if self.concurrency == 0 {
            self.concurrency = 1;
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.addr.trim().is_empty() {
            anyhow::bail!("store address must be set (--addr or GEO_ADDR)");
        }
        if self.num == 0 {
            anyhow::bail!("num must be > 0");
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be > 0");
        }
        if !(self.query.radius.is_finite() && self.query.radius > 0.0) {
            anyhow::bail!("radius must be a positive number");
        }
        if self.query.count == 0 {
            anyhow::bail!("count must be > 0");
        }
        if self.duration_secs == Some(0) {
            anyhow::bail!("duration_secs must be > 0 when set");
        }
        self.bounds.validate()?;
        Ok(())
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_micros(self.sleep_us)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    /// Pool settings for this run; timeouts stay at the pool defaults.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.addr.clone()).with_password(self.password.clone())
    }
}
