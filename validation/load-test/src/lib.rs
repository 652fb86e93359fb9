//! Load testing harness for Redis-protocol geo stores.
//!
//! This crate provides tools to:
//! - Seed a fresh geo set with random coordinates
//! - Hammer it with concurrent `GEORADIUS` queries
//! - Report throughput and errors once per second
//! - Summarize a run as a table, JSON, or CSV

pub mod config;
pub mod generator;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::{BenchConfig, ConfigOverrides};
pub use generator::CoordinateGenerator;
pub use metrics::{Counters, RunTotals, TickSnapshot};
pub use report::{BenchSummary, OutputFormat, ResultsReport};
pub use runner::{bench, setup, BenchSettings, LoadRunner, Reporter, SeedReport};
