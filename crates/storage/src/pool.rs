//! Connection pool for Redis-protocol stores.
//!
//! Connections are dialed lazily with fixed connect/response timeouts and
//! handed back to a bounded idle list when the borrower is done. Idle
//! connections past `idle_timeout` are discarded, and (optionally) every
//! borrowed connection is checked with a `PING` first.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use redis::aio::MultiplexedConnection;
use redis::{
    AsyncConnectionConfig, Client, ConnectionInfo, IntoConnectionInfo, RedisError, RedisResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use geo_common::{GeoError, GeoResult};

/// Pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// `host:port` or a full `redis://` / `rediss://` URL
    pub addr: String,

    /// Overrides any password embedded in `addr` when non-empty
    #[serde(default)]
    pub password: Option<String>,

    /// Maximum number of idle connections kept around
    pub max_idle: usize,

    /// Idle connections older than this are closed instead of reused
    pub idle_timeout: Duration,

    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,

    /// PING each idle connection before handing it out
    pub test_on_borrow: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            addr: String::new(),
            password: None,
            max_idle: 10,
            idle_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(1),
            read_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(1),
            test_on_borrow: true,
        }
    }
}

impl PoolConfig {
    /// Config for `addr` with default timeouts.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = if password.is_empty() {
            None
        } else {
            Some(password)
        };
        self
    }

    /// Per-command timeout. The client does not distinguish reads from
    /// writes, so the longer of the two applies.
    pub fn response_timeout(&self) -> Duration {
        self.read_timeout.max(self.write_timeout)
    }

    /// Resolve the address and password into client connection info.
    pub fn connection_info(&self) -> GeoResult<ConnectionInfo> {
        let addr = self.addr.trim();
        if addr.is_empty() {
            return Err(GeoError::InvalidConfig("store address is empty".to_string()));
        }

        let url = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{}", addr)
        };

        let mut info = url
            .as_str()
            .into_connection_info()
            .map_err(|e| GeoError::InvalidConfig(format!("invalid store address '{}': {}", addr, e)))?;

        if let Some(password) = &self.password {
            info.redis.password = Some(password.clone());
        }

        Ok(info)
    }
}

/// Pool counters, mostly for startup and shutdown logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub idle: usize,
    pub dialed: u64,
    pub dial_errors: u64,
}

struct IdleConn {
    conn: MultiplexedConnection,
    returned_at: Instant,
}

struct PoolInner {
    client: Client,
    config: PoolConfig,
    idle: Mutex<Vec<IdleConn>>,
    dialed: AtomicU64,
    dial_errors: AtomicU64,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, Vec<IdleConn>> {
        // The idle list holds no invariants a panicking holder could break.
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pop the most recently returned connection that has not expired.
    fn pop_idle(&self) -> Option<MultiplexedConnection> {
        let mut idle = self.idle();
        while let Some(entry) = idle.pop() {
            if entry.returned_at.elapsed() <= self.config.idle_timeout {
                return Some(entry.conn);
            }
            debug!("Dropping expired idle connection");
        }
        None
    }

    fn put_idle(&self, conn: MultiplexedConnection) {
        let mut idle = self.idle();
        if idle.len() < self.config.max_idle {
            idle.push(IdleConn {
                conn,
                returned_at: Instant::now(),
            });
        }
    }
}

/// Shared pool of store connections. Cloning is cheap.
#[derive(Clone)]
pub struct GeoPool {
    inner: Arc<PoolInner>,
}

impl GeoPool {
    /// Create a pool. Nothing is dialed until the first `get`.
    pub fn new(config: PoolConfig) -> GeoResult<Self> {
        let info = config.connection_info()?;
        let client = Client::open(info)
            .map_err(|e| GeoError::InvalidConfig(format!("invalid store address '{}': {}", config.addr, e)))?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                client,
                config,
                idle: Mutex::new(Vec::new()),
                dialed: AtomicU64::new(0),
                dial_errors: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Borrow a connection, reusing an idle one when it is still healthy.
    pub async fn get(&self) -> GeoResult<PooledConnection> {
        while let Some(mut conn) = self.inner.pop_idle() {
            if !self.inner.config.test_on_borrow {
                return Ok(self.wrap(conn));
            }

            let pong: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
            match pong {
                Ok(_) => return Ok(self.wrap(conn)),
                Err(e) => warn!(error = %e, "Ping failed, discarding pooled connection"),
            }
        }

        let conn = self.dial().await?;
        Ok(self.wrap(conn))
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.inner.idle().len(),
            dialed: self.inner.dialed.load(Ordering::Relaxed),
            dial_errors: self.inner.dial_errors.load(Ordering::Relaxed),
        }
    }

    async fn dial(&self) -> GeoResult<MultiplexedConnection> {
        let config = &self.inner.config;
        let result = self
            .inner
            .client
            .get_multiplexed_async_connection_with_config(
                &AsyncConnectionConfig::new()
                    .set_connection_timeout(config.connect_timeout)
                    .set_response_timeout(config.response_timeout()),
            )
            .await;

        match result {
            Ok(conn) => {
                self.inner.dialed.fetch_add(1, Ordering::Relaxed);
                debug!(addr = %config.addr, "Dialed store connection");
                Ok(conn)
            }
            Err(e) => {
                self.inner.dial_errors.fetch_add(1, Ordering::Relaxed);
                warn!(addr = %config.addr, error = %e, "Dial to store failed");
                Err(GeoError::Connection(format!("dial {} failed: {}", config.addr, e)))
            }
        }
    }

    fn wrap(&self, conn: MultiplexedConnection) -> PooledConnection {
        PooledConnection {
            conn: Some(conn),
            pool: self.inner.clone(),
            broken: false,
        }
    }
}

/// A borrowed connection. Goes back to the idle list on drop unless marked broken.
pub struct PooledConnection {
    conn: Option<MultiplexedConnection>,
    pool: Arc<PoolInner>,
    broken: bool,
}

impl PooledConnection {
    /// Map a command error, marking the connection broken if the error came
    /// from the transport.
    pub fn fail(&mut self, err: RedisError) -> GeoError {
        let err = map_redis_error(err);
        if err.is_connection_error() {
            self.broken = true;
        }
        err
    }

    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }
}

impl Deref for PooledConnection {
    type Target = MultiplexedConnection;

    fn deref(&self) -> &Self::Target {
        // Only `Drop` takes the connection out.
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if !self.broken {
                self.pool.put_idle(conn);
            }
        }
    }
}

/// Classify a client error.
pub fn map_redis_error(err: RedisError) -> GeoError {
    if err.is_timeout() {
        GeoError::Timeout
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        GeoError::Connection(err.to_string())
    } else {
        GeoError::Command(err.to_string())
    }
}
