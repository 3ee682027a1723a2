//! Backend selection
//!
//! This module holds the fixed, ordered list of backend servers and the
//! rotation cursor used to hand them out in round-robin order.

use std::sync::Arc;
use tokio::sync::Mutex;

/// A backend chosen for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// Position of the backend in the configured list
    pub index: usize,

    /// Backend address (e.g., "localhost:9001")
    pub addr: String,
}

/// Pool of backend servers with a shared rotation cursor
///
/// Clones share both the list and the cursor, so a single pool built at
/// startup can be handed to every connection handler.
#[derive(Debug, Clone)]
pub struct BackendPool {
    backends: Arc<[String]>,
    cursor: Arc<Mutex<usize>>,
}

impl BackendPool {
    /// Create a pool from an ordered list of backend addresses
    ///
    /// An empty list is rejected here rather than at selection time.
    pub fn new(addrs: Vec<String>) -> anyhow::Result<Self> {
        if addrs.is_empty() {
            anyhow::bail!("Backend pool requires at least one backend");
        }

        Ok(Self {
            backends: addrs.into(),
            cursor: Arc::new(Mutex::new(0)),
        })
    }

    /// Return the backend at the cursor and advance the cursor
    ///
    /// The read and the advance happen under one lock, so the sequence of
    /// picks across all callers is exactly `0, 1, .., len-1, 0, ..` in
    /// lock-acquisition order.
    pub async fn pick_next(&self) -> Backend {
        let mut cursor = self.cursor.lock().await;
        let index = *cursor;
        *cursor = (index + 1) % self.backends.len();

        Backend {
            index,
            addr: self.backends[index].clone(),
        }
    }

    /// Number of configured backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false, a pool cannot be built empty
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Configured backend addresses in rotation order
    pub fn addrs(&self) -> &[String] {
        &self.backends
    }
}
