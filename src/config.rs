//! Construction-time configuration for a [`StreamingGraph`](crate::graph::StreamingGraph).

use serde::{Deserialize, Serialize};

use crate::concurrency::current_workers;
use crate::error::{Error, Result};
use crate::pool::MAX_POOL_BLOCKS;
use crate::primitives::{DEFAULT_RADIX_BITS, MAX_RADIX_BITS};

/// Sizing and tuning knobs fixed when a graph is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Number of vertex slots preallocated.
    pub max_vertices: usize,
    /// Number of edge types; valid types are `0..edge_types`.
    pub edge_types: usize,
    /// Number of edge blocks the pool may issue.
    pub max_blocks: usize,
    /// Worker count for batch application; `None` uses the fork-join runtime's thread count.
    pub workers: Option<usize>,
    /// Digit width for radix passes.
    pub radix_bits: u32,
    /// Timestamp given to bulk-loaded edges that carry none.
    pub default_timestamp: i64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_vertices: 1 << 16,
            edge_types: 1,
            max_blocks: 1 << 20,
            workers: None,
            radix_bits: DEFAULT_RADIX_BITS,
            default_timestamp: 0,
        }
    }
}

impl GraphConfig {
    /// Default configuration sized for `max_vertices` vertices.
    pub fn with_vertices(max_vertices: usize) -> Self {
        Self {
            max_vertices,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    /// [`Error::Json`] for malformed JSON, [`Error::InvalidConfig`] for unusable values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(Error::InvalidConfig(msg));
        if self.max_vertices == 0 {
            return bad("max_vertices must be at least 1".into());
        }
        if self.edge_types == 0 {
            return bad("edge_types must be at least 1".into());
        }
        if self.max_blocks == 0 {
            return bad("max_blocks must be at least 1".into());
        }
        if self.max_blocks > MAX_POOL_BLOCKS {
            return bad(format!(
                "max_blocks {} exceeds {MAX_POOL_BLOCKS}",
                self.max_blocks
            ));
        }
        if i64::try_from(self.max_vertices).is_err() {
            return bad(format!(
                "max_vertices {} does not fit a vertex id",
                self.max_vertices
            ));
        }
        if self.max_vertices.checked_mul(self.edge_types).is_none() {
            return bad(format!(
                "max_vertices {} x edge_types {} overflows the chain head table",
                self.max_vertices, self.edge_types
            ));
        }
        if self.workers == Some(0) {
            return bad("workers must be at least 1 when set".into());
        }
        if !(1..=MAX_RADIX_BITS).contains(&self.radix_bits) {
            return bad(format!(
                "radix_bits {} is outside 1..={MAX_RADIX_BITS}",
                self.radix_bits
            ));
        }
        Ok(())
    }

    /// Effective worker count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(current_workers)
    }
}
