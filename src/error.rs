//! Error type shared by every fallible operation in the crate.
//!
//! Errors fall in two classes:
//! - **precondition** failures: the caller passed something the operation is not defined for
//!   (empty input, mismatched array lengths, an out-of-range vertex).
//! - **resource** failures: the environment could not satisfy the request (pool exhausted,
//!   unreadable or malformed input files).
//!
//! Reads that race a mutation are not errors either: an extraction whose gathered edge count
//! disagrees with a degree counter logs a warning and returns the rows it could fill.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// All recoverable errors produced by `blockgraph`.
#[derive(Debug, Error)]
pub enum Error {
    /// A primitive that needs at least one element was handed an empty slice.
    #[error("{op} requires a non-empty input")]
    EmptyInput {
        /// Name of the rejecting operation.
        op: &'static str,
    },

    /// Radix width outside the supported range.
    #[error("radix width of {bits} bits is outside 1..={max}")]
    RadixBits {
        /// Requested bit width.
        bits: u32,
        /// Largest supported width.
        max: u32,
    },

    /// Key range too wide to allocate one counter per value.
    #[error("key range [{min}, {max}] cannot be bucketed")]
    KeyRange {
        /// Smallest key.
        min: i64,
        /// Largest key.
        max: i64,
    },

    /// Record stride of zero passed to a strided primitive.
    #[error("record stride must be at least 1")]
    ZeroStride,

    /// Two arrays that must agree in length do not.
    #[error("{what}: expected length {expected}, got {actual}")]
    LengthMismatch {
        /// Which array was wrong.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// CSR offsets that do not start at 0 or decrease somewhere.
    #[error("offsets are not a valid CSR row index (first bad position {at})")]
    InvalidOffsets {
        /// First position where the offsets break.
        at: usize,
    },

    /// Vertex id outside `[0, nv)`.
    #[error("vertex {vertex} is out of range for {nv} vertices")]
    VertexOutOfRange {
        /// Offending id.
        vertex: i64,
        /// Vertex count of the target graph.
        nv: usize,
    },

    /// Edge type outside the configured range.
    #[error("edge type {etype} is out of range for {edge_types} edge types")]
    EdgeTypeOutOfRange {
        /// Offending type.
        etype: i64,
        /// Configured number of types.
        edge_types: usize,
    },

    /// The block pool has no blocks left.
    #[error("edge block pool exhausted ({capacity} blocks)")]
    PoolExhausted {
        /// Pool capacity in blocks.
        capacity: usize,
    },

    /// A configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// File length is not a whole number of 64-bit words.
    #[error("input of {len} bytes is not a multiple of 8")]
    UnalignedFile {
        /// Length in bytes.
        len: usize,
    },

    /// File ends before the data its header declares.
    #[error("{what} truncated: need {needed} words, have {actual}")]
    Truncated {
        /// Which section was short.
        what: &'static str,
        /// Words required.
        needed: usize,
        /// Words present.
        actual: usize,
    },

    /// A header count that is negative.
    #[error("{what} is negative ({value})")]
    NegativeCount {
        /// Which header field.
        what: &'static str,
        /// Value found.
        value: i64,
    },

    /// JSON (de)serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` when the error is a caller-contract violation.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput { .. }
                | Self::RadixBits { .. }
                | Self::KeyRange { .. }
                | Self::ZeroStride
                | Self::LengthMismatch { .. }
                | Self::InvalidOffsets { .. }
                | Self::VertexOutOfRange { .. }
                | Self::EdgeTypeOutOfRange { .. }
                | Self::InvalidConfig(_)
        )
    }

    /// Returns `true` when the error comes from resource exhaustion or malformed input data.
    pub fn is_resource(&self) -> bool {
        !self.is_precondition()
    }

    pub(crate) fn empty(op: &'static str) -> Self {
        Self::EmptyInput { op }
    }

    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::LengthMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let pre = Error::empty("prefix_sum");
        assert!(pre.is_precondition());
        assert!(!pre.is_resource());

        let res = Error::PoolExhausted { capacity: 8 };
        assert!(res.is_resource());
        assert!(!res.is_precondition());

        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(io.is_resource());
    }

    #[test]
    fn check_len_reports_both_sides() {
        assert!(Error::check_len("weights", 3, 3).is_ok());
        let err = Error::check_len("weights", 3, 2).unwrap_err();
        assert_eq!(err.to_string(), "weights: expected length 3, got 2");
    }
}
