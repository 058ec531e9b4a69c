//! Batch messages exchanged with the ingestion boundary.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::{Action, ActionStream};

/// A new or refreshed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeInsertion {
    /// Source vertex.
    pub source: i64,
    /// Destination vertex.
    pub destination: i64,
    /// Weight to store.
    pub weight: i64,
    /// Timestamp of the action.
    pub time: i64,
}

/// An edge to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeDeletion {
    /// Source vertex.
    pub source: i64,
    /// Destination vertex.
    pub destination: i64,
}

/// A group of insertions and deletions applied as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Edge type of every action in the batch.
    pub edge_type: i64,
    /// Also apply every action in the reverse direction.
    pub make_undirected: bool,
    /// `false` tells the receiver that the stream ends after this batch.
    pub keep_alive: bool,
    /// Edges to insert or refresh.
    pub insertions: Vec<EdgeInsertion>,
    /// Edges to remove.
    pub deletions: Vec<EdgeDeletion>,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Batch {
    /// An empty, directed, keep-alive batch of type `edge_type`.
    pub fn new(edge_type: i64) -> Self {
        Self {
            edge_type,
            make_undirected: false,
            keep_alive: true,
            insertions: Vec::new(),
            deletions: Vec::new(),
        }
    }

    /// An empty batch that ends the stream.
    pub fn end_of_stream(edge_type: i64) -> Self {
        Self {
            keep_alive: false,
            ..Self::new(edge_type)
        }
    }

    /// Number of actions as sent (before undirected expansion).
    pub fn len(&self) -> usize {
        self.insertions.len() + self.deletions.len()
    }

    /// Returns `true` if the batch carries no actions.
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.deletions.is_empty()
    }

    /// Parses a batch from JSON.
    ///
    /// # Errors
    /// [`Error::Json`](crate::Error::Json) on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the batch to JSON.
    ///
    /// # Errors
    /// [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ActionStream {
    /// Slices the stream into directed batches of at most `size` actions.
    ///
    /// Insertions get weight 1 and timestamps counting up from `first_time` in stream order.
    /// The last batch has `keep_alive == false`; an empty stream yields one such batch.
    pub fn batches(&self, size: usize, edge_type: i64, first_time: i64) -> Vec<Batch> {
        let size = size.max(1);
        let mut out: Vec<Batch> = self
            .actions
            .chunks(size)
            .enumerate()
            .map(|(c, chunk)| {
                let mut batch = Batch::new(edge_type);
                for (k, &action) in chunk.iter().enumerate() {
                    let (source, destination) = action.endpoints();
                    match action {
                        Action::Insert { .. } => batch.insertions.push(EdgeInsertion {
                            source,
                            destination,
                            weight: 1,
                            time: first_time + (c * size + k) as i64,
                        }),
                        Action::Delete { .. } => batch.deletions.push(EdgeDeletion {
                            source,
                            destination,
                        }),
                    }
                }
                batch
            })
            .collect();
        match out.last_mut() {
            Some(last) => last.keep_alive = false,
            None => out.push(Batch::end_of_stream(edge_type)),
        }
        out
    }
}
