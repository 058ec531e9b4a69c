//! Seeded random edge batches for load generation and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::message::{Batch, EdgeInsertion};

/// Produces undirected insertion batches with uniformly random endpoints in `[0, nv)`.
///
/// Every edge has weight 1 and is stamped with its running line number (1, 2, ...). After
/// `num_batches` batches (if bounded) one empty batch with `keep_alive == false` is produced
/// and the iterator ends.
#[derive(Debug, Clone)]
pub struct RandomEdgeGenerator {
    rng: StdRng,
    nv: u64,
    batch_size: usize,
    edge_type: i64,
    remaining: Option<usize>,
    line: i64,
    done: bool,
}

impl RandomEdgeGenerator {
    /// A generator over `nv` vertices emitting `batch_size` edges per batch, forever.
    ///
    /// # Panics
    /// Panics if `nv == 0`.
    pub fn new(seed: u64, nv: usize, batch_size: usize) -> Self {
        assert!(nv > 0, "random edges need at least one vertex");
        Self {
            rng: StdRng::seed_from_u64(seed),
            nv: nv as u64,
            batch_size,
            edge_type: 0,
            remaining: None,
            line: 0,
            done: false,
        }
    }

    /// Stops after `num_batches` data batches.
    #[must_use]
    pub fn with_batches(mut self, num_batches: usize) -> Self {
        self.remaining = Some(num_batches);
        self
    }

    /// Tags every batch with `edge_type`.
    #[must_use]
    pub fn with_edge_type(mut self, edge_type: i64) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Number of edges generated so far.
    pub fn edges_generated(&self) -> i64 {
        self.line
    }

    fn next_batch(&mut self) -> Batch {
        let mut batch = Batch::new(self.edge_type);
        batch.make_undirected = true;
        batch.insertions.reserve(self.batch_size);
        for _ in 0..self.batch_size {
            self.line += 1;
            batch.insertions.push(EdgeInsertion {
                source: self.rng.gen_range(0..self.nv) as i64,
                destination: self.rng.gen_range(0..self.nv) as i64,
                weight: 1,
                time: self.line,
            });
        }
        batch
    }
}

impl Iterator for RandomEdgeGenerator {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.done {
            return None;
        }
        match &mut self.remaining {
            Some(0) => {
                self.done = true;
                let mut last = Batch::end_of_stream(self.edge_type);
                last.make_undirected = true;
                Some(last)
            }
            Some(n) => {
                *n -= 1;
                Some(self.next_batch())
            }
            None => Some(self.next_batch()),
        }
    }
}
