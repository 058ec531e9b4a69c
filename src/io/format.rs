//! Binary graph and action files.
//!
//! Both formats are flat arrays of 64-bit words. Word 0 is [`ENDIAN_CHECK`]; if it does not
//! read back as that value in little-endian order, the whole file is read big-endian.
//!
//! Graph file: `[magic, nv, ne, offsets[nv + 1], ind[ne], weight[ne]]`.
//!
//! Action file: `[magic, naction, (source, destination) * naction]`; a pair whose two fields
//! are both bitwise complemented is a deletion.
//!
//! Trailing words beyond what the header declares are ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zerocopy::byteorder::{BigEndian, ByteOrder, LittleEndian, I64};
use zerocopy::{AsBytes, Ref};

use super::runtime;
use crate::config::GraphConfig;
use crate::csr::{csr_to_graph, CsrSnapshot};
use crate::error::{Error, Result};
use crate::graph::StreamingGraph;

/// Magic word used to detect the byte order of a file.
pub const ENDIAN_CHECK: i64 = 0x1234_ABCD;

const WORD: usize = core::mem::size_of::<i64>();

/// A decoded graph file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFile {
    /// Number of vertices.
    pub nv: usize,
    /// Number of edges.
    pub ne: usize,
    /// Row boundaries, length `nv + 1`.
    pub offsets: Vec<usize>,
    /// Destinations.
    pub ind: Vec<i64>,
    /// Weights.
    pub weight: Vec<i64>,
}

/// One entry of an action file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Add (or refresh) an edge.
    Insert {
        /// Source vertex.
        source: i64,
        /// Destination vertex.
        destination: i64,
    },
    /// Remove an edge.
    Delete {
        /// Source vertex.
        source: i64,
        /// Destination vertex.
        destination: i64,
    },
}

impl Action {
    fn decode(a: i64, b: i64) -> Self {
        if a < 0 && b < 0 {
            Self::Delete {
                source: !a,
                destination: !b,
            }
        } else {
            Self::Insert {
                source: a,
                destination: b,
            }
        }
    }

    fn encode(self) -> [i64; 2] {
        match self {
            Self::Insert {
                source,
                destination,
            } => [source, destination],
            Self::Delete {
                source,
                destination,
            } => [!source, !destination],
        }
    }

    /// The `(source, destination)` pair regardless of kind.
    pub fn endpoints(self) -> (i64, i64) {
        match self {
            Self::Insert {
                source,
                destination,
            }
            | Self::Delete {
                source,
                destination,
            } => (source, destination),
        }
    }
}

/// A decoded action file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStream {
    /// Actions in file order.
    pub actions: Vec<Action>,
}

fn read_words<O: ByteOrder>(bytes: &[u8]) -> Option<Vec<i64>> {
    let words = Ref::<_, [I64<O>]>::new_slice(bytes)?;
    Some(words.into_slice().iter().map(|w| w.get()).collect())
}

/// Splits `bytes` into native words, honoring the magic word's byte order.
fn decode_words(bytes: &[u8]) -> Result<Vec<i64>> {
    if bytes.len() % WORD != 0 {
        return Err(Error::UnalignedFile { len: bytes.len() });
    }
    let le = read_words::<LittleEndian>(bytes).ok_or(Error::UnalignedFile { len: bytes.len() })?;
    match le.first() {
        None => Err(Error::Truncated {
            what: "header",
            needed: 1,
            actual: 0,
        }),
        Some(&ENDIAN_CHECK) => Ok(le),
        Some(_) => {
            debug_event!(words = le.len(), "byte-swapped input");
            read_words::<BigEndian>(bytes).ok_or(Error::UnalignedFile { len: bytes.len() })
        }
    }
}

fn encode_words(words: &[i64]) -> Vec<u8> {
    let le: Vec<I64<LittleEndian>> = words.iter().map(|&w| I64::new(w)).collect();
    le.as_slice().as_bytes().to_vec()
}

fn need(what: &'static str, words: &[i64], needed: usize) -> Result<()> {
    if words.len() < needed {
        Err(Error::Truncated {
            what,
            needed,
            actual: words.len(),
        })
    } else {
        Ok(())
    }
}

fn count(what: &'static str, value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::NegativeCount { what, value })
}

/// Decodes a graph file image.
///
/// # Errors
/// [`Error::UnalignedFile`] for a length that is not a multiple of 8,
/// [`Error::Truncated`] when the header or arrays are short, [`Error::NegativeCount`] for a
/// negative header count, and [`Error::InvalidOffsets`] for negative offsets.
pub fn decode_graph(bytes: &[u8]) -> Result<GraphFile> {
    let words = decode_words(bytes)?;
    need("graph header", &words, 3)?;
    let nv = count("graph vertex count", words[1])?;
    let ne = count("graph edge count", words[2])?;
    let body = &words[3..];
    need("graph arrays", body, nv.saturating_add(1).saturating_add(ne.saturating_mul(2)))?;

    let offsets = body[..=nv]
        .iter()
        .enumerate()
        .map(|(at, &o)| usize::try_from(o).map_err(|_| Error::InvalidOffsets { at }))
        .collect::<Result<Vec<_>>>()?;
    let ind = body[nv + 1..nv + 1 + ne].to_vec();
    let weight = body[nv + 1 + ne..nv + 1 + 2 * ne].to_vec();
    Ok(GraphFile {
        nv,
        ne,
        offsets,
        ind,
        weight,
    })
}

/// Encodes a graph file image in little-endian order.
pub fn encode_graph(graph: &GraphFile) -> Vec<u8> {
    let mut words = Vec::with_capacity(3 + graph.offsets.len() + 2 * graph.ind.len());
    words.extend([ENDIAN_CHECK, graph.nv as i64, graph.ne as i64]);
    words.extend(graph.offsets.iter().map(|&o| o as i64));
    words.extend_from_slice(&graph.ind);
    words.extend_from_slice(&graph.weight);
    encode_words(&words)
}

/// Decodes an action file image.
///
/// # Errors
/// As [`decode_graph`].
pub fn decode_actions(bytes: &[u8]) -> Result<ActionStream> {
    let words = decode_words(bytes)?;
    need("action header", &words, 2)?;
    let naction = count("action count", words[1])?;
    need("action pairs", &words[2..], naction.saturating_mul(2))?;
    let actions = words[2..2 + 2 * naction]
        .chunks_exact(2)
        .map(|p| Action::decode(p[0], p[1]))
        .collect();
    Ok(ActionStream { actions })
}

/// Encodes an action file image in little-endian order.
pub fn encode_actions(stream: &ActionStream) -> Vec<u8> {
    let mut words = Vec::with_capacity(2 + 2 * stream.actions.len());
    words.extend([ENDIAN_CHECK, stream.actions.len() as i64]);
    words.extend(stream.actions.iter().flat_map(|a| a.encode()));
    encode_words(&words)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    runtime::init();
    let bytes = std::fs::read(path)?;
    runtime::record_load(bytes.len());
    Ok(bytes)
}

/// Reads and decodes a graph file.
///
/// # Errors
/// [`Error::Io`] if the file cannot be read, otherwise as [`decode_graph`].
pub fn load_graph(path: impl AsRef<Path>) -> Result<GraphFile> {
    let graph = decode_graph(&read_file(path.as_ref())?)?;
    debug_event!(nv = graph.nv, ne = graph.ne, "graph file loaded");
    Ok(graph)
}

/// Reads and decodes an action file.
///
/// # Errors
/// [`Error::Io`] if the file cannot be read, otherwise as [`decode_actions`].
pub fn load_actions(path: impl AsRef<Path>) -> Result<ActionStream> {
    let stream = decode_actions(&read_file(path.as_ref())?)?;
    debug_event!(actions = stream.actions.len(), "action file loaded");
    Ok(stream)
}

/// Loads an initial graph and the action stream to replay on it.
///
/// # Errors
/// As [`load_graph`] and [`load_actions`].
pub fn load_graph_and_actions(
    graph_path: impl AsRef<Path>,
    action_path: impl AsRef<Path>,
) -> Result<(GraphFile, ActionStream)> {
    Ok((load_graph(graph_path)?, load_actions(action_path)?))
}

impl GraphFile {
    /// The file's arrays as a CSR snapshot with a weight column.
    pub fn to_csr(&self) -> CsrSnapshot {
        CsrSnapshot {
            offsets: self.offsets.clone(),
            ind: self.ind.clone(),
            weight: Some(self.weight.clone()),
            time_first: None,
            time_recent: None,
            etype: None,
            sorted: false,
        }
    }

    /// Bulk-loads the file as the type-0 edges of a new graph, timestamped with
    /// `config.default_timestamp`.
    ///
    /// # Errors
    /// As [`csr_to_graph`]; offsets must also be a valid row index for `ind`.
    pub fn to_graph<const B: usize>(&self, config: &GraphConfig) -> Result<StreamingGraph<B>> {
        csr_to_graph(config, &self.to_csr())
    }
}
