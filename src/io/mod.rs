//! Reading and writing the binary graph and action file formats.

pub mod format;
pub mod runtime;

pub use format::{
    decode_actions, decode_graph, encode_actions, encode_graph, load_actions, load_graph,
    load_graph_and_actions, Action, ActionStream, GraphFile, ENDIAN_CHECK,
};
pub use runtime::IoStats;
