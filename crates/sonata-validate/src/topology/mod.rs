//! Topology graphs and forwarding path validation

mod builder;
mod graph;
mod trace;
mod validator;

pub use builder::{TopologyBuilder, TopologyLevel, TopologyOptions};
pub use graph::{EdgeAttrs, EdgeKind, NodeAttrs, NodeKind, TopologyGraph};
pub use trace::{trace_path, PathBreak, PathTrace, TraceStep, BREAK_MARKER};
pub use validator::{TopologyOutcome, TopologyValidator};
