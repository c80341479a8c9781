//! Minimal sea-of-nodes substrate for vector construction.
//!
//! # Core Components
//!
//! - **Types** (`types.rs`): lane, vector and node result types
//! - **Operators** (`operators.rs`): scalar, vector and reduction opcodes
//! - **Arena** (`arena.rs`): typed IDs and append-only storage
//! - **Node** (`node.rs`): nodes and their slot layout
//! - **Graph** (`graph.rs`): ownership, use lists and constant interning

pub mod arena;
pub mod graph;
pub mod node;
pub mod operators;
pub mod types;

pub use arena::{Arena, Id, SecondaryMap};
pub use graph::Graph;
pub use node::{InputList, Node, NodeFlags, NodeId};
pub use operators::{Operator, ReductionOpcode, ScalarOpcode, VectorOpcode, VectorShape};
pub use types::{BasicType, NodeType, ScalarConstant, VectorType};
