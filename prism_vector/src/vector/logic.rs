//! Three-input logic and all-ones patterns.
//!
//! A macro-logic node evaluates an arbitrary boolean function of three
//! inputs bit by bit. The function is an 8-bit truth table indexed by
//! `(a << 2) | (b << 1) | c`, so `0x96` is three-way XOR and `0xE8` majority.

use super::malformed;
use super::VectorNode;
use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::{Operator, VectorOpcode};
use crate::ir::types::{ScalarConstant, VectorType};

/// Fuse three vectors under `truth_table`.
///
/// Every input must be exactly as wide as `vt` in bytes; lane types may
/// differ since the function is bitwise.
#[track_caller]
pub fn make_macro_logic(
    graph: &Graph,
    in1: NodeId,
    in2: NodeId,
    in3: NodeId,
    truth_table: u8,
    vt: VectorType,
) -> VectorNode {
    for input in [in1, in2, in3] {
        let width = graph.ty(input).as_vector().map(|v| v.length_in_bytes());
        if width != Some(vt.length_in_bytes()) {
            malformed(format_args!(
                "macro logic input {:?} : {} does not match {}",
                input,
                graph.ty(input),
                vt
            ));
        }
    }
    VectorNode::MacroLogic {
        inputs: [in1, in2, in3],
        truth_table,
        vt,
    }
}

/// Evaluate `truth_table` on one bit of each input.
#[inline]
pub const fn truth_table_bit(truth_table: u8, a: bool, b: bool, c: bool) -> bool {
    let index = ((a as u8) << 2) | ((b as u8) << 1) | (c as u8);
    (truth_table >> index) & 1 == 1
}

/// Evaluate `truth_table` bitwise across three words.
pub const fn apply_truth_table(truth_table: u8, a: u64, b: u64, c: u64) -> u64 {
    let mut result = 0u64;
    let mut index = 0;
    while index < 8 {
        if (truth_table >> index) & 1 == 1 {
            let sa = if index & 4 != 0 { a } else { !a };
            let sb = if index & 2 != 0 { b } else { !b };
            let sc = if index & 1 != 0 { c } else { !c };
            result |= sa & sb & sc;
        }
        index += 1;
    }
    result
}

// =============================================================================
// Patterns
// =============================================================================

fn is_con_minus_one(graph: &Graph, id: NodeId) -> bool {
    matches!(
        graph.constant(id),
        Some(ScalarConstant::Int(-1)) | Some(ScalarConstant::Long(-1))
    )
}

/// A broadcast of -1 over byte, short, int or long lanes.
pub fn is_all_ones_vector(graph: &Graph, id: NodeId) -> bool {
    match graph.op(id) {
        Operator::Vector(
            VectorOpcode::ReplicateB
            | VectorOpcode::ReplicateS
            | VectorOpcode::ReplicateI
            | VectorOpcode::ReplicateL,
        ) => graph
            .input(id, 1)
            .is_some_and(|scalar| is_con_minus_one(graph, scalar)),
        _ => false,
    }
}

/// An XOR with an all-ones broadcast on either side, i.e. a bitwise NOT.
pub fn is_vector_bitwise_not_pattern(graph: &Graph, id: NodeId) -> bool {
    if graph.op(id) != Operator::Vector(VectorOpcode::XorV) {
        return false;
    }
    [1, 2].into_iter().any(|slot| {
        graph
            .input(id, slot)
            .is_some_and(|input| is_all_ones_vector(graph, input))
    })
}

// =============================================================================
// Tests
// =============================================================================
