//! Vector node factory.
//!
//! Every constructor here belongs to the construction tier: the opcode it is
//! given must already have passed [`implemented`](super::implemented).
//! Anything else panics.

use tracing::trace;

use super::opcode::{replicate_opcode, vector_opcode};
use super::{malformed, missed_vector_creation, unsupported_type, ControlDependency, VectorNode};
use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::{ScalarOpcode, VectorOpcode, VectorShape};
use crate::ir::types::{BasicType, VectorType};

// =============================================================================
// Arithmetic
// =============================================================================

/// Build a one-input vector node.
#[track_caller]
pub fn make_unary(vopc: VectorOpcode, input: NodeId, vt: VectorType) -> VectorNode {
    if vopc.shape() != VectorShape::Unary {
        missed_vector_creation(vopc, vt.element());
    }
    VectorNode::Unary {
        opcode: vopc,
        input,
        vt,
    }
}

/// Build a two-input vector node.
#[track_caller]
pub fn make_binary(vopc: VectorOpcode, lhs: NodeId, rhs: NodeId, vt: VectorType) -> VectorNode {
    if vopc.shape() != VectorShape::Binary {
        missed_vector_creation(vopc, vt.element());
    }
    VectorNode::Binary {
        opcode: vopc,
        lhs,
        rhs,
        vt,
    }
}

/// Build a three-input vector node.
///
/// For `FmaV*` the inputs are `a * b + c`. For `CMoveV*` they are the
/// condition, the value when false and the value when true.
#[track_caller]
pub fn make_ternary(
    vopc: VectorOpcode,
    first: NodeId,
    second: NodeId,
    third: NodeId,
    vt: VectorType,
) -> VectorNode {
    if vopc.shape() != VectorShape::Ternary {
        missed_vector_creation(vopc, vt.element());
    }
    VectorNode::Ternary {
        opcode: vopc,
        inputs: [first, second, third],
        vt,
    }
}

/// Vector form of the scalar operation `sopc` over `lanes x bt`.
///
/// `operands` are the already-vectorized inputs, one per arity slot.
/// Compare-moves take `(condition, if_false, if_true)`: the condition is not
/// part of [`vector_operands`](super::vector_operands) and must be passed
/// explicitly ahead of the two value operands.
#[track_caller]
pub fn make_for_scalar(
    sopc: ScalarOpcode,
    operands: &[NodeId],
    lanes: u32,
    bt: BasicType,
) -> VectorNode {
    let Some(vopc) = vector_opcode(sopc, bt) else {
        missed_vector_creation(sopc, bt);
    };
    let vt = VectorType::new(bt, lanes);
    match (vopc.shape(), operands) {
        (VectorShape::Unary, &[input]) => make_unary(vopc, input, vt),
        (VectorShape::Binary, &[lhs, rhs]) => make_binary(vopc, lhs, rhs, vt),
        (VectorShape::Ternary, &[a, b, c]) => make_ternary(vopc, a, b, c, vt),
        (VectorShape::Unary | VectorShape::Binary | VectorShape::Ternary, _) => malformed(
            format_args!(
                "'{}' takes {} operands, got {}",
                vopc,
                vopc.arity().unwrap_or(0),
                operands.len()
            ),
        ),
        _ => missed_vector_creation(vopc, bt),
    }
}

// =============================================================================
// Broadcast and Shift Counts
// =============================================================================

/// Broadcast the scalar `s` to every lane.
#[track_caller]
pub fn scalar_to_vector(s: NodeId, lanes: u32, bt: BasicType) -> VectorNode {
    let Some(opcode) = replicate_opcode(bt) else {
        unsupported_type(bt);
    };
    VectorNode::Replicate {
        opcode,
        input: s,
        vt: VectorType::new(bt, lanes),
    }
}

/// Shift-count carrier for the scalar shift `sopc`.
///
/// Every right shift, signed or not, gets a right-count node. Signedness was
/// settled when the shift itself was resolved.
#[track_caller]
pub fn shift_count(sopc: ScalarOpcode, count: NodeId, lanes: u32, bt: BasicType) -> VectorNode {
    let opcode = if sopc.is_left_shift() {
        VectorOpcode::LShiftCntV
    } else if sopc.is_right_shift() {
        VectorOpcode::RShiftCntV
    } else {
        missed_vector_creation(sopc, bt);
    };
    VectorNode::ShiftCount {
        opcode,
        count,
        vt: VectorType::new(bt, lanes),
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Vector load of `lanes x bt` from `address`.
#[track_caller]
pub fn make_load(
    control: Option<NodeId>,
    memory: NodeId,
    address: NodeId,
    lanes: u32,
    bt: BasicType,
    dependency: ControlDependency,
) -> VectorNode {
    if !bt.is_primitive() {
        unsupported_type(bt);
    }
    VectorNode::Load {
        control,
        memory,
        address,
        vt: VectorType::new(bt, lanes),
        dependency,
    }
}

/// Vector store of `value` to `address`. The width comes from `value`.
#[track_caller]
pub fn make_store(
    graph: &Graph,
    control: Option<NodeId>,
    memory: NodeId,
    address: NodeId,
    value: NodeId,
) -> VectorNode {
    let Some(vt) = graph.ty(value).as_vector() else {
        malformed(format_args!(
            "vector store of non-vector value {:?} : {}",
            value,
            graph.ty(value)
        ));
    };
    VectorNode::Store {
        control,
        memory,
        address,
        value,
        vt,
    }
}

// =============================================================================
// Insert
// =============================================================================

/// Replace lane `position` of `vector` with the scalar `value`.
#[track_caller]
pub fn make_insert(graph: &Graph, vector: NodeId, value: NodeId, position: u32) -> VectorNode {
    let Some(vt) = graph.ty(vector).as_vector() else {
        malformed(format_args!(
            "lane insert into non-vector {:?} : {}",
            vector,
            graph.ty(vector)
        ));
    };
    if position >= vt.lanes() {
        malformed(format_args!(
            "insert position {} out of range for {}",
            position, vt
        ));
    }
    trace!(position, %vt, "lane insert");
    VectorNode::Insert {
        vector,
        value,
        position,
        vt,
    }
}

// =============================================================================
// Tests
// =============================================================================
