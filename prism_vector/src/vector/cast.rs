//! Casts, reinterprets, store masks and the vector box boundary.

use tracing::debug;

use super::{malformed, missed_vector_creation, unsupported_type, VectorNode};
use crate::config::VectorConfig;
use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::{Operator, VectorOpcode, VectorShape};
use crate::ir::types::{BasicType, VectorType};

// =============================================================================
// Cast
// =============================================================================

/// The cast opcode converting lanes *from* `bt` to another element type.
///
/// # Panics
///
/// Panics for boolean, char and non-primitive lanes, which have no cast form.
#[track_caller]
pub fn cast_opcode(bt: BasicType) -> VectorOpcode {
    match bt {
        BasicType::Byte => VectorOpcode::VectorCastB2X,
        BasicType::Short => VectorOpcode::VectorCastS2X,
        BasicType::Int => VectorOpcode::VectorCastI2X,
        BasicType::Long => VectorOpcode::VectorCastL2X,
        BasicType::Float => VectorOpcode::VectorCastF2X,
        BasicType::Double => VectorOpcode::VectorCastD2X,
        _ => unsupported_type(bt),
    }
}

/// Convert every lane of `input` to `bt`, keeping the lane count.
#[track_caller]
pub fn make_cast(vopc: VectorOpcode, input: NodeId, bt: BasicType, lanes: u32) -> VectorNode {
    if vopc.shape() != VectorShape::Cast {
        missed_vector_creation(vopc, bt);
    }
    VectorNode::Cast {
        opcode: vopc,
        input,
        vt: VectorType::new(bt, lanes),
    }
}

// =============================================================================
// Reinterpret
// =============================================================================

/// View the bits of `input` as `vt`.
pub fn make_reinterpret(input: NodeId, vt: VectorType) -> VectorNode {
    VectorNode::Reinterpret { input, vt }
}

/// Collapse a reinterpret of a reinterpret back to the original value when
/// the outer target type equals that value's type.
///
/// One step only. Returns `id` when nothing applies.
pub fn reinterpret_identity(graph: &Graph, id: NodeId) -> NodeId {
    if graph.op(id) != Operator::Vector(VectorOpcode::VectorReinterpret) {
        return id;
    }
    let Some(inner) = graph.input(id, 1) else {
        return id;
    };
    if graph.op(inner) != Operator::Vector(VectorOpcode::VectorReinterpret) {
        return id;
    }
    match graph.input(inner, 1) {
        Some(original) if graph.ty(original) == graph.ty(id) => {
            debug!(node = ?id, original = ?original, "reinterpret round trip folded");
            original
        }
        _ => id,
    }
}

// =============================================================================
// Store Mask
// =============================================================================

/// Narrow a mask of `lanes x in_type` to boolean lanes for storing.
///
/// The source element size travels as an int constant operand.
#[track_caller]
pub fn make_store_mask(graph: &Graph, input: NodeId, in_type: BasicType, lanes: u32) -> VectorNode {
    if !graph.ty(input).is_vector() {
        malformed(format_args!(
            "store mask of non-vector {:?} : {}",
            input,
            graph.ty(input)
        ));
    }
    if !in_type.is_primitive() {
        unsupported_type(in_type);
    }
    VectorNode::StoreMask {
        input,
        element_size: in_type.byte_size() as u32,
        vt: VectorType::new(BasicType::Boolean, lanes),
    }
}

// =============================================================================
// Box / Unbox
// =============================================================================

/// Wrap the vector `value` into the object produced by `allocation`.
#[track_caller]
pub fn make_box(graph: &Graph, allocation: NodeId, value: NodeId) -> VectorNode {
    let Some(vt) = graph.ty(value).as_vector() else {
        malformed(format_args!(
            "box of non-vector {:?} : {}",
            value,
            graph.ty(value)
        ));
    };
    VectorNode::Box {
        allocation,
        value,
        vt,
    }
}

/// Read the vector payload of type `vt` out of `object`.
pub fn make_unbox(memory: NodeId, object: NodeId, vt: VectorType) -> VectorNode {
    VectorNode::Unbox {
        memory,
        object,
        vt,
    }
}

/// Collapse an unbox of a box to the boxed payload.
///
/// Applies only with reboxing enabled and when the unbox yields exactly the
/// payload's type. Pointer casts between the box and the unbox are looked
/// through. Returns `id` when nothing applies.
pub fn unbox_identity(graph: &Graph, id: NodeId, config: &VectorConfig) -> NodeId {
    if !config.enable_vector_reboxing
        || graph.op(id) != Operator::Vector(VectorOpcode::VectorUnbox)
    {
        return id;
    }
    let Some(object) = graph.input(id, VectorNode::UNBOX_OBJECT) else {
        return id;
    };
    let boxed = graph.uncast(object);
    if graph.op(boxed) != Operator::Vector(VectorOpcode::VectorBox) {
        return id;
    }
    match graph.input(boxed, VectorNode::BOX_VALUE) {
        Some(value) if graph.ty(value) == graph.ty(id) => {
            debug!(node = ?id, payload = ?value, "unbox of box folded");
            value
        }
        _ => id,
    }
}

// =============================================================================
// Tests
// =============================================================================
