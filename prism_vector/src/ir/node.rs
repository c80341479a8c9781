//! Graph nodes.
//!
//! # Input Slots
//!
//! Every node reserves slot 0 for its control input, which is
//! [`NodeId::INVALID`] for floating nodes. Value operands start at slot 1.
//! Memory nodes follow the layout `[control, memory, address, value?]`, so a
//! store's value sits at [`Node::VALUE_IN`]. Vector nodes use the same
//! convention, which keeps operand positions stable between a scalar node and
//! the vector node that replaces it.

use smallvec::SmallVec;

use super::arena::Id;
use super::operators::{Operator, ReductionOpcode, ScalarOpcode, VectorOpcode};
use super::types::{NodeType, ScalarConstant};

/// Unique identifier for a node in the graph.
pub type NodeId = Id<Node>;

/// Input slots. Four covers everything but large packs.
pub type InputList = SmallVec<[NodeId; 4]>;

// =============================================================================
// Node
// =============================================================================

/// A node in the IR graph.
#[derive(Clone)]
pub struct Node {
    /// The operation this node performs.
    pub op: Operator,

    /// Input slots; slot 0 is control.
    pub inputs: InputList,

    /// Result type.
    pub ty: NodeType,

    pub flags: NodeFlags,
}

impl Node {
    /// Slot of the stored value.
    pub const VALUE_IN: usize = 3;

    /// Create a node.
    pub fn new(op: Operator, inputs: InputList, ty: NodeType) -> Self {
        Node {
            op,
            inputs,
            ty,
            flags: NodeFlags::empty(),
        }
    }

    /// Input at `slot`, or `None` if the slot is absent or unused.
    #[inline]
    pub fn input(&self, slot: usize) -> Option<NodeId> {
        self.inputs.get(slot).copied().filter(|id| id.is_valid())
    }

    /// Control input.
    #[inline]
    pub fn control(&self) -> Option<NodeId> {
        self.input(0)
    }

    /// Number of input slots, control included.
    #[inline]
    pub fn req(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn scalar_opcode(&self) -> Option<ScalarOpcode> {
        self.op.as_scalar()
    }

    #[inline]
    pub fn vector_opcode(&self) -> Option<VectorOpcode> {
        self.op.as_vector()
    }

    #[inline]
    pub fn reduction_opcode(&self) -> Option<ReductionOpcode> {
        match self.op {
            Operator::Reduction(op) => Some(op),
            _ => None,
        }
    }

    #[inline]
    pub fn as_constant(&self) -> Option<ScalarConstant> {
        self.op.as_constant()
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        self.op.is_constant()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?} : {}", self.op, self.inputs.as_slice(), self.ty)
    }
}

// =============================================================================
// Node Flags
// =============================================================================

bitflags::bitflags! {
    /// Node properties.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// Must stay below its control input (pinned load).
        const PINNED = 0b0000_0001;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::types::BasicType;
    use smallvec::smallvec;

    #[test]
    fn test_input_skips_invalid_control() {
        let node = Node::new(
            Operator::Scalar(ScalarOpcode::AddI),
            smallvec![NodeId::INVALID, NodeId::new(4), NodeId::new(5)],
            NodeType::Scalar(BasicType::Int),
        );
        assert_eq!(node.control(), None);
        assert_eq!(node.input(1), Some(NodeId::new(4)));
        assert_eq!(node.input(3), None);
        assert_eq!(node.req(), 3);
    }

    #[test]
    fn test_constant_node() {
        let node = Node::new(
            Operator::ConInt(-1),
            InputList::new(),
            NodeType::Scalar(BasicType::Int),
        );
        assert!(node.is_constant());
        assert_eq!(node.as_constant(), Some(ScalarConstant::Int(-1)));
        assert_eq!(node.scalar_opcode(), None);
    }

    #[test]
    fn test_flags() {
        let mut node = Node::new(Operator::Start, InputList::new(), NodeType::Control);
        assert!(node.flags.is_empty());
        node.flags.insert(NodeFlags::PINNED);
        assert!(node.flags.contains(NodeFlags::PINNED));
    }
}
