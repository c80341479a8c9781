//! Which inputs of a scalar node become vector inputs.

use std::ops::Range;

use crate::ir::node::Node;
use crate::ir::operators::ScalarOpcode;

/// Half-open range of input slots of `node` that carry vectorizable data.
///
/// Slots outside the range (control, memory, address, shift counts,
/// compare-move conditions) stay scalar when the node is vectorized.
pub fn vector_operands(node: &Node) -> Range<usize> {
    use ScalarOpcode::*;

    let req = node.req();
    match node.scalar_opcode() {
        Some(op) if op.is_load() => 0..0,
        Some(op) if op.is_store() => Node::VALUE_IN..Node::VALUE_IN + 1,
        // The count is vectorized separately as a shift-count carrier.
        Some(LShiftI | LShiftL | RShiftI | RShiftL | URShiftI | URShiftL) => 1..2,
        Some(
            AddI | AddL | AddF | AddD | SubI | SubL | SubF | SubD | MulI | MulL | MulF | MulD
            | DivF | DivD | AndI | AndL | OrI | OrL | XorI | XorL | MulAddS2I,
        ) => 1..3,
        // Slot 1 is the condition.
        Some(CMoveI | CMoveL | CMoveF | CMoveD) => 2..req.max(2),
        Some(FmaF | FmaD) => 1..4,
        _ => 1..req.max(1),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::{InputList, NodeId};
    use crate::ir::operators::Operator;
    use crate::ir::types::NodeType;

    fn node(op: ScalarOpcode, req: usize) -> Node {
        let inputs: InputList = (0..req as u32).map(NodeId::new).collect();
        Node::new(Operator::Scalar(op), inputs, NodeType::Top)
    }

    #[test]
    fn test_loads_have_no_vector_operands() {
        let range = vector_operands(&node(ScalarOpcode::LoadF, 3));
        assert!(range.is_empty());
        assert_eq!(range, 0..0);
        assert_eq!(vector_operands(&node(ScalarOpcode::LoadP, 3)), 0..0);
    }

    #[test]
    fn test_stores_expose_value_only() {
        assert_eq!(vector_operands(&node(ScalarOpcode::StoreI, 4)), 3..4);
        assert_eq!(vector_operands(&node(ScalarOpcode::StoreN, 4)), 3..4);
    }

    #[test]
    fn test_shift_count_stays_scalar() {
        assert_eq!(vector_operands(&node(ScalarOpcode::LShiftI, 3)), 1..2);
        assert_eq!(vector_operands(&node(ScalarOpcode::URShiftL, 3)), 1..2);
    }

    #[test]
    fn test_binary_ops() {
        assert_eq!(vector_operands(&node(ScalarOpcode::AddI, 3)), 1..3);
        assert_eq!(vector_operands(&node(ScalarOpcode::DivD, 3)), 1..3);
        assert_eq!(vector_operands(&node(ScalarOpcode::XorL, 3)), 1..3);
        assert_eq!(vector_operands(&node(ScalarOpcode::MulAddS2I, 5)), 1..3);
    }

    #[test]
    fn test_cmove_skips_condition() {
        assert_eq!(vector_operands(&node(ScalarOpcode::CMoveD, 4)), 2..4);
        assert_eq!(vector_operands(&node(ScalarOpcode::CMoveI, 4)), 2..4);
    }

    #[test]
    fn test_fma_exposes_three() {
        assert_eq!(vector_operands(&node(ScalarOpcode::FmaF, 4)), 1..4);
    }

    #[test]
    fn test_default_is_all_operands() {
        assert_eq!(vector_operands(&node(ScalarOpcode::AbsI, 2)), 1..2);
        assert_eq!(vector_operands(&node(ScalarOpcode::URShiftB, 3)), 1..3);
        assert_eq!(vector_operands(&node(ScalarOpcode::MinD, 3)), 1..3);
    }
}
