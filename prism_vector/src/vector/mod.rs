//! Vector node construction.
//!
//! This module turns scalar operations into vector nodes:
//!
//! - **Resolution** (`opcode`): scalar opcode + lane type to vector opcode
//! - **Operands** (`operands`): which scalar inputs become vector inputs
//! - **Factory** (`factory`): arithmetic, broadcast, shift-count and memory
//! - **Reductions** (`reduction`): opcode, neutral element, node
//! - **Packs** (`pack`): scalar-to-vector assembly and lane extraction
//! - **Casts** (`cast`): cast, reinterpret, store-mask, box and unbox
//! - **Logic** (`logic`): three-input truth tables and all-ones patterns
//!
//! # Two Tiers
//!
//! Queries (`vector_opcode`, `implemented`, ...) return `Option`/`bool` and
//! never fail. Constructors (`make_*`) assume the query tier already said
//! yes. Handing them an unsupported combination is a bug in the caller and
//! panics with the offending opcode and element type.
//!
//! Constructors return an unattached [`VectorNode`]. The caller decides where
//! it goes and calls [`VectorNode::attach`] to move it into the graph.

pub mod cast;
pub mod factory;
pub mod logic;
pub mod opcode;
pub mod operands;
pub mod pack;
pub mod reduction;

use std::fmt;

use smallvec::SmallVec;

use crate::ir::graph::Graph;
use crate::ir::node::{InputList, NodeFlags, NodeId};
use crate::ir::operators::{Operator, ReductionOpcode, VectorOpcode};
use crate::ir::types::{BasicType, NodeType, VectorType};

pub use cast::{
    cast_opcode, make_box, make_cast, make_reinterpret, make_store_mask, make_unbox,
    reinterpret_identity, unbox_identity,
};
pub use factory::{
    make_binary, make_for_scalar, make_insert, make_load, make_store, make_ternary, make_unary,
    scalar_to_vector, shift_count,
};
pub use logic::{is_all_ones_vector, is_vector_bitwise_not_pattern, make_macro_logic};
pub use opcode::{implemented, replicate_opcode, vector_opcode};
pub use operands::vector_operands;
pub use pack::{extract_opcode, make_extract, PackNode};
pub use reduction::{
    make_reduction, make_reduction_input, neutral_element, reduction_implemented,
    reduction_opcode,
};

// =============================================================================
// Fatal Paths
// =============================================================================

/// A constructor was handed an opcode it cannot build.
#[cold]
#[track_caller]
pub(crate) fn missed_vector_creation(opcode: impl fmt::Display, bt: BasicType) -> ! {
    tracing::error!(%opcode, element = %bt, "missed vector creation");
    panic!("missed vector creation for '{}' (element {})", opcode, bt);
}

/// A constructor was handed a lane type with no vector form.
#[cold]
#[track_caller]
pub(crate) fn unsupported_type(bt: BasicType) -> ! {
    tracing::error!(element = %bt, "type is not supported for vectors");
    panic!("type '{}' is not supported for vectors", bt);
}

/// Any other broken constructor precondition.
#[cold]
#[track_caller]
pub(crate) fn malformed(message: fmt::Arguments<'_>) -> ! {
    tracing::error!(%message, "malformed vector node");
    panic!("{}", message);
}

// =============================================================================
// Load Dependency
// =============================================================================

/// How a vector load depends on its control input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlDependency {
    /// May float above the control input once the test is known to pass.
    #[default]
    DependsOnlyOnTest,
    /// Must stay below the control input.
    Pinned,
}

// =============================================================================
// Vector Node
// =============================================================================

/// An unattached vector node.
///
/// One variant per node shape. Operand fields name what the slot holds, so
/// a unary node has no second operand to read by mistake.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorNode {
    Unary {
        opcode: VectorOpcode,
        input: NodeId,
        vt: VectorType,
    },
    Binary {
        opcode: VectorOpcode,
        lhs: NodeId,
        rhs: NodeId,
        vt: VectorType,
    },
    Ternary {
        opcode: VectorOpcode,
        inputs: [NodeId; 3],
        vt: VectorType,
    },
    Load {
        control: Option<NodeId>,
        memory: NodeId,
        address: NodeId,
        vt: VectorType,
        dependency: ControlDependency,
    },
    Store {
        control: Option<NodeId>,
        memory: NodeId,
        address: NodeId,
        value: NodeId,
        vt: VectorType,
    },
    Replicate {
        opcode: VectorOpcode,
        input: NodeId,
        vt: VectorType,
    },
    ShiftCount {
        opcode: VectorOpcode,
        count: NodeId,
        vt: VectorType,
    },
    Pack {
        opcode: VectorOpcode,
        inputs: SmallVec<[NodeId; 8]>,
        vt: VectorType,
    },
    Extract {
        opcode: VectorOpcode,
        vector: NodeId,
        position: u32,
        element: BasicType,
    },
    Reduction {
        opcode: ReductionOpcode,
        control: Option<NodeId>,
        accumulator: NodeId,
        vector: NodeId,
        element: BasicType,
    },
    Cast {
        opcode: VectorOpcode,
        input: NodeId,
        vt: VectorType,
    },
    Reinterpret {
        input: NodeId,
        vt: VectorType,
    },
    Insert {
        vector: NodeId,
        value: NodeId,
        position: u32,
        vt: VectorType,
    },
    StoreMask {
        input: NodeId,
        element_size: u32,
        vt: VectorType,
    },
    MacroLogic {
        inputs: [NodeId; 3],
        truth_table: u8,
        vt: VectorType,
    },
    Box {
        allocation: NodeId,
        value: NodeId,
        vt: VectorType,
    },
    Unbox {
        memory: NodeId,
        object: NodeId,
        vt: VectorType,
    },
}

impl VectorNode {
    /// Slot of the boxed payload on a box node.
    pub const BOX_VALUE: usize = 2;
    /// Slot of the boxed object on an unbox node.
    pub const UNBOX_OBJECT: usize = 2;

    /// The operator this node carries once attached.
    pub fn operator(&self) -> Operator {
        match self {
            VectorNode::Unary { opcode, .. }
            | VectorNode::Binary { opcode, .. }
            | VectorNode::Ternary { opcode, .. }
            | VectorNode::Replicate { opcode, .. }
            | VectorNode::ShiftCount { opcode, .. }
            | VectorNode::Pack { opcode, .. }
            | VectorNode::Extract { opcode, .. }
            | VectorNode::Cast { opcode, .. } => Operator::Vector(*opcode),
            VectorNode::Load { .. } => Operator::Vector(VectorOpcode::LoadVector),
            VectorNode::Store { .. } => Operator::Vector(VectorOpcode::StoreVector),
            VectorNode::Reinterpret { .. } => Operator::Vector(VectorOpcode::VectorReinterpret),
            VectorNode::Insert { .. } => Operator::Vector(VectorOpcode::VectorInsert),
            VectorNode::StoreMask { .. } => Operator::Vector(VectorOpcode::VectorStoreMask),
            VectorNode::MacroLogic { .. } => Operator::Vector(VectorOpcode::MacroLogicV),
            VectorNode::Box { .. } => Operator::Vector(VectorOpcode::VectorBox),
            VectorNode::Unbox { .. } => Operator::Vector(VectorOpcode::VectorUnbox),
            VectorNode::Reduction { opcode, .. } => Operator::Reduction(*opcode),
        }
    }

    /// The vector opcode, or `None` for reductions.
    pub fn vector_opcode(&self) -> Option<VectorOpcode> {
        self.operator().as_vector()
    }

    /// Shape of the value this node produces, if it is a vector.
    pub fn vector_type(&self) -> Option<VectorType> {
        self.node_type().as_vector()
    }

    /// Result type of this node.
    pub fn node_type(&self) -> NodeType {
        match self {
            VectorNode::Unary { vt, .. }
            | VectorNode::Binary { vt, .. }
            | VectorNode::Ternary { vt, .. }
            | VectorNode::Load { vt, .. }
            | VectorNode::Replicate { vt, .. }
            | VectorNode::ShiftCount { vt, .. }
            | VectorNode::Pack { vt, .. }
            | VectorNode::Cast { vt, .. }
            | VectorNode::Reinterpret { vt, .. }
            | VectorNode::Insert { vt, .. }
            | VectorNode::StoreMask { vt, .. }
            | VectorNode::MacroLogic { vt, .. }
            | VectorNode::Unbox { vt, .. } => NodeType::Vector(*vt),
            VectorNode::Store { .. } => NodeType::Memory,
            VectorNode::Box { vt, .. } => NodeType::VectorBox(*vt),
            VectorNode::Extract { element, .. } => NodeType::Scalar(*element),
            VectorNode::Reduction { element, .. } => NodeType::Scalar(element.stack_type()),
        }
    }

    /// Move this node into `graph`.
    ///
    /// Immediate operands (lane positions, element sizes, truth tables) are
    /// materialized as interned int constants.
    pub fn attach(self, graph: &mut Graph) -> NodeId {
        let op = self.operator();
        let ty = self.node_type();
        let none = NodeId::INVALID;

        let mut pinned = false;
        let inputs: InputList = match self {
            VectorNode::Unary { input, .. }
            | VectorNode::Replicate { input, .. }
            | VectorNode::Cast { input, .. }
            | VectorNode::Reinterpret { input, .. } => InputList::from_slice(&[none, input]),
            VectorNode::ShiftCount { count, .. } => InputList::from_slice(&[none, count]),
            VectorNode::Binary { lhs, rhs, .. } => InputList::from_slice(&[none, lhs, rhs]),
            VectorNode::Ternary { inputs: [a, b, c], .. } => {
                InputList::from_slice(&[none, a, b, c])
            }
            VectorNode::Load {
                control,
                memory,
                address,
                dependency,
                ..
            } => {
                pinned = dependency == ControlDependency::Pinned;
                InputList::from_slice(&[control.unwrap_or(none), memory, address])
            }
            VectorNode::Store {
                control,
                memory,
                address,
                value,
                ..
            } => InputList::from_slice(&[control.unwrap_or(none), memory, address, value]),
            VectorNode::Pack { inputs, .. } => {
                let mut list = InputList::with_capacity(inputs.len() + 1);
                list.push(none);
                list.extend_from_slice(&inputs);
                list
            }
            VectorNode::Extract {
                vector, position, ..
            } => {
                let pos = graph.int_con(position as i32);
                InputList::from_slice(&[none, vector, pos])
            }
            VectorNode::Reduction {
                control,
                accumulator,
                vector,
                ..
            } => InputList::from_slice(&[control.unwrap_or(none), accumulator, vector]),
            VectorNode::Insert {
                vector,
                value,
                position,
                ..
            } => {
                let pos = graph.int_con(position as i32);
                InputList::from_slice(&[none, vector, value, pos])
            }
            VectorNode::StoreMask {
                input,
                element_size,
                ..
            } => {
                let size = graph.int_con(element_size as i32);
                InputList::from_slice(&[none, input, size])
            }
            VectorNode::MacroLogic {
                inputs: [a, b, c],
                truth_table,
                ..
            } => {
                let func = graph.int_con(i32::from(truth_table));
                InputList::from_slice(&[none, a, b, c, func])
            }
            VectorNode::Box {
                allocation, value, ..
            } => InputList::from_slice(&[none, allocation, value]),
            VectorNode::Unbox { memory, object, .. } => {
                InputList::from_slice(&[none, memory, object])
            }
        };

        let id = graph.add_node(op, &inputs, ty);
        if pinned {
            graph.node_mut(id).flags.insert(NodeFlags::PINNED);
        }
        id
    }
}

impl fmt::Display for VectorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.operator(), self.node_type())
    }
}

// =============================================================================
// Tests
// =============================================================================
