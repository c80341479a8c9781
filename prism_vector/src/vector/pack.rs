//! Packing scalars into vectors and extracting them again.
//!
//! # Binary-Tree Packs
//!
//! A flat pack of `n` scalars is rebuilt as a balanced tree of two-lane
//! packs. Each level views a pair of narrow lanes as one lane of the next
//! wider integer, so every internal node stays two lanes wide:
//!
//! ```text
//!             PackL [2 x long]
//!            /                \
//!     PackI [2 x int]    PackI [2 x int]
//!      /        \          /        \
//!    s0          s1      s2          s3
//! ```
//!
//! | Sub-pack lanes | Combined as         |
//! |----------------|---------------------|
//! | boolean, byte  | `PackS` [2 x short] |
//! | char, short    | `PackI` [2 x int]   |
//! | int            | `PackL` [2 x long]  |
//! | long           | `Pack2L` [2 x long] |
//! | float          | `PackD` [2 x double]|
//! | double         | `Pack2D` [2 x double]|
//!
//! The declared types are a naming convention for the pair views, not a
//! byte count: the payload of a tree is always the leaves in order.

use smallvec::SmallVec;

use super::{malformed, unsupported_type, VectorNode};
use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::VectorOpcode;
use crate::ir::types::{BasicType, VectorType};
use crate::target::Matcher;

// =============================================================================
// Pack Node
// =============================================================================

/// A pack under construction.
///
/// Created from its first scalar with [`PackNode::make`]; the rest are added
/// with [`PackNode::add_operand`].
#[derive(Debug, Clone, PartialEq)]
pub struct PackNode {
    opcode: VectorOpcode,
    operands: SmallVec<[NodeId; 8]>,
    vt: VectorType,
}

impl PackNode {
    /// Start a pack of `lanes x bt` holding `first`.
    #[track_caller]
    pub fn make(first: NodeId, lanes: u32, bt: BasicType) -> Self {
        let opcode = match bt {
            BasicType::Boolean | BasicType::Byte => VectorOpcode::PackB,
            BasicType::Char | BasicType::Short => VectorOpcode::PackS,
            BasicType::Int => VectorOpcode::PackI,
            BasicType::Long => VectorOpcode::PackL,
            BasicType::Float => VectorOpcode::PackF,
            BasicType::Double => VectorOpcode::PackD,
            _ => unsupported_type(bt),
        };
        let mut operands = SmallVec::new();
        operands.push(first);
        PackNode {
            opcode,
            operands,
            vt: VectorType::new(bt, lanes),
        }
    }

    #[inline]
    pub fn add_operand(&mut self, operand: NodeId) {
        self.operands.push(operand);
    }

    #[inline]
    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    #[inline]
    pub fn opcode(&self) -> VectorOpcode {
        self.opcode
    }

    #[inline]
    pub fn vector_type(&self) -> VectorType {
        self.vt
    }

    /// Rebuild operands `[lo, hi)` as a balanced tree of two-lane packs.
    ///
    /// Inner sub-packs are attached to `graph`; the root is returned
    /// unattached.
    #[track_caller]
    pub fn binary_tree_pack(&self, graph: &mut Graph, lo: usize, hi: usize) -> VectorNode {
        let count = hi.saturating_sub(lo);
        if hi > self.operands.len() || count < 2 || !count.is_power_of_two() {
            malformed(format_args!(
                "pack range {}..{} of {} operands is not a power-of-two run",
                lo,
                hi,
                self.operands.len()
            ));
        }

        if count == 2 {
            let mut pair = PackNode::make(self.operands[lo], 2, self.vt.element());
            pair.add_operand(self.operands[lo + 1]);
            return pair.into();
        }

        let mid = lo + count / 2;
        let low = self.binary_tree_pack(graph, lo, mid);
        let high = self.binary_tree_pack(graph, mid, hi);
        let bt = sub_pack_element(&low);
        debug_assert_eq!(bt, sub_pack_element(&high));

        let (opcode, wide) = match bt {
            BasicType::Boolean | BasicType::Byte => (VectorOpcode::PackS, BasicType::Short),
            BasicType::Char | BasicType::Short => (VectorOpcode::PackI, BasicType::Int),
            BasicType::Int => (VectorOpcode::PackL, BasicType::Long),
            BasicType::Long => (VectorOpcode::Pack2L, BasicType::Long),
            BasicType::Float => (VectorOpcode::PackD, BasicType::Double),
            BasicType::Double => (VectorOpcode::Pack2D, BasicType::Double),
            _ => unsupported_type(bt),
        };

        let mut inputs = SmallVec::new();
        inputs.push(low.attach(graph));
        inputs.push(high.attach(graph));
        VectorNode::Pack {
            opcode,
            inputs,
            vt: VectorType::new(wide, 2),
        }
    }
}

fn sub_pack_element(node: &VectorNode) -> BasicType {
    match node {
        VectorNode::Pack { vt, .. } => vt.element(),
        other => malformed(format_args!("expected a pack, found {}", other)),
    }
}

impl From<PackNode> for VectorNode {
    fn from(pack: PackNode) -> Self {
        VectorNode::Pack {
            opcode: pack.opcode,
            inputs: pack.operands,
            vt: pack.vt,
        }
    }
}

// =============================================================================
// Extract
// =============================================================================

/// The lane-extract opcode for `bt`. Boolean lanes extract unsigned.
pub const fn extract_opcode(bt: BasicType) -> Option<VectorOpcode> {
    match bt {
        BasicType::Boolean => Some(VectorOpcode::ExtractUB),
        BasicType::Byte => Some(VectorOpcode::ExtractB),
        BasicType::Char => Some(VectorOpcode::ExtractC),
        BasicType::Short => Some(VectorOpcode::ExtractS),
        BasicType::Int => Some(VectorOpcode::ExtractI),
        BasicType::Long => Some(VectorOpcode::ExtractL),
        BasicType::Float => Some(VectorOpcode::ExtractF),
        BasicType::Double => Some(VectorOpcode::ExtractD),
        _ => None,
    }
}

/// Read lane `position` of `vector` as a scalar of `bt`.
///
/// `position` must be below the target's maximum lane count for `bt`.
#[track_caller]
pub fn make_extract(
    matcher: &dyn Matcher,
    vector: NodeId,
    position: u32,
    bt: BasicType,
) -> VectorNode {
    let Some(opcode) = extract_opcode(bt) else {
        unsupported_type(bt);
    };
    let max = matcher.max_vector_size(bt);
    if position >= max {
        malformed(format_args!(
            "extract position {} out of range for {} lanes of {}",
            position, max, bt
        ));
    }
    VectorNode::Extract {
        opcode,
        vector,
        position,
        element: bt,
    }
}

// =============================================================================
// Tests
// =============================================================================
