//! Vector reductions.
//!
//! A reduction folds every lane of a vector into a scalar accumulator:
//!
//! ```text
//! acc' = acc OP v[0] OP v[1] OP ... OP v[n-1]
//! ```
//!
//! The accumulator is seeded with the operation's neutral element so that
//! folding an empty or masked-off set of lanes leaves it unchanged.
//!
//! | Operation | Neutral element                     |
//! |-----------|-------------------------------------|
//! | Add       | 0                                   |
//! | Mul       | 1                                   |
//! | And       | all ones (-1)                       |
//! | Or, Xor   | 0                                   |
//! | Min       | type maximum (+inf for floating)    |
//! | Max       | type minimum (-inf for floating)    |
//!
//! Byte and short lanes reduce into an int accumulator, so their neutral
//! elements are int constants.

use tracing::debug;

use super::opcode::admissible_shape;
use super::{missed_vector_creation, VectorNode};
use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::{ReductionOpcode, ScalarOpcode};
use crate::ir::types::{BasicType, ScalarConstant};
use crate::target::Matcher;

// =============================================================================
// Resolution
// =============================================================================

/// The reduction implementing `sopc` over lanes of `bt`.
///
/// Boolean and char lanes never reduce.
pub const fn reduction_opcode(sopc: ScalarOpcode, bt: BasicType) -> Option<ReductionOpcode> {
    use BasicType::*;
    use ReductionOpcode as R;
    use ScalarOpcode as S;

    let ropc = match (sopc, bt) {
        (S::AddI, Byte | Short | Int) => R::AddReductionVI,
        (S::AddL, Long) => R::AddReductionVL,
        (S::AddF, Float) => R::AddReductionVF,
        (S::AddD, Double) => R::AddReductionVD,

        (S::MulI, Byte | Short | Int) => R::MulReductionVI,
        (S::MulL, Long) => R::MulReductionVL,
        (S::MulF, Float) => R::MulReductionVF,
        (S::MulD, Double) => R::MulReductionVD,

        (S::MinI, Byte | Short | Int)
        | (S::MinL, Long)
        | (S::MinF, Float)
        | (S::MinD, Double) => R::MinReductionV,
        (S::MaxI, Byte | Short | Int)
        | (S::MaxL, Long)
        | (S::MaxF, Float)
        | (S::MaxD, Double) => R::MaxReductionV,

        (S::AndI, Byte | Short | Int) | (S::AndL, Long) => R::AndReductionV,
        (S::OrI, Byte | Short | Int) | (S::OrL, Long) => R::OrReductionV,
        (S::XorI, Byte | Short | Int) | (S::XorL, Long) => R::XorReductionV,

        _ => return None,
    };
    Some(ropc)
}

/// Lane types `ropc` can reduce.
const fn reduces(ropc: ReductionOpcode, bt: BasicType) -> bool {
    use BasicType::*;
    use ReductionOpcode as R;

    match ropc {
        R::AddReductionVI | R::MulReductionVI => matches!(bt, Byte | Short | Int),
        R::AddReductionVL | R::MulReductionVL => matches!(bt, Long),
        R::AddReductionVF | R::MulReductionVF => matches!(bt, Float),
        R::AddReductionVD | R::MulReductionVD => matches!(bt, Double),
        R::MinReductionV | R::MaxReductionV => {
            matches!(bt, Byte | Short | Int | Long | Float | Double)
        }
        R::AndReductionV | R::OrReductionV | R::XorReductionV => {
            matches!(bt, Byte | Short | Int | Long)
        }
    }
}

// =============================================================================
// Neutral Elements
// =============================================================================

/// The value that leaves any accumulator unchanged under `ropc`.
///
/// Returns `None` when `ropc` does not reduce lanes of `bt`.
pub fn neutral_element(ropc: ReductionOpcode, bt: BasicType) -> Option<ScalarConstant> {
    use ReductionOpcode as R;

    if !reduces(ropc, bt) {
        return None;
    }
    let wide = bt.stack_type();
    let value = match ropc {
        R::AddReductionVI
        | R::AddReductionVL
        | R::AddReductionVF
        | R::AddReductionVD
        | R::OrReductionV
        | R::XorReductionV => return ScalarConstant::zero(bt),

        R::MulReductionVI => ScalarConstant::Int(1),
        R::MulReductionVL => ScalarConstant::Long(1),
        R::MulReductionVF => ScalarConstant::Float(1.0),
        R::MulReductionVD => ScalarConstant::Double(1.0),

        R::AndReductionV => match wide {
            BasicType::Long => ScalarConstant::Long(-1),
            _ => ScalarConstant::Int(-1),
        },

        R::MinReductionV => match wide {
            BasicType::Long => ScalarConstant::Long(i64::MAX),
            BasicType::Float => ScalarConstant::Float(f32::INFINITY),
            BasicType::Double => ScalarConstant::Double(f64::INFINITY),
            _ => ScalarConstant::Int(i32::MAX),
        },
        R::MaxReductionV => match wide {
            BasicType::Long => ScalarConstant::Long(i64::MIN),
            BasicType::Float => ScalarConstant::Float(f32::NEG_INFINITY),
            BasicType::Double => ScalarConstant::Double(f64::NEG_INFINITY),
            _ => ScalarConstant::Int(i32::MIN),
        },
    };
    Some(value)
}

/// Interned accumulator seed for reducing `sopc` over lanes of `bt`.
#[track_caller]
pub fn make_reduction_input(graph: &mut Graph, sopc: ScalarOpcode, bt: BasicType) -> NodeId {
    let Some(ropc) = reduction_opcode(sopc, bt) else {
        missed_vector_creation(sopc, bt);
    };
    let Some(seed) = neutral_element(ropc, bt) else {
        missed_vector_creation(ropc, bt);
    };
    match ropc {
        ReductionOpcode::AddReductionVI
        | ReductionOpcode::AddReductionVL
        | ReductionOpcode::AddReductionVF
        | ReductionOpcode::AddReductionVD
        | ReductionOpcode::OrReductionV
        | ReductionOpcode::XorReductionV => graph.zero_con(bt),
        _ => graph.con(seed),
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Reduction node folding `vector` into `accumulator`.
#[track_caller]
pub fn make_reduction(
    sopc: ScalarOpcode,
    control: Option<NodeId>,
    accumulator: NodeId,
    vector: NodeId,
    bt: BasicType,
) -> VectorNode {
    let Some(opcode) = reduction_opcode(sopc, bt) else {
        missed_vector_creation(sopc, bt);
    };
    VectorNode::Reduction {
        opcode,
        control,
        accumulator,
        vector,
        element: bt,
    }
}

/// Whether `sopc` can be reduced over `lanes x bt` on the target.
pub fn reduction_implemented(
    matcher: &dyn Matcher,
    sopc: ScalarOpcode,
    lanes: u32,
    bt: BasicType,
) -> bool {
    if !admissible_shape(matcher, lanes, bt) {
        return false;
    }
    match reduction_opcode(sopc, bt) {
        Some(ropc) if matcher.match_rule_supported_reduction(ropc, lanes, bt) => true,
        Some(ropc) => {
            debug!(opcode = %sopc, reduction = %ropc, lanes, element = %bt, "reduction not realizable");
            false
        }
        None => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
