//! Scalar-to-vector opcode resolution.
//!
//! [`vector_opcode`] is a total function over `(ScalarOpcode, BasicType)`.
//! Every pair outside the table below has no vector form, including pairs
//! where the scalar opcode's register class does not match the lane type
//! (`AddL` over `int` lanes, say).
//!
//! Sub-word lanes follow the scalar promotion rules:
//! - boolean and byte share byte-lane opcodes, char and short share short-lane
//!   opcodes
//! - boolean and char are unsigned, so a signed right shift of either becomes
//!   a logical right shift
//! - multiply, min, max and abs have no meaning over boolean (and min, max
//!   and abs none over char)
//!
//! Logical right shifts of byte and short lanes stay unsupported. The scalar
//! operation sign-extends the narrow value to int before shifting, so the
//! bits shifted in from the top are copies of the sign bit, which a lane-wide
//! logical shift cannot reproduce for negative values. `URShiftB` and
//! `URShiftS` exist for the cases the front end has already proven safe.

use tracing::{debug, trace};

use crate::ir::node::Node;
use crate::ir::operators::{ScalarOpcode, VectorOpcode};
use crate::ir::types::BasicType;
use crate::target::Matcher;

// =============================================================================
// Resolution
// =============================================================================

/// The vector opcode implementing `sopc` over lanes of `bt`, or `None` if
/// there is none.
pub fn vector_opcode(sopc: ScalarOpcode, bt: BasicType) -> Option<VectorOpcode> {
    let vopc = lookup(sopc, bt);
    if vopc.is_none() {
        trace!(opcode = %sopc, element = %bt, "no vector form");
    }
    vopc
}

const fn lookup(sopc: ScalarOpcode, bt: BasicType) -> Option<VectorOpcode> {
    use BasicType::*;
    use ScalarOpcode as S;
    use VectorOpcode as V;

    let vopc = match (sopc, bt) {
        // Add / Sub / Mul
        (S::AddI, Boolean | Byte) => V::AddVB,
        (S::AddI, Char | Short) => V::AddVS,
        (S::AddI, Int) => V::AddVI,
        (S::AddL, Long) => V::AddVL,
        (S::AddF, Float) => V::AddVF,
        (S::AddD, Double) => V::AddVD,

        (S::SubI, Boolean | Byte) => V::SubVB,
        (S::SubI, Char | Short) => V::SubVS,
        (S::SubI, Int) => V::SubVI,
        (S::SubL, Long) => V::SubVL,
        (S::SubF, Float) => V::SubVF,
        (S::SubD, Double) => V::SubVD,

        (S::MulI, Byte) => V::MulVB,
        (S::MulI, Char | Short) => V::MulVS,
        (S::MulI, Int) => V::MulVI,
        (S::MulL, Long) => V::MulVL,
        (S::MulF, Float) => V::MulVF,
        (S::MulD, Double) => V::MulVD,

        (S::DivF, Float) => V::DivVF,
        (S::DivD, Double) => V::DivVD,

        (S::FmaF, Float) => V::FmaVF,
        (S::FmaD, Double) => V::FmaVD,
        (S::CMoveF, Float) => V::CMoveVF,
        (S::CMoveD, Double) => V::CMoveVD,

        // Reads short lanes, writes int lanes; resolved on the result type.
        (S::MulAddS2I, Int) => V::MulAddVS2VI,

        // Unary
        (S::AbsI, Byte) => V::AbsVB,
        (S::AbsI, Short) => V::AbsVS,
        (S::AbsI, Int) => V::AbsVI,
        (S::AbsL, Long) => V::AbsVL,
        (S::AbsF, Float) => V::AbsVF,
        (S::AbsD, Double) => V::AbsVD,

        (S::NegI, Int) => V::NegVI,
        (S::NegF, Float) => V::NegVF,
        (S::NegD, Double) => V::NegVD,

        (S::SqrtF, Float) => V::SqrtVF,
        (S::SqrtD, Double) => V::SqrtVD,

        (S::RoundDoubleMode, Double) => V::RoundDoubleModeV,

        // Lane width changes the count.
        (S::PopCountI, Int) => V::PopCountVI,

        // Min / Max
        (S::MinI, Byte | Short | Int)
        | (S::MinL, Long)
        | (S::MinF, Float)
        | (S::MinD, Double) => V::MinV,
        (S::MaxI, Byte | Short | Int)
        | (S::MaxL, Long)
        | (S::MaxF, Float)
        | (S::MaxD, Double) => V::MaxV,

        // Shifts
        (S::LShiftI, Boolean | Byte) => V::LShiftVB,
        (S::LShiftI, Char | Short) => V::LShiftVS,
        (S::LShiftI, Int) => V::LShiftVI,
        (S::LShiftL, Long) => V::LShiftVL,

        (S::RShiftI, Boolean) => V::URShiftVB,
        (S::RShiftI, Char) => V::URShiftVS,
        (S::RShiftI, Byte) => V::RShiftVB,
        (S::RShiftI, Short) => V::RShiftVS,
        (S::RShiftI, Int) => V::RShiftVI,
        (S::RShiftL, Long) => V::RShiftVL,

        (S::URShiftB, Byte) => V::URShiftVB,
        (S::URShiftS, Short) => V::URShiftVS,
        (S::URShiftI, Boolean) => V::URShiftVB,
        (S::URShiftI, Char) => V::URShiftVS,
        (S::URShiftI, Int) => V::URShiftVI,
        (S::URShiftL, Long) => V::URShiftVL,

        // Bitwise; the lane type tells int and long apart.
        (S::AndI, Boolean | Byte | Char | Short | Int) | (S::AndL, Long) => V::AndV,
        (S::OrI, Boolean | Byte | Char | Short | Int) | (S::OrL, Long) => V::OrV,
        (S::XorI, Boolean | Byte | Char | Short | Int) | (S::XorL, Long) => V::XorV,

        // Memory; the lane type rides on the vector type.
        (
            S::LoadB | S::LoadUB | S::LoadS | S::LoadUS | S::LoadI | S::LoadL | S::LoadF
            | S::LoadD,
            _,
        ) if bt.is_primitive() => V::LoadVector,
        (S::StoreB | S::StoreC | S::StoreI | S::StoreL | S::StoreF | S::StoreD, _)
            if bt.is_primitive() =>
        {
            V::StoreVector
        }

        _ => return None,
    };
    Some(vopc)
}

/// The broadcast opcode for lanes of `bt`.
pub const fn replicate_opcode(bt: BasicType) -> Option<VectorOpcode> {
    match bt {
        BasicType::Boolean | BasicType::Byte => Some(VectorOpcode::ReplicateB),
        BasicType::Char | BasicType::Short => Some(VectorOpcode::ReplicateS),
        BasicType::Int => Some(VectorOpcode::ReplicateI),
        BasicType::Long => Some(VectorOpcode::ReplicateL),
        BasicType::Float => Some(VectorOpcode::ReplicateF),
        BasicType::Double => Some(VectorOpcode::ReplicateD),
        _ => None,
    }
}

// =============================================================================
// Admission
// =============================================================================

/// Whether `sopc` over `lanes x bt` can be vectorized on the target.
///
/// This is the gate every caller must pass before using the factory.
pub fn implemented(matcher: &dyn Matcher, sopc: ScalarOpcode, lanes: u32, bt: BasicType) -> bool {
    if !admissible_shape(matcher, lanes, bt) {
        return false;
    }
    match vector_opcode(sopc, bt) {
        Some(vopc) if matcher.match_rule_supported_vector(vopc, lanes, bt) => true,
        Some(vopc) => {
            debug!(opcode = %sopc, vector = %vopc, lanes, element = %bt, "not realizable on target");
            false
        }
        None => false,
    }
}

/// Shape checks shared by the vector and reduction gates.
pub(crate) fn admissible_shape(matcher: &dyn Matcher, lanes: u32, bt: BasicType) -> bool {
    if !bt.is_primitive() {
        debug!(element = %bt, "not a lane type");
        return false;
    }
    if lanes <= 1 || !lanes.is_power_of_two() {
        debug!(lanes, "lane count is not a power of two above one");
        return false;
    }
    if !matcher.vector_size_supported(bt, lanes) {
        debug!(lanes, element = %bt, "width not supported");
        return false;
    }
    true
}

// =============================================================================
// Node Predicates
// =============================================================================

/// Scalar int and long shifts.
pub fn is_shift(node: &Node) -> bool {
    matches!(
        node.scalar_opcode(),
        Some(
            ScalarOpcode::LShiftI
                | ScalarOpcode::LShiftL
                | ScalarOpcode::RShiftI
                | ScalarOpcode::RShiftL
                | ScalarOpcode::URShiftI
                | ScalarOpcode::URShiftL
        )
    )
}

/// Vector shifts.
pub fn is_vshift(node: &Node) -> bool {
    node.vector_opcode().is_some_and(is_vector_shift)
}

/// Shift-count carriers.
pub fn is_vshift_cnt(node: &Node) -> bool {
    node.vector_opcode().is_some_and(is_vector_shift_count)
}

/// Loop-invariant vectors. Only broadcasts qualify for now.
pub fn is_invariant_vector(node: &Node) -> bool {
    node.vector_opcode().is_some_and(VectorOpcode::is_replicate)
}

/// Operations reading short lanes and producing int lanes.
pub fn is_type_transition_short_to_int(node: &Node) -> bool {
    node.scalar_opcode() == Some(ScalarOpcode::MulAddS2I)
}

pub fn is_type_transition_to_int(node: &Node) -> bool {
    is_type_transition_short_to_int(node)
}

pub fn is_muladds2i(node: &Node) -> bool {
    node.scalar_opcode() == Some(ScalarOpcode::MulAddS2I)
}

pub fn is_roundop_d(node: &Node) -> bool {
    node.scalar_opcode() == Some(ScalarOpcode::RoundDoubleMode)
}

#[inline]
pub const fn is_vector_shift(vopc: VectorOpcode) -> bool {
    vopc.is_vector_shift()
}

#[inline]
pub const fn is_vector_shift_count(vopc: VectorOpcode) -> bool {
    vopc.is_vector_shift_count()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::InputList;
    use crate::ir::operators::Operator;
    use crate::ir::types::NodeType;
    use crate::target::{SimdLevel, TargetMatcher};
    use BasicType::*;

    fn scalar(op: ScalarOpcode) -> Node {
        Node::new(Operator::Scalar(op), InputList::new(), NodeType::Top)
    }

    fn vector(op: VectorOpcode) -> Node {
        Node::new(Operator::Vector(op), InputList::new(), NodeType::Top)
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    #[test]
    fn test_add_sub_by_lane_width() {
        assert_eq!(vector_opcode(ScalarOpcode::AddI, Boolean), Some(VectorOpcode::AddVB));
        assert_eq!(vector_opcode(ScalarOpcode::AddI, Byte), Some(VectorOpcode::AddVB));
        assert_eq!(vector_opcode(ScalarOpcode::AddI, Char), Some(VectorOpcode::AddVS));
        assert_eq!(vector_opcode(ScalarOpcode::AddI, Int), Some(VectorOpcode::AddVI));
        assert_eq!(vector_opcode(ScalarOpcode::SubI, Short), Some(VectorOpcode::SubVS));
        assert_eq!(vector_opcode(ScalarOpcode::SubD, Double), Some(VectorOpcode::SubVD));
    }

    #[test]
    fn test_boolean_multiply_unsupported() {
        assert_eq!(vector_opcode(ScalarOpcode::MulI, Boolean), None);
        assert_eq!(vector_opcode(ScalarOpcode::MulI, Byte), Some(VectorOpcode::MulVB));
        assert_eq!(vector_opcode(ScalarOpcode::MulI, Char), Some(VectorOpcode::MulVS));
    }

    #[test]
    fn test_register_class_mismatch_unsupported() {
        assert_eq!(vector_opcode(ScalarOpcode::AddL, Int), None);
        assert_eq!(vector_opcode(ScalarOpcode::AddF, Double), None);
        assert_eq!(vector_opcode(ScalarOpcode::AddI, Long), None);
        assert_eq!(vector_opcode(ScalarOpcode::AndL, Int), None);
        assert_eq!(vector_opcode(ScalarOpcode::AndI, Float), None);
    }

    #[test]
    fn test_unsigned_domain_rejections() {
        for op in [ScalarOpcode::MinI, ScalarOpcode::MaxI, ScalarOpcode::AbsI] {
            assert_eq!(vector_opcode(op, Boolean), None, "{}", op);
            assert_eq!(vector_opcode(op, Char), None, "{}", op);
        }
        assert_eq!(vector_opcode(ScalarOpcode::MinI, Short), Some(VectorOpcode::MinV));
        assert_eq!(vector_opcode(ScalarOpcode::MaxD, Double), Some(VectorOpcode::MaxV));
        assert_eq!(vector_opcode(ScalarOpcode::AbsI, Byte), Some(VectorOpcode::AbsVB));
    }

    #[test]
    fn test_popcount_int_only() {
        assert_eq!(vector_opcode(ScalarOpcode::PopCountI, Int), Some(VectorOpcode::PopCountVI));
        for bt in [Boolean, Byte, Char, Short, Long] {
            assert_eq!(vector_opcode(ScalarOpcode::PopCountI, bt), None);
        }
    }

    #[test]
    fn test_floating_only_ops() {
        assert_eq!(vector_opcode(ScalarOpcode::FmaF, Float), Some(VectorOpcode::FmaVF));
        assert_eq!(vector_opcode(ScalarOpcode::CMoveD, Double), Some(VectorOpcode::CMoveVD));
        assert_eq!(vector_opcode(ScalarOpcode::CMoveI, Int), None);
        assert_eq!(vector_opcode(ScalarOpcode::DivF, Float), Some(VectorOpcode::DivVF));
        assert_eq!(
            vector_opcode(ScalarOpcode::RoundDoubleMode, Double),
            Some(VectorOpcode::RoundDoubleModeV)
        );
        assert_eq!(vector_opcode(ScalarOpcode::SqrtD, Double), Some(VectorOpcode::SqrtVD));
        assert_eq!(vector_opcode(ScalarOpcode::NegI, Int), Some(VectorOpcode::NegVI));
        assert_eq!(vector_opcode(ScalarOpcode::NegI, Short), None);
    }

    #[test]
    fn test_muladd_resolves_on_int() {
        assert_eq!(
            vector_opcode(ScalarOpcode::MulAddS2I, Int),
            Some(VectorOpcode::MulAddVS2VI)
        );
        assert_eq!(vector_opcode(ScalarOpcode::MulAddS2I, Short), None);
    }

    // =========================================================================
    // Shifts
    // =========================================================================

    #[test]
    fn test_left_shift_by_lane_width() {
        assert_eq!(vector_opcode(ScalarOpcode::LShiftI, Boolean), Some(VectorOpcode::LShiftVB));
        assert_eq!(vector_opcode(ScalarOpcode::LShiftI, Char), Some(VectorOpcode::LShiftVS));
        assert_eq!(vector_opcode(ScalarOpcode::LShiftL, Long), Some(VectorOpcode::LShiftVL));
    }

    #[test]
    fn test_signed_right_shift_of_unsigned_lanes() {
        assert_eq!(vector_opcode(ScalarOpcode::RShiftI, Boolean), Some(VectorOpcode::URShiftVB));
        assert_eq!(vector_opcode(ScalarOpcode::RShiftI, Char), Some(VectorOpcode::URShiftVS));
        assert_eq!(vector_opcode(ScalarOpcode::RShiftI, Byte), Some(VectorOpcode::RShiftVB));
        assert_eq!(vector_opcode(ScalarOpcode::RShiftI, Short), Some(VectorOpcode::RShiftVS));
    }

    #[test]
    fn test_narrow_logical_right_shift_unsupported() {
        assert_eq!(vector_opcode(ScalarOpcode::URShiftI, Byte), None);
        assert_eq!(vector_opcode(ScalarOpcode::URShiftI, Short), None);
        assert_eq!(vector_opcode(ScalarOpcode::URShiftI, Char), Some(VectorOpcode::URShiftVS));
        assert_eq!(vector_opcode(ScalarOpcode::URShiftB, Byte), Some(VectorOpcode::URShiftVB));
        assert_eq!(vector_opcode(ScalarOpcode::URShiftS, Short), Some(VectorOpcode::URShiftVS));
    }

    // =========================================================================
    // Bitwise and Memory
    // =========================================================================

    #[test]
    fn test_bitwise_shares_one_opcode() {
        assert_eq!(vector_opcode(ScalarOpcode::AndI, Int), Some(VectorOpcode::AndV));
        assert_eq!(vector_opcode(ScalarOpcode::AndL, Long), Some(VectorOpcode::AndV));
        assert_eq!(vector_opcode(ScalarOpcode::OrI, Boolean), Some(VectorOpcode::OrV));
        assert_eq!(vector_opcode(ScalarOpcode::XorL, Long), Some(VectorOpcode::XorV));
    }

    #[test]
    fn test_memory_ops_ignore_lane_type() {
        for bt in BasicType::PRIMITIVES {
            assert_eq!(vector_opcode(ScalarOpcode::LoadI, bt), Some(VectorOpcode::LoadVector));
            assert_eq!(vector_opcode(ScalarOpcode::StoreC, bt), Some(VectorOpcode::StoreVector));
        }
        assert_eq!(vector_opcode(ScalarOpcode::LoadP, Long), None);
        assert_eq!(vector_opcode(ScalarOpcode::StoreN, Int), None);
        assert_eq!(vector_opcode(ScalarOpcode::LoadI, Object), None);
    }

    #[test]
    fn test_replicate_opcode() {
        assert_eq!(replicate_opcode(Boolean), Some(VectorOpcode::ReplicateB));
        assert_eq!(replicate_opcode(Char), Some(VectorOpcode::ReplicateS));
        assert_eq!(replicate_opcode(Double), Some(VectorOpcode::ReplicateD));
        assert_eq!(replicate_opcode(Array), None);
    }

    // =========================================================================
    // Admission
    // =========================================================================

    #[test]
    fn test_implemented_gate() {
        let m = TargetMatcher::new(SimdLevel::Avx2);
        assert!(implemented(&m, ScalarOpcode::AddI, 4, Int));
        assert!(implemented(&m, ScalarOpcode::AddI, 8, Int));
        assert!(!implemented(&m, ScalarOpcode::AddI, 16, Int));
        assert!(!implemented(&m, ScalarOpcode::AddI, 1, Int));
        assert!(!implemented(&m, ScalarOpcode::AddI, 3, Int));
        assert!(!implemented(&m, ScalarOpcode::AddI, 4, Object));
        assert!(!implemented(&m, ScalarOpcode::MulI, 16, Boolean));
        assert!(!implemented(&m, ScalarOpcode::URShiftI, 8, Short));
    }

    #[test]
    fn test_implemented_consults_opcode_support() {
        let avx2 = TargetMatcher::new(SimdLevel::Avx2);
        let avx512 = TargetMatcher::new(SimdLevel::Avx512);
        assert!(!implemented(&avx2, ScalarOpcode::MulL, 4, Long));
        assert!(implemented(&avx512, ScalarOpcode::MulL, 4, Long));
        assert!(!implemented(&avx2, ScalarOpcode::PopCountI, 8, Int));
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    #[test]
    fn test_shift_predicates() {
        assert!(is_shift(&scalar(ScalarOpcode::URShiftL)));
        assert!(!is_shift(&scalar(ScalarOpcode::URShiftB)));
        assert!(!is_shift(&scalar(ScalarOpcode::AddI)));
        assert!(is_vshift(&vector(VectorOpcode::RShiftVS)));
        assert!(!is_vshift(&vector(VectorOpcode::RShiftCntV)));
        assert!(is_vshift_cnt(&vector(VectorOpcode::LShiftCntV)));
        assert!(!is_vshift_cnt(&scalar(ScalarOpcode::LShiftI)));
    }

    #[test]
    fn test_invariant_vector_is_broadcast() {
        assert!(is_invariant_vector(&vector(VectorOpcode::ReplicateL)));
        assert!(!is_invariant_vector(&vector(VectorOpcode::LoadVector)));
        assert!(!is_invariant_vector(&scalar(ScalarOpcode::LoadL)));
    }

    #[test]
    fn test_transition_predicates() {
        let muladd = scalar(ScalarOpcode::MulAddS2I);
        assert!(is_type_transition_short_to_int(&muladd));
        assert!(is_type_transition_to_int(&muladd));
        assert!(is_muladds2i(&muladd));
        assert!(!is_muladds2i(&scalar(ScalarOpcode::MulI)));
        assert!(is_roundop_d(&scalar(ScalarOpcode::RoundDoubleMode)));
        assert!(!is_roundop_d(&scalar(ScalarOpcode::SqrtD)));
    }
}
