//! Opcode definitions for scalar and vector nodes.
//!
//! Opcodes are split by role:
//! - **Scalar**: the operations the vectorizer finds in loop bodies
//! - **Vector**: every vector node kind the factory can build
//! - **Reduction**: vector-to-scalar collapses
//!
//! A vector opcode names a node kind, not a lane type. Several scalar
//! opcodes share one vector opcode (`AndV` serves `AndI` and `AndL`) and the
//! node's [`VectorType`](super::types::VectorType) tells them apart.

use std::fmt;

use super::types::ScalarConstant;

// =============================================================================
// Scalar Opcodes
// =============================================================================

/// Scalar operations the vectorizer may encounter.
///
/// The suffix names the register class: `I` int, `L` long, `F` float,
/// `D` double. Loads and stores carry the memory width instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarOpcode {
    // Arithmetic
    AddI,
    AddL,
    AddF,
    AddD,
    SubI,
    SubL,
    SubF,
    SubD,
    MulI,
    MulL,
    MulF,
    MulD,
    DivF,
    DivD,
    FmaF,
    FmaD,
    /// Multiply two short pairs and add the products into an int.
    MulAddS2I,

    // Conditional move
    CMoveI,
    CMoveL,
    CMoveF,
    CMoveD,

    // Unary
    AbsI,
    AbsL,
    AbsF,
    AbsD,
    NegI,
    NegF,
    NegD,
    SqrtF,
    SqrtD,
    RoundDoubleMode,
    PopCountI,

    // Min / max
    MinI,
    MinL,
    MinF,
    MinD,
    MaxI,
    MaxL,
    MaxF,
    MaxD,

    // Shifts
    LShiftI,
    LShiftL,
    RShiftI,
    RShiftL,
    URShiftB,
    URShiftS,
    URShiftI,
    URShiftL,

    // Bitwise
    AndI,
    AndL,
    OrI,
    OrL,
    XorI,
    XorL,

    // Memory
    LoadB,
    LoadUB,
    LoadS,
    LoadUS,
    LoadI,
    LoadL,
    LoadF,
    LoadD,
    LoadP,
    LoadN,
    StoreB,
    StoreC,
    StoreI,
    StoreL,
    StoreF,
    StoreD,
    StoreP,
    StoreN,
}

impl ScalarOpcode {
    /// Memory loads, including pointer loads that never vectorize.
    #[inline]
    pub const fn is_load(self) -> bool {
        matches!(
            self,
            Self::LoadB
                | Self::LoadUB
                | Self::LoadS
                | Self::LoadUS
                | Self::LoadI
                | Self::LoadL
                | Self::LoadF
                | Self::LoadD
                | Self::LoadP
                | Self::LoadN
        )
    }

    /// Memory stores, including pointer stores that never vectorize.
    #[inline]
    pub const fn is_store(self) -> bool {
        matches!(
            self,
            Self::StoreB
                | Self::StoreC
                | Self::StoreI
                | Self::StoreL
                | Self::StoreF
                | Self::StoreD
                | Self::StoreP
                | Self::StoreN
        )
    }

    #[inline]
    pub const fn is_left_shift(self) -> bool {
        matches!(self, Self::LShiftI | Self::LShiftL)
    }

    /// Arithmetic and logical right shifts of every width.
    #[inline]
    pub const fn is_right_shift(self) -> bool {
        matches!(
            self,
            Self::RShiftI
                | Self::RShiftL
                | Self::URShiftB
                | Self::URShiftS
                | Self::URShiftI
                | Self::URShiftL
        )
    }
}

impl fmt::Display for ScalarOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Vector Opcodes
// =============================================================================

/// Node shape of a vector opcode.
///
/// The shape fixes the operand arity, so the factory can refuse to build,
/// say, an `AddVI` with one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorShape {
    Unary,
    Binary,
    Ternary,
    Load,
    Store,
    Replicate,
    ShiftCount,
    Pack,
    Extract,
    Cast,
    Reinterpret,
    Insert,
    StoreMask,
    MacroLogic,
    Box,
    Unbox,
}

/// Vector node kinds.
///
/// Lane-typed suffixes: `B` byte, `S` short, `I` int, `L` long, `F` float,
/// `D` double. Opcodes without a suffix are width-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorOpcode {
    AddVB,
    AddVS,
    AddVI,
    AddVL,
    AddVF,
    AddVD,
    SubVB,
    SubVS,
    SubVI,
    SubVL,
    SubVF,
    SubVD,
    MulVB,
    MulVS,
    MulVI,
    MulVL,
    MulVF,
    MulVD,
    DivVF,
    DivVD,
    MinV,
    MaxV,
    AbsVB,
    AbsVS,
    AbsVI,
    AbsVL,
    AbsVF,
    AbsVD,
    NegVI,
    NegVF,
    NegVD,
    SqrtVF,
    SqrtVD,
    PopCountVI,
    RoundDoubleModeV,
    MulAddVS2VI,
    FmaVF,
    FmaVD,
    CMoveVF,
    CMoveVD,

    LShiftVB,
    LShiftVS,
    LShiftVI,
    LShiftVL,
    RShiftVB,
    RShiftVS,
    RShiftVI,
    RShiftVL,
    URShiftVB,
    URShiftVS,
    URShiftVI,
    URShiftVL,
    LShiftCntV,
    RShiftCntV,

    AndV,
    OrV,
    XorV,
    MacroLogicV,

    LoadVector,
    StoreVector,

    ReplicateB,
    ReplicateS,
    ReplicateI,
    ReplicateL,
    ReplicateF,
    ReplicateD,

    PackB,
    PackS,
    PackI,
    PackL,
    PackF,
    PackD,
    Pack2L,
    Pack2D,

    ExtractUB,
    ExtractB,
    ExtractC,
    ExtractS,
    ExtractI,
    ExtractL,
    ExtractF,
    ExtractD,

    VectorCastB2X,
    VectorCastS2X,
    VectorCastI2X,
    VectorCastL2X,
    VectorCastF2X,
    VectorCastD2X,
    VectorReinterpret,
    VectorInsert,
    VectorStoreMask,
    VectorBox,
    VectorUnbox,
}

impl VectorOpcode {
    /// The node shape this opcode is built with.
    pub const fn shape(self) -> VectorShape {
        use VectorOpcode::*;
        match self {
            AbsVB | AbsVS | AbsVI | AbsVL | AbsVF | AbsVD | NegVI | NegVF | NegVD | SqrtVF
            | SqrtVD | PopCountVI => VectorShape::Unary,

            AddVB | AddVS | AddVI | AddVL | AddVF | AddVD | SubVB | SubVS | SubVI | SubVL
            | SubVF | SubVD | MulVB | MulVS | MulVI | MulVL | MulVF | MulVD | DivVF | DivVD
            | MinV | MaxV | LShiftVB | LShiftVS | LShiftVI | LShiftVL | RShiftVB | RShiftVS
            | RShiftVI | RShiftVL | URShiftVB | URShiftVS | URShiftVI | URShiftVL | AndV | OrV
            | XorV | RoundDoubleModeV | MulAddVS2VI => VectorShape::Binary,

            FmaVF | FmaVD | CMoveVF | CMoveVD => VectorShape::Ternary,

            LoadVector => VectorShape::Load,
            StoreVector => VectorShape::Store,

            ReplicateB | ReplicateS | ReplicateI | ReplicateL | ReplicateF | ReplicateD => {
                VectorShape::Replicate
            }

            LShiftCntV | RShiftCntV => VectorShape::ShiftCount,

            PackB | PackS | PackI | PackL | PackF | PackD | Pack2L | Pack2D => VectorShape::Pack,

            ExtractUB | ExtractB | ExtractC | ExtractS | ExtractI | ExtractL | ExtractF
            | ExtractD => VectorShape::Extract,

            VectorCastB2X | VectorCastS2X | VectorCastI2X | VectorCastL2X | VectorCastF2X
            | VectorCastD2X => VectorShape::Cast,

            VectorReinterpret => VectorShape::Reinterpret,
            VectorInsert => VectorShape::Insert,
            VectorStoreMask => VectorShape::StoreMask,
            MacroLogicV => VectorShape::MacroLogic,
            VectorBox => VectorShape::Box,
            VectorUnbox => VectorShape::Unbox,
        }
    }

    /// Number of value operands for the arithmetic shapes.
    #[inline]
    pub const fn arity(self) -> Option<usize> {
        match self.shape() {
            VectorShape::Unary => Some(1),
            VectorShape::Binary => Some(2),
            VectorShape::Ternary => Some(3),
            _ => None,
        }
    }

    /// Lane-wise shifts (left, arithmetic right, logical right).
    #[inline]
    pub const fn is_vector_shift(self) -> bool {
        use VectorOpcode::*;
        matches!(
            self,
            LShiftVB
                | LShiftVS
                | LShiftVI
                | LShiftVL
                | RShiftVB
                | RShiftVS
                | RShiftVI
                | RShiftVL
                | URShiftVB
                | URShiftVS
                | URShiftVI
                | URShiftVL
        )
    }

    /// Shift-count carriers.
    #[inline]
    pub const fn is_vector_shift_count(self) -> bool {
        matches!(self, VectorOpcode::LShiftCntV | VectorOpcode::RShiftCntV)
    }

    /// Broadcast nodes.
    #[inline]
    pub const fn is_replicate(self) -> bool {
        matches!(self.shape(), VectorShape::Replicate)
    }
}

impl fmt::Display for VectorOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Reduction Opcodes
// =============================================================================

/// Vector-to-scalar reductions.
///
/// Int reductions also serve byte and short lanes; the accumulator is
/// always an int there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionOpcode {
    AddReductionVI,
    AddReductionVL,
    AddReductionVF,
    AddReductionVD,
    MulReductionVI,
    MulReductionVL,
    MulReductionVF,
    MulReductionVD,
    MinReductionV,
    MaxReductionV,
    AndReductionV,
    OrReductionV,
    XorReductionV,
}

impl fmt::Display for ReductionOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// Operator (Unified)
// =============================================================================

/// What a graph node computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Control entry.
    Start,
    /// Incoming value, typed at creation.
    Parameter(u16),
    /// 32-bit integer constant (also holds sub-word values).
    ConInt(i32),
    /// 64-bit integer constant.
    ConLong(i64),
    /// Float constant, stored as bits for `Hash`/`Eq`.
    ConFloat(u32),
    /// Double constant, stored as bits for `Hash`/`Eq`.
    ConDouble(u64),
    /// Pointer cast; carries no computation.
    CastPP,
    /// Scalar operation.
    Scalar(ScalarOpcode),
    /// Vector operation.
    Vector(VectorOpcode),
    /// Vector-to-scalar reduction.
    Reduction(ReductionOpcode),
}

impl Operator {
    /// The operator that materializes `value`.
    pub fn constant(value: ScalarConstant) -> Self {
        match value {
            ScalarConstant::Int(v) => Operator::ConInt(v),
            ScalarConstant::Long(v) => Operator::ConLong(v),
            ScalarConstant::Float(v) => Operator::ConFloat(v.to_bits()),
            ScalarConstant::Double(v) => Operator::ConDouble(v.to_bits()),
        }
    }

    /// The constant this operator produces, if any.
    pub fn as_constant(&self) -> Option<ScalarConstant> {
        match *self {
            Operator::ConInt(v) => Some(ScalarConstant::Int(v)),
            Operator::ConLong(v) => Some(ScalarConstant::Long(v)),
            Operator::ConFloat(bits) => Some(ScalarConstant::Float(f32::from_bits(bits))),
            Operator::ConDouble(bits) => Some(ScalarConstant::Double(f64::from_bits(bits))),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_constant(&self) -> bool {
        matches!(
            self,
            Operator::ConInt(_) | Operator::ConLong(_) | Operator::ConFloat(_) | Operator::ConDouble(_)
        )
    }

    #[inline]
    pub const fn as_scalar(&self) -> Option<ScalarOpcode> {
        match self {
            Operator::Scalar(op) => Some(*op),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_vector(&self) -> Option<VectorOpcode> {
        match self {
            Operator::Vector(op) => Some(*op),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Start => f.write_str("Start"),
            Operator::Parameter(i) => write!(f, "Parm{}", i),
            Operator::CastPP => f.write_str("CastPP"),
            Operator::Scalar(op) => write!(f, "{}", op),
            Operator::Vector(op) => write!(f, "{}", op),
            Operator::Reduction(op) => write!(f, "{}", op),
            constant => match constant.as_constant() {
                Some(value) => write!(f, "Con({})", value),
                None => f.write_str("?"),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
