//! Element and vector types for the vector IR.
//!
//! Three layers:
//! - [`BasicType`]: the element kind of a lane (or of a scalar value)
//! - [`VectorType`]: an (element, lane count) pair, compared structurally
//! - [`NodeType`]: the result type carried by every node in the graph
//!
//! Boolean and char are unsigned-valued. This matters for right shifts,
//! min/max and absolute value, where the vector forms assume a signed lane.

use std::fmt;

// =============================================================================
// Basic Type
// =============================================================================

/// Element type of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BasicType {
    /// 1-byte unsigned truth value (0 or 1).
    Boolean,
    /// 2-byte unsigned UTF-16 code unit.
    Char,
    /// 1-byte signed integer.
    Byte,
    /// 2-byte signed integer.
    Short,
    /// 4-byte signed integer.
    Int,
    /// 8-byte signed integer.
    Long,
    /// 4-byte IEEE-754 float.
    Float,
    /// 8-byte IEEE-754 double.
    Double,
    /// Object reference. Never a lane type.
    Object,
    /// Array reference. Never a lane type.
    Array,
    /// No value.
    Void,
}

impl BasicType {
    /// Every primitive lane type, in declaration order.
    pub const PRIMITIVES: [BasicType; 8] = [
        BasicType::Boolean,
        BasicType::Char,
        BasicType::Byte,
        BasicType::Short,
        BasicType::Int,
        BasicType::Long,
        BasicType::Float,
        BasicType::Double,
    ];

    /// Whether this type may be used as a vector lane.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        !matches!(self, BasicType::Object | BasicType::Array | BasicType::Void)
    }

    #[inline]
    pub const fn is_floating(self) -> bool {
        matches!(self, BasicType::Float | BasicType::Double)
    }

    /// Size of one lane in bytes. Reference types report pointer size.
    #[inline]
    pub const fn byte_size(self) -> usize {
        match self {
            BasicType::Boolean | BasicType::Byte => 1,
            BasicType::Char | BasicType::Short => 2,
            BasicType::Int | BasicType::Float => 4,
            BasicType::Long | BasicType::Double => 8,
            BasicType::Object | BasicType::Array => 8,
            BasicType::Void => 0,
        }
    }

    /// Lower-case source name.
    pub const fn name(self) -> &'static str {
        match self {
            BasicType::Boolean => "boolean",
            BasicType::Char => "char",
            BasicType::Byte => "byte",
            BasicType::Short => "short",
            BasicType::Int => "int",
            BasicType::Long => "long",
            BasicType::Float => "float",
            BasicType::Double => "double",
            BasicType::Object => "object",
            BasicType::Array => "array",
            BasicType::Void => "void",
        }
    }

    /// Scalar type a value of this element is held in once extracted.
    ///
    /// Sub-word values live in `int` registers.
    #[inline]
    pub const fn stack_type(self) -> BasicType {
        match self {
            BasicType::Boolean | BasicType::Char | BasicType::Byte | BasicType::Short => {
                BasicType::Int
            }
            other => other,
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Vector Type
// =============================================================================

/// A vector shape: element type and lane count.
///
/// Lane count is always a power of two greater than one. Whether the target
/// can actually hold the shape is a separate question for the
/// [`Matcher`](crate::target::Matcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorType {
    element: BasicType,
    lanes: u32,
}

impl VectorType {
    /// Build a vector type.
    ///
    /// # Panics
    ///
    /// Panics if `element` is not primitive or `lanes` is not a power of two
    /// greater than one. Callers are expected to have passed the
    /// `implemented` gate first.
    #[track_caller]
    pub fn new(element: BasicType, lanes: u32) -> Self {
        match Self::try_new(element, lanes) {
            Some(vt) => vt,
            None => panic!("invalid vector shape: {} x {}", lanes, element),
        }
    }

    /// Build a vector type, returning `None` for an illegal shape.
    #[inline]
    pub const fn try_new(element: BasicType, lanes: u32) -> Option<Self> {
        if element.is_primitive() && lanes > 1 && lanes.is_power_of_two() {
            Some(VectorType { element, lanes })
        } else {
            None
        }
    }

    #[inline]
    pub const fn element(&self) -> BasicType {
        self.element
    }

    #[inline]
    pub const fn lanes(&self) -> u32 {
        self.lanes
    }

    /// Total width in bytes.
    #[inline]
    pub const fn length_in_bytes(&self) -> usize {
        self.lanes as usize * self.element.byte_size()
    }
}

impl fmt::Display for VectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vector[{} x {}]", self.lanes, self.element)
    }
}

// =============================================================================
// Node Type
// =============================================================================

/// Result type of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Unknown.
    Top,
    /// Control token.
    Control,
    /// Memory state.
    Memory,
    /// Raw address.
    Address,
    /// A scalar value of the given basic type.
    Scalar(BasicType),
    /// A vector value.
    Vector(VectorType),
    /// A heap object holding a vector payload of the given shape.
    VectorBox(VectorType),
}

impl NodeType {
    /// The vector shape, if this is a vector value.
    #[inline]
    pub const fn as_vector(&self) -> Option<VectorType> {
        match self {
            NodeType::Vector(vt) => Some(*vt),
            _ => None,
        }
    }

    /// The scalar type, if this is a scalar value.
    #[inline]
    pub const fn as_scalar(&self) -> Option<BasicType> {
        match self {
            NodeType::Scalar(bt) => Some(*bt),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_vector(&self) -> bool {
        matches!(self, NodeType::Vector(_))
    }
}

impl From<VectorType> for NodeType {
    fn from(vt: VectorType) -> Self {
        NodeType::Vector(vt)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Top => f.write_str("top"),
            NodeType::Control => f.write_str("control"),
            NodeType::Memory => f.write_str("memory"),
            NodeType::Address => f.write_str("address"),
            NodeType::Scalar(bt) => write!(f, "{}", bt),
            NodeType::Vector(vt) => write!(f, "{}", vt),
            NodeType::VectorBox(vt) => write!(f, "box<{}>", vt),
        }
    }
}

// =============================================================================
// Scalar Constants
// =============================================================================

/// A typed scalar constant as interned by the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarConstant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl ScalarConstant {
    /// The zero of the register class holding `bt`.
    ///
    /// Returns `None` for non-primitive types.
    pub const fn zero(bt: BasicType) -> Option<Self> {
        match bt.stack_type() {
            BasicType::Int => Some(ScalarConstant::Int(0)),
            BasicType::Long => Some(ScalarConstant::Long(0)),
            BasicType::Float => Some(ScalarConstant::Float(0.0)),
            BasicType::Double => Some(ScalarConstant::Double(0.0)),
            _ => None,
        }
    }

    /// The scalar type of this constant.
    pub const fn basic_type(&self) -> BasicType {
        match self {
            ScalarConstant::Int(_) => BasicType::Int,
            ScalarConstant::Long(_) => BasicType::Long,
            ScalarConstant::Float(_) => BasicType::Float,
            ScalarConstant::Double(_) => BasicType::Double,
        }
    }

    /// Integral value widened to 64 bits; floats are converted numerically.
    pub fn as_i64(&self) -> i64 {
        match *self {
            ScalarConstant::Int(v) => v as i64,
            ScalarConstant::Long(v) => v,
            ScalarConstant::Float(v) => v as i64,
            ScalarConstant::Double(v) => v as i64,
        }
    }

    /// Floating value widened to 64 bits; integers are converted numerically.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarConstant::Int(v) => v as f64,
            ScalarConstant::Long(v) => v as f64,
            ScalarConstant::Float(v) => v as f64,
            ScalarConstant::Double(v) => v,
        }
    }

    /// Bitwise equality, so that `NaN == NaN` and `-0.0 != 0.0`.
    pub fn bits_eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (ScalarConstant::Float(a), ScalarConstant::Float(b)) => a.to_bits() == b.to_bits(),
            (ScalarConstant::Double(a), ScalarConstant::Double(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for ScalarConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarConstant::Int(v) => write!(f, "{}", v),
            ScalarConstant::Long(v) => write!(f, "{}L", v),
            ScalarConstant::Float(v) => write!(f, "{}f", v),
            ScalarConstant::Double(v) => write!(f, "{}d", v),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_type_classes() {
        assert!(BasicType::Double.is_floating());
        assert!(!BasicType::Object.is_primitive());
    }

    #[test]
    fn test_basic_type_sizes() {
        let sizes: Vec<_> = BasicType::PRIMITIVES.iter().map(|t| t.byte_size()).collect();
        assert_eq!(sizes, vec![1, 2, 1, 2, 4, 8, 4, 8]);
    }

    #[test]
    fn test_vector_type_shape() {
        let vt = VectorType::new(BasicType::Short, 8);
        assert_eq!(vt.length_in_bytes(), 16);
        assert_eq!(vt.to_string(), "vector[8 x short]");
        assert_eq!(vt, VectorType::new(BasicType::Short, 8));
        assert_ne!(vt, VectorType::new(BasicType::Char, 8));
    }

    #[test]
    fn test_vector_type_rejects_bad_shapes() {
        assert!(VectorType::try_new(BasicType::Int, 1).is_none());
        assert!(VectorType::try_new(BasicType::Int, 6).is_none());
        assert!(VectorType::try_new(BasicType::Object, 4).is_none());
        assert!(VectorType::try_new(BasicType::Boolean, 16).is_some());
    }

    #[test]
    #[should_panic(expected = "invalid vector shape")]
    fn test_vector_type_new_panics() {
        let _ = VectorType::new(BasicType::Long, 3);
    }

    #[test]
    fn test_zero_constants() {
        assert_eq!(ScalarConstant::zero(BasicType::Byte), Some(ScalarConstant::Int(0)));
        assert_eq!(ScalarConstant::zero(BasicType::Long), Some(ScalarConstant::Long(0)));
        assert_eq!(
            ScalarConstant::zero(BasicType::Double),
            Some(ScalarConstant::Double(0.0))
        );
        assert_eq!(ScalarConstant::zero(BasicType::Object), None);
    }

    #[test]
    fn test_bits_eq_distinguishes_zero_signs() {
        let pos = ScalarConstant::Double(0.0);
        let neg = ScalarConstant::Double(-0.0);
        assert!(!pos.bits_eq(&neg));
        let nan = ScalarConstant::Float(f32::NAN);
        assert!(nan.bits_eq(&nan));
    }
}
