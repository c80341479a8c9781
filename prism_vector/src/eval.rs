//! Lane-level evaluation of vector graphs.
//!
//! [`LaneEvaluator`] interprets vector nodes over concrete values so that
//! construction can be checked against the scalar semantics it replaces.
//!
//! # Value Model
//!
//! - Scalars are [`ScalarConstant`]s. Sub-word values are held as `Int`,
//!   sign- or zero-extended by lane type the way a scalar load would.
//! - Vectors are little-endian byte buffers tagged with a lane type.
//!   Packs concatenate their inputs' bytes, so pair views built by a
//!   binary-tree pack hold exactly the leaves in order.
//!
//! Integer lanes follow two's-complement wrapping; shift counts are masked to
//! the int or long width; float min/max propagate NaN and order `-0.0`
//! below `+0.0`.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::ir::graph::Graph;
use crate::ir::node::NodeId;
use crate::ir::operators::{Operator, ReductionOpcode, VectorOpcode, VectorShape};
use crate::ir::types::{BasicType, ScalarConstant, VectorType};
use crate::vector::logic::apply_truth_table;
use crate::vector::VectorNode;

// =============================================================================
// Errors
// =============================================================================

/// Why a node could not be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A parameter (or other leaf) has no bound value.
    #[error("no value bound for node {0:?}")]
    Unbound(NodeId),

    /// The evaluator has no model for this operator.
    #[error("cannot evaluate '{op}' at node {node:?}")]
    Unsupported { node: NodeId, op: Operator },

    /// A required input slot is empty.
    #[error("node {node:?} has no input in slot {slot}")]
    MissingInput { node: NodeId, slot: usize },

    /// An input evaluated to the wrong kind of value.
    #[error("node {node:?}: expected {expected}")]
    Operand {
        node: NodeId,
        expected: &'static str,
    },

    /// A lane index past the end of a vector.
    #[error("node {node:?}: lane {lane} out of range")]
    LaneOutOfRange { node: NodeId, lane: usize },
}

// =============================================================================
// Values
// =============================================================================

/// A vector value as raw lane bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorValue {
    element: BasicType,
    bytes: SmallVec<[u8; 64]>,
}

impl VectorValue {
    /// Encode `lanes` at the width of `element`, truncating integers.
    pub fn from_lanes(element: BasicType, lanes: &[ScalarConstant]) -> Self {
        let mut bytes = SmallVec::new();
        for &lane in lanes {
            encode_lane(element, lane, &mut bytes);
        }
        VectorValue { element, bytes }
    }

    /// Every lane of `vt` set to `value`.
    pub fn splat(vt: VectorType, value: ScalarConstant) -> Self {
        let mut bytes = SmallVec::new();
        for _ in 0..vt.lanes() {
            encode_lane(vt.element(), value, &mut bytes);
        }
        VectorValue {
            element: vt.element(),
            bytes,
        }
    }

    #[inline]
    pub fn element(&self) -> BasicType {
        self.element
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of whole lanes of the tagged type.
    pub fn lane_count(&self) -> usize {
        self.bytes.len() / self.element.byte_size().max(1)
    }

    /// Lane `index` read as the tagged type.
    pub fn lane(&self, index: usize) -> Option<ScalarConstant> {
        self.lane_as(index, self.element)
    }

    /// Lane `index` read as `bt`, regardless of the tag.
    pub fn lane_as(&self, index: usize, bt: BasicType) -> Option<ScalarConstant> {
        let size = bt.byte_size();
        let start = index.checked_mul(size)?;
        let chunk = self.bytes.get(start..start + size)?;
        decode_lane(bt, chunk)
    }

    /// All lanes of the tagged type.
    pub fn lanes(&self) -> Vec<ScalarConstant> {
        (0..self.lane_count()).filter_map(|i| self.lane(i)).collect()
    }
}

/// Value of an evaluated node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(ScalarConstant),
    Vector(VectorValue),
}

impl Value {
    pub fn as_scalar(&self) -> Option<ScalarConstant> {
        match self {
            Value::Scalar(s) => Some(*s),
            Value::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&VectorValue> {
        match self {
            Value::Vector(v) => Some(v),
            Value::Scalar(_) => None,
        }
    }
}

impl From<ScalarConstant> for Value {
    fn from(value: ScalarConstant) -> Self {
        Value::Scalar(value)
    }
}

impl From<VectorValue> for Value {
    fn from(value: VectorValue) -> Self {
        Value::Vector(value)
    }
}

// =============================================================================
// Lane Encoding
// =============================================================================

fn encode_lane(bt: BasicType, value: ScalarConstant, out: &mut SmallVec<[u8; 64]>) {
    match bt {
        BasicType::Boolean | BasicType::Byte => out.push(value.as_i64() as u8),
        BasicType::Char | BasicType::Short => {
            out.extend_from_slice(&(value.as_i64() as u16).to_le_bytes())
        }
        BasicType::Int => out.extend_from_slice(&(value.as_i64() as i32).to_le_bytes()),
        BasicType::Long => out.extend_from_slice(&value.as_i64().to_le_bytes()),
        BasicType::Float => out.extend_from_slice(&as_f32(value).to_bits().to_le_bytes()),
        BasicType::Double => out.extend_from_slice(&value.as_f64().to_bits().to_le_bytes()),
        BasicType::Object | BasicType::Array | BasicType::Void => {}
    }
}

fn decode_lane(bt: BasicType, chunk: &[u8]) -> Option<ScalarConstant> {
    let value = match bt {
        BasicType::Boolean => ScalarConstant::Int(i32::from(chunk[0])),
        BasicType::Byte => ScalarConstant::Int(i32::from(chunk[0] as i8)),
        BasicType::Char => ScalarConstant::Int(i32::from(u16::from_le_bytes(chunk.try_into().ok()?))),
        BasicType::Short => ScalarConstant::Int(i32::from(i16::from_le_bytes(chunk.try_into().ok()?))),
        BasicType::Int => ScalarConstant::Int(i32::from_le_bytes(chunk.try_into().ok()?)),
        BasicType::Long => ScalarConstant::Long(i64::from_le_bytes(chunk.try_into().ok()?)),
        BasicType::Float => {
            ScalarConstant::Float(f32::from_bits(u32::from_le_bytes(chunk.try_into().ok()?)))
        }
        BasicType::Double => {
            ScalarConstant::Double(f64::from_bits(u64::from_le_bytes(chunk.try_into().ok()?)))
        }
        BasicType::Object | BasicType::Array | BasicType::Void => return None,
    };
    Some(value)
}

fn as_f32(value: ScalarConstant) -> f32 {
    match value {
        ScalarConstant::Int(v) => v as f32,
        ScalarConstant::Long(v) => v as f32,
        ScalarConstant::Float(v) => v,
        ScalarConstant::Double(v) => v as f32,
    }
}

/// Integer result in the register class of `bt`.
fn int(bt: BasicType, value: i64) -> ScalarConstant {
    match bt.stack_type() {
        BasicType::Long => ScalarConstant::Long(value),
        _ => ScalarConstant::Int(value as i32),
    }
}

/// Floating result in the precision of `bt`.
fn float(bt: BasicType, value: f64) -> ScalarConstant {
    match bt {
        BasicType::Float => ScalarConstant::Float(value as f32),
        _ => ScalarConstant::Double(value),
    }
}

fn java_min(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if a == 0.0 && b == 0.0 {
        if a.is_sign_negative() {
            a
        } else {
            b
        }
    } else if a < b {
        a
    } else {
        b
    }
}

fn java_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if a == 0.0 && b == 0.0 {
        if a.is_sign_positive() {
            a
        } else {
            b
        }
    } else if a > b {
        a
    } else {
        b
    }
}

/// Numeric conversion between lane types.
fn convert(value: ScalarConstant, to: BasicType) -> ScalarConstant {
    match (value, to) {
        (_, BasicType::Float) => ScalarConstant::Float(as_f32(value)),
        (_, BasicType::Double) => ScalarConstant::Double(value.as_f64()),
        (ScalarConstant::Float(f), BasicType::Long) => ScalarConstant::Long(f as i64),
        (ScalarConstant::Double(d), BasicType::Long) => ScalarConstant::Long(d as i64),
        (ScalarConstant::Float(f), _) => int(to, i64::from(f as i32)),
        (ScalarConstant::Double(d), _) => int(to, i64::from(d as i32)),
        (_, _) => int(to, value.as_i64()),
    }
}

// =============================================================================
// Lane Operations
// =============================================================================

fn unary_lane(vopc: VectorOpcode, bt: BasicType, x: ScalarConstant) -> Option<ScalarConstant> {
    use VectorOpcode::*;
    let value = match vopc {
        AbsVB | AbsVS | AbsVI | AbsVL => int(bt, x.as_i64().wrapping_abs()),
        NegVI => int(bt, x.as_i64().wrapping_neg()),
        PopCountVI => ScalarConstant::Int((x.as_i64() as i32).count_ones() as i32),
        AbsVF | AbsVD => float(bt, x.as_f64().abs()),
        NegVF | NegVD => float(bt, -x.as_f64()),
        SqrtVF | SqrtVD => float(bt, x.as_f64().sqrt()),
        _ => return None,
    };
    Some(value)
}

fn arith_lane(
    vopc: VectorOpcode,
    bt: BasicType,
    a: ScalarConstant,
    b: ScalarConstant,
) -> Option<ScalarConstant> {
    use VectorOpcode::*;
    let (x, y) = (a.as_i64(), b.as_i64());
    let (fx, fy) = (a.as_f64(), b.as_f64());
    let value = match vopc {
        AddVB | AddVS | AddVI | AddVL => int(bt, x.wrapping_add(y)),
        SubVB | SubVS | SubVI | SubVL => int(bt, x.wrapping_sub(y)),
        MulVB | MulVS | MulVI | MulVL => int(bt, x.wrapping_mul(y)),
        AddVF | AddVD => float(bt, fx + fy),
        SubVF | SubVD => float(bt, fx - fy),
        MulVF | MulVD => float(bt, fx * fy),
        DivVF | DivVD => float(bt, fx / fy),
        MinV if bt.is_floating() => float(bt, java_min(fx, fy)),
        MaxV if bt.is_floating() => float(bt, java_max(fx, fy)),
        MinV => int(bt, x.min(y)),
        MaxV => int(bt, x.max(y)),
        _ => return None,
    };
    Some(value)
}

fn shift_lane(vopc: VectorOpcode, bt: BasicType, a: ScalarConstant, count: i64) -> Option<ScalarConstant> {
    use VectorOpcode::*;
    let x = a.as_i64();
    let int_count = (count & 31) as u32;
    let long_count = (count & 63) as u32;
    let value = match vopc {
        LShiftVB | LShiftVS | LShiftVI => int(bt, i64::from((x as i32).wrapping_shl(int_count))),
        RShiftVB | RShiftVS | RShiftVI => int(bt, i64::from((x as i32) >> int_count)),
        URShiftVB | URShiftVS | URShiftVI => int(bt, i64::from(((x as i32 as u32) >> int_count) as i32)),
        LShiftVL => ScalarConstant::Long(x.wrapping_shl(long_count)),
        RShiftVL => ScalarConstant::Long(x >> long_count),
        URShiftVL => ScalarConstant::Long(((x as u64) >> long_count) as i64),
        _ => return None,
    };
    Some(value)
}

fn reduce_step(
    ropc: ReductionOpcode,
    bt: BasicType,
    acc: ScalarConstant,
    x: ScalarConstant,
) -> ScalarConstant {
    use ReductionOpcode::*;
    let (a, b) = (acc.as_i64(), x.as_i64());
    match ropc {
        AddReductionVI | AddReductionVL => int(bt, a.wrapping_add(b)),
        MulReductionVI | MulReductionVL => int(bt, a.wrapping_mul(b)),
        AddReductionVF | AddReductionVD => float(bt, acc.as_f64() + x.as_f64()),
        MulReductionVF | MulReductionVD => float(bt, acc.as_f64() * x.as_f64()),
        MinReductionV if bt.is_floating() => float(bt, java_min(acc.as_f64(), x.as_f64())),
        MaxReductionV if bt.is_floating() => float(bt, java_max(acc.as_f64(), x.as_f64())),
        MinReductionV => int(bt, a.min(b)),
        MaxReductionV => int(bt, a.max(b)),
        AndReductionV => int(bt, a & b),
        OrReductionV => int(bt, a | b),
        XorReductionV => int(bt, a ^ b),
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Interprets vector nodes of a graph over bound leaf values.
///
/// Results are memoized per node.
pub struct LaneEvaluator<'g> {
    graph: &'g Graph,
    values: FxHashMap<NodeId, Value>,
}

impl<'g> LaneEvaluator<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        LaneEvaluator {
            graph,
            values: FxHashMap::default(),
        }
    }

    /// Fix the value of `id`, typically a parameter.
    pub fn bind(&mut self, id: NodeId, value: impl Into<Value>) {
        self.values.insert(id, value.into());
    }

    /// Evaluate `id` and everything it depends on.
    pub fn eval(&mut self, id: NodeId) -> Result<Value, EvalError> {
        if let Some(value) = self.values.get(&id) {
            return Ok(value.clone());
        }
        let value = self.compute(id)?;
        self.values.insert(id, value.clone());
        Ok(value)
    }

    pub fn eval_scalar(&mut self, id: NodeId) -> Result<ScalarConstant, EvalError> {
        self.eval(id)?.as_scalar().ok_or(EvalError::Operand {
            node: id,
            expected: "a scalar",
        })
    }

    pub fn eval_vector(&mut self, id: NodeId) -> Result<VectorValue, EvalError> {
        match self.eval(id)? {
            Value::Vector(v) => Ok(v),
            Value::Scalar(_) => Err(EvalError::Operand {
                node: id,
                expected: "a vector",
            }),
        }
    }

    // =========================================================================
    // Operand Access
    // =========================================================================

    fn input(&self, id: NodeId, slot: usize) -> Result<NodeId, EvalError> {
        self.graph
            .input(id, slot)
            .ok_or(EvalError::MissingInput { node: id, slot })
    }

    fn scalar_in(&mut self, id: NodeId, slot: usize) -> Result<ScalarConstant, EvalError> {
        let input = self.input(id, slot)?;
        self.eval_scalar(input)
    }

    fn vector_in(&mut self, id: NodeId, slot: usize) -> Result<VectorValue, EvalError> {
        let input = self.input(id, slot)?;
        self.eval_vector(input)
    }

    fn vector_type(&self, id: NodeId) -> Result<VectorType, EvalError> {
        self.graph.ty(id).as_vector().ok_or(EvalError::Operand {
            node: id,
            expected: "a vector-typed node",
        })
    }

    fn read_lanes(
        id: NodeId,
        v: &VectorValue,
        bt: BasicType,
        count: usize,
    ) -> Result<SmallVec<[ScalarConstant; 16]>, EvalError> {
        (0..count)
            .map(|lane| v.lane_as(lane, bt).ok_or(EvalError::LaneOutOfRange { node: id, lane }))
            .collect()
    }

    fn unsupported(&self, id: NodeId) -> EvalError {
        EvalError::Unsupported {
            node: id,
            op: self.graph.op(id),
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn compute(&mut self, id: NodeId) -> Result<Value, EvalError> {
        let op = self.graph.op(id);
        if let Some(constant) = op.as_constant() {
            return Ok(Value::Scalar(constant));
        }
        match op {
            Operator::CastPP => {
                let input = self.input(id, 1)?;
                self.eval(input)
            }
            Operator::Parameter(_) => Err(EvalError::Unbound(id)),
            Operator::Vector(vopc) => self.vector(id, vopc),
            Operator::Reduction(ropc) => self.reduction(id, ropc),
            _ => Err(self.unsupported(id)),
        }
    }

    fn vector(&mut self, id: NodeId, vopc: VectorOpcode) -> Result<Value, EvalError> {
        match vopc.shape() {
            VectorShape::Replicate | VectorShape::ShiftCount => {
                let vt = self.vector_type(id)?;
                let s = self.scalar_in(id, 1)?;
                Ok(VectorValue::splat(vt, s).into())
            }
            VectorShape::Pack => self.pack(id),
            VectorShape::Extract => {
                let v = self.vector_in(id, 1)?;
                let lane = self.scalar_in(id, 2)?.as_i64() as usize;
                let bt = self.graph.ty(id).as_scalar().ok_or(EvalError::Operand {
                    node: id,
                    expected: "a scalar-typed extract",
                })?;
                v.lane_as(lane, bt)
                    .map(Value::Scalar)
                    .ok_or(EvalError::LaneOutOfRange { node: id, lane })
            }
            VectorShape::Unary => {
                let vt = self.vector_type(id)?;
                let v = self.vector_in(id, 1)?;
                let lanes = Self::read_lanes(id, &v, vt.element(), vt.lanes() as usize)?;
                let mut out = SmallVec::<[ScalarConstant; 16]>::new();
                for x in lanes {
                    out.push(unary_lane(vopc, vt.element(), x).ok_or_else(|| self.unsupported(id))?);
                }
                Ok(VectorValue::from_lanes(vt.element(), &out).into())
            }
            VectorShape::Binary => self.binary(id, vopc),
            VectorShape::Ternary => self.ternary(id, vopc),
            VectorShape::Cast => {
                let vt = self.vector_type(id)?;
                let v = self.vector_in(id, 1)?;
                let lanes = Self::read_lanes(id, &v, v.element(), vt.lanes() as usize)?;
                let out: SmallVec<[ScalarConstant; 16]> =
                    lanes.into_iter().map(|x| convert(x, vt.element())).collect();
                Ok(VectorValue::from_lanes(vt.element(), &out).into())
            }
            VectorShape::Reinterpret => {
                let vt = self.vector_type(id)?;
                let v = self.vector_in(id, 1)?;
                let mut bytes = v.bytes;
                bytes.resize(vt.length_in_bytes(), 0);
                Ok(VectorValue {
                    element: vt.element(),
                    bytes,
                }
                .into())
            }
            VectorShape::Insert => {
                let vt = self.vector_type(id)?;
                let mut v = self.vector_in(id, 1)?;
                let value = self.scalar_in(id, 2)?;
                let lane = self.scalar_in(id, 3)?.as_i64() as usize;
                let size = vt.element().byte_size();
                let start = lane * size;
                if lane >= vt.lanes() as usize || start + size > v.bytes.len() {
                    return Err(EvalError::LaneOutOfRange { node: id, lane });
                }
                let mut encoded = SmallVec::<[u8; 64]>::new();
                encode_lane(vt.element(), value, &mut encoded);
                v.bytes[start..start + size].copy_from_slice(&encoded);
                v.element = vt.element();
                Ok(v.into())
            }
            VectorShape::StoreMask => {
                let vt = self.vector_type(id)?;
                let v = self.vector_in(id, 1)?;
                let size = self.scalar_in(id, 2)?.as_i64() as usize;
                let mut bytes = SmallVec::new();
                for lane in 0..vt.lanes() as usize {
                    let chunk = v
                        .bytes
                        .get(lane * size..(lane + 1) * size)
                        .ok_or(EvalError::LaneOutOfRange { node: id, lane })?;
                    bytes.push(u8::from(chunk.iter().any(|&b| b != 0)));
                }
                Ok(VectorValue {
                    element: BasicType::Boolean,
                    bytes,
                }
                .into())
            }
            VectorShape::MacroLogic => {
                let vt = self.vector_type(id)?;
                let a = self.vector_in(id, 1)?;
                let b = self.vector_in(id, 2)?;
                let c = self.vector_in(id, 3)?;
                let table = self.scalar_in(id, 4)?.as_i64() as u8;
                let width = vt.length_in_bytes();
                if a.bytes.len() < width || b.bytes.len() < width || c.bytes.len() < width {
                    return Err(EvalError::Operand {
                        node: id,
                        expected: "inputs as wide as the result",
                    });
                }
                let bytes = (0..width)
                    .map(|i| {
                        apply_truth_table(
                            table,
                            u64::from(a.bytes[i]),
                            u64::from(b.bytes[i]),
                            u64::from(c.bytes[i]),
                        ) as u8
                    })
                    .collect();
                Ok(VectorValue {
                    element: vt.element(),
                    bytes,
                }
                .into())
            }
            VectorShape::Box => {
                let value = self.input(id, VectorNode::BOX_VALUE)?;
                self.eval(value)
            }
            VectorShape::Unbox => {
                let object = self.input(id, VectorNode::UNBOX_OBJECT)?;
                self.eval(object)
            }
            VectorShape::Load | VectorShape::Store => Err(self.unsupported(id)),
        }
    }

    fn pack(&mut self, id: NodeId) -> Result<Value, EvalError> {
        let vt = self.vector_type(id)?;
        let mut bytes = SmallVec::new();
        for slot in 1..self.graph.required_operand_count(id) {
            let input = self.input(id, slot)?;
            match self.eval(input)? {
                Value::Scalar(s) => encode_lane(vt.element(), s, &mut bytes),
                Value::Vector(v) => bytes.extend_from_slice(v.bytes()),
            }
        }
        Ok(VectorValue {
            element: vt.element(),
            bytes,
        }
        .into())
    }

    fn binary(&mut self, id: NodeId, vopc: VectorOpcode) -> Result<Value, EvalError> {
        let vt = self.vector_type(id)?;
        let bt = vt.element();
        let lanes = vt.lanes() as usize;

        match vopc {
            VectorOpcode::AndV | VectorOpcode::OrV | VectorOpcode::XorV => {
                let a = self.vector_in(id, 1)?;
                let b = self.vector_in(id, 2)?;
                let width = vt.length_in_bytes();
                if a.bytes.len() < width || b.bytes.len() < width {
                    return Err(EvalError::Operand {
                        node: id,
                        expected: "inputs as wide as the result",
                    });
                }
                let bytes = (0..width)
                    .map(|i| match vopc {
                        VectorOpcode::AndV => a.bytes[i] & b.bytes[i],
                        VectorOpcode::OrV => a.bytes[i] | b.bytes[i],
                        _ => a.bytes[i] ^ b.bytes[i],
                    })
                    .collect();
                Ok(VectorValue { element: bt, bytes }.into())
            }
            VectorOpcode::MulAddVS2VI => {
                let a = self.vector_in(id, 1)?;
                let b = self.vector_in(id, 2)?;
                let xs = Self::read_lanes(id, &a, BasicType::Short, lanes * 2)?;
                let ys = Self::read_lanes(id, &b, BasicType::Short, lanes * 2)?;
                let out: SmallVec<[ScalarConstant; 16]> = (0..lanes)
                    .map(|i| {
                        let lo = xs[2 * i].as_i64() * ys[2 * i].as_i64();
                        let hi = xs[2 * i + 1].as_i64() * ys[2 * i + 1].as_i64();
                        ScalarConstant::Int(lo.wrapping_add(hi) as i32)
                    })
                    .collect();
                Ok(VectorValue::from_lanes(BasicType::Int, &out).into())
            }
            VectorOpcode::RoundDoubleModeV => {
                let v = self.vector_in(id, 1)?;
                let mode = self.scalar_in(id, 2)?.as_i64();
                let round: fn(f64) -> f64 = match mode {
                    0 => f64::round_ties_even,
                    1 => f64::floor,
                    2 => f64::ceil,
                    _ => return Err(self.unsupported(id)),
                };
                let out: SmallVec<[ScalarConstant; 16]> = Self::read_lanes(id, &v, bt, lanes)?
                    .into_iter()
                    .map(|x| float(bt, round(x.as_f64())))
                    .collect();
                Ok(VectorValue::from_lanes(bt, &out).into())
            }
            _ if vopc.is_vector_shift() => {
                let v = self.vector_in(id, 1)?;
                let count = self.shift_count(id)?;
                let mut out = SmallVec::<[ScalarConstant; 16]>::new();
                for x in Self::read_lanes(id, &v, bt, lanes)? {
                    out.push(shift_lane(vopc, bt, x, count).ok_or_else(|| self.unsupported(id))?);
                }
                Ok(VectorValue::from_lanes(bt, &out).into())
            }
            _ => {
                let a = self.vector_in(id, 1)?;
                let b = self.vector_in(id, 2)?;
                let xs = Self::read_lanes(id, &a, bt, lanes)?;
                let ys = Self::read_lanes(id, &b, bt, lanes)?;
                let mut out = SmallVec::<[ScalarConstant; 16]>::new();
                for (x, y) in xs.into_iter().zip(ys) {
                    out.push(arith_lane(vopc, bt, x, y).ok_or_else(|| self.unsupported(id))?);
                }
                Ok(VectorValue::from_lanes(bt, &out).into())
            }
        }
    }

    /// The count operand of a vector shift.
    ///
    /// A shift-count carrier contributes its scalar directly so that counts
    /// wider than the lane survive.
    fn shift_count(&mut self, id: NodeId) -> Result<i64, EvalError> {
        let count = self.input(id, 2)?;
        let carrier = self
            .graph
            .node(count)
            .vector_opcode()
            .is_some_and(VectorOpcode::is_vector_shift_count);
        if carrier {
            return Ok(self.scalar_in(count, 1)?.as_i64());
        }
        match self.eval(count)? {
            Value::Scalar(s) => Ok(s.as_i64()),
            Value::Vector(v) => v
                .lane(0)
                .map(|s| s.as_i64())
                .ok_or(EvalError::LaneOutOfRange { node: count, lane: 0 }),
        }
    }

    fn ternary(&mut self, id: NodeId, vopc: VectorOpcode) -> Result<Value, EvalError> {
        let vt = self.vector_type(id)?;
        let bt = vt.element();
        let lanes = vt.lanes() as usize;
        let a = self.vector_in(id, 1)?;
        let b = self.vector_in(id, 2)?;
        let c = self.vector_in(id, 3)?;

        match vopc {
            VectorOpcode::FmaVF | VectorOpcode::FmaVD => {
                let xs = Self::read_lanes(id, &a, bt, lanes)?;
                let ys = Self::read_lanes(id, &b, bt, lanes)?;
                let zs = Self::read_lanes(id, &c, bt, lanes)?;
                let out: SmallVec<[ScalarConstant; 16]> = (0..lanes)
                    .map(|i| match bt {
                        BasicType::Float => ScalarConstant::Float(
                            as_f32(xs[i]).mul_add(as_f32(ys[i]), as_f32(zs[i])),
                        ),
                        _ => ScalarConstant::Double(
                            xs[i].as_f64().mul_add(ys[i].as_f64(), zs[i].as_f64()),
                        ),
                    })
                    .collect();
                Ok(VectorValue::from_lanes(bt, &out).into())
            }
            VectorOpcode::CMoveVF | VectorOpcode::CMoveVD => {
                // (condition, if_false, if_true); any set bit selects if_true.
                let size = bt.byte_size();
                let width = vt.length_in_bytes();
                if a.bytes.len() < width || b.bytes.len() < width || c.bytes.len() < width {
                    return Err(EvalError::Operand {
                        node: id,
                        expected: "inputs as wide as the result",
                    });
                }
                let mut bytes = SmallVec::new();
                for lane in 0..lanes {
                    let range = lane * size..(lane + 1) * size;
                    let taken = a.bytes[range.clone()].iter().any(|&x| x != 0);
                    let source = if taken { &c } else { &b };
                    bytes.extend_from_slice(&source.bytes[range]);
                }
                Ok(VectorValue { element: bt, bytes }.into())
            }
            _ => Err(self.unsupported(id)),
        }
    }

    fn reduction(&mut self, id: NodeId, ropc: ReductionOpcode) -> Result<Value, EvalError> {
        let acc = self.scalar_in(id, 1)?;
        let vector = self.input(id, 2)?;
        let vt = self.vector_type(vector)?;
        let v = self.eval_vector(vector)?;
        let bt = vt.element();

        let mut result = acc;
        for x in Self::read_lanes(id, &v, bt, vt.lanes() as usize)? {
            result = reduce_step(ropc, bt, result, x);
        }
        Ok(Value::Scalar(result))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::operators::ScalarOpcode;
    use crate::ir::types::NodeType;
    use crate::vector::{
        make_binary, make_cast, make_for_scalar, make_insert, make_macro_logic,
        make_reduction, make_reinterpret, make_store_mask, make_ternary, scalar_to_vector,
        shift_count,
    };

    fn ints(values: &[i32]) -> VectorValue {
        let lanes: Vec<_> = values.iter().map(|&v| ScalarConstant::Int(v)).collect();
        VectorValue::from_lanes(BasicType::Int, &lanes)
    }

    fn vector_param(graph: &mut Graph, index: u16, bt: BasicType, lanes: u32) -> NodeId {
        graph.parameter(index, VectorType::new(bt, lanes).into())
    }

    // =========================================================================
    // Values
    // =========================================================================

    #[test]
    fn test_lane_encoding() {
        let v = VectorValue::from_lanes(
            BasicType::Byte,
            &[ScalarConstant::Int(-1), ScalarConstant::Int(300)],
        );
        assert_eq!(v.bytes(), &[0xFF, 0x2C]);
        assert_eq!(v.lane(0), Some(ScalarConstant::Int(-1)));
        assert_eq!(v.lane_as(0, BasicType::Boolean), Some(ScalarConstant::Int(255)));
        assert_eq!(v.lane_as(0, BasicType::Char), Some(ScalarConstant::Int(0x2CFF)));
        assert_eq!(v.lane(2), None);
    }

    #[test]
    fn test_splat() {
        let v = VectorValue::splat(VectorType::new(BasicType::Double, 2), ScalarConstant::Double(1.5));
        assert_eq!(v.lanes(), vec![ScalarConstant::Double(1.5); 2]);
        assert_eq!(v.lane_count(), 2);
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    #[test]
    fn test_add_wraps_in_lane_width() {
        let mut graph = Graph::new();
        let a = vector_param(&mut graph, 0, BasicType::Byte, 4);
        let b = vector_param(&mut graph, 1, BasicType::Byte, 4);
        let add = make_for_scalar(ScalarOpcode::AddI, &[a, b], 4, BasicType::Byte).attach(&mut graph);

        let byte = |xs: [i32; 4]| {
            let lanes: Vec<_> = xs.iter().map(|&x| ScalarConstant::Int(x)).collect();
            VectorValue::from_lanes(BasicType::Byte, &lanes)
        };
        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(a, byte([127, -128, 1, 0]));
        eval.bind(b, byte([1, -1, 2, 0]));
        let out = eval.eval_vector(add).unwrap();
        assert_eq!(
            out.lanes(),
            vec![
                ScalarConstant::Int(-128),
                ScalarConstant::Int(127),
                ScalarConstant::Int(3),
                ScalarConstant::Int(0)
            ]
        );
    }

    #[test]
    fn test_bitwise_ops_are_width_agnostic() {
        let mut graph = Graph::new();
        let vt = VectorType::new(BasicType::Int, 4);
        let a = vector_param(&mut graph, 0, BasicType::Int, 4);
        let b = vector_param(&mut graph, 1, BasicType::Int, 4);
        let and = make_binary(VectorOpcode::AndV, a, b, vt).attach(&mut graph);

        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(a, ints(&[0b1100, -1, 0, 7]));
        eval.bind(b, ints(&[0b1010, 5, -1, 0]));
        assert_eq!(eval.eval_vector(and).unwrap(), ints(&[0b1000, 5, 0, 0]));
    }

    #[test]
    fn test_float_min_max_semantics() {
        assert!(java_min(f64::NAN, 1.0).is_nan());
        assert!(java_min(0.0, -0.0).is_sign_negative());
        assert!(java_max(-0.0, 0.0).is_sign_positive());
        assert_eq!(java_max(2.0, -3.0), 2.0);
    }

    #[test]
    fn test_char_shift_is_logical() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Char, 4);
        let cnt = graph.int_con(4);
        let count = shift_count(ScalarOpcode::RShiftI, cnt, 4, BasicType::Char).attach(&mut graph);
        let shr = make_for_scalar(ScalarOpcode::RShiftI, &[v, count], 4, BasicType::Char)
            .attach(&mut graph);

        let lanes: Vec<_> = [0xFFFF, 0x8000, 0x10, 0]
            .iter()
            .map(|&x| ScalarConstant::Int(x))
            .collect();
        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(v, VectorValue::from_lanes(BasicType::Char, &lanes));
        let out = eval.eval_vector(shr).unwrap();
        assert_eq!(
            out.lanes(),
            vec![
                ScalarConstant::Int(0x0FFF),
                ScalarConstant::Int(0x0800),
                ScalarConstant::Int(0x1),
                ScalarConstant::Int(0)
            ]
        );
    }

    #[test]
    fn test_shift_count_masked() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Int, 4);
        let cnt = graph.int_con(33);
        let count = shift_count(ScalarOpcode::LShiftI, cnt, 4, BasicType::Int).attach(&mut graph);
        let shl = make_for_scalar(ScalarOpcode::LShiftI, &[v, count], 4, BasicType::Int)
            .attach(&mut graph);

        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(v, ints(&[1, -1, 3, i32::MAX]));
        assert_eq!(eval.eval_vector(shl).unwrap(), ints(&[2, -2, 6, -2]));
    }

    #[test]
    fn test_fma_and_cmove() {
        let mut graph = Graph::new();
        let vt = VectorType::new(BasicType::Double, 2);
        let a = vector_param(&mut graph, 0, BasicType::Double, 2);
        let b = vector_param(&mut graph, 1, BasicType::Double, 2);
        let c = vector_param(&mut graph, 2, BasicType::Double, 2);
        let fma = make_ternary(VectorOpcode::FmaVD, a, b, c, vt).attach(&mut graph);
        let cmove = make_ternary(VectorOpcode::CMoveVD, a, b, c, vt).attach(&mut graph);

        let doubles = |xs: [f64; 2]| {
            let lanes: Vec<_> = xs.iter().map(|&x| ScalarConstant::Double(x)).collect();
            VectorValue::from_lanes(BasicType::Double, &lanes)
        };
        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(a, doubles([2.0, 0.0]));
        eval.bind(b, doubles([3.0, 5.0]));
        eval.bind(c, doubles([1.0, 7.0]));
        assert_eq!(eval.eval_vector(fma).unwrap(), doubles([7.0, 7.0]));
        assert_eq!(eval.eval_vector(cmove).unwrap(), doubles([1.0, 5.0]));
    }

    #[test]
    fn test_muladd_pairs() {
        let mut graph = Graph::new();
        let a = vector_param(&mut graph, 0, BasicType::Short, 8);
        let b = vector_param(&mut graph, 1, BasicType::Short, 8);
        let muladd = make_for_scalar(ScalarOpcode::MulAddS2I, &[a, b], 4, BasicType::Int)
            .attach(&mut graph);

        let shorts = |xs: [i32; 8]| {
            let lanes: Vec<_> = xs.iter().map(|&x| ScalarConstant::Int(x)).collect();
            VectorValue::from_lanes(BasicType::Short, &lanes)
        };
        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(a, shorts([1, 2, 3, 4, -1, -1, 100, 0]));
        eval.bind(b, shorts([5, 6, 7, 8, 1, 1, 100, 9]));
        assert_eq!(eval.eval_vector(muladd).unwrap(), ints(&[17, 53, -2, 10000]));
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    #[test]
    fn test_cast_narrows_and_saturates() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Float, 4);
        let cast = make_cast(VectorOpcode::VectorCastF2X, v, BasicType::Byte, 4).attach(&mut graph);

        let lanes: Vec<_> = [1.9f32, -1.9, 1e10, f32::NAN]
            .iter()
            .map(|&x| ScalarConstant::Float(x))
            .collect();
        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(v, VectorValue::from_lanes(BasicType::Float, &lanes));
        let out = eval.eval_vector(cast).unwrap();
        // f2i saturates to i32::MAX, which narrows to -1 as a byte.
        assert_eq!(
            out.lanes(),
            vec![
                ScalarConstant::Int(1),
                ScalarConstant::Int(-1),
                ScalarConstant::Int(-1),
                ScalarConstant::Int(0)
            ]
        );
    }

    #[test]
    fn test_reinterpret_keeps_bits() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Int, 4);
        let bytes = make_reinterpret(v, VectorType::new(BasicType::Byte, 16)).attach(&mut graph);

        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(v, ints(&[0x0403_0201, 0, 0, -1]));
        let out = eval.eval_vector(bytes).unwrap();
        assert_eq!(out.element(), BasicType::Byte);
        assert_eq!(&out.bytes()[..4], &[1, 2, 3, 4]);
        assert_eq!(out.lane(15), Some(ScalarConstant::Int(-1)));
    }

    #[test]
    fn test_insert_and_store_mask() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Int, 4);
        let s = graph.int_con(9);
        let ins = make_insert(&graph, v, s, 2).attach(&mut graph);
        let mask = make_store_mask(&graph, ins, BasicType::Int, 4).attach(&mut graph);

        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(v, ints(&[0, -1, 0, 0]));
        assert_eq!(eval.eval_vector(ins).unwrap(), ints(&[0, -1, 9, 0]));
        assert_eq!(eval.eval_vector(mask).unwrap().bytes(), &[0, 1, 1, 0]);
    }

    #[test]
    fn test_macro_logic_matches_bitwise() {
        let mut graph = Graph::new();
        let vt = VectorType::new(BasicType::Int, 4);
        let a = vector_param(&mut graph, 0, BasicType::Int, 4);
        let b = vector_param(&mut graph, 1, BasicType::Int, 4);
        let c = vector_param(&mut graph, 2, BasicType::Int, 4);
        let xor3 = make_macro_logic(&graph, a, b, c, 0x96, vt).attach(&mut graph);

        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(a, ints(&[1, 2, 3, -1]));
        eval.bind(b, ints(&[4, 2, 5, 0]));
        eval.bind(c, ints(&[16, 0, 6, 7]));
        assert_eq!(eval.eval_vector(xor3).unwrap(), ints(&[1 ^ 4 ^ 16, 0, 3 ^ 5 ^ 6, -1 ^ 7]));
    }

    // =========================================================================
    // Reductions
    // =========================================================================

    #[test]
    fn test_reduction_folds_lanes() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Short, 4);
        let acc = graph.int_con(100);
        let sum = make_reduction(ScalarOpcode::AddI, None, acc, v, BasicType::Short).attach(&mut graph);
        let max = graph.int_con(i32::MIN);
        let top = make_reduction(ScalarOpcode::MaxI, None, max, v, BasicType::Short).attach(&mut graph);

        let lanes: Vec<_> = [1, -2, 3, 32767].iter().map(|&x| ScalarConstant::Int(x)).collect();
        let mut eval = LaneEvaluator::new(&graph);
        eval.bind(v, VectorValue::from_lanes(BasicType::Short, &lanes));
        assert_eq!(eval.eval_scalar(sum).unwrap(), ScalarConstant::Int(100 + 1 - 2 + 3 + 32767));
        assert_eq!(eval.eval_scalar(top).unwrap(), ScalarConstant::Int(32767));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_unbound_parameter() {
        let mut graph = Graph::new();
        let v = vector_param(&mut graph, 0, BasicType::Int, 4);
        let r = scalar_to_vector(v, 4, BasicType::Int).attach(&mut graph);
        let mut eval = LaneEvaluator::new(&graph);
        assert_eq!(eval.eval(r), Err(EvalError::Unbound(v)));
    }

    #[test]
    fn test_loads_unsupported() {
        let mut graph = Graph::new();
        let mem = graph.parameter(0, NodeType::Memory);
        let adr = graph.parameter(1, NodeType::Address);
        let load = crate::vector::make_load(
            None,
            mem,
            adr,
            4,
            BasicType::Int,
            crate::vector::ControlDependency::default(),
        )
        .attach(&mut graph);
        let mut eval = LaneEvaluator::new(&graph);
        assert!(matches!(eval.eval(load), Err(EvalError::Unsupported { .. })));
    }
}
