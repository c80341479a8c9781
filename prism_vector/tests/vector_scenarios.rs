//! End-to-end construction scenarios through the public API.

use prism_vector::ir::{BasicType, Graph, NodeType, Operator, ReductionOpcode, ScalarConstant};
use prism_vector::ir::{ScalarOpcode, VectorOpcode, VectorType};
use prism_vector::vector::{
    implemented, is_vector_bitwise_not_pattern, make_binary, make_for_scalar, make_reinterpret,
    make_reduction, make_reduction_input, neutral_element, reduction_implemented,
    reduction_opcode, reinterpret_identity, scalar_to_vector, shift_count, vector_opcode,
};
use prism_vector::{LaneEvaluator, SimdLevel, TargetMatcher, VectorConfig, VectorValue};

fn int_lanes(values: &[i32], bt: BasicType) -> VectorValue {
    let lanes: Vec<_> = values.iter().map(|&v| ScalarConstant::Int(v)).collect();
    VectorValue::from_lanes(bt, &lanes)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_int_add_resolves_and_is_implemented() {
    assert_eq!(vector_opcode(ScalarOpcode::AddI, BasicType::Int), Some(VectorOpcode::AddVI));

    let matcher = TargetMatcher::default();
    assert!(implemented(&matcher, ScalarOpcode::AddI, 4, BasicType::Int));

    let mut graph = Graph::new();
    let vt = VectorType::new(BasicType::Int, 4);
    let a = graph.parameter(0, vt.into());
    let b = graph.parameter(1, vt.into());
    let add = make_for_scalar(ScalarOpcode::AddI, &[a, b], 4, BasicType::Int).attach(&mut graph);
    assert_eq!(graph.op(add), Operator::Vector(VectorOpcode::AddVI));
    assert_eq!(graph.ty(add), NodeType::Vector(vt));

    let mut eval = LaneEvaluator::new(&graph);
    eval.bind(a, int_lanes(&[1, 2, 3, i32::MAX], BasicType::Int));
    eval.bind(b, int_lanes(&[10, 20, 30, 1], BasicType::Int));
    assert_eq!(
        eval.eval_vector(add).unwrap(),
        int_lanes(&[11, 22, 33, i32::MIN], BasicType::Int)
    );
}

#[test]
fn test_double_multiply_reduction() {
    let ropc = reduction_opcode(ScalarOpcode::MulD, BasicType::Double);
    assert_eq!(ropc, Some(ReductionOpcode::MulReductionVD));
    assert_eq!(
        neutral_element(ReductionOpcode::MulReductionVD, BasicType::Double),
        Some(ScalarConstant::Double(1.0))
    );

    let matcher = TargetMatcher::new(SimdLevel::Avx2);
    assert!(reduction_implemented(&matcher, ScalarOpcode::MulD, 4, BasicType::Double));

    let mut graph = Graph::new();
    let vt = VectorType::new(BasicType::Double, 4);
    let v = graph.parameter(0, vt.into());
    let seed = make_reduction_input(&mut graph, ScalarOpcode::MulD, BasicType::Double);
    assert_eq!(graph.constant(seed), Some(ScalarConstant::Double(1.0)));

    let product = make_reduction(ScalarOpcode::MulD, None, seed, v, BasicType::Double)
        .attach(&mut graph);
    assert_eq!(graph.ty(product), NodeType::Scalar(BasicType::Double));

    let lanes: Vec<_> = [2.0, 3.0, 0.5, -1.0]
        .iter()
        .map(|&x| ScalarConstant::Double(x))
        .collect();
    let mut eval = LaneEvaluator::new(&graph);
    eval.bind(v, VectorValue::from_lanes(BasicType::Double, &lanes));
    assert_eq!(eval.eval_scalar(product).unwrap(), ScalarConstant::Double(-3.0));
}

#[test]
fn test_char_right_shift_builds_unsigned_shift() {
    let mut graph = Graph::new();
    let vt = VectorType::new(BasicType::Char, 8);
    let v = graph.parameter(0, vt.into());
    let cnt = graph.int_con(1);
    let count = shift_count(ScalarOpcode::RShiftI, cnt, 8, BasicType::Char).attach(&mut graph);
    let shr =
        make_for_scalar(ScalarOpcode::RShiftI, &[v, count], 8, BasicType::Char).attach(&mut graph);

    assert_eq!(graph.op(shr), Operator::Vector(VectorOpcode::URShiftVS));
    assert_eq!(graph.op(count), Operator::Vector(VectorOpcode::RShiftCntV));

    let mut eval = LaneEvaluator::new(&graph);
    eval.bind(
        v,
        int_lanes(&[0xFFFF, 0x8000, 2, 3, 0, 1, 0x7FFF, 0xFFFE], BasicType::Char),
    );
    assert_eq!(
        eval.eval_vector(shr).unwrap(),
        int_lanes(&[0x7FFF, 0x4000, 1, 1, 0, 0, 0x3FFF, 0x7FFF], BasicType::Char)
    );
}

#[test]
fn test_boolean_right_shift_is_unsigned() {
    assert_eq!(
        vector_opcode(ScalarOpcode::RShiftI, BasicType::Boolean),
        Some(VectorOpcode::URShiftVB)
    );
    assert_eq!(
        vector_opcode(ScalarOpcode::RShiftI, BasicType::Byte),
        Some(VectorOpcode::RShiftVB)
    );
}

// =============================================================================
// Unsupported Pairs
// =============================================================================

#[test]
fn test_unsupported_pairs_are_refused() {
    let matcher = TargetMatcher::new(SimdLevel::Avx512);
    let pairs = [
        (ScalarOpcode::MulI, BasicType::Boolean),
        (ScalarOpcode::PopCountI, BasicType::Byte),
        (ScalarOpcode::URShiftI, BasicType::Short),
        (ScalarOpcode::URShiftI, BasicType::Byte),
        (ScalarOpcode::AbsI, BasicType::Char),
        (ScalarOpcode::AddL, BasicType::Int),
        (ScalarOpcode::LoadP, BasicType::Object),
    ];
    for (sopc, bt) in pairs {
        assert_eq!(vector_opcode(sopc, bt), None, "{} over {}", sopc, bt);
        assert!(!implemented(&matcher, sopc, 8, bt), "{} over {}", sopc, bt);
    }
}

#[test]
fn test_narrow_config_limits_lanes() {
    let config = VectorConfig::avx512().with_max_vector_bytes(16).unwrap();
    let matcher = config.oracle();
    assert!(implemented(&matcher, ScalarOpcode::AddI, 4, BasicType::Int));
    assert!(!implemented(&matcher, ScalarOpcode::AddI, 8, BasicType::Int));
}

// =============================================================================
// Simplifications and Patterns
// =============================================================================

#[test]
fn test_reinterpret_to_own_type_twice_collapses() {
    let mut graph = Graph::new();
    let vt = VectorType::new(BasicType::Float, 8);
    let v = graph.parameter(0, vt.into());
    let once = make_reinterpret(v, vt).attach(&mut graph);
    let twice = make_reinterpret(once, vt).attach(&mut graph);
    assert_eq!(reinterpret_identity(&graph, twice), v);
}

#[test]
fn test_bitwise_not_recognized_for_integral_broadcasts() {
    let mut graph = Graph::new();
    let m1 = graph.int_con(-1);
    let m1l = graph.long_con(-1);
    let two = graph.int_con(2);

    for (bt, lanes, ones_con) in [
        (BasicType::Byte, 16, m1),
        (BasicType::Short, 8, m1),
        (BasicType::Int, 4, m1),
        (BasicType::Long, 2, m1l),
    ] {
        let vt = VectorType::new(bt, lanes);
        let v = graph.parameter(0, vt.into());
        let ones = scalar_to_vector(ones_con, lanes, bt).attach(&mut graph);
        let twos = scalar_to_vector(two, lanes, bt).attach(&mut graph);

        let not = make_binary(VectorOpcode::XorV, v, ones, vt).attach(&mut graph);
        let xor = make_binary(VectorOpcode::XorV, v, twos, vt).attach(&mut graph);
        assert!(is_vector_bitwise_not_pattern(&graph, not), "{}", bt);
        assert!(!is_vector_bitwise_not_pattern(&graph, xor), "{}", bt);
    }
}

#[test]
fn test_bitwise_not_evaluates_to_complement() {
    let mut graph = Graph::new();
    let vt = VectorType::new(BasicType::Int, 4);
    let v = graph.parameter(0, vt.into());
    let m1 = graph.int_con(-1);
    let ones = scalar_to_vector(m1, 4, BasicType::Int).attach(&mut graph);
    let not = make_binary(VectorOpcode::XorV, ones, v, vt).attach(&mut graph);

    let mut eval = LaneEvaluator::new(&graph);
    eval.bind(v, int_lanes(&[0, -1, 5, i32::MIN], BasicType::Int));
    assert_eq!(
        eval.eval_vector(not).unwrap(),
        int_lanes(&[-1, 0, !5, i32::MAX], BasicType::Int)
    );
}

// =============================================================================
// Fatal Paths
// =============================================================================

#[test]
#[should_panic(expected = "missed vector creation for 'MulI' (element boolean)")]
fn test_build_unsupported_pair_panics() {
    let mut graph = Graph::new();
    let vt = VectorType::new(BasicType::Boolean, 16);
    let a = graph.parameter(0, vt.into());
    make_for_scalar(ScalarOpcode::MulI, &[a, a], 16, BasicType::Boolean);
}

#[test]
#[should_panic(expected = "missed vector creation")]
fn test_reduction_of_char_panics() {
    let mut graph = Graph::new();
    let v = graph.parameter(0, VectorType::new(BasicType::Char, 8).into());
    let acc = graph.int_con(0);
    make_reduction(ScalarOpcode::AddI, None, acc, v, BasicType::Char);
}
