//! Vector node construction for the Prism JIT.
//!
//! Turns scalar IR operations into SIMD vector nodes:
//! - Scalar-to-vector opcode resolution per lane type
//! - Target capability queries
//! - Vector, reduction, pack and conversion node factories
//! - A lane-level reference evaluator for checking constructed graphs
#![deny(unsafe_op_in_unsafe_fn)]
pub mod config;
pub mod eval;
pub mod ir;
pub mod target;
pub mod vector;

pub use config::{ConfigError, VectorConfig};
pub use eval::{EvalError, LaneEvaluator, Value, VectorValue};
pub use target::{Matcher, SimdLevel, TargetMatcher};
pub use vector::{ControlDependency, VectorNode};
