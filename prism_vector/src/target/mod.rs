//! Target capability queries.
//!
//! The vector factory never decides on its own whether a shape can be code
//! generated. It asks a [`Matcher`], which answers from the target's
//! description:
//!
//! - **Width**: is `lanes x element` a legal register shape?
//! - **Opcode**: does the target have an instruction for this vector node?
//! - **Reduction**: can this reduction be lowered at this width?
//!
//! [`TargetMatcher`] answers for x86-64 at a given [`SimdLevel`].

use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::ir::operators::{ReductionOpcode, VectorOpcode};
use crate::ir::types::BasicType;

// =============================================================================
// Matcher Trait
// =============================================================================

/// Capability oracle consulted before any vector node is built.
///
/// All queries are pure.
pub trait Matcher {
    /// Whether `lanes x bt` fits a vector register on this target.
    fn vector_size_supported(&self, bt: BasicType, lanes: u32) -> bool;

    /// Whether `opcode` is realizable for `lanes x bt`.
    fn match_rule_supported_vector(&self, opcode: VectorOpcode, lanes: u32, bt: BasicType)
        -> bool;

    /// Whether `opcode` reduces `lanes x bt` on this target.
    fn match_rule_supported_reduction(
        &self,
        opcode: ReductionOpcode,
        lanes: u32,
        bt: BasicType,
    ) -> bool;

    /// Largest lane count for `bt`; zero if `bt` never vectorizes.
    fn max_vector_size(&self, bt: BasicType) -> u32;

    /// Smallest lane count for `bt`; zero if `bt` never vectorizes.
    fn min_vector_size(&self, bt: BasicType) -> u32;
}

// =============================================================================
// SIMD Level
// =============================================================================

/// Target SIMD capability level.
///
/// Higher levels include all capabilities of lower levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdLevel {
    /// SSE4.2 (128-bit vectors)
    Sse42,

    /// AVX (256-bit floating-point)
    ///
    /// - Integer lanes still 128-bit only
    Avx,

    /// AVX2 (full 256-bit support)
    ///
    /// - FMA instruction support
    Avx2,

    /// AVX-512 (512-bit vectors)
    ///
    /// - 64-bit lane multiply, abs and arithmetic shift
    /// - Ternary logic (`vpternlog`)
    Avx512,
}

impl SimdLevel {
    /// Maximum vector width in bytes.
    pub const fn max_vector_bytes(self) -> usize {
        match self {
            SimdLevel::Sse42 => 16,
            SimdLevel::Avx | SimdLevel::Avx2 => 32,
            SimdLevel::Avx512 => 64,
        }
    }

    /// Maximum width in bytes for lanes of `bt`.
    ///
    /// AVX widened only the floating-point registers.
    pub const fn max_vector_bytes_for(self, bt: BasicType) -> usize {
        match self {
            SimdLevel::Avx if !bt.is_floating() => 16,
            level => level.max_vector_bytes(),
        }
    }

    /// FMA (fused multiply-add).
    pub const fn has_fma(self) -> bool {
        matches!(self, SimdLevel::Avx2 | SimdLevel::Avx512)
    }

    /// `vpternlog` three-input logic.
    pub const fn has_ternary_logic(self) -> bool {
        matches!(self, SimdLevel::Avx512)
    }

    /// Canonical lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            SimdLevel::Sse42 => "sse4.2",
            SimdLevel::Avx => "avx",
            SimdLevel::Avx2 => "avx2",
            SimdLevel::Avx512 => "avx512",
        }
    }
}

impl Default for SimdLevel {
    fn default() -> Self {
        SimdLevel::Avx2
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimdLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sse4.2" | "sse42" => Ok(SimdLevel::Sse42),
            "avx" => Ok(SimdLevel::Avx),
            "avx2" => Ok(SimdLevel::Avx2),
            "avx512" => Ok(SimdLevel::Avx512),
            _ => Err(ConfigError::UnknownSimdLevel(s.to_string())),
        }
    }
}

// =============================================================================
// x86-64 Matcher
// =============================================================================

/// Capability oracle for x86-64 at a fixed SIMD level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMatcher {
    level: SimdLevel,
    /// Optional clamp on register width, in bytes.
    max_bytes: Option<usize>,
}

impl TargetMatcher {
    pub const fn new(level: SimdLevel) -> Self {
        TargetMatcher {
            level,
            max_bytes: None,
        }
    }

    /// Clamp the register width. Widths above the level's maximum have no
    /// effect.
    pub const fn with_max_vector_bytes(mut self, bytes: usize) -> Self {
        self.max_bytes = Some(bytes);
        self
    }

    #[inline]
    pub const fn level(&self) -> SimdLevel {
        self.level
    }

    fn max_bytes(&self, bt: BasicType) -> usize {
        let native = self.level.max_vector_bytes_for(bt);
        match self.max_bytes {
            Some(clamp) => native.min(clamp),
            None => native,
        }
    }

    fn at_least(&self, level: SimdLevel) -> bool {
        self.level >= level
    }
}

impl Default for TargetMatcher {
    fn default() -> Self {
        Self::new(SimdLevel::default())
    }
}

impl Matcher for TargetMatcher {
    fn vector_size_supported(&self, bt: BasicType, lanes: u32) -> bool {
        if !bt.is_primitive() || !lanes.is_power_of_two() {
            return false;
        }
        let min = self.min_vector_size(bt);
        min != 0 && lanes >= min && lanes <= self.max_vector_size(bt)
    }

    fn match_rule_supported_vector(
        &self,
        opcode: VectorOpcode,
        lanes: u32,
        bt: BasicType,
    ) -> bool {
        if !self.vector_size_supported(bt, lanes) {
            return false;
        }
        let bytes = lanes as usize * bt.byte_size();
        match opcode {
            VectorOpcode::MulVL
            | VectorOpcode::AbsVL
            | VectorOpcode::RShiftVL
            | VectorOpcode::PopCountVI => self.at_least(SimdLevel::Avx512),
            VectorOpcode::MacroLogicV => self.level.has_ternary_logic(),
            VectorOpcode::FmaVF | VectorOpcode::FmaVD => self.level.has_fma(),
            VectorOpcode::RoundDoubleModeV => self.at_least(SimdLevel::Avx),
            // No byte multiply instruction; lowered through short lanes.
            VectorOpcode::MulVB => bytes <= 32 || self.at_least(SimdLevel::Avx512),
            _ => true,
        }
    }

    fn match_rule_supported_reduction(
        &self,
        opcode: ReductionOpcode,
        lanes: u32,
        bt: BasicType,
    ) -> bool {
        if !self.vector_size_supported(bt, lanes) {
            return false;
        }
        match opcode {
            ReductionOpcode::MulReductionVL => self.at_least(SimdLevel::Avx512),
            ReductionOpcode::MinReductionV | ReductionOpcode::MaxReductionV
                if bt == BasicType::Long =>
            {
                self.at_least(SimdLevel::Avx512)
            }
            _ => true,
        }
    }

    fn max_vector_size(&self, bt: BasicType) -> u32 {
        if !bt.is_primitive() {
            return 0;
        }
        let lanes = self.max_bytes(bt) / bt.byte_size();
        if lanes < self.min_vector_size(bt) as usize {
            0
        } else {
            lanes as u32
        }
    }

    fn min_vector_size(&self, bt: BasicType) -> u32 {
        if !bt.is_primitive() {
            return 0;
        }
        // At least two lanes and at least four bytes.
        (4 / bt.byte_size()).max(2) as u32
    }
}

// =============================================================================
// Tests
// =============================================================================
