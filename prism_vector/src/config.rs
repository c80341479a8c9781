//! Configuration for vector node construction.

use thiserror::Error;

use crate::target::{SimdLevel, TargetMatcher};

/// Errors raised while building a [`VectorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The SIMD level name was not recognized.
    #[error("unknown SIMD level: {0}")]
    UnknownSimdLevel(String),

    /// A width clamp that no lane type can use.
    #[error("invalid max vector width: {bytes} bytes (expected a power of two, at least 4)")]
    InvalidVectorWidth {
        /// The rejected width.
        bytes: usize,
    },
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the vector factory and its simplifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorConfig {
    /// Target SIMD level.
    pub simd_level: SimdLevel,
    /// Allow an unbox of a freshly boxed vector to collapse to the payload.
    pub enable_vector_reboxing: bool,
    /// Clamp on register width in bytes, below the level's native width.
    pub max_vector_bytes: Option<usize>,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            simd_level: SimdLevel::Avx2,
            enable_vector_reboxing: true,
            max_vector_bytes: None,
        }
    }
}

impl VectorConfig {
    /// Configuration for SSE4.2 targets.
    pub fn sse42() -> Self {
        Self {
            simd_level: SimdLevel::Sse42,
            ..Default::default()
        }
    }

    /// Configuration for AVX2 targets.
    pub fn avx2() -> Self {
        Self {
            simd_level: SimdLevel::Avx2,
            ..Default::default()
        }
    }

    /// Configuration for AVX-512 targets.
    pub fn avx512() -> Self {
        Self {
            simd_level: SimdLevel::Avx512,
            ..Default::default()
        }
    }

    /// Parse the SIMD level from its name.
    pub fn with_simd_level_name(mut self, name: &str) -> Result<Self, ConfigError> {
        self.simd_level = name.parse()?;
        Ok(self)
    }

    /// Clamp the register width.
    pub fn with_max_vector_bytes(mut self, bytes: usize) -> Result<Self, ConfigError> {
        if bytes < 4 || !bytes.is_power_of_two() {
            return Err(ConfigError::InvalidVectorWidth { bytes });
        }
        self.max_vector_bytes = Some(bytes);
        Ok(self)
    }

    pub fn with_reboxing(mut self, enabled: bool) -> Self {
        self.enable_vector_reboxing = enabled;
        self
    }

    /// The capability oracle this configuration describes.
    pub fn oracle(&self) -> TargetMatcher {
        let matcher = TargetMatcher::new(self.simd_level);
        match self.max_vector_bytes {
            Some(bytes) => matcher.with_max_vector_bytes(bytes),
            None => matcher,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
