//! Error types for tree growth and skinning.

use thiserror::Error;

use crate::types::LimbId;

/// Errors that can occur while growing or meshing a tree.
#[derive(Debug, Error)]
pub enum KauriError {
    /// Segment length must be positive and finite.
    #[error("invalid segment length: {length} (must be > 0 and finite)")]
    InvalidSegmentLength {
        /// The rejected length.
        length: f32,
    },

    /// Kill distance must be non-negative and finite.
    #[error("invalid kill distance: {distance} (must be >= 0 and finite)")]
    InvalidKillDistance {
        /// The rejected distance.
        distance: f32,
    },

    /// Jitter magnitude must be non-negative and finite.
    #[error("invalid jitter magnitude: {jitter} (must be >= 0 and finite)")]
    InvalidJitter {
        /// The rejected magnitude.
        jitter: f32,
    },

    /// The trunk would never reach its target height.
    #[error(
        "trunk direction {direction:?} has no upward component; \
         it can never reach target height {target_height}"
    )]
    NonUpwardTrunk {
        /// Direction of the last trunk limb.
        direction: [f32; 3],
        /// Height the trunk was asked to reach.
        target_height: f32,
    },

    /// Trunk target height must be finite.
    #[error("invalid trunk height: {height} (must be finite)")]
    InvalidTrunkHeight {
        /// The rejected height.
        height: f32,
    },

    /// Trunk segments are too short to move the tip at this height in `f32`.
    #[error(
        "trunk step {step} is below the float resolution at height {height};          the tip would stop moving"
    )]
    TrunkStepTooSmall {
        /// Vertical gain of one segment.
        step: f32,
        /// Largest height the trunk passes through.
        height: f32,
    },

    /// Operation needs at least one limb.
    #[error("limb graph is empty")]
    EmptyGraph,

    /// A limb id does not exist in the graph.
    #[error("unknown limb {id} (graph has {len} limbs)")]
    UnknownLimb {
        /// The requested id.
        id: LimbId,
        /// Number of limbs in the graph.
        len: usize,
    },

    /// An attraction point contains NaN or infinity.
    #[error("attraction point {index} is not finite: {point:?}")]
    NonFiniteAttractor {
        /// Index of the point in the field.
        index: usize,
        /// The offending coordinates.
        point: [f32; 3],
    },

    /// A limb would be created with NaN or infinite coordinates.
    #[error("non-finite geometry growing from limb {parent}: end {end:?}")]
    NonFiniteGeometry {
        /// Limb the new segment was growing from.
        parent: LimbId,
        /// The computed end point.
        end: [f32; 3],
    },

    /// Rings need at least three vertices to enclose an area.
    #[error("invalid radial subdivisions: {count} (must be >= 3)")]
    InvalidRadialSubdivisions {
        /// The rejected count.
        count: usize,
    },

    /// Tip thickness must be positive and finite.
    #[error("invalid extremity size: {size} (must be > 0 and finite)")]
    InvalidExtremitySize {
        /// The rejected size.
        size: f32,
    },

    /// Power-mean exponent must be positive and finite.
    #[error("invalid size exponent: {exponent} (must be > 0 and finite)")]
    InvalidSizeExponent {
        /// The rejected exponent.
        exponent: f32,
    },

    /// Configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Reading configuration or writing a mesh failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for growth and meshing operations.
pub type Result<T> = std::result::Result<T, KauriError>;

impl KauriError {
    /// Returns `true` if this error stems from a rejected parameter value.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            KauriError::InvalidSegmentLength { .. }
                | KauriError::InvalidKillDistance { .. }
                | KauriError::InvalidJitter { .. }
                | KauriError::NonUpwardTrunk { .. }
                | KauriError::InvalidTrunkHeight { .. }
                | KauriError::TrunkStepTooSmall { .. }
                | KauriError::InvalidRadialSubdivisions { .. }
                | KauriError::InvalidExtremitySize { .. }
                | KauriError::InvalidSizeExponent { .. }
                | KauriError::Config(_)
        )
    }

    /// Returns `true` if this error was caused by NaN or infinite coordinates.
    pub fn is_geometry_error(&self) -> bool {
        matches!(
            self,
            KauriError::NonFiniteAttractor { .. } | KauriError::NonFiniteGeometry { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let e = KauriError::InvalidSegmentLength { length: -1.0 };
        assert!(e.to_string().contains("-1"));

        let e = KauriError::UnknownLimb { id: 7, len: 3 };
        assert_eq!(e.to_string(), "unknown limb 7 (graph has 3 limbs)");
    }

    #[test]
    fn classification() {
        assert!(KauriError::InvalidJitter { jitter: f32::NAN }.is_config_error());
        assert!(!KauriError::EmptyGraph.is_config_error());
        assert!(
            KauriError::NonFiniteGeometry {
                parent: 0,
                end: [f32::NAN, 0.0, 0.0]
            }
            .is_geometry_error()
        );
        assert!(!KauriError::EmptyGraph.is_geometry_error());
    }

    #[test]
    fn json_errors_convert() {
        let err: KauriError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, KauriError::Config(_)));
        assert!(err.is_config_error());
    }
}
