//! Error types for kinematic evaluation.

use thiserror::Error;

/// Errors that can occur during forward-kinematic evaluation.
#[derive(Debug, Error)]
pub enum KinematicsError {
    /// The angle sequence does not match the tree's consumable rotation
    /// channels.
    #[error("angle sequence has {got} values, tree consumes {expected}")]
    AngleCountMismatch {
        /// Rotation channels the traversal will consume.
        expected: usize,
        /// Values actually supplied.
        got: usize,
    },

    /// A batched input has the wrong shape.
    #[error("shape mismatch for {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which input was malformed.
        context: &'static str,
        /// Required extent.
        expected: usize,
        /// Extent actually supplied.
        got: usize,
    },

    /// Length rescaling was requested without a bone-length table.
    #[error("bone lengths supplied without a bone-length table")]
    MissingLengthTable,

    /// A joint needs rescaling but has no entry in the bone-length table.
    #[error("no bone-length entry for joint {joint}")]
    MissingBoneLength {
        /// The unmapped joint name.
        joint: String,
    },

    /// Error from the underlying BVH layer (parsing, I/O).
    #[error(transparent)]
    Bvh(#[from] mocap_bvh::BvhError),
}

impl KinematicsError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(context: &'static str, expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            got,
        }
    }

    /// Create a missing bone length error.
    pub fn missing_bone_length(joint: impl Into<String>) -> Self {
        Self::MissingBoneLength {
            joint: joint.into(),
        }
    }
}

/// Result type for kinematics operations.
pub type Result<T> = std::result::Result<T, KinematicsError>;
