//! Error types for BVH parsing, reading and reconciliation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while parsing or reconciling BVH data.
#[derive(Debug, Error)]
pub enum BvhError {
    /// Token-level syntax error in the BVH text.
    #[error("syntax error at line {line}: {message}")]
    Syntax {
        /// Line number (1-based) where the error was detected.
        line: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Input ended while more tokens were expected.
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof {
        /// What the parser was looking for.
        expected: &'static str,
    },

    /// A channel label is not one of the six BVH channel names.
    #[error("unknown channel label: {0}")]
    InvalidChannel(String),

    /// A joint's rotation channels are not a permutation of X/Y/Z.
    #[error("malformed rotation channels for joint {joint}: got \"{found}\"")]
    MalformedRotationChannels {
        /// The offending joint name.
        joint: String,
        /// The axis letters found, in declaration order.
        found: String,
    },

    /// A joint's file-declared rotation order does not match the canonical
    /// expectation.
    #[error("expected channel order \"{expected}\" but file specifies \"{found}\" for joint {joint}")]
    ChannelOrderMismatch {
        /// The offending joint name.
        joint: String,
        /// Canonical rotation-axis order.
        expected: String,
        /// Rotation-axis order declared by the file.
        found: String,
    },

    /// A joint name has no entry in the supplied canonical joint order.
    #[error("joint not present in canonical joint order: {0}")]
    UnknownJoint(String),

    /// The root node does not declare one of the three position channels.
    #[error("root is missing position channel: {channel}")]
    MissingPositionChannel {
        /// The missing channel label.
        channel: &'static str,
    },

    /// A frame row carried the wrong number of values.
    #[error("frame {frame} has {got} values, expected {expected}")]
    FrameLengthMismatch {
        /// Total channel count declared by the hierarchy.
        expected: usize,
        /// Values actually present in the row.
        got: usize,
        /// Frame index (0-based) of the offending row.
        frame: usize,
    },

    /// More frame rows arrived than the motion header declared.
    #[error("more frames than the declared count of {declared}")]
    ExtraFrames {
        /// Frame count from the motion header.
        declared: usize,
    },

    /// A caller-supplied buffer has the wrong length.
    #[error("buffer length {got} does not match expected {expected}")]
    BufferSizeMismatch {
        /// Required buffer length.
        expected: usize,
        /// Length of the buffer actually supplied.
        got: usize,
    },

    /// Duplicate joint name in one skeleton.
    #[error("duplicate joint name: {0}")]
    DuplicateJoint(String),

    /// The tree violates a structural invariant of the format.
    #[error("invalid skeleton structure: {0}")]
    InvalidStructure(String),

    /// A custom joint-order entry could not be interpreted.
    #[error("invalid joint order entry for {joint}: {message}")]
    InvalidJointOrder {
        /// The joint the entry was for.
        joint: String,
        /// Description of why the entry is invalid.
        message: String,
    },

    /// A directory walk found no file that could be reconciled.
    #[error("no loadable BVH files under {}", dir.display())]
    NoFilesLoaded {
        /// The directory that was walked.
        dir: PathBuf,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BvhError {
    /// Create a syntax error at a given line.
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Create a malformed rotation channels error.
    pub fn malformed_rotation(joint: impl Into<String>, found: impl Into<String>) -> Self {
        Self::MalformedRotationChannels {
            joint: joint.into(),
            found: found.into(),
        }
    }

    /// Create a channel order mismatch error.
    pub fn channel_order_mismatch(
        joint: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::ChannelOrderMismatch {
            joint: joint.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid joint order error.
    pub fn invalid_joint_order(joint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidJointOrder {
            joint: joint.into(),
            message: message.into(),
        }
    }

    /// Whether the error means "this file does not fit the canonical layout"
    /// rather than "this file is broken".
    ///
    /// The directory batch loader downgrades these to a logged skip; every
    /// other error aborts the walk.
    pub fn is_reconcile_failure(&self) -> bool {
        matches!(
            self,
            Self::ChannelOrderMismatch { .. }
                | Self::UnknownJoint(_)
                | Self::MalformedRotationChannels { .. }
        )
    }
}

/// Result type for BVH operations.
pub type Result<T> = std::result::Result<T, BvhError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_display() {
        let err = BvhError::syntax(7, "expected OFFSET");
        assert!(err.to_string().contains("line 7"));
        assert!(err.to_string().contains("OFFSET"));
    }

    #[test]
    fn test_channel_order_mismatch_display() {
        let err = BvhError::channel_order_mismatch("LeftForeArm", "yzx", "xyz");
        let msg = err.to_string();
        assert!(msg.contains("LeftForeArm"));
        assert!(msg.contains("yzx"));
        assert!(msg.contains("xyz"));
    }

    #[test]
    fn test_frame_length_mismatch_display() {
        let err = BvhError::FrameLengthMismatch {
            expected: 69,
            got: 68,
            frame: 12,
        };
        assert!(err.to_string().contains("69"));
        assert!(err.to_string().contains("68"));
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_reconcile_failure_classification() {
        assert!(BvhError::UnknownJoint("reference".into()).is_reconcile_failure());
        assert!(BvhError::channel_order_mismatch("hips", "xyz", "zyx").is_reconcile_failure());
        assert!(!BvhError::ExtraFrames { declared: 10 }.is_reconcile_failure());
    }
}
