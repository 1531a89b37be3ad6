//! Skeleton node model and channel types.
//!
//! These types represent the parsed BVH hierarchy before any kinematic
//! processing. They closely mirror the file structure but use Rust-native
//! types: channel labels are resolved to a closed enum at parse time so the
//! per-frame code never compares strings.

use std::fmt::Write as _;

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Axes and channels
// ============================================================================

/// A rotation/translation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Lowercase letter used in channel-order strings and fixed-angle keys.
    pub fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }

    /// Parse from a single axis letter (either case).
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'x' => Some(Self::X),
            'y' => Some(Self::Y),
            'z' => Some(Self::Z),
            _ => None,
        }
    }
}

/// One of the six BVH channel labels.
///
/// The variant is decided once when the hierarchy is parsed; everything
/// downstream dispatches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Channel {
    /// Translation along X (root only in the standard format).
    XPosition,
    /// Translation along Y.
    YPosition,
    /// Translation along Z.
    ZPosition,
    /// Rotation about X.
    XRotation,
    /// Rotation about Y.
    YRotation,
    /// Rotation about Z.
    ZRotation,
}

impl Channel {
    /// Parse a channel label as it appears in a `CHANNELS` declaration.
    ///
    /// Matching is case-insensitive; files in the wild disagree on
    /// capitalization.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "xposition" => Some(Self::XPosition),
            "yposition" => Some(Self::YPosition),
            "zposition" => Some(Self::ZPosition),
            "xrotation" => Some(Self::XRotation),
            "yrotation" => Some(Self::YRotation),
            "zrotation" => Some(Self::ZRotation),
            _ => None,
        }
    }

    /// The canonical label as written in well-formed BVH files.
    pub fn label(self) -> &'static str {
        match self {
            Self::XPosition => "Xposition",
            Self::YPosition => "Yposition",
            Self::ZPosition => "Zposition",
            Self::XRotation => "Xrotation",
            Self::YRotation => "Yrotation",
            Self::ZRotation => "Zrotation",
        }
    }

    /// Whether this is a rotation channel.
    pub fn is_rotation(self) -> bool {
        self.rotation_axis().is_some()
    }

    /// Whether this is a position channel.
    pub fn is_position(self) -> bool {
        matches!(self, Self::XPosition | Self::YPosition | Self::ZPosition)
    }

    /// The rotation axis, if this is a rotation channel.
    pub fn rotation_axis(self) -> Option<Axis> {
        match self {
            Self::XRotation => Some(Axis::X),
            Self::YRotation => Some(Axis::Y),
            Self::ZRotation => Some(Axis::Z),
            _ => None,
        }
    }
}

// ============================================================================
// Skeleton node
// ============================================================================

/// The literal name carried by end-site markers in the file.
pub const END_SITE_NAME: &str = "End Site";

/// One joint of the skeleton tree.
///
/// Children are exclusively owned; the tree has no back-pointers. `length`
/// and `offset_unit` are zero until
/// [`process_skeleton`](https://docs.rs/mocap-kinematics) runs the metrics
/// pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    /// Joint name. Matched case-insensitively against canonical tables.
    pub name: String,
    /// Channels in file declaration order.
    pub channels: Vec<Channel>,
    /// Translation relative to the parent, in the parent's local frame.
    pub offset: Vector3<f64>,
    /// Child joints in file declaration order.
    pub children: Vec<Node>,
    /// Whether this node is an `End Site` marker.
    pub is_end_site: bool,
    /// Euclidean norm of `offset`; set by the metrics pass.
    pub length: f64,
    /// `offset` normalized to unit length, or the raw (zero) offset when
    /// `length` is zero; set by the metrics pass.
    pub offset_unit: Vector3<f64>,
}

impl Node {
    /// Create a joint with no channels, offset or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            offset: Vector3::zeros(),
            children: Vec::new(),
            is_end_site: false,
            length: 0.0,
            offset_unit: Vector3::zeros(),
        }
    }

    /// Create an end-site marker with the generic file name.
    pub fn end_site(offset: Vector3<f64>) -> Self {
        Self {
            name: END_SITE_NAME.to_string(),
            channels: Vec::new(),
            offset,
            children: Vec::new(),
            is_end_site: true,
            length: 0.0,
            offset_unit: Vector3::zeros(),
        }
    }

    /// Set the channel list.
    #[must_use]
    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    /// Set the parent-relative offset.
    #[must_use]
    pub fn with_offset(mut self, offset: Vector3<f64>) -> Self {
        self.offset = offset;
        self
    }

    /// Append a child joint.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Total channel count over this node and its whole subtree, in
    /// depth-first declaration order.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
            + self
                .children
                .iter()
                .map(Node::channel_count)
                .sum::<usize>()
    }

    /// Rotation channel count over this node and its whole subtree.
    pub fn rotation_channel_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_rotation()).count()
            + self
                .children
                .iter()
                .map(Node::rotation_channel_count)
                .sum::<usize>()
    }

    /// Indented multi-line dump of the hierarchy, one joint per line.
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        self.tree_string_into(&mut out, "");
        out
    }

    fn tree_string_into(&self, out: &mut String, prefix: &str) {
        let labels: Vec<&str> = self.channels.iter().map(|c| c.label()).collect();
        let _ = writeln!(out, "{prefix}{}({})", self.name, labels.join(", "));
        let child_prefix = format!("{prefix}--");
        for child in &self.children {
            child.tree_string_into(out, &child_prefix);
        }
    }
}
