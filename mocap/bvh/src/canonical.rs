//! Canonical joint-order and bone-length configuration tables.
//!
//! These are fixed lookup tables, not state derived from any file. They are
//! constructed once and passed explicitly to every reconciler or kinematics
//! call, so the standard and range-of-motion layouts can coexist in one
//! process.

use std::collections::HashMap;

use crate::error::{BvhError, Result};
use crate::types::Axis;

use Axis::{X, Y, Z};

const XYZ: [Axis; 3] = [X, Y, Z];
const XZY: [Axis; 3] = [X, Z, Y];
const YZX: [Axis; 3] = [Y, Z, X];
const ZYX: [Axis; 3] = [Z, Y, X];

/// The standard 21-joint capture layout.
const STANDARD: &[(&str, [Axis; 3])] = &[
    ("hips", XYZ),
    ("spine", XYZ),
    ("head", XYZ),
    ("leftshoulder", XYZ),
    ("leftarm", XYZ),
    ("leftforearm", YZX),
    ("lefthand", XYZ),
    ("lefthandthumb1", XZY),
    ("rightshoulder", XYZ),
    ("rightarm", XYZ),
    ("rightforearm", YZX),
    ("righthand", XYZ),
    ("righthandthumb1", XZY),
    ("leftupleg", XYZ),
    ("leftleg", XYZ),
    ("leftfoot", XYZ),
    ("lefttoebase", XYZ),
    ("rightupleg", XYZ),
    ("rightleg", XYZ),
    ("rightfoot", XYZ),
    ("righttoebase", XYZ),
];

/// The range-of-motion calibration layout. Same joint set arranged with the
/// left side grouped before the right, and different forearm/thumb axis
/// conventions.
const RANGE_OF_MOTION: &[(&str, [Axis; 3])] = &[
    ("hips", XYZ),
    ("spine", XYZ),
    ("head", XYZ),
    ("leftshoulder", XYZ),
    ("leftarm", XYZ),
    ("leftforearm", ZYX),
    ("lefthand", XYZ),
    ("lefthandthumb1", XYZ),
    ("leftupleg", XYZ),
    ("leftleg", XYZ),
    ("leftfoot", XYZ),
    ("lefttoebase", XYZ),
    ("rightshoulder", XYZ),
    ("rightarm", XYZ),
    ("rightforearm", ZYX),
    ("righthand", XYZ),
    ("righthandthumb1", XYZ),
    ("rightupleg", XYZ),
    ("rightleg", XYZ),
    ("rightfoot", XYZ),
    ("righttoebase", XYZ),
];

/// Node name (lowercase) to semantic bone label. Bilateral bones share one
/// label so a symmetric skeleton resolves to a single named length.
const BONE_LENGTH_NAMES: &[(&str, &str)] = &[
    ("spine", "waist"),
    ("head", "spine"),
    ("headendsite", "head"),
    ("leftshoulder", "mid-spine"),
    ("leftarm", "half-shoulder"),
    ("leftforearm", "upper-arm"),
    ("lefthand", "lower-arm"),
    ("lefthandendsite", "hand"),
    ("lefthandthumb1endsite", "thumb"),
    ("rightshoulder", "mid-spine"),
    ("rightarm", "half-shoulder"),
    ("rightforearm", "upper-arm"),
    ("righthand", "lower-arm"),
    ("righthandendsite", "hand"),
    ("righthandthumb1endsite", "thumb"),
    ("leftupleg", "half-hip"),
    ("leftleg", "upper-leg"),
    ("leftfoot", "lower-leg"),
    ("lefttoebase", "back-foot"),
    ("lefttoebaseendsite", "fore-foot"),
    ("rightupleg", "half-hip"),
    ("rightleg", "upper-leg"),
    ("rightfoot", "lower-leg"),
    ("righttoebase", "back-foot"),
    ("righttoebaseendsite", "fore-foot"),
];

// ============================================================================
// JointOrder
// ============================================================================

/// A canonical joint order: joint name (lowercase) to (slot index, expected
/// rotation-axis order).
///
/// Reconciling a file against a `JointOrder` produces angle/offset data in a
/// fixed anatomical layout regardless of the file's declaration order.
#[derive(Debug, Clone)]
pub struct JointOrder {
    slots: HashMap<String, (usize, [Axis; 3])>,
}

impl JointOrder {
    /// The standard capture layout.
    pub fn standard() -> Self {
        Self::from_table(STANDARD)
    }

    /// The range-of-motion calibration layout.
    pub fn range_of_motion() -> Self {
        Self::from_table(RANGE_OF_MOTION)
    }

    fn from_table(table: &[(&str, [Axis; 3])]) -> Self {
        let slots = table
            .iter()
            .enumerate()
            .map(|(i, &(name, axes))| (name.to_string(), (i, axes)))
            .collect();
        Self { slots }
    }

    /// Build a custom order from (joint name, axis-order string) pairs.
    ///
    /// Slot indices follow the entry order. Each axis-order string must be a
    /// permutation of "xyz".
    pub fn from_entries(entries: &[(&str, &str)]) -> Result<Self> {
        let mut slots = HashMap::with_capacity(entries.len());
        for (i, &(name, order)) in entries.iter().enumerate() {
            let axes = parse_axis_order(order)
                .ok_or_else(|| BvhError::invalid_joint_order(name, format!("\"{order}\" is not a permutation of xyz")))?;
            if slots.insert(name.to_lowercase(), (i, axes)).is_some() {
                return Err(BvhError::DuplicateJoint(name.to_string()));
            }
        }
        Ok(Self { slots })
    }

    /// Number of canonical joints.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the order contains no joints.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total canonical channel count (3 rotation channels per joint).
    pub fn channel_count(&self) -> usize {
        3 * self.slots.len()
    }

    /// Look up a joint by lowercase name.
    pub fn get(&self, name: &str) -> Option<(usize, [Axis; 3])> {
        self.slots.get(name).copied()
    }

    /// Labels `"<joint>_<axis>"` for every canonical channel, in slot order.
    pub fn channel_labels(&self) -> Vec<String> {
        let mut labels = vec![String::new(); self.channel_count()];
        for (name, &(slot, axes)) in &self.slots {
            for (k, axis) in axes.iter().enumerate() {
                labels[slot * 3 + k] = format!("{name}_{}", axis.letter());
            }
        }
        labels
    }
}

/// Parse a 3-letter axis-order string into distinct axes.
pub(crate) fn parse_axis_order(order: &str) -> Option<[Axis; 3]> {
    let mut chars = order.chars();
    let a = Axis::from_letter(chars.next()?)?;
    let b = Axis::from_letter(chars.next()?)?;
    let c = Axis::from_letter(chars.next()?)?;
    if chars.next().is_some() || a == b || b == c || a == c {
        return None;
    }
    Some([a, b, c])
}

/// Format three axes as the lowercase string used in error messages.
pub(crate) fn axis_order_string(axes: &[Axis]) -> String {
    axes.iter().map(|a| a.letter()).collect()
}

// ============================================================================
// BoneLengthTable
// ============================================================================

/// Node-name to semantic-bone-label map with dense label slots.
///
/// Semantic labels deduplicate bilateral bones (left and right upper-arm map
/// to one "upper-arm" length). Slots index a dense length vector; they are
/// assigned once at construction from the sorted unique labels.
#[derive(Debug, Clone)]
pub struct BoneLengthTable {
    names: HashMap<String, String>,
    label_slots: HashMap<String, usize>,
    labels: Vec<String>,
}

impl BoneLengthTable {
    /// The standard 25-entry table covering the standard joint order,
    /// including renamed end sites (`<parent>EndSite`).
    pub fn standard() -> Self {
        Self::from_entries(BONE_LENGTH_NAMES)
    }

    /// Build from (node name, semantic label) pairs.
    pub fn from_entries(entries: &[(&str, &str)]) -> Self {
        let names: HashMap<String, String> = entries
            .iter()
            .map(|&(node, label)| (node.to_lowercase(), label.to_string()))
            .collect();
        let mut labels: Vec<String> = names.values().cloned().collect();
        labels.sort();
        labels.dedup();
        let label_slots = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self {
            names,
            label_slots,
            labels,
        }
    }

    /// Number of distinct semantic labels (the dense length-vector size).
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Semantic labels in slot order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Semantic label for a node name (lowercase), if mapped.
    pub fn label_of(&self, node_name: &str) -> Option<&str> {
        self.names.get(node_name).map(String::as_str)
    }

    /// Dense length-vector slot for a node name (lowercase), if mapped.
    pub fn label_index(&self, node_name: &str) -> Option<usize> {
        let label = self.names.get(node_name)?;
        self.label_slots.get(label).copied()
    }
}
