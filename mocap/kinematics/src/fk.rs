//! Single-sample forward kinematics.
//!
//! Walks the skeleton tree pre-order, composing rigid transforms from the
//! root down. The angle sequence is consumed through an explicit cursor
//! threaded through the recursion; its order is the same depth-first
//! declaration order the motion reader used to build the sequence.

use std::collections::{HashMap, HashSet};

use nalgebra::{DVector, Matrix3, Matrix4, Point3, Vector4};

use mocap_bvh::{Axis, BoneLengthTable, Node};

use crate::error::{KinematicsError, Result};
use crate::rotation::rotation_about;

/// One bone segment: the parent joint's world position and the child
/// joint's world position under the parent's accumulated rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bone {
    /// World position of the parent joint.
    pub start: Point3<f64>,
    /// World position of the child joint.
    pub end: Point3<f64>,
}

/// Options for joint-position evaluation.
///
/// Built with the `with_*` methods; the default config consumes every angle
/// from the sequence, uses raw file offsets and emits every joint.
#[derive(Debug, Clone, Default)]
pub struct FkConfig {
    fixed_angles: HashMap<String, f64>,
    skip: HashSet<String>,
    length_table: Option<BoneLengthTable>,
}

impl FkConfig {
    /// Empty config: no overrides, no skips, no length table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix one joint's rotation about `axis` to a constant angle (radians).
    ///
    /// The fixed channel no longer consumes a value from the angle
    /// sequence.
    #[must_use]
    pub fn with_fixed_angle(mut self, joint: &str, axis: Axis, angle: f64) -> Self {
        self.fixed_angles
            .insert(fixed_angle_key(joint, axis), angle);
        self
    }

    /// Suppress a joint's own position from the output.
    ///
    /// A skipped interior joint still propagates its transform to children;
    /// a skipped end site is pruned together with its (empty) subtree.
    #[must_use]
    pub fn with_skip(mut self, joint: &str) -> Self {
        self.skip.insert(joint.to_lowercase());
        self
    }

    /// Supply the bone-length table used to resolve length rescaling.
    #[must_use]
    pub fn with_length_table(mut self, table: BoneLengthTable) -> Self {
        self.length_table = Some(table);
        self
    }

    pub(crate) fn fixed_angles(&self) -> &HashMap<String, f64> {
        &self.fixed_angles
    }

    pub(crate) fn skip(&self) -> &HashSet<String> {
        &self.skip
    }

    pub(crate) fn length_table(&self) -> Option<&BoneLengthTable> {
        self.length_table.as_ref()
    }
}

/// Key format for fixed-angle overrides: `<joint_lowercase>_<axis_letter>`.
pub fn fixed_angle_key(joint: &str, axis: Axis) -> String {
    format!("{}_{}", joint.to_lowercase(), axis.letter())
}

/// Number of angle values a traversal will consume, honoring fixed-angle
/// overrides.
pub(crate) fn consumed_angle_count(node: &Node, fixed: &HashMap<String, f64>) -> usize {
    let name = node.name.to_lowercase();
    let own = node
        .channels
        .iter()
        .filter_map(|c| c.rotation_axis())
        .filter(|&axis| !fixed.contains_key(&format!("{name}_{}", axis.letter())))
        .count();
    own + node
        .children
        .iter()
        .map(|c| consumed_angle_count(c, fixed))
        .sum::<usize>()
}

/// Homogeneous local transform from a rotation and a translation.
fn local_transform(rot: &Matrix3<f64>, offset: nalgebra::Vector3<f64>) -> Matrix4<f64> {
    let mut local = Matrix4::identity();
    local.fixed_view_mut::<3, 3>(0, 0).copy_from(rot);
    local.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
    local
}

fn origin_of(trans: &Matrix4<f64>) -> Point3<f64> {
    Point3::new(trans[(0, 3)], trans[(1, 3)], trans[(2, 3)])
}

// ============================================================================
// Bone segments
// ============================================================================

/// Compute world-space bone segments from a tree and a flat radian angle
/// sequence.
///
/// Angles are consumed in depth-first pre-order, each rotation channel in
/// its joint's own declared order; the sequence length must equal the
/// tree's rotation-channel count. Pure function: identical inputs yield
/// bit-identical output.
pub fn bone_segments(root: &Node, angles: &[f64]) -> Result<Vec<Bone>> {
    let expected = root.rotation_channel_count();
    if angles.len() != expected {
        return Err(KinematicsError::AngleCountMismatch {
            expected,
            got: angles.len(),
        });
    }
    let mut bones = Vec::new();
    let mut cursor = 0usize;
    bones_visit(root, angles, &mut cursor, &Matrix4::identity(), &mut bones);
    Ok(bones)
}

fn bones_visit(
    node: &Node,
    angles: &[f64],
    cursor: &mut usize,
    parent: &Matrix4<f64>,
    out: &mut Vec<Bone>,
) {
    let mut rot = Matrix3::identity();
    for channel in &node.channels {
        if let Some(axis) = channel.rotation_axis() {
            rot *= rotation_about(axis, angles[*cursor]);
            *cursor += 1;
        }
    }
    let world = parent * local_transform(&rot, node.offset);
    let start = origin_of(&world);
    for child in &node.children {
        let end = world * Vector4::new(child.offset.x, child.offset.y, child.offset.z, 1.0);
        out.push(Bone {
            start,
            end: Point3::new(end.x, end.y, end.z),
        });
        bones_visit(child, angles, cursor, &world, out);
    }
}

// ============================================================================
// Joint positions
// ============================================================================

/// Compute world-space joint positions from a tree and a flat radian angle
/// sequence.
///
/// `lengths` optionally rescales each nonzero-length joint offset to the
/// named bone length (via `offset_unit` from the metrics pass and the
/// config's bone-length table) instead of the raw file offset. The angle
/// sequence length must equal the rotation channels not covered by
/// fixed-angle overrides.
pub fn joint_positions(
    root: &Node,
    angles: &[f64],
    lengths: Option<&DVector<f64>>,
    config: &FkConfig,
) -> Result<Vec<Point3<f64>>> {
    let expected = consumed_angle_count(root, config.fixed_angles());
    if angles.len() != expected {
        return Err(KinematicsError::AngleCountMismatch {
            expected,
            got: angles.len(),
        });
    }
    let resolved = match lengths {
        Some(values) => {
            let table = config
                .length_table()
                .ok_or(KinematicsError::MissingLengthTable)?;
            if values.len() != table.label_count() {
                return Err(KinematicsError::shape_mismatch(
                    "bone lengths",
                    table.label_count(),
                    values.len(),
                ));
            }
            Some((table, values.as_slice()))
        }
        None => None,
    };
    let mut joints = Vec::new();
    let mut cursor = 0usize;
    positions_visit(
        root,
        angles,
        &mut cursor,
        &Matrix4::identity(),
        config,
        resolved,
        &mut joints,
    )?;
    Ok(joints)
}

fn positions_visit(
    node: &Node,
    angles: &[f64],
    cursor: &mut usize,
    parent: &Matrix4<f64>,
    config: &FkConfig,
    lengths: Option<(&BoneLengthTable, &[f64])>,
    out: &mut Vec<Point3<f64>>,
) -> Result<()> {
    let name = node.name.to_lowercase();
    let mut rot = Matrix3::identity();
    for channel in &node.channels {
        if let Some(axis) = channel.rotation_axis() {
            let key = format!("{name}_{}", axis.letter());
            let angle = match config.fixed_angles().get(&key) {
                Some(&fixed) => fixed,
                None => {
                    let a = angles[*cursor];
                    *cursor += 1;
                    a
                }
            };
            rot *= rotation_about(axis, angle);
        }
    }

    let skipped = config.skip().contains(&name);
    if skipped && node.is_end_site {
        // An end site contributes no further structure; prune it.
        return Ok(());
    }

    let offset = match lengths {
        Some((table, values)) if node.length != 0.0 => {
            let slot = table
                .label_index(&name)
                .ok_or_else(|| KinematicsError::missing_bone_length(node.name.clone()))?;
            node.offset_unit * values[slot]
        }
        _ => node.offset,
    };

    let world = parent * local_transform(&rot, offset);
    if !skipped {
        out.push(origin_of(&world));
    }
    for child in &node.children {
        positions_visit(child, angles, cursor, &world, config, lengths, out)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mocap_bvh::Channel;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    fn rot_xyz() -> Vec<Channel> {
        vec![Channel::XRotation, Channel::YRotation, Channel::ZRotation]
    }

    /// Root with a single Z rotation channel and one child at (0, 1, 0).
    fn two_joint_tree() -> Node {
        Node::new("Root")
            .with_channels(vec![Channel::ZRotation])
            .with_child(
                Node::new("Child")
                    .with_channels(rot_xyz())
                    .with_offset(Vector3::new(0.0, 1.0, 0.0)),
            )
    }

    #[test]
    fn test_quarter_turn_moves_child() {
        let tree = two_joint_tree();
        let angles = [FRAC_PI_2, 0.0, 0.0, 0.0];
        let bones = bone_segments(&tree, &angles).expect("should compute");
        assert_eq!(bones.len(), 1);
        assert_relative_eq!(bones[0].start.coords.norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(bones[0].end.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(bones[0].end.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bones[0].end.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_determinism_is_bitwise() {
        let tree = two_joint_tree();
        let angles = [0.3, -0.7, 0.11, 2.4];
        let a = bone_segments(&tree, &angles).expect("should compute");
        let b = bone_segments(&tree, &angles).expect("should compute");
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.start, y.start);
            assert_eq!(x.end, y.end);
        }
    }

    #[test]
    fn test_angle_count_is_checked() {
        let tree = two_joint_tree();
        let result = bone_segments(&tree, &[0.1, 0.2]);
        assert!(matches!(
            result,
            Err(KinematicsError::AngleCountMismatch {
                expected: 4,
                got: 2,
            })
        ));
    }

    #[test]
    fn test_position_channels_consume_no_angles() {
        let tree = Node::new("Root")
            .with_channels(vec![
                Channel::XPosition,
                Channel::YPosition,
                Channel::ZPosition,
                Channel::ZRotation,
            ])
            .with_child(
                Node::new("Child")
                    .with_channels(rot_xyz())
                    .with_offset(Vector3::new(0.0, 1.0, 0.0)),
            );
        let bones = bone_segments(&tree, &[FRAC_PI_2, 0.0, 0.0, 0.0]).expect("should compute");
        assert_relative_eq!(bones[0].end.x, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_chained_transforms_compose() {
        // Two quarter turns about Z cancel the offset back onto the Y axis
        // negated: (0,1,0) -> (-1,0,0) -> (-1,-1,0) for the grandchild.
        let tree = Node::new("Root")
            .with_channels(vec![Channel::ZRotation])
            .with_child(
                Node::new("Mid")
                    .with_channels(vec![Channel::ZRotation])
                    .with_offset(Vector3::new(0.0, 1.0, 0.0))
                    .with_child(
                        Node::new("Tip")
                            .with_channels(vec![Channel::ZRotation])
                            .with_offset(Vector3::new(0.0, 1.0, 0.0)),
                    ),
            );
        let bones =
            bone_segments(&tree, &[FRAC_PI_2, FRAC_PI_2, 0.0]).expect("should compute");
        assert_eq!(bones.len(), 2);
        assert_relative_eq!(bones[1].start.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(bones[1].end.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(bones[1].end.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_joint_positions_match_bone_endpoints() {
        let tree = two_joint_tree();
        let angles = [FRAC_PI_2, 0.0, 0.0, 0.0];
        let joints =
            joint_positions(&tree, &angles, None, &FkConfig::new()).expect("should compute");
        assert_eq!(joints.len(), 2);
        assert_relative_eq!(joints[1].x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(joints[1].y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_angle_override_replaces_cursor_value() {
        let tree = two_joint_tree();
        let config = FkConfig::new().with_fixed_angle("Root", Axis::Z, FRAC_PI_2);
        // Root's Z channel is fixed, so only the child's three angles remain.
        let joints =
            joint_positions(&tree, &[0.0, 0.0, 0.0], None, &config).expect("should compute");
        assert_relative_eq!(joints[1].x, -1.0, epsilon = 1e-12);

        // The full-length sequence is now a count mismatch.
        let result = joint_positions(&tree, &[0.0; 4], None, &config);
        assert!(matches!(
            result,
            Err(KinematicsError::AngleCountMismatch { expected: 3, .. })
        ));
    }

    #[test]
    fn test_skip_interior_joint_keeps_children() {
        let tree = two_joint_tree();
        let config = FkConfig::new().with_skip("Root");
        let joints =
            joint_positions(&tree, &[FRAC_PI_2, 0.0, 0.0, 0.0], None, &config)
                .expect("should compute");
        // Root omitted, child still rotated through the root's transform.
        assert_eq!(joints.len(), 1);
        assert_relative_eq!(joints[0].x, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_skip_end_site_prunes_it_only() {
        let mut tree = two_joint_tree();
        tree.children[0]
            .children
            .push(Node::end_site(Vector3::new(0.0, 0.5, 0.0)));
        let mut with_metrics = tree.clone();
        crate::skeleton::process_skeleton(&mut with_metrics);

        let config = FkConfig::new().with_skip("childendsite");
        let joints = joint_positions(
            &with_metrics,
            &[0.0, 0.0, 0.0, 0.0],
            None,
            &config,
        )
        .expect("should compute");
        // Root and child remain; the end site is pruned.
        assert_eq!(joints.len(), 2);
        assert_relative_eq!(joints[1].y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_length_rescaling_doubles_offset_preserving_direction() {
        let mut tree = two_joint_tree();
        tree.children[0].offset = Vector3::new(0.0, 2.0, 0.0);
        crate::skeleton::process_skeleton(&mut tree);

        let table = BoneLengthTable::from_entries(&[("child", "bone")]);
        let lengths = DVector::from_element(1, 4.0);
        let config = FkConfig::new().with_length_table(table);
        let joints = joint_positions(&tree, &[0.0, 0.0, 0.0, 0.0], Some(&lengths), &config)
            .expect("should compute");
        // Canonical length 2 doubled to 4 along the preserved +Y direction.
        assert_relative_eq!(joints[1].y, 4.0, epsilon = 1e-12);
        assert_relative_eq!(joints[1].x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rescaling_unmapped_joint_is_fatal() {
        let mut tree = two_joint_tree();
        tree.children[0].offset = Vector3::new(0.0, 2.0, 0.0);
        crate::skeleton::process_skeleton(&mut tree);

        let table = BoneLengthTable::from_entries(&[("elsewhere", "bone")]);
        let lengths = DVector::from_element(1, 4.0);
        let config = FkConfig::new().with_length_table(table);
        let result = joint_positions(&tree, &[0.0; 4], Some(&lengths), &config);
        assert!(matches!(
            result,
            Err(KinematicsError::MissingBoneLength { ref joint }) if joint == "Child"
        ));
    }

    #[test]
    fn test_rescaling_without_table_is_rejected() {
        let tree = two_joint_tree();
        let lengths = DVector::from_element(1, 4.0);
        let result = joint_positions(&tree, &[0.0; 4], Some(&lengths), &FkConfig::new());
        assert!(matches!(result, Err(KinematicsError::MissingLengthTable)));
    }
}
