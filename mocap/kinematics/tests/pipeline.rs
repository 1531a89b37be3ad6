//! End-to-end pipeline: BVH text through parsing, metrics, reconciliation
//! and forward kinematics.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use mocap_bvh::{JointOrder, read_bvh_str, reconcile, validate};
use mocap_kinematics::{
    FkConfig, batch_of_one, bone_segments, joint_positions, joint_positions_batch,
    process_skeleton,
};
use std::f64::consts::PI;

/// A small two-armed figure: hips, spine, and symmetric hands with end
/// sites. Frame 1 raises a 90 degree Z rotation at the hips.
const FIGURE: &str = "\
HIERARCHY
ROOT Hips
{
    OFFSET 0.0 0.0 0.0
    CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation
    JOINT Spine
    {
        OFFSET 0.0 1.0 0.0
        CHANNELS 3 Xrotation Yrotation Zrotation
        JOINT LeftHand
        {
            OFFSET 1.0 0.0 0.0
            CHANNELS 3 Xrotation Yrotation Zrotation
            End Site
            {
                OFFSET 0.5 0.0 0.0
            }
        }
        JOINT RightHand
        {
            OFFSET -1.0 0.0 0.0
            CHANNELS 3 Xrotation Yrotation Zrotation
            End Site
            {
                OFFSET -0.5 0.0 0.0
            }
        }
    }
}
MOTION
Frames: 2
Frame Time: 0.0333333
0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0
0.0 2.0 0.0 0.0 0.0 90.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0
";

fn figure_order() -> JointOrder {
    JointOrder::from_entries(&[
        ("hips", "xyz"),
        ("spine", "xyz"),
        ("lefthand", "xyz"),
        ("righthand", "xyz"),
    ])
    .unwrap()
}

#[test]
fn test_full_pipeline_rest_pose_and_rotation() {
    let mut data = read_bvh_str(FIGURE).expect("should read");
    validate(&data.root).expect("should validate");
    process_skeleton(&mut data.root);

    // End sites picked up their parents' names.
    let spine = &data.root.children[0];
    assert_eq!(spine.children[0].children[0].name, "LeftHandEndSite");
    assert_eq!(spine.children[1].children[0].name, "RightHandEndSite");

    // Frame 0: rest pose. Bones connect hips -> spine -> hands -> tips.
    let rest: Vec<f64> = data.angles_rad.row(0).iter().copied().collect();
    let bones = bone_segments(&data.root, &rest).expect("should compute");
    assert_eq!(bones.len(), 5);
    let left_tip = bones[2].end;
    assert_relative_eq!(left_tip.x, 1.5, epsilon = 1e-12);
    assert_relative_eq!(left_tip.y, 1.0, epsilon = 1e-12);

    // Frame 1: 90 degrees about Z at the hips swings the left hand from
    // +X to +Y.
    let turned: Vec<f64> = data.angles_rad.row(1).iter().copied().collect();
    let joints =
        joint_positions(&data.root, &turned, None, &FkConfig::new()).expect("should compute");
    // Emission order: hips, spine, lefthand, its end site, righthand, its
    // end site.
    assert_eq!(joints.len(), 6);
    assert_relative_eq!(joints[1].x, -1.0, epsilon = 1e-12); // spine
    assert_relative_eq!(joints[2].y, 1.0, epsilon = 1e-12); // left hand
    assert_relative_eq!(joints[2].x, -1.0, epsilon = 1e-12);
}

#[test]
fn test_reconciliation_against_custom_order() {
    let data = read_bvh_str(FIGURE).expect("should read");
    let order = figure_order();
    let mut channel_order = vec![0usize; order.channel_count()];
    let mut offsets = vec![0.0; order.channel_count()];
    reconcile(&data.root, &order, &mut channel_order, &mut offsets).expect("should reconcile");

    // The file's joint order matches the canonical entry order, so the
    // permutation is the identity and the hips Z column carries pi/2.
    assert_eq!(channel_order, (0..12).collect::<Vec<_>>());
    assert_relative_eq!(data.angles_rad[(1, 2)], PI / 2.0, epsilon = 1e-12);

    // Canonical offsets: spine slot holds (0, 1, 0).
    assert_relative_eq!(offsets[4], 1.0, epsilon = 1e-12);
}

#[test]
fn test_batch_agrees_with_single_over_whole_clip() {
    let mut data = read_bvh_str(FIGURE).expect("should read");
    process_skeleton(&mut data.root);

    for frame in 0..data.frames_read {
        let angles: Vec<f64> = data.angles_rad.row(frame).iter().copied().collect();
        let single = joint_positions(&data.root, &angles, None, &FkConfig::new())
            .expect("should compute");
        let batched = joint_positions_batch(
            &data.root,
            &batch_of_one(&angles),
            None,
            &FkConfig::new(),
        )
        .expect("should compute");
        for (joint, positions) in batched.iter().enumerate() {
            assert_eq!(positions[0], single[joint]);
        }
    }
}

#[test]
fn test_skipping_reference_joint_preserves_descendants() {
    let mut data = read_bvh_str(FIGURE).expect("should read");
    process_skeleton(&mut data.root);

    let rest: Vec<f64> = data.angles_rad.row(0).iter().copied().collect();
    let config = FkConfig::new().with_skip("spine");
    let joints =
        joint_positions(&data.root, &rest, None, &config).expect("should compute");
    // Spine's own position is gone but both hands (offset through the
    // spine's transform) and their end sites remain.
    assert_eq!(joints.len(), 5);
    assert_relative_eq!(joints[1].x, 1.0, epsilon = 1e-12);
    assert_relative_eq!(joints[1].y, 1.0, epsilon = 1e-12);
}
