//! Skeleton metrics: per-joint offset length, unit direction, and end-site
//! naming.
//!
//! [`process_skeleton`] is the one pass that mutates the tree after parsing.
//! It must complete before any FK call that rescales bone lengths; this is
//! plain phase ordering, there is no concurrent access to guard.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::DVector;

use mocap_bvh::{BoneLengthTable, END_SITE_NAME, Node, read_bvh_file};

use crate::error::{KinematicsError, Result};

/// Compute `length` and `offset_unit` for every node and rename generic
/// end sites to `<parent>EndSite`.
///
/// A zero-length offset keeps its raw (zero) vector as `offset_unit`; no
/// fallback direction is invented. Only end sites still carrying the
/// literal file marker name are renamed, so the pass is idempotent.
pub fn process_skeleton(node: &mut Node) {
    node.length = node.offset.norm();
    node.offset_unit = if node.length != 0.0 {
        node.offset / node.length
    } else {
        node.offset
    };
    let parent_name = node.name.clone();
    for child in &mut node.children {
        if child.is_end_site && child.name == END_SITE_NAME {
            child.name = format!("{parent_name}EndSite");
        }
        process_skeleton(child);
    }
}

/// Fill a dense label-indexed length vector from the tree's offsets.
///
/// Nodes absent from the table are ignored; bilateral nodes sharing a label
/// overwrite the same slot (symmetric skeletons make this harmless). The
/// buffer must be sized to [`BoneLengthTable::label_count`].
pub fn populate_lengths(
    node: &Node,
    table: &BoneLengthTable,
    lengths: &mut [f64],
) -> Result<()> {
    if lengths.len() != table.label_count() {
        return Err(KinematicsError::shape_mismatch(
            "bone lengths",
            table.label_count(),
            lengths.len(),
        ));
    }
    fill(node, table, lengths);
    Ok(())
}

fn fill(node: &Node, table: &BoneLengthTable, lengths: &mut [f64]) {
    if let Some(slot) = table.label_index(&node.name.to_lowercase()) {
        lengths[slot] = node.offset.norm();
    }
    for child in &node.children {
        fill(child, table, lengths);
    }
}

/// Named bone lengths of a tree as a dense vector in label-slot order.
pub fn bone_lengths(root: &Node, table: &BoneLengthTable) -> DVector<f64> {
    let mut lengths = DVector::zeros(table.label_count());
    fill(root, table, lengths.as_mut_slice());
    lengths
}

/// Collect bone-length vectors from a directory tree, one per directory,
/// taken from the first `.bvh` file found there (sorted order).
///
/// Every subject directory of a capture session shares one skeleton, so a
/// single file per directory suffices.
pub fn load_all_lengths(
    dir: impl AsRef<Path>,
    table: &BoneLengthTable,
) -> Result<Vec<DVector<f64>>> {
    let mut out = Vec::new();
    visit_dir(dir.as_ref(), table, &mut out)?;
    Ok(out)
}

fn visit_dir(dir: &Path, table: &BoneLengthTable, out: &mut Vec<DVector<f64>>) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut subdirs: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).map_err(mocap_bvh::BvhError::from)? {
        let entry = entry.map_err(mocap_bvh::BvhError::from)?;
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("bvh"))
        {
            files.push(path);
        }
    }
    files.sort();
    subdirs.sort();

    if let Some(path) = files.first() {
        let mut data = read_bvh_file(path)?;
        process_skeleton(&mut data.root);
        out.push(bone_lengths(&data.root, table));
        tracing::info!("measured skeleton from {}", path.display());
    }
    for sub in subdirs {
        visit_dir(&sub, table, out)?;
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

    fn rot_xyz() -> Vec<Channel> {
        vec![Channel::XRotation, Channel::YRotation, Channel::ZRotation]
    }

    #[test]
    fn test_lengths_and_unit_offsets() {
        let mut root = Node::new("Hips").with_channels(rot_xyz()).with_child(
            Node::new("Spine")
                .with_channels(rot_xyz())
                .with_offset(Vector3::new(3.0, 0.0, 4.0)),
        );
        process_skeleton(&mut root);

        // Zero-length root keeps its raw zero offset as the unit vector.
        assert_relative_eq!(root.length, 0.0, epsilon = 1e-12);
        assert_relative_eq!(root.offset_unit.norm(), 0.0, epsilon = 1e-12);

        let spine = &root.children[0];
        assert_relative_eq!(spine.length, 5.0, epsilon = 1e-12);
        assert_relative_eq!(spine.offset_unit.x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(spine.offset_unit.z, 0.8, epsilon = 1e-12);
        assert_relative_eq!(spine.offset_unit.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_end_site_renaming_disambiguates() {
        let mut root = Node::new("Hips")
            .with_channels(rot_xyz())
            .with_child(
                Node::new("LeftHand")
                    .with_channels(rot_xyz())
                    .with_child(Node::end_site(Vector3::new(0.0, 0.1, 0.0))),
            )
            .with_child(
                Node::new("RightHand")
                    .with_channels(rot_xyz())
                    .with_child(Node::end_site(Vector3::new(0.0, 0.1, 0.0))),
            );
        process_skeleton(&mut root);
        assert_eq!(root.children[0].children[0].name, "LeftHandEndSite");
        assert_eq!(root.children[1].children[0].name, "RightHandEndSite");

        // Running the pass again leaves the names alone.
        process_skeleton(&mut root);
        assert_eq!(root.children[0].children[0].name, "LeftHandEndSite");
    }

    #[test]
    fn test_bone_lengths_deduplicate_bilateral() {
        let table = BoneLengthTable::from_entries(&[
            ("lefthand", "hand"),
            ("righthand", "hand"),
            ("spine", "waist"),
        ]);
        let root = Node::new("Hips")
            .with_channels(rot_xyz())
            .with_child(
                Node::new("Spine")
                    .with_channels(rot_xyz())
                    .with_offset(Vector3::new(0.0, 2.0, 0.0)),
            )
            .with_child(
                Node::new("LeftHand")
                    .with_channels(rot_xyz())
                    .with_offset(Vector3::new(1.0, 0.0, 0.0)),
            )
            .with_child(
                Node::new("RightHand")
                    .with_channels(rot_xyz())
                    .with_offset(Vector3::new(-1.0, 0.0, 0.0)),
            );
        let lengths = bone_lengths(&root, &table);
        assert_eq!(lengths.len(), 2);

        let hand = table.label_index("lefthand").unwrap();
        let waist = table.label_index("spine").unwrap();
        assert_relative_eq!(lengths[hand], 1.0, epsilon = 1e-12);
        assert_relative_eq!(lengths[waist], 2.0, epsilon = 1e-12);
    }

    fn clip_with_spine_length(len: f64) -> String {
        format!(
            "\
HIERARCHY
ROOT A
{{
    OFFSET 0.0 0.0 0.0
    CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation
    JOINT B
    {{
        OFFSET 0.0 {len} 0.0
        CHANNELS 3 Xrotation Yrotation Zrotation
        End Site
        {{
            OFFSET 0.0 0.5 0.0
        }}
    }}
}}
MOTION
Frames: 1
Frame Time: 0.01
0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0
"
        )
    }

    #[test]
    fn test_load_all_lengths_measures_first_file_per_directory() {
        let table = BoneLengthTable::from_entries(&[("b", "bone")]);
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let sub = root.join("other_subject");
        fs::create_dir_all(&sub).unwrap();
        // Only the first file in sorted order gets measured per directory.
        fs::write(root.join("a_first.bvh"), clip_with_spine_length(2.0)).unwrap();
        fs::write(root.join("z_second.bvh"), clip_with_spine_length(9.0)).unwrap();
        fs::write(sub.join("only.bvh"), clip_with_spine_length(3.0)).unwrap();

        let lengths = load_all_lengths(root, &table).expect("should load");
        assert_eq!(lengths.len(), 2);
        let slot = table.label_index("b").unwrap();
        assert_relative_eq!(lengths[0][slot], 2.0, epsilon = 1e-12);
        assert_relative_eq!(lengths[1][slot], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_populate_lengths_checks_buffer_size() {
        let table = BoneLengthTable::from_entries(&[("spine", "waist")]);
        let root = Node::new("Hips").with_channels(rot_xyz());
        let mut too_small: [f64; 0] = [];
        assert!(matches!(
            populate_lengths(&root, &table, &mut too_small),
            Err(KinematicsError::ShapeMismatch { .. })
        ));
    }
}
