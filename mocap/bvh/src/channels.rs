//! Channel-order reconciliation against a canonical joint order.
//!
//! Maps an arbitrary file's channel layout onto the fixed anatomical
//! numbering of a [`JointOrder`]: a permutation of angle-column indices plus
//! the joint offsets rearranged into canonical slots.

use crate::canonical::{JointOrder, axis_order_string};
use crate::error::{BvhError, Result};
use crate::types::{Axis, Node};

/// Extract a joint's rotation-axis order from its channel declaration.
///
/// Fails unless the joint declares exactly three rotation channels whose
/// axes are a permutation of X/Y/Z.
pub fn rotation_order(node: &Node) -> Result<[Axis; 3]> {
    let axes: Vec<Axis> = node
        .channels
        .iter()
        .filter_map(|c| c.rotation_axis())
        .collect();
    let distinct = axes.len() == 3 && axes[0] != axes[1] && axes[1] != axes[2] && axes[0] != axes[2];
    if !distinct {
        return Err(BvhError::malformed_rotation(
            node.name.clone(),
            axis_order_string(&axes),
        ));
    }
    Ok([axes[0], axes[1], axes[2]])
}

/// Populate `channel_order` and `offsets` for every non-end-site joint of
/// the tree, in canonical layout.
///
/// `channel_order[slot * 3 + k]` receives the angle-column index (the
/// position among the file's rotation channels, in depth-first declaration
/// order) that canonical channel occupies; `offsets[slot * 3 + k]` receives
/// component `k` of the joint's parent-relative offset. Both buffers must be
/// pre-sized to [`JointOrder::channel_count`].
///
/// Either the whole tree reconciles or the file is rejected; the tree is
/// never mutated and the buffers carry no partial-success guarantee on
/// error.
pub fn reconcile(
    root: &Node,
    order: &JointOrder,
    channel_order: &mut [usize],
    offsets: &mut [f64],
) -> Result<()> {
    let expected = order.channel_count();
    if channel_order.len() != expected {
        return Err(BvhError::BufferSizeMismatch {
            expected,
            got: channel_order.len(),
        });
    }
    if offsets.len() != expected {
        return Err(BvhError::BufferSizeMismatch {
            expected,
            got: offsets.len(),
        });
    }
    let mut cursor = 0usize;
    visit(root, order, channel_order, offsets, &mut cursor)
}

fn visit(
    node: &Node,
    order: &JointOrder,
    channel_order: &mut [usize],
    offsets: &mut [f64],
    cursor: &mut usize,
) -> Result<()> {
    if node.is_end_site {
        return Ok(());
    }
    let found = rotation_order(node)?;
    let key = node.name.to_lowercase();
    let (slot, expected) = order
        .get(&key)
        .ok_or_else(|| BvhError::UnknownJoint(node.name.clone()))?;
    if found != expected {
        return Err(BvhError::channel_order_mismatch(
            node.name.clone(),
            axis_order_string(&expected),
            axis_order_string(&found),
        ));
    }
    for k in 0..3 {
        channel_order[slot * 3 + k] = *cursor;
        *cursor += 1;
        offsets[slot * 3 + k] = node.offset[k];
    }
    for child in &node.children {
        visit(child, order, channel_order, offsets, cursor)?;
    }
    Ok(())
}
