//! Structural validation of parsed skeleton trees.
//!
//! Checks the format invariants that the grammar alone cannot enforce:
//! distinct joint names, well-formed rotation triplets, bare end sites, and
//! position channels confined to the root.

use std::collections::HashSet;

use crate::channels::rotation_order;
use crate::error::{BvhError, Result};
use crate::types::Node;

/// Summary of a validated tree.
#[derive(Debug)]
pub struct ValidationReport {
    /// Non-end-site joint names in pre-order.
    pub joint_names: Vec<String>,
    /// Number of end-site markers in the tree.
    pub end_site_count: usize,
    /// Total channel count over the tree.
    pub channel_count: usize,
}

/// Validate a skeleton tree.
///
/// Returns the first violated invariant, or a [`ValidationReport`] on
/// success.
pub fn validate(root: &Node) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        joint_names: Vec::new(),
        end_site_count: 0,
        channel_count: root.channel_count(),
    };
    let mut seen = HashSet::new();
    visit(root, true, &mut seen, &mut report)?;
    Ok(report)
}

fn visit(
    node: &Node,
    is_root: bool,
    seen: &mut HashSet<String>,
    report: &mut ValidationReport,
) -> Result<()> {
    if node.is_end_site {
        if !node.channels.is_empty() {
            return Err(BvhError::InvalidStructure(format!(
                "end site under {} declares channels",
                node.name
            )));
        }
        if !node.children.is_empty() {
            return Err(BvhError::InvalidStructure(format!(
                "end site under {} has children",
                node.name
            )));
        }
        report.end_site_count += 1;
        return Ok(());
    }

    if !seen.insert(node.name.to_lowercase()) {
        return Err(BvhError::DuplicateJoint(node.name.clone()));
    }
    rotation_order(node)?;
    if !is_root && node.channels.iter().any(|c| c.is_position()) {
        return Err(BvhError::InvalidStructure(format!(
            "non-root joint {} declares position channels",
            node.name
        )));
    }
    report.joint_names.push(node.name.clone());

    for child in &node.children {
        visit(child, false, seen, report)?;
    }
    Ok(())
}
