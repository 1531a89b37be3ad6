//! Batched joint-position evaluation: N independent samples over one tree.
//!
//! Every batch element is an independent FK evaluation (there is no
//! cross-element state), so rows are mapped through the single-sample path.
//! With the `parallel` feature the map runs on rayon; sequential fallback
//! when disabled. Results are identical either way.

use nalgebra::{DMatrix, DVector, Point3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use mocap_bvh::Node;

use crate::error::{KinematicsError, Result};
use crate::fk::{FkConfig, consumed_angle_count, joint_positions};

/// Lift a single angle vector into a batch of one.
///
/// The batched API is rank-2 only; this is the supported normalization for
/// rank-1 input.
pub fn batch_of_one(angles: &[f64]) -> DMatrix<f64> {
    DMatrix::from_row_slice(1, angles.len(), angles)
}

/// Compute joint positions for a batch of angle samples.
///
/// `angles` is (batch x angle count); `lengths`, when present, is
/// (batch x label count) or a single row broadcast across the batch, and
/// requires the config to carry a bone-length table. Returns one vector per
/// emitted joint, each holding that joint's position for every batch
/// element. All shapes are checked before any computation begins.
pub fn joint_positions_batch(
    root: &Node,
    angles: &DMatrix<f64>,
    lengths: Option<&DMatrix<f64>>,
    config: &FkConfig,
) -> Result<Vec<Vec<Point3<f64>>>> {
    let n_batch = angles.nrows();
    let expected = consumed_angle_count(root, config.fixed_angles());
    if angles.ncols() != expected {
        return Err(KinematicsError::shape_mismatch(
            "angle columns",
            expected,
            angles.ncols(),
        ));
    }
    if let Some(values) = lengths {
        let table = config
            .length_table()
            .ok_or(KinematicsError::MissingLengthTable)?;
        if values.ncols() != table.label_count() {
            return Err(KinematicsError::shape_mismatch(
                "length columns",
                table.label_count(),
                values.ncols(),
            ));
        }
        if values.nrows() != 1 && values.nrows() != n_batch {
            return Err(KinematicsError::shape_mismatch(
                "length rows",
                n_batch,
                values.nrows(),
            ));
        }
    }

    let eval_row = |b: usize| -> Result<Vec<Point3<f64>>> {
        let row: Vec<f64> = angles.row(b).iter().copied().collect();
        let length_row: Option<DVector<f64>> = lengths.map(|m| {
            let r = if m.nrows() == 1 { 0 } else { b };
            DVector::from_iterator(m.ncols(), m.row(r).iter().copied())
        });
        joint_positions(root, &row, length_row.as_ref(), config)
    };

    #[cfg(feature = "parallel")]
    let per_sample: Vec<Vec<Point3<f64>>> = (0..n_batch)
        .into_par_iter()
        .map(eval_row)
        .collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let per_sample: Vec<Vec<Point3<f64>>> =
        (0..n_batch).map(eval_row).collect::<Result<_>>()?;

    // Transpose to joints-major: one batch vector per emitted joint.
    let n_joints = per_sample.first().map_or(0, Vec::len);
    let mut out = vec![Vec::with_capacity(n_batch); n_joints];
    for sample in per_sample {
        for (j, p) in sample.into_iter().enumerate() {
            out[j].push(p);
        }
    }
    Ok(out)
}
