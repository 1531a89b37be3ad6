//! Directory batch loader.
//!
//! Walks a directory tree for `.bvh` files, reconciles each against a
//! canonical joint order, and concatenates the survivors' motion data.
//! Files whose layout does not fit the canonical order are skipped with a
//! logged reason; anything else (I/O, syntax) aborts the walk.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;

use crate::canonical::JointOrder;
use crate::channels::reconcile;
use crate::error::{BvhError, Result};
use crate::reader::read_bvh_file;

/// Concatenated motion data from a directory of reconciled BVH files.
#[derive(Debug, Clone)]
pub struct MotionDataset {
    /// Radian angles in canonical column order, all files' frames stacked
    /// row-wise; shape (total frames x canonical channel count).
    pub angles: DMatrix<f64>,
    /// One canonical-order offset row per loaded file;
    /// shape (file count x canonical channel count).
    pub offsets: DMatrix<f64>,
    /// Source paths of the loaded files, in stacking order.
    pub files: Vec<PathBuf>,
}

impl MotionDataset {
    /// Number of files that reconciled successfully.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Total frame count across all loaded files.
    pub fn frame_count(&self) -> usize {
        self.angles.nrows()
    }
}

/// Load every reconcilable `.bvh` file under `dir` (recursively).
///
/// Per file: parse, decompose, reconcile against `order`, and permute the
/// radian angle columns into canonical order. Reconciliation failures skip
/// the file with a warning; other errors are fatal. Fails with
/// [`BvhError::NoFilesLoaded`] when nothing survives.
pub fn load_all(dir: impl AsRef<Path>, order: &JointOrder) -> Result<MotionDataset> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    collect_bvh_files(dir, &mut paths)?;
    paths.sort();

    let n = order.channel_count();
    let mut angle_blocks: Vec<DMatrix<f64>> = Vec::new();
    let mut offset_rows: Vec<Vec<f64>> = Vec::new();
    let mut files = Vec::new();

    for path in paths {
        let data = read_bvh_file(&path)?;
        let mut channel_order = vec![0usize; n];
        let mut offsets = vec![0.0; n];
        match reconcile(&data.root, order, &mut channel_order, &mut offsets) {
            Ok(()) => {
                let frames = data.frames_read;
                let block = DMatrix::from_fn(frames, n, |r, c| {
                    data.angles_rad[(r, channel_order[c])]
                });
                angle_blocks.push(block);
                offset_rows.push(offsets);
                tracing::info!("loaded {}", path.display());
                files.push(path);
            }
            Err(e) if e.is_reconcile_failure() => {
                tracing::warn!("skipping {}: {}", path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }

    if files.is_empty() {
        return Err(BvhError::NoFilesLoaded {
            dir: dir.to_path_buf(),
        });
    }

    let total_frames: usize = angle_blocks.iter().map(DMatrix::nrows).sum();
    let mut angles = DMatrix::zeros(total_frames, n);
    let mut row = 0;
    for block in &angle_blocks {
        angles.rows_mut(row, block.nrows()).copy_from(block);
        row += block.nrows();
    }
    let offsets = DMatrix::from_fn(offset_rows.len(), n, |r, c| offset_rows[r][c]);

    Ok(MotionDataset {
        angles,
        offsets,
        files,
    })
}

/// Recursive walk collecting `.bvh` paths (case-insensitive extension).
fn collect_bvh_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_bvh_files(&path, out)?;
        } else if has_bvh_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

pub(crate) fn has_bvh_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("bvh"))
}
