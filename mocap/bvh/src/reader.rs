//! Motion reader: per-frame decomposition of raw channel values.
//!
//! [`MotionReader`] consumes parse events and splits every frame row into a
//! 3-component root translation and an angle vector over the rotation
//! channels, converting degrees to radians as it goes.

use std::f64::consts::PI;
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::Path;

use nalgebra::DMatrix;

use crate::error::{BvhError, Result};
use crate::parser::{BvhSink, parse_bvh_reader, parse_bvh_str};
use crate::types::{Channel, Node};

/// Location of the root's three position channels within a frame row.
///
/// The contiguous form is the common case (the standard format declares
/// `Xposition Yposition Zposition` first); the scattered form handles any
/// other layout. Both select the same 3 scalars per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionIndex {
    /// Ascending adjacent indices, stored as a range.
    Contiguous(Range<usize>),
    /// Explicit (x, y, z) channel indices.
    Scattered([usize; 3]),
}

impl PositionIndex {
    /// Whether a channel index belongs to the position selection.
    pub fn contains(&self, index: usize) -> bool {
        match self {
            Self::Contiguous(range) => range.contains(&index),
            Self::Scattered(indices) => indices.contains(&index),
        }
    }

    /// Extract the (x, y, z) position values from a frame row.
    pub fn extract(&self, values: &[f64]) -> [f64; 3] {
        match self {
            Self::Contiguous(range) => [
                values[range.start],
                values[range.start + 1],
                values[range.start + 2],
            ],
            Self::Scattered([x, y, z]) => [values[*x], values[*y], values[*z]],
        }
    }
}

/// Streaming frame decomposer implementing [`BvhSink`].
#[derive(Debug)]
pub struct MotionReader {
    pos_idx: Option<PositionIndex>,
    ang_idx: Vec<usize>,
    num_channels: usize,
    declared_frames: usize,
    frames_read: usize,
    dt: f64,
    positions: DMatrix<f64>,
    angles_deg: DMatrix<f64>,
    angles_rad: DMatrix<f64>,
}

impl Default for MotionReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionReader {
    /// Create an empty reader; state is populated by parse events.
    pub fn new() -> Self {
        Self {
            pos_idx: None,
            ang_idx: Vec::new(),
            num_channels: 0,
            declared_frames: 0,
            frames_read: 0,
            dt: 0.0,
            positions: DMatrix::zeros(0, 0),
            angles_deg: DMatrix::zeros(0, 0),
            angles_rad: DMatrix::zeros(0, 0),
        }
    }

    /// Number of frame rows actually delivered. May be less than the
    /// declared count; rows past this index are undefined.
    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// Consume the reader into a [`MotionData`], pairing it with the tree
    /// the parser returned.
    pub fn into_data(self, root: Node) -> MotionData {
        MotionData {
            root,
            positions: self.positions,
            angles_deg: self.angles_deg,
            angles_rad: self.angles_rad,
            dt: self.dt,
            num_frames: self.declared_frames,
            frames_read: self.frames_read,
        }
    }

    fn position_channel(root: &Node, channel: Channel) -> Result<usize> {
        root.channels
            .iter()
            .position(|&c| c == channel)
            .ok_or(BvhError::MissingPositionChannel {
                channel: channel.label(),
            })
    }
}

impl BvhSink for MotionReader {
    fn on_hierarchy(&mut self, root: &Node) -> Result<()> {
        // Position channels only appear on the root, whose channel block
        // starts the depth-first layout, so root-local indices are global.
        let x = Self::position_channel(root, Channel::XPosition)?;
        let y = Self::position_channel(root, Channel::YPosition)?;
        let z = Self::position_channel(root, Channel::ZPosition)?;
        let pos_idx = if y == x + 1 && z == y + 1 {
            PositionIndex::Contiguous(x..z + 1)
        } else {
            PositionIndex::Scattered([x, y, z])
        };
        self.num_channels = root.channel_count();
        self.ang_idx = (0..self.num_channels)
            .filter(|&i| !pos_idx.contains(i))
            .collect();
        self.pos_idx = Some(pos_idx);
        Ok(())
    }

    fn on_motion(&mut self, frames: usize, dt: f64) -> Result<()> {
        self.declared_frames = frames;
        self.dt = dt;
        self.positions = DMatrix::zeros(frames, 3);
        self.angles_deg = DMatrix::zeros(frames, self.ang_idx.len());
        self.angles_rad = DMatrix::zeros(frames, self.ang_idx.len());
        self.frames_read = 0;
        Ok(())
    }

    fn on_frame(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.num_channels {
            return Err(BvhError::FrameLengthMismatch {
                expected: self.num_channels,
                got: values.len(),
                frame: self.frames_read,
            });
        }
        if self.frames_read >= self.declared_frames {
            return Err(BvhError::ExtraFrames {
                declared: self.declared_frames,
            });
        }
        let row = self.frames_read;
        if let Some(pos_idx) = &self.pos_idx {
            let [x, y, z] = pos_idx.extract(values);
            self.positions[(row, 0)] = x;
            self.positions[(row, 1)] = y;
            self.positions[(row, 2)] = z;
        }
        for (col, &src) in self.ang_idx.iter().enumerate() {
            let deg = values[src];
            self.angles_deg[(row, col)] = deg;
            self.angles_rad[(row, col)] = deg * PI / 180.0;
        }
        self.frames_read += 1;
        Ok(())
    }
}

/// A fully read BVH file: skeleton tree plus decomposed motion buffers.
#[derive(Debug, Clone)]
pub struct MotionData {
    /// The skeleton tree.
    pub root: Node,
    /// Root translation per frame, shape (declared frames x 3).
    pub positions: DMatrix<f64>,
    /// Rotation-channel values in degrees, file column order,
    /// shape (declared frames x angle count).
    pub angles_deg: DMatrix<f64>,
    /// The same angles converted to radians.
    pub angles_rad: DMatrix<f64>,
    /// Sample interval from the motion header, in seconds.
    pub dt: f64,
    /// Frame count declared by the motion header.
    pub num_frames: usize,
    /// Frame rows actually present. Rows at or past this index are
    /// undefined and must not be read.
    pub frames_read: usize,
}

/// Parse and decompose a BVH document from a string.
pub fn read_bvh_str(text: &str) -> Result<MotionData> {
    let mut reader = MotionReader::new();
    let root = parse_bvh_str(text, &mut reader)?;
    Ok(reader.into_data(root))
}

/// Parse and decompose a BVH file from disk.
pub fn read_bvh_file(path: impl AsRef<Path>) -> Result<MotionData> {
    let file = File::open(path)?;
    let mut reader = MotionReader::new();
    let root = parse_bvh_reader(BufReader::new(file), &mut reader)?;
    Ok(reader.into_data(root))
}
