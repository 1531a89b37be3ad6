//! Biovision Hierarchy (BVH) motion-capture file parsing.
//!
//! This crate parses [BVH](https://research.cs.wisc.edu/graphics/Courses/cs-838-1999/Jeff/BVH.html)
//! motion-capture files — a text format describing a skeletal joint tree
//! plus a per-frame time series of joint angles and positions — and
//! reconciles arbitrary file layouts against fixed canonical joint orders.
//!
//! # Features
//!
//! - Event-driven parser for the BVH grammar ([`BvhSink`])
//! - Frame decomposition into root translation and rotation angles, with
//!   degree-to-radian conversion ([`MotionReader`])
//! - Canonical joint-order reconciliation producing an angle-column
//!   permutation and canonical offsets ([`reconcile`])
//! - Structural validation of parsed trees ([`validate`])
//! - Directory batch loading with skip-on-mismatch ([`load_all`])
//!
//! Forward kinematics over the parsed tree lives in the companion
//! `mocap-kinematics` crate.
//!
//! # Example
//!
//! ```
//! use mocap_bvh::read_bvh_str;
//!
//! let bvh = "\
//! HIERARCHY
//! ROOT Hips
//! {
//!     OFFSET 0.0 0.0 0.0
//!     CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
//!     End Site
//!     {
//!         OFFSET 0.0 1.0 0.0
//!     }
//! }
//! MOTION
//! Frames: 1
//! Frame Time: 0.033333
//! 0.0 5.0 0.0 90.0 0.0 0.0
//! ";
//!
//! let data = read_bvh_str(bvh).expect("should parse");
//! assert_eq!(data.root.name, "Hips");
//! assert_eq!(data.frames_read, 1);
//! assert_eq!(data.positions[(0, 1)], 5.0);
//! assert_eq!(data.angles_deg[(0, 0)], 90.0);
//! ```
//!
//! # Canonical joint orders
//!
//! A [`JointOrder`] maps lowercase joint names to fixed output slots and
//! expected rotation-axis orders. Two built-in layouts exist — the standard
//! capture layout and a range-of-motion calibration layout — and callers
//! choose one per call; nothing is inferred from the file.
//!
//! # Limitations
//!
//! - Writing/export is not supported
//! - Streaming ingestion is not supported; a file is parsed in one pass
//! - Retargeting across different joint topologies is out of scope

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names,
    clippy::items_after_statements,
    clippy::option_if_let_else,
    clippy::doc_markdown
)]

mod canonical;
mod channels;
mod error;
mod loader;
mod parser;
mod reader;
mod types;
mod validation;

pub use canonical::{BoneLengthTable, JointOrder};
pub use channels::{reconcile, rotation_order};
pub use error::{BvhError, Result};
pub use loader::{MotionDataset, load_all};
pub use parser::{BvhSink, NullSink, parse_bvh_reader, parse_bvh_str};
pub use reader::{MotionData, MotionReader, PositionIndex, read_bvh_file, read_bvh_str};
pub use types::{Axis, Channel, END_SITE_NAME, Node};
pub use validation::{ValidationReport, validate};
