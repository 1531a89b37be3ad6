//! Forward kinematics over BVH skeleton trees.
//!
//! This crate takes the [`Node`](mocap_bvh::Node) tree parsed by
//! `mocap-bvh` and turns per-frame joint angles into world-space geometry:
//!
//! - Bone segments for rendering ([`bone_segments`])
//! - Joint positions with optional fixed-angle overrides, bone-length
//!   rescaling and a skip set ([`joint_positions`], [`FkConfig`])
//! - Batched evaluation over many samples at once
//!   ([`joint_positions_batch`])
//! - The skeleton metrics pass feeding length rescaling
//!   ([`process_skeleton`], [`bone_lengths`])
//!
//! All evaluation is pure call-and-return: no state persists across calls
//! and the tree is read-only once the metrics pass has run.
//!
//! # Example
//!
//! ```
//! use mocap_bvh::{Channel, Node};
//! use mocap_kinematics::bone_segments;
//! use nalgebra::Vector3;
//! use std::f64::consts::FRAC_PI_2;
//!
//! // Root with one Z rotation channel, child one unit up the Y axis.
//! let tree = Node::new("Root")
//!     .with_channels(vec![Channel::ZRotation])
//!     .with_child(Node::new("Tip").with_channels(vec![
//!         Channel::XRotation,
//!         Channel::YRotation,
//!         Channel::ZRotation,
//!     ])
//!     .with_offset(Vector3::new(0.0, 1.0, 0.0)));
//!
//! // A quarter turn about Z carries the tip onto the negative X axis.
//! let bones = bone_segments(&tree, &[FRAC_PI_2, 0.0, 0.0, 0.0]).expect("should compute");
//! assert!((bones[0].end.x - (-1.0)).abs() < 1e-12);
//! ```
//!
//! # Feature flags
//!
//! - `parallel`: evaluate batch elements across CPU cores via rayon.
//!   Results are identical to sequential evaluation.

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

mod batch;
mod error;
mod fk;
mod rotation;
mod skeleton;

pub use batch::{batch_of_one, joint_positions_batch};
pub use error::{KinematicsError, Result};
pub use fk::{Bone, FkConfig, bone_segments, fixed_angle_key, joint_positions};
pub use rotation::rotation_about;
pub use skeleton::{bone_lengths, load_all_lengths, populate_lengths, process_skeleton};
