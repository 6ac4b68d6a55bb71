//! Tick driven motion simulator for six-axis robot arms with a parallel base and spherical wrist.
//!
//! The arm is moved by joint moves, straight and circular Cartesian moves, or by live jogging
//! in the joint, world, tool or user frame. Every call to [controller::ArmController::tick]
//! advances the motion a little and returns; nothing blocks.
//!
//! # Features
//!
//! - Analytic forward and inverse kinematics (OPW). Solutions are cross-checked with forward
//!   kinematics and sorted by proximity to the current joint angles. At the wrist singularity
//!   J4 keeps its previous value and J6 takes the remaining rotation.
//! - Joint moves choose the direction of rotation that keeps every joint inside its range,
//!   also when the range wraps around through zero.
//! - Cartesian moves and jogging are atomic: a pose that cannot be reached inside the joint
//!   ranges does not move any joint and leaves the arm faulted until the fault is cleared.
//! - Self collision and object collision checks with oriented bounding boxes.
//! - Six end effectors with their own boxes. Suction and claw can pick up parts.
//! - Motion instructions with position registers, offsets, tool and user frames, and a
//!   runner that steps through a program.
//!
//! # Parameters
//!
//! The geometry is described by the seven OPW parameters (_a1, a2, b, c1, c2, c3_, and _c4_).
//! The arm is at zero when all joints stick straight up in the air.
//!
//! ![OPW Diagram](https://bourumir-wyngs.github.io/rs-opw-kinematics/documentation/opw.gif)
//!
//! To use the library, fill out an [arm::ArmSettings] (or take the default simulated arm)
//! and create an [controller::ArmController] from it.

pub mod parameters;
pub mod parameters_robots;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;
#[cfg(feature = "allow_filesystem")]
pub mod parameter_error;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod kinematics_impl;

pub mod constraints;

pub mod base;

pub mod frame;
pub mod point;

pub mod joint_segment;
pub mod interpolator;

pub mod joint_body;
pub mod collisions;
pub mod end_effector;

pub mod capabilities;
pub mod scene;
pub mod motion_error;

pub mod cartesian;
pub mod arm;
pub mod controller;
pub mod executor;

#[cfg(test)]
#[cfg(feature = "allow_filesystem")]
mod tests;
