//! # Flight Autonomy
//!
//! The two autonomous drivers that sit on top of the drone contract: a
//! waypoint autopilot executing pre-programmed flight plans, and a
//! reactive navigator steering toward a goal around camera-detected
//! obstacles. They are mutually exclusive; the operator runs one at a
//! time.

pub mod autopilot;
pub mod navigator;
pub mod routines;

pub use autopilot::Autopilot;
pub use navigator::{AvoidanceAction, NavStatus, Navigator, NavigatorStatus};
pub use routines::{BUILTIN_ROUTINES, RoutineParams, build_routine};
