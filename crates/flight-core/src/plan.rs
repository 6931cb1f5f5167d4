//! Waypoint and flight-plan model used by the autopilot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single waypoint inside a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointStatus {
    Pending,
    Active,
    Reached,
    Skipped,
}

impl Default for WaypointStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for WaypointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Reached => "reached",
            Self::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

/// A single mission target: absolute world coordinates plus travel speed
/// and an optional hover after arrival
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    /// X in cm
    pub x: i32,
    /// Y in cm
    pub y: i32,
    /// Altitude in cm
    pub z: i32,
    /// Travel speed in cm/s
    pub speed: u32,
    /// Seconds to hover after reaching
    pub hover_time: f64,
    /// Optional action label executed at the waypoint
    pub action: Option<String>,
    pub status: WaypointStatus,
}

impl Waypoint {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self {
            x,
            y,
            z,
            speed: 50,
            hover_time: 0.0,
            action: None,
            status: WaypointStatus::Pending,
        }
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_hover(mut self, seconds: f64) -> Self {
        self.hover_time = seconds;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }
}

/// Flight-plan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightPlanStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl Default for FlightPlanStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for FlightPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// An ordered sequence of waypoints the drone flies through.
///
/// `current_index` stays within `0 ..= waypoints.len()`; it only moves
/// forward except when a looping plan wraps back to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPlan {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
    #[serde(rename = "loop", default)]
    pub loop_enabled: bool,
    #[serde(default)]
    pub status: FlightPlanStatus,
    #[serde(default)]
    pub current_index: usize,
}

impl FlightPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            waypoints: Vec::new(),
            loop_enabled: false,
            status: FlightPlanStatus::Idle,
            current_index: 0,
        }
    }

    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.waypoints.push(waypoint);
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Back to IDLE at index 0 with every waypoint PENDING
    pub fn reset(&mut self) {
        self.status = FlightPlanStatus::Idle;
        self.current_index = 0;
        for wp in &mut self.waypoints {
            wp.status = WaypointStatus::Pending;
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> FlightPlan {
        let mut plan = FlightPlan::new("sample");
        plan.add_waypoint(Waypoint::new(100, 0, 80).with_speed(40).with_hover(1.0));
        plan.add_waypoint(Waypoint::new(0, 100, 80).with_action("photo"));
        plan
    }

    #[test]
    fn test_waypoint_defaults() {
        let wp = Waypoint::new(10, 20, 30);
        assert_eq!(wp.speed, 50);
        assert_eq!(wp.hover_time, 0.0);
        assert_eq!(wp.status, WaypointStatus::Pending);
        assert!(wp.action.is_none());
    }

    #[test]
    fn test_plan_reset() {
        let mut plan = sample_plan();
        plan.status = FlightPlanStatus::Aborted;
        plan.current_index = 2;
        plan.waypoints[0].status = WaypointStatus::Reached;
        plan.waypoints[1].status = WaypointStatus::Skipped;

        plan.reset();

        assert_eq!(plan.status, FlightPlanStatus::Idle);
        assert_eq!(plan.current_index, 0);
        assert!(
            plan.waypoints
                .iter()
                .all(|wp| wp.status == WaypointStatus::Pending)
        );
    }

    #[test]
    fn test_plan_serde_roundtrip() {
        let mut plan = sample_plan();
        plan.loop_enabled = true;

        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"loop\":true"));
        assert!(json.contains("\"status\":\"idle\""));

        let back: FlightPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, plan.name);
        assert_eq!(back.len(), 2);
        assert!(back.loop_enabled);
        assert_eq!(back.waypoints[1].action.as_deref(), Some("photo"));
    }
}
