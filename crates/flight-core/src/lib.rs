//! # Flight Core
//!
//! Shared domain model for the flight stack: the observable drone state,
//! RC stick commands, the waypoint/flight-plan model, and the control
//! contract every drone backend implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod plan;

pub use error::{FlightError, FlightResult};
pub use plan::*;

/// Round to one decimal place for wire snapshots
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ============================================================================
// DRONE STATE
// ============================================================================

/// Observable snapshot of a drone.
///
/// Positions are centimeters from the takeoff origin, yaw is degrees in
/// `[0, 360)` measured counter-clockwise from the positive X axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneState {
    /// X position in cm
    pub x: f64,
    /// Y position in cm
    pub y: f64,
    /// Altitude in cm, never below 0
    pub z: f64,
    /// Heading in degrees `[0, 360)`
    pub yaw: f64,
    /// Current commanded linear speed in cm/s
    pub speed: f64,
    /// Battery percentage `[0, 100]`
    pub battery: f64,
    pub is_flying: bool,
    pub is_connected: bool,
    /// Cumulative seconds spent flying across takeoff sessions
    pub flight_time: f64,
    /// Internal temperature in Celsius, capped at 45
    pub temperature: f64,
    /// Wall clock at snapshot time
    pub timestamp: DateTime<Utc>,
}

impl Default for DroneState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            speed: 0.0,
            battery: 100.0,
            is_flying: false,
            is_connected: false,
            flight_time: 0.0,
            temperature: 25.0,
            timestamp: Utc::now(),
        }
    }
}

impl DroneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 3-D Euclidean distance from the drone to a world point, in cm
    pub fn distance_to(&self, x: f64, y: f64, z: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        let dz = z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Copy with numeric fields rounded to 0.1, for wire serialization
    pub fn rounded(&self) -> Self {
        Self {
            x: round1(self.x),
            y: round1(self.y),
            z: round1(self.z),
            yaw: round1(self.yaw),
            speed: round1(self.speed),
            battery: round1(self.battery),
            flight_time: round1(self.flight_time),
            temperature: round1(self.temperature),
            ..self.clone()
        }
    }
}

// ============================================================================
// RC COMMANDS & DIRECTIONS
// ============================================================================

/// RC-style stick values, each clamped to `[-100, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RcCommand {
    pub left_right: i8,
    pub forward_back: i8,
    pub up_down: i8,
    pub yaw: i8,
}

impl RcCommand {
    pub const NEUTRAL: Self = Self {
        left_right: 0,
        forward_back: 0,
        up_down: 0,
        yaw: 0,
    };

    /// Build a command, clamping each stick to `[-100, 100]`
    pub fn new(left_right: i32, forward_back: i32, up_down: i32, yaw: i32) -> Self {
        Self {
            left_right: left_right.clamp(-100, 100) as i8,
            forward_back: forward_back.clamp(-100, 100) as i8,
            up_down: up_down.clamp(-100, 100) as i8,
            yaw: yaw.clamp(-100, 100) as i8,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

/// Body-frame translation directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl MoveDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Resolve a body-frame translation into world-frame deltas.
    ///
    /// `forward` is along `(cos yaw, sin yaw)`; `left`/`right` are its
    /// perpendiculars; `up`/`down` translate altitude only.
    pub fn displacement(&self, yaw_deg: f64, distance_cm: f64) -> (f64, f64, f64) {
        let rad = yaw_deg.to_radians();
        match self {
            Self::Forward => (distance_cm * rad.cos(), distance_cm * rad.sin(), 0.0),
            Self::Back => (-distance_cm * rad.cos(), -distance_cm * rad.sin(), 0.0),
            Self::Left => (distance_cm * rad.sin(), -distance_cm * rad.cos(), 0.0),
            Self::Right => (-distance_cm * rad.sin(), distance_cm * rad.cos(), 0.0),
            Self::Up => (0.0, 0.0, distance_cm),
            Self::Down => (0.0, 0.0, -distance_cm),
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MoveDirection {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "back" => Ok(Self::Back),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(FlightError::invalid_command(format!(
                "unknown direction '{other}'"
            ))),
        }
    }
}

// ============================================================================
// DRONE CONTROL CONTRACT
// ============================================================================

/// Control contract implemented by every drone backend.
///
/// `move_by`, `rotate`, and `go_to` block until the motion completes (or
/// the backend gives up); `send_rc` latches stick values and returns
/// immediately. `emergency_stop` is unconditional and cannot fail.
#[async_trait]
pub trait DroneBackend: Send + Sync {
    /// Connect to the drone and reset battery/temperature to nominal
    async fn connect(&self) -> FlightResult<()>;

    /// Emergency-stop, then clear the connection
    async fn disconnect(&self);

    /// Requires connected and not flying; hovers at roughly 80 cm
    async fn takeoff(&self) -> FlightResult<()>;

    /// Requires flying; zeroes altitude and motion
    async fn land(&self) -> FlightResult<()>;

    /// Unconditionally zero motion and clear the flying flag
    async fn emergency_stop(&self);

    /// Translate `distance_cm` in the body frame along `direction`
    async fn move_by(&self, direction: MoveDirection, distance_cm: u32) -> FlightResult<()>;

    /// Rotate clockwise by `degrees` (negative for counter-clockwise)
    async fn rotate(&self, degrees: i32) -> FlightResult<()>;

    /// Set movement speed, clamped to `[10, 100]` cm/s
    async fn set_speed(&self, speed_cm_s: u32) -> FlightResult<()>;

    /// Latch RC stick values; non-blocking
    fn send_rc(&self, rc: RcCommand);

    /// Snapshot of the current state; always a copy
    fn state(&self) -> DroneState;

    /// Fly straight toward absolute world coordinates
    async fn go_to(&self, x: f64, y: f64, z: f64, speed_cm_s: u32) -> FlightResult<()>;

    /// Most recent operator-facing log lines, newest last; empty when the
    /// backend keeps no log
    fn recent_log(&self, limit: usize) -> Vec<String> {
        let _ = limit;
        Vec::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults() {
        let state = DroneState::new();
        assert_eq!(state.battery, 100.0);
        assert_eq!(state.temperature, 25.0);
        assert!(!state.is_flying);
        assert!(!state.is_connected);
    }

    #[test]
    fn test_state_distance() {
        let state = DroneState {
            x: 10.0,
            y: 0.0,
            z: 0.0,
            ..Default::default()
        };
        assert!((state.distance_to(10.0, 30.0, 40.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_state_rounding_roundtrip() {
        let state = DroneState {
            x: 123.456,
            yaw: 359.949,
            battery: 99.87,
            ..Default::default()
        };
        let rounded = state.rounded();
        assert_eq!(rounded.x, 123.5);
        assert_eq!(rounded.yaw, 359.9);
        assert_eq!(rounded.battery, 99.9);

        let json = serde_json::to_string(&rounded).unwrap();
        let back: DroneState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.x, rounded.x);
        assert_eq!(back.yaw, rounded.yaw);
        assert_eq!(back.battery, rounded.battery);
    }

    #[test]
    fn test_rc_clamping() {
        let rc = RcCommand::new(-250, 250, 40, -40);
        assert_eq!(rc.left_right, -100);
        assert_eq!(rc.forward_back, 100);
        assert_eq!(rc.up_down, 40);
        assert_eq!(rc.yaw, -40);
        assert!(!rc.is_neutral());
        assert!(RcCommand::NEUTRAL.is_neutral());
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(
            "forward".parse::<MoveDirection>().unwrap(),
            MoveDirection::Forward
        );
        assert!("sideways".parse::<MoveDirection>().is_err());
    }

    #[test]
    fn test_body_frame_displacement() {
        // Facing +X: forward is +X, left is -Y
        let (dx, dy, dz) = MoveDirection::Forward.displacement(0.0, 100.0);
        assert!((dx - 100.0).abs() < 1e-9 && dy.abs() < 1e-9 && dz == 0.0);

        let (dx, dy, _) = MoveDirection::Left.displacement(0.0, 100.0);
        assert!(dx.abs() < 1e-9 && (dy + 100.0).abs() < 1e-9);

        // Facing +Y (yaw 90): forward is +Y
        let (dx, dy, _) = MoveDirection::Forward.displacement(90.0, 100.0);
        assert!(dx.abs() < 1e-6 && (dy - 100.0).abs() < 1e-6);

        let (_, _, dz) = MoveDirection::Down.displacement(45.0, 30.0);
        assert_eq!(dz, -30.0);
    }
}
