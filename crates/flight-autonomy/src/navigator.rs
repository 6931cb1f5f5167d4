//! Reactive goal-seeking with camera-based obstacle avoidance

use flight_core::{DroneBackend, DroneState, FlightError, FlightResult, RcCommand};
use flight_world::{CameraFrame, DepthCamera, Environment};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time;
use tracing::{debug, info};

/// Begin steering around obstacles closer than this, cm
pub const SAFETY_DISTANCE: f64 = 100.0;
/// Hard avoidance threshold, cm
pub const CRITICAL_DISTANCE: f64 = 50.0;
/// RC forward value while cruising
pub const CRUISE_SPEED: i32 = 45;
/// Close enough to the destination, cm
pub const ARRIVAL_RADIUS: f64 = 35.0;
/// Navigation tick period (10 Hz)
pub const NAV_INTERVAL: Duration = Duration::from_millis(100);

/// Navigator lifecycle, as reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavStatus {
    Idle,
    DestinationSet,
    Navigating,
    Reached,
    Stopped,
}

/// What the avoidance policy did on the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvoidanceAction {
    None,
    Clear,
    Avoiding,
    Critical,
}

/// Target point in world coordinates, cm
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Destination {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Observer-facing snapshot of the navigator
#[derive(Debug, Clone, Serialize)]
pub struct NavigatorStatus {
    pub status: NavStatus,
    pub active: bool,
    pub destination: Option<Destination>,
    pub distance_to_goal: f64,
    pub avoidance_action: AvoidanceAction,
    pub reached: bool,
}

/// RC outputs of one steering decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Steering {
    pub yaw: i32,
    pub forward: i32,
    pub altitude: i32,
    pub action: AvoidanceAction,
}

/// Drives the drone toward a destination while steering around obstacles
/// seen by the depth camera. One background task at 10 Hz; it owns the
/// `last_frame` slot and the avoidance state.
pub struct Navigator {
    drone: Arc<dyn DroneBackend>,
    environment: Arc<Environment>,
    camera: DepthCamera,
    destination: Mutex<Option<Destination>>,
    active: AtomicBool,
    reached: AtomicBool,
    status: Mutex<NavStatus>,
    action: Mutex<AvoidanceAction>,
    last_frame: RwLock<Option<Arc<CameraFrame>>>,
}

impl Navigator {
    pub fn new(
        drone: Arc<dyn DroneBackend>,
        environment: Arc<Environment>,
        camera: DepthCamera,
    ) -> Self {
        Self {
            drone,
            environment,
            camera,
            destination: Mutex::new(None),
            active: AtomicBool::new(false),
            reached: AtomicBool::new(false),
            status: Mutex::new(NavStatus::Idle),
            action: Mutex::new(AvoidanceAction::None),
            last_frame: RwLock::new(None),
        }
    }

    pub fn set_destination(&self, x: f64, y: f64, z: f64) {
        *self.destination.lock() = Some(Destination { x, y, z });
        self.reached.store(false, Ordering::SeqCst);
        *self.status.lock() = NavStatus::DestinationSet;
        info!(x, y, z, "destination set");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Latest published camera frame, if any tick has run
    pub fn last_frame(&self) -> Option<Arc<CameraFrame>> {
        self.last_frame.read().clone()
    }

    /// Launch the navigation loop. Silently returns when already active;
    /// fails without a destination.
    pub fn start(self: &Arc<Self>) -> FlightResult<()> {
        if self.active.load(Ordering::SeqCst) {
            return Ok(());
        }
        if self.destination.lock().is_none() {
            return Err(FlightError::NoDestination);
        }

        self.active.store(true, Ordering::SeqCst);
        self.reached.store(false, Ordering::SeqCst);
        *self.status.lock() = NavStatus::Navigating;
        info!("navigator started");

        let nav = Arc::clone(self);
        tokio::spawn(async move { nav.run().await });
        Ok(())
    }

    /// Stop navigating and idle the sticks
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        *self.status.lock() = NavStatus::Stopped;
        self.drone.send_rc(RcCommand::NEUTRAL);
        info!("navigator stopped");
    }

    pub fn status(&self) -> NavigatorStatus {
        let state = self.drone.state();
        let destination = *self.destination.lock();
        let distance_to_goal = destination
            .map(|d| state.distance_to(d.x, d.y, d.z))
            .unwrap_or(0.0);

        NavigatorStatus {
            status: *self.status.lock(),
            active: self.is_active(),
            destination,
            distance_to_goal: (distance_to_goal * 10.0).round() / 10.0,
            avoidance_action: *self.action.lock(),
            reached: self.reached.load(Ordering::SeqCst),
        }
    }

    async fn run(self: Arc<Self>) {
        while self.active.load(Ordering::SeqCst) {
            let state = self.drone.state();

            if !state.is_flying {
                time::sleep(NAV_INTERVAL).await;
                continue;
            }

            let frame = Arc::new(self.camera.capture(&state, &self.environment));
            *self.last_frame.write() = Some(Arc::clone(&frame));

            let Some(dest) = *self.destination.lock() else {
                time::sleep(NAV_INTERVAL).await;
                continue;
            };

            let dist_to_goal = state.distance_to(dest.x, dest.y, dest.z);
            if dist_to_goal < ARRIVAL_RADIUS {
                self.drone.send_rc(RcCommand::NEUTRAL);
                *self.status.lock() = NavStatus::Reached;
                self.reached.store(true, Ordering::SeqCst);
                *self.action.lock() = AvoidanceAction::None;
                self.active.store(false, Ordering::SeqCst);
                info!("destination reached");
                break;
            }

            let goal_bearing = (dest.y - state.y)
                .atan2(dest.x - state.x)
                .to_degrees()
                .rem_euclid(360.0);

            let steering = steer(&frame, &state, goal_bearing, dest.z);
            *self.action.lock() = steering.action;
            debug!(?steering.action, dist_to_goal, "tick");
            self.drone
                .send_rc(RcCommand::new(0, steering.forward, steering.altitude, steering.yaw));

            time::sleep(NAV_INTERVAL).await;
        }

        // Motors idle whenever the loop exits
        self.drone.send_rc(RcCommand::NEUTRAL);
    }
}

/// Signed difference from the drone's heading to the goal bearing, in
/// `[-180, 180)`; negative means the goal is to the left
pub fn heading_error(goal_bearing: f64, yaw: f64) -> f64 {
    (goal_bearing - yaw + 180.0).rem_euclid(360.0) - 180.0
}

/// One steering decision from a depth frame.
///
/// The scan splits into five zones (far-left through far-right); the
/// center zone's worst depth selects between three regimes: clear cruise,
/// cautious slow-down with a turn around the blockage, or critical
/// back-off. In the caution regime the turn prefers the goal side only
/// when that side clears the critical distance, otherwise whichever side
/// is more open.
pub fn steer(frame: &CameraFrame, state: &DroneState, goal_bearing: f64, goal_alt: f64) -> Steering {
    let n = frame.num_rays;
    let zone_size = n / 5;
    let mut zones = [f64::INFINITY; 5];
    for (z, zone) in zones.iter_mut().enumerate() {
        let start = z * zone_size;
        let end = if z < 4 { start + zone_size } else { n };
        *zone = frame.depths[start..end]
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
    }

    let center = zones[2];
    let best_left = zones[0].max(zones[1]);
    let best_right = zones[3].max(zones[4]);

    let err = heading_error(goal_bearing, state.yaw);

    let alt_error = goal_alt - state.z;
    let altitude = (alt_error * 0.5).clamp(-30.0, 30.0) as i32;

    let mut yaw = (err * 0.8).clamp(-60.0, 60.0) as i32;
    let mut forward = CRUISE_SPEED;
    let action;

    if center < CRITICAL_DISTANCE {
        // Obstacle very close: back up and turn hard toward the open side
        forward = -20;
        yaw = if best_left > best_right { -70 } else { 70 };
        action = AvoidanceAction::Critical;
    } else if center < SAFETY_DISTANCE {
        // Obstacle ahead: slow proportionally and steer around it
        let ratio = center / SAFETY_DISTANCE;
        forward = ((CRUISE_SPEED as f64 * ratio) as i32).max(10);
        yaw = if err < 0.0 {
            if best_left > CRITICAL_DISTANCE {
                -50
            } else if best_right > CRITICAL_DISTANCE {
                50
            } else if best_left >= best_right {
                -50
            } else {
                50
            }
        } else if best_right > CRITICAL_DISTANCE {
            50
        } else if best_left > CRITICAL_DISTANCE {
            -50
        } else if best_right >= best_left {
            50
        } else {
            -50
        };
        action = AvoidanceAction::Avoiding;
    } else {
        // Clear ahead: cruise toward the goal, nudging away from anything
        // crowding the periphery
        if zones[0] < SAFETY_DISTANCE * 0.6 {
            yaw = yaw.max(15);
        }
        if zones[4] < SAFETY_DISTANCE * 0.6 {
            yaw = yaw.min(-15);
        }
        action = AvoidanceAction::Clear;
    }

    Steering {
        yaw,
        forward,
        altitude,
        action,
    }
}

// ============================================================================
// TESTS
// ============================================================================
