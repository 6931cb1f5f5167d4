//! # Flight Sim
//!
//! A virtual drone implementing the full control contract in software.
//! State lives behind a single mutex; a 20 Hz background task integrates
//! latched RC stick values while the drone flies, and blocking motions
//! simulate travel time with capped sleeps.

use async_trait::async_trait;
use chrono::{Local, Utc};
use flight_core::{DroneBackend, DroneState, FlightError, FlightResult, MoveDirection, RcCommand};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI8, Ordering};
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Default movement speed in cm/s
const DEFAULT_SPEED: f64 = 50.0;
/// Rotation rate in degrees/s
const ROTATE_SPEED: f64 = 90.0;
/// Hover altitude after takeoff, cm
const TAKEOFF_ALTITUDE: f64 = 80.0;
/// RC integrator period (20 Hz)
const RC_INTERVAL: Duration = Duration::from_millis(50);
/// Cap on simulated travel delay for move/rotate
const BLOCKING_CAP: Duration = Duration::from_secs(2);
/// Battery drain per second of actuated flight, percent
const BATTERY_DRAIN_PER_S: f64 = 0.5;
/// Temperature rise per second of actuated flight, Celsius
const TEMP_RISE_PER_S: f64 = 0.1;
const MAX_TEMPERATURE: f64 = 45.0;
const LOG_CAPACITY: usize = 200;

/// Mutable simulator state, all guarded by one lock
struct SimCore {
    state: DroneState,
    /// Movement speed setpoint in cm/s
    speed: f64,
    /// Start of the current takeoff session
    flight_start: Option<Instant>,
}

impl SimCore {
    fn drain(&mut self, seconds: f64) {
        self.state.battery = (self.state.battery - seconds * BATTERY_DRAIN_PER_S).max(0.0);
        self.state.temperature =
            (self.state.temperature + seconds * TEMP_RISE_PER_S).min(MAX_TEMPERATURE);
    }

    fn close_flight_session(&mut self) {
        if let Some(start) = self.flight_start.take() {
            self.state.flight_time += start.elapsed().as_secs_f64();
        }
    }
}

struct SimInner {
    core: Mutex<SimCore>,
    /// Latched RC sticks: left_right, forward_back, up_down, yaw rate
    rc: [AtomicI8; 4],
    rc_active: AtomicBool,
    log: Mutex<VecDeque<String>>,
}

impl SimInner {
    fn push_log(&self, msg: impl AsRef<str>) {
        let entry = format!("[{}] {}", Local::now().format("%H:%M:%S"), msg.as_ref());
        let mut log = self.log.lock();
        if log.len() == LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(entry);
    }

    fn latched_rc(&self) -> RcCommand {
        RcCommand {
            left_right: self.rc[0].load(Ordering::Relaxed),
            forward_back: self.rc[1].load(Ordering::Relaxed),
            up_down: self.rc[2].load(Ordering::Relaxed),
            yaw: self.rc[3].load(Ordering::Relaxed),
        }
    }

    fn latch_rc(&self, rc: RcCommand) {
        self.rc[0].store(rc.left_right, Ordering::Relaxed);
        self.rc[1].store(rc.forward_back, Ordering::Relaxed);
        self.rc[2].store(rc.up_down, Ordering::Relaxed);
        self.rc[3].store(rc.yaw, Ordering::Relaxed);
    }
}

/// A virtual drone that simulates physics and state
pub struct SimulatedDrone {
    inner: Arc<SimInner>,
}

impl Default for SimulatedDrone {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDrone {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SimInner {
                core: Mutex::new(SimCore {
                    state: DroneState::new(),
                    speed: DEFAULT_SPEED,
                    flight_start: None,
                }),
                rc: [
                    AtomicI8::new(0),
                    AtomicI8::new(0),
                    AtomicI8::new(0),
                    AtomicI8::new(0),
                ],
                rc_active: AtomicBool::new(false),
                log: Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)),
            }),
        }
    }

    /// Launch the RC integrator; one task at a time
    fn start_rc_loop(&self) {
        if self.inner.rc_active.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let interval_s = RC_INTERVAL.as_secs_f64();
            let mut ticker = time::interval(RC_INTERVAL);

            loop {
                ticker.tick().await;
                if !inner.rc_active.load(Ordering::SeqCst) {
                    break;
                }

                let rc = inner.latched_rc();
                let mut core = inner.core.lock();
                if !core.state.is_flying {
                    break;
                }

                let lr = rc.left_right as f64;
                let fb = rc.forward_back as f64;
                let ud = rc.up_down as f64;
                let yaw_rate = rc.yaw as f64;

                let rad = core.state.yaw.to_radians();
                let scale = core.speed * interval_s / 100.0;

                core.state.x += (fb * rad.cos() - lr * rad.sin()) * scale;
                core.state.y += (fb * rad.sin() + lr * rad.cos()) * scale;
                core.state.z = (core.state.z + ud * scale).max(0.0);
                core.state.yaw =
                    (core.state.yaw + yaw_rate * 0.9 * interval_s).rem_euclid(360.0);
                core.state.speed =
                    (lr * lr + fb * fb + ud * ud).sqrt() * core.speed / 100.0;
                core.drain(interval_s);
            }
            debug!("RC integrator stopped");
        });
    }

    fn stop_rc_loop(&self) {
        self.inner.rc_active.store(false, Ordering::SeqCst);
        self.inner.latch_rc(RcCommand::NEUTRAL);
    }
}

#[async_trait]
impl DroneBackend for SimulatedDrone {
    async fn connect(&self) -> FlightResult<()> {
        {
            let mut core = self.inner.core.lock();
            core.state.is_connected = true;
            core.state.battery = 100.0;
            core.state.temperature = 25.0;
        }
        self.inner.push_log("Connected to simulated drone");
        info!("simulated drone connected");
        Ok(())
    }

    async fn disconnect(&self) {
        self.emergency_stop().await;
        {
            let mut core = self.inner.core.lock();
            core.state.is_connected = false;
        }
        self.inner.push_log("Disconnected");
        info!("simulated drone disconnected");
    }

    async fn takeoff(&self) -> FlightResult<()> {
        {
            let mut core = self.inner.core.lock();
            if !core.state.is_connected {
                return Err(FlightError::NotConnected);
            }
            if core.state.is_flying {
                return Err(FlightError::AlreadyFlying);
            }
            core.state.is_flying = true;
            core.state.z = TAKEOFF_ALTITUDE;
            core.flight_start = Some(Instant::now());
        }
        self.inner
            .push_log(format!("Takeoff, hovering at {TAKEOFF_ALTITUDE:.0}cm"));
        self.start_rc_loop();
        Ok(())
    }

    async fn land(&self) -> FlightResult<()> {
        self.stop_rc_loop();
        {
            let mut core = self.inner.core.lock();
            if !core.state.is_flying {
                return Err(FlightError::NotFlying);
            }
            core.state.is_flying = false;
            core.state.z = 0.0;
            core.state.speed = 0.0;
            core.close_flight_session();
        }
        self.inner.push_log("Landed");
        Ok(())
    }

    async fn emergency_stop(&self) {
        self.stop_rc_loop();
        {
            let mut core = self.inner.core.lock();
            core.state.is_flying = false;
            core.state.z = 0.0;
            core.state.speed = 0.0;
            core.close_flight_session();
        }
        self.inner.push_log("EMERGENCY STOP");
        warn!("emergency stop");
    }

    async fn move_by(&self, direction: MoveDirection, distance_cm: u32) -> FlightResult<()> {
        let (yaw, speed) = {
            let core = self.inner.core.lock();
            if !core.state.is_flying {
                return Err(FlightError::NotFlying);
            }
            (core.state.yaw, core.speed)
        };

        let (dx, dy, dz) = direction.displacement(yaw, distance_cm as f64);
        let duration = distance_cm as f64 / speed;
        time::sleep(Duration::from_secs_f64(duration).min(BLOCKING_CAP)).await;

        {
            let mut core = self.inner.core.lock();
            core.state.x += dx;
            core.state.y += dy;
            core.state.z = (core.state.z + dz).max(0.0);
            core.drain(duration);
        }
        self.inner
            .push_log(format!("Move {direction} {distance_cm}cm"));
        Ok(())
    }

    async fn rotate(&self, degrees: i32) -> FlightResult<()> {
        {
            let mut core = self.inner.core.lock();
            if !core.state.is_flying {
                return Err(FlightError::NotFlying);
            }
            core.state.yaw = (core.state.yaw + degrees as f64).rem_euclid(360.0);
            let yaw = core.state.yaw;
            drop(core);
            self.inner
                .push_log(format!("Rotate {degrees} degrees, yaw={yaw:.0}"));
        }
        let duration = degrees.unsigned_abs() as f64 / ROTATE_SPEED;
        time::sleep(Duration::from_secs_f64(duration).min(BLOCKING_CAP)).await;
        Ok(())
    }

    async fn set_speed(&self, speed_cm_s: u32) -> FlightResult<()> {
        let clamped = speed_cm_s.clamp(10, 100) as f64;
        self.inner.core.lock().speed = clamped;
        self.inner.push_log(format!("Speed set to {clamped:.0} cm/s"));
        Ok(())
    }

    fn send_rc(&self, rc: RcCommand) {
        // Latched regardless of the integrator; applied only while it runs
        self.inner.latch_rc(rc);
    }

    fn state(&self) -> DroneState {
        let mut core = self.inner.core.lock();
        core.state.timestamp = Utc::now();
        core.state.clone()
    }

    async fn go_to(&self, x: f64, y: f64, z: f64, speed_cm_s: u32) -> FlightResult<()> {
        let (sx, sy, sz) = {
            let core = self.inner.core.lock();
            if !core.state.is_flying {
                return Err(FlightError::NotFlying);
            }
            (core.state.x, core.state.y, core.state.z)
        };

        let dist = ((x - sx).powi(2) + (y - sy).powi(2) + (z - sz).powi(2)).sqrt();
        if dist < 1.0 {
            return Ok(());
        }

        let speed = speed_cm_s.max(10) as f64;
        let duration = dist / speed;
        let steps = ((duration * 10.0) as usize).max(1);
        let dt = duration / steps as f64;

        for i in 1..=steps {
            time::sleep(Duration::from_secs_f64(dt.min(0.5))).await;
            let frac = i as f64 / steps as f64;
            let mut core = self.inner.core.lock();
            core.state.x = sx + (x - sx) * frac;
            core.state.y = sy + (y - sy) * frac;
            core.state.z = (sz + (z - sz) * frac).max(0.0);
            core.state.speed = speed;
            core.drain(dt);
        }

        self.inner
            .push_log(format!("Go to ({x:.0}, {y:.0}, {z:.0}) at {speed:.0} cm/s"));
        Ok(())
    }

    fn recent_log(&self, limit: usize) -> Vec<String> {
        let log = self.inner.log.lock();
        log.iter()
            .skip(log.len().saturating_sub(limit))
            .cloned()
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
