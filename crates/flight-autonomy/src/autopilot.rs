//! Background execution of flight plans

use flight_core::{
    DroneBackend, FlightError, FlightPlan, FlightPlanStatus, FlightResult, Waypoint,
    WaypointStatus,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};

/// How often the worker re-checks a paused plan
const PAUSE_POLL: Duration = Duration::from_millis(200);

/// Executes a loaded flight plan on a background task.
///
/// The worker owns all plan mutation while the plan is RUNNING; readers
/// take snapshots. Cancellation is a stop flag checked at the top of each
/// iteration and again after every blocking `go_to`; the in-flight leg
/// itself is not interrupted.
pub struct Autopilot {
    drone: Arc<dyn DroneBackend>,
    plan: Arc<RwLock<Option<FlightPlan>>>,
    stop: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Autopilot {
    pub fn new(drone: Arc<dyn DroneBackend>) -> Self {
        Self {
            drone,
            plan: Arc::new(RwLock::new(None)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Snapshot of the loaded plan, if any
    pub fn plan_snapshot(&self) -> Option<FlightPlan> {
        self.plan.read().clone()
    }

    pub fn status(&self) -> Option<FlightPlanStatus> {
        self.plan.read().as_ref().map(|p| p.status)
    }

    /// Replace the loaded plan. Rejected while the current plan runs.
    /// The accepted plan is reset: IDLE, index 0, every waypoint PENDING.
    pub fn load_plan(&self, mut plan: FlightPlan) -> FlightResult<()> {
        let mut slot = self.plan.write();
        if slot
            .as_ref()
            .is_some_and(|p| p.status == FlightPlanStatus::Running)
        {
            return Err(FlightError::PlanAlreadyRunning);
        }
        plan.reset();
        info!(plan = %plan.name, waypoints = plan.len(), "flight plan loaded");
        *slot = Some(plan);
        Ok(())
    }

    /// Launch the worker. No-op when the plan is already running.
    pub fn start(&self) -> FlightResult<()> {
        {
            let mut slot = self.plan.write();
            let plan = slot.as_mut().ok_or(FlightError::NoPlanLoaded)?;
            if plan.status == FlightPlanStatus::Running {
                return Ok(());
            }
            self.stop.store(false, Ordering::SeqCst);
            plan.status = FlightPlanStatus::Running;
            info!(plan = %plan.name, "autopilot started");
        }

        let worker = Worker {
            drone: Arc::clone(&self.drone),
            plan: Arc::clone(&self.plan),
            stop: Arc::clone(&self.stop),
        };
        *self.worker.lock() = Some(tokio::spawn(worker.run()));
        Ok(())
    }

    pub fn pause(&self) {
        if let Some(plan) = self.plan.write().as_mut() {
            if plan.status == FlightPlanStatus::Running {
                plan.status = FlightPlanStatus::Paused;
                info!(plan = %plan.name, "autopilot paused");
            }
        }
    }

    pub fn resume(&self) {
        if let Some(plan) = self.plan.write().as_mut() {
            if plan.status == FlightPlanStatus::Paused {
                plan.status = FlightPlanStatus::Running;
                info!(plan = %plan.name, "autopilot resumed");
            }
        }
    }

    pub fn abort(&self) {
        if let Some(plan) = self.plan.write().as_mut() {
            plan.status = FlightPlanStatus::Aborted;
            info!(plan = %plan.name, "autopilot aborted");
        }
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// What the worker decided to do this iteration
enum Step {
    Pause,
    Wrap,
    Fly(usize, Waypoint),
    Finish,
}

struct Worker {
    drone: Arc<dyn DroneBackend>,
    plan: Arc<RwLock<Option<FlightPlan>>>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    async fn run(self) {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }

            // Decide under the lock, fly outside it
            let step = {
                let mut slot = self.plan.write();
                let Some(plan) = slot.as_mut() else { break };
                match plan.status {
                    FlightPlanStatus::Paused => Step::Pause,
                    FlightPlanStatus::Running => {
                        let idx = plan.current_index;
                        if idx >= plan.waypoints.len() {
                            if plan.loop_enabled {
                                plan.current_index = 0;
                                for wp in &mut plan.waypoints {
                                    wp.status = WaypointStatus::Pending;
                                }
                                debug!(plan = %plan.name, "plan wrapped");
                                Step::Wrap
                            } else {
                                plan.status = FlightPlanStatus::Completed;
                                info!(plan = %plan.name, "plan completed");
                                Step::Finish
                            }
                        } else {
                            plan.waypoints[idx].status = WaypointStatus::Active;
                            Step::Fly(idx, plan.waypoints[idx].clone())
                        }
                    }
                    _ => Step::Finish,
                }
            };

            match step {
                Step::Pause => time::sleep(PAUSE_POLL).await,
                Step::Wrap => {}
                Step::Finish => break,
                Step::Fly(idx, wp) => {
                    let result = self
                        .drone
                        .go_to(wp.x as f64, wp.y as f64, wp.z as f64, wp.speed)
                        .await;

                    if self.stop.load(Ordering::SeqCst) {
                        break;
                    }

                    let reached = result.is_ok();
                    {
                        let mut slot = self.plan.write();
                        if let Some(plan) = slot.as_mut() {
                            if let Some(w) = plan.waypoints.get_mut(idx) {
                                w.status = if reached {
                                    WaypointStatus::Reached
                                } else {
                                    debug!(index = idx, "waypoint skipped");
                                    WaypointStatus::Skipped
                                };
                            }
                        }
                    }

                    if reached && wp.hover_time > 0.0 {
                        time::sleep(Duration::from_secs_f64(wp.hover_time)).await;
                    }

                    let mut slot = self.plan.write();
                    if let Some(plan) = slot.as_mut() {
                        plan.current_index = idx + 1;
                    }
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
