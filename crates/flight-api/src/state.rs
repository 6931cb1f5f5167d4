//! Shared application context

use flight_autonomy::{Autopilot, Navigator};
use flight_core::DroneBackend;
use flight_sim::SimulatedDrone;
use flight_tello::TelloDrone;
use flight_world::{DepthCamera, Environment};
use std::sync::Arc;
use tracing::info;

/// One composite owning the five collaborators every handler needs.
/// Created at startup; no global mutable state anywhere else.
#[derive(Clone)]
pub struct AppState {
    pub drone: Arc<dyn DroneBackend>,
    pub autopilot: Arc<Autopilot>,
    pub navigator: Arc<Navigator>,
    pub environment: Arc<Environment>,
    pub camera: DepthCamera,
}

impl AppState {
    pub fn new(use_real_drone: bool) -> Self {
        let drone: Arc<dyn DroneBackend> = if use_real_drone {
            info!("backend: hardware drone");
            Arc::new(TelloDrone::new())
        } else {
            info!("backend: simulator");
            Arc::new(SimulatedDrone::new())
        };

        let environment = Arc::new(Environment::default_environment());
        let camera = DepthCamera::default();
        let autopilot = Arc::new(Autopilot::new(Arc::clone(&drone)));
        let navigator = Arc::new(Navigator::new(
            Arc::clone(&drone),
            Arc::clone(&environment),
            camera.clone(),
        ));

        Self {
            drone,
            autopilot,
            navigator,
            environment,
            camera,
        }
    }
}
