//! API route definitions

use crate::handlers;
use crate::state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Connection
        .route("/api/connect", post(handlers::connect))
        .route("/api/disconnect", post(handlers::disconnect))
        // Basic flight commands
        .route("/api/takeoff", post(handlers::takeoff))
        .route("/api/land", post(handlers::land))
        .route("/api/emergency", post(handlers::emergency))
        .route("/api/move", post(handlers::move_drone))
        .route("/api/rotate", post(handlers::rotate))
        .route("/api/speed", post(handlers::set_speed))
        .route("/api/rc", post(handlers::send_rc))
        // Telemetry
        .route("/api/state", get(handlers::get_state))
        // Autopilot
        .route("/api/routines", get(handlers::list_routines))
        .route("/api/autopilot/load", post(handlers::autopilot_load))
        .route("/api/autopilot/start", post(handlers::autopilot_start))
        .route("/api/autopilot/pause", post(handlers::autopilot_pause))
        .route("/api/autopilot/resume", post(handlers::autopilot_resume))
        .route("/api/autopilot/abort", post(handlers::autopilot_abort))
        .route("/api/autopilot/status", get(handlers::autopilot_status))
        // Environment & camera
        .route("/api/environment", get(handlers::get_environment))
        .route("/api/camera", get(handlers::get_camera))
        // Autonomous navigation
        .route(
            "/api/autonomous/destination",
            post(handlers::autonomous_destination),
        )
        .route("/api/autonomous/start", post(handlers::autonomous_start))
        .route("/api/autonomous/stop", post(handlers::autonomous_stop))
        .route("/api/autonomous/status", get(handlers::autonomous_status))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
