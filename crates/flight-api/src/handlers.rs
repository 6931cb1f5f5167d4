//! API request handlers

use crate::error::ApiError;
use crate::state::AppState;

use axum::{Json, extract::State, response::IntoResponse};
use flight_autonomy::{BUILTIN_ROUTINES, NavigatorStatus, RoutineParams, build_routine};
use flight_core::{
    DroneState, FlightPlan, FlightResult, MoveDirection, RcCommand, Waypoint,
};
use flight_world::CameraFrame;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Serialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            error: None,
        })
    }

    fn from_result(result: FlightResult<()>) -> Json<Self> {
        match result {
            Ok(()) => Json(Self {
                success: true,
                error: None,
            }),
            Err(e) => Json(Self {
                success: false,
                error: Some(e.to_string()),
            }),
        }
    }
}

#[derive(Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub state: DroneState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub direction: String,
    #[serde(default = "default_distance")]
    pub distance: u32,
}

fn default_distance() -> u32 {
    50
}

#[derive(Deserialize)]
pub struct RotateRequest {
    #[serde(default = "default_degrees")]
    pub degrees: i32,
}

fn default_degrees() -> i32 {
    90
}

#[derive(Deserialize)]
pub struct SpeedRequest {
    #[serde(default = "default_speed")]
    pub speed: u32,
}

fn default_speed() -> u32 {
    50
}

#[derive(Deserialize, Default)]
pub struct RcRequest {
    #[serde(default)]
    pub left_right: i32,
    #[serde(default)]
    pub forward_back: i32,
    #[serde(default)]
    pub up_down: i32,
    #[serde(default)]
    pub yaw: i32,
}

#[derive(Deserialize)]
pub struct LoadPlanRequest {
    #[serde(default = "default_routine")]
    pub routine: String,
    #[serde(default)]
    pub params: RoutineParams,
    #[serde(default)]
    pub waypoints: Vec<WaypointRequest>,
    #[serde(default, rename = "loop")]
    pub loop_enabled: bool,
}

fn default_routine() -> String {
    "square".into()
}

#[derive(Deserialize)]
pub struct WaypointRequest {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub hover_time: f64,
}

#[derive(Serialize)]
pub struct LoadPlanResponse {
    pub success: bool,
    pub plan: FlightPlan,
}

#[derive(Deserialize)]
pub struct DestinationRequest {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_destination_z")]
    pub z: f64,
}

fn default_destination_z() -> f64 {
    80.0
}

// ============================================================================
// CONNECTION & FLIGHT HANDLERS
// ============================================================================

pub async fn connect(State(state): State<AppState>) -> Json<CommandResponse> {
    CommandResponse::from_result(state.drone.connect().await)
}

pub async fn disconnect(State(state): State<AppState>) -> Json<CommandResponse> {
    state.drone.disconnect().await;
    CommandResponse::ok()
}

pub async fn takeoff(State(state): State<AppState>) -> Json<CommandResponse> {
    CommandResponse::from_result(state.drone.takeoff().await)
}

pub async fn land(State(state): State<AppState>) -> Json<CommandResponse> {
    CommandResponse::from_result(state.drone.land().await)
}

pub async fn emergency(State(state): State<AppState>) -> Json<CommandResponse> {
    state.drone.emergency_stop().await;
    CommandResponse::ok()
}

pub async fn move_drone(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let direction: MoveDirection = req.direction.parse()?;
    Ok(CommandResponse::from_result(
        state.drone.move_by(direction, req.distance).await,
    ))
}

pub async fn rotate(
    State(state): State<AppState>,
    Json(req): Json<RotateRequest>,
) -> Json<CommandResponse> {
    CommandResponse::from_result(state.drone.rotate(req.degrees).await)
}

pub async fn set_speed(
    State(state): State<AppState>,
    Json(req): Json<SpeedRequest>,
) -> Json<CommandResponse> {
    CommandResponse::from_result(state.drone.set_speed(req.speed).await)
}

pub async fn send_rc(
    State(state): State<AppState>,
    Json(req): Json<RcRequest>,
) -> Json<CommandResponse> {
    state.drone.send_rc(RcCommand::new(
        req.left_right,
        req.forward_back,
        req.up_down,
        req.yaw,
    ));
    CommandResponse::ok()
}

// ============================================================================
// TELEMETRY
// ============================================================================

pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse {
        state: state.drone.state().rounded(),
        log: state.drone.recent_log(30),
    })
}

// ============================================================================
// AUTOPILOT
// ============================================================================

pub async fn list_routines() -> impl IntoResponse {
    Json(json!({ "routines": BUILTIN_ROUTINES }))
}

pub async fn autopilot_load(
    State(state): State<AppState>,
    Json(req): Json<LoadPlanRequest>,
) -> Result<Json<LoadPlanResponse>, ApiError> {
    let mut plan = match build_routine(&req.routine, &req.params) {
        Some(plan) => plan,
        None => {
            // Custom waypoint list under the requested name
            if req.waypoints.is_empty() {
                return Err(ApiError::bad_request(format!(
                    "unknown routine '{}' and no waypoints given",
                    req.routine
                )));
            }
            let mut plan = FlightPlan::new(&req.routine);
            for wp in &req.waypoints {
                plan.add_waypoint(
                    Waypoint::new(wp.x, wp.y, wp.z)
                        .with_speed(wp.speed)
                        .with_hover(wp.hover_time),
                );
            }
            plan
        }
    };

    plan.loop_enabled = req.loop_enabled;
    state.autopilot.load_plan(plan)?;

    let plan = state
        .autopilot
        .plan_snapshot()
        .ok_or_else(|| ApiError::bad_request("plan failed to load"))?;
    Ok(Json(LoadPlanResponse {
        success: true,
        plan,
    }))
}

pub async fn autopilot_start(
    State(state): State<AppState>,
) -> Result<Json<CommandResponse>, ApiError> {
    state.autopilot.start()?;
    Ok(CommandResponse::ok())
}

pub async fn autopilot_pause(State(state): State<AppState>) -> Json<CommandResponse> {
    state.autopilot.pause();
    CommandResponse::ok()
}

pub async fn autopilot_resume(State(state): State<AppState>) -> Json<CommandResponse> {
    state.autopilot.resume();
    CommandResponse::ok()
}

pub async fn autopilot_abort(State(state): State<AppState>) -> Json<CommandResponse> {
    state.autopilot.abort();
    CommandResponse::ok()
}

pub async fn autopilot_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.autopilot.plan_snapshot() {
        Some(plan) => Json(serde_json::to_value(&plan).unwrap_or_default()),
        None => Json(json!({ "status": "idle", "waypoints": [] })),
    }
}

// ============================================================================
// ENVIRONMENT & CAMERA
// ============================================================================

pub async fn get_environment(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "obstacles": state.environment.obstacles() }))
}

/// Latest navigator frame, or a fresh capture when none exists yet
pub async fn get_camera(State(state): State<AppState>) -> Json<CameraFrame> {
    let frame = match state.navigator.last_frame() {
        Some(frame) => frame.rounded(),
        None => state
            .camera
            .capture(&state.drone.state(), &state.environment)
            .rounded(),
    };
    Json(frame)
}

// ============================================================================
// AUTONOMOUS NAVIGATION
// ============================================================================

pub async fn autonomous_destination(
    State(state): State<AppState>,
    Json(req): Json<DestinationRequest>,
) -> impl IntoResponse {
    state.navigator.set_destination(req.x, req.y, req.z);
    info!(x = req.x, y = req.y, z = req.z, "destination accepted");
    Json(json!({
        "success": true,
        "destination": { "x": req.x, "y": req.y, "z": req.z },
    }))
}

pub async fn autonomous_start(
    State(state): State<AppState>,
) -> Result<Json<CommandResponse>, ApiError> {
    state.navigator.start()?;
    Ok(CommandResponse::ok())
}

pub async fn autonomous_stop(State(state): State<AppState>) -> Json<CommandResponse> {
    state.navigator.stop();
    CommandResponse::ok()
}

pub async fn autonomous_status(State(state): State<AppState>) -> Json<NavigatorStatus> {
    Json(state.navigator.status())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::routes::create_router;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn sim_router() -> axum::Router {
        create_router(AppState::new(false))
    }

    #[tokio::test]
    async fn test_connect_then_state() {
        let app = sim_router();

        let response = app.clone().oneshot(post("/api/connect", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);

        let response = app.oneshot(get("/api/state")).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["is_connected"], true);
        assert_eq!(value["battery"], 100.0);
        // Connect is logged, and the log rides along with the state
        assert!(value["log"].as_array().is_some_and(|log| !log.is_empty()));
    }

    #[tokio::test]
    async fn test_takeoff_without_connect_fails_softly() {
        let app = sim_router();
        let response = app.oneshot(post("/api/takeoff", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().contains("not connected"));
    }

    #[tokio::test]
    async fn test_move_rejects_unknown_direction() {
        let app = sim_router();
        let response = app
            .oneshot(post("/api/move", r#"{"direction": "sideways", "distance": 50}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_autopilot_lifecycle_endpoints() {
        let app = sim_router();

        // Start before load: precondition failure, HTTP 400
        let response = app
            .clone()
            .oneshot(post("/api/autopilot/start", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post(
                "/api/autopilot/load",
                r#"{"routine": "square", "params": {"size": 100}, "loop": true}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["success"], true);
        assert_eq!(value["plan"]["status"], "idle");
        assert_eq!(value["plan"]["loop"], true);
        assert_eq!(value["plan"]["waypoints"][0]["x"], 50);

        let response = app
            .clone()
            .oneshot(get("/api/autopilot/status"))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "idle");
    }

    #[tokio::test]
    async fn test_autopilot_load_custom_waypoints() {
        let app = sim_router();
        let response = app
            .oneshot(post(
                "/api/autopilot/load",
                r#"{"routine": "patrol", "waypoints": [
                    {"x": 0, "y": 0, "z": 100},
                    {"x": 200, "y": 0, "z": 100, "speed": 60, "hover_time": 2.0}
                ]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["plan"]["name"], "patrol");
        assert_eq!(value["plan"]["waypoints"][1]["speed"], 60);
    }

    #[tokio::test]
    async fn test_autonomous_start_requires_destination() {
        let app = sim_router();
        let response = app
            .clone()
            .oneshot(post("/api/autonomous/start", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value = body_json(response).await;
        assert!(value["error"].as_str().unwrap().contains("no destination"));

        let response = app
            .clone()
            .oneshot(post("/api/autonomous/destination", r#"{"x": 100, "y": 50}"#))
            .await
            .unwrap();
        let value = body_json(response).await;
        assert_eq!(value["destination"]["z"], 80.0);

        let response = app.oneshot(get("/api/autonomous/status")).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["status"], "destination_set");
        assert_eq!(value["reached"], false);
    }

    #[tokio::test]
    async fn test_environment_and_camera_endpoints() {
        let app = sim_router();

        let response = app.clone().oneshot(get("/api/environment")).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["obstacles"].as_array().unwrap().len(), 12);

        // No navigator frame yet: a fresh capture is served
        let response = app.oneshot(get("/api/camera")).await.unwrap();
        let value = body_json(response).await;
        assert_eq!(value["num_rays"], 48);
        assert_eq!(value["depths"].as_array().unwrap().len(), 48);
    }
}
