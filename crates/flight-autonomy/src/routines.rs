//! Pre-built flight plan generators

use flight_core::{FlightPlan, Waypoint};
use serde::Deserialize;
use std::f64::consts::PI;

/// Names accepted by [`build_routine`]
pub const BUILTIN_ROUTINES: &[&str] = &["square", "circle", "figure_eight", "survey_grid"];

/// Optional overrides for the routine generators; anything unset falls
/// back to that routine's default
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutineParams {
    pub size: Option<i32>,
    pub radius: Option<i32>,
    pub altitude: Option<i32>,
    pub points: Option<usize>,
    pub speed: Option<u32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub spacing: Option<i32>,
}

/// Build a builtin routine by name, or `None` for an unknown name
pub fn build_routine(name: &str, params: &RoutineParams) -> Option<FlightPlan> {
    let altitude = params.altitude;
    match name {
        "square" => Some(square(
            params.size.unwrap_or(200),
            altitude.unwrap_or(100),
            params.speed.unwrap_or(40),
        )),
        "circle" => Some(circle(
            params.radius.unwrap_or(150),
            altitude.unwrap_or(100),
            params.points.unwrap_or(12),
            params.speed.unwrap_or(30),
        )),
        "figure_eight" => Some(figure_eight(
            params.radius.unwrap_or(100),
            altitude.unwrap_or(100),
            params.points.unwrap_or(16),
            params.speed.unwrap_or(30),
        )),
        "survey_grid" => Some(survey_grid(
            params.width.unwrap_or(300),
            params.height.unwrap_or(300),
            params.spacing.unwrap_or(100),
            altitude.unwrap_or(120),
            params.speed.unwrap_or(35),
        )),
        _ => None,
    }
}

/// Four corners of a centered square, counter-clockwise from
/// `(+half, +half)`, with a one second hover at each corner
pub fn square(size_cm: i32, altitude: i32, speed: u32) -> FlightPlan {
    let mut plan = FlightPlan::new("Square");
    let half = size_cm / 2;
    let corners = [
        (half, half),
        (-half, half),
        (-half, -half),
        (half, -half),
    ];
    for (x, y) in corners {
        plan.add_waypoint(
            Waypoint::new(x, y, altitude)
                .with_speed(speed)
                .with_hover(1.0),
        );
    }
    plan
}

/// `points` samples around a circle, starting east and going
/// counter-clockwise
pub fn circle(radius_cm: i32, altitude: i32, points: usize, speed: u32) -> FlightPlan {
    let mut plan = FlightPlan::new("Circle");
    for i in 0..points {
        let angle = 2.0 * PI * i as f64 / points as f64;
        let x = (radius_cm as f64 * angle.cos()) as i32;
        let y = (radius_cm as f64 * angle.sin()) as i32;
        plan.add_waypoint(Waypoint::new(x, y, altitude).with_speed(speed));
    }
    plan
}

/// Lemniscate sampled at `points`: `x = r sin t`, `y = r sin t cos t`
pub fn figure_eight(radius_cm: i32, altitude: i32, points: usize, speed: u32) -> FlightPlan {
    let mut plan = FlightPlan::new("Figure-8");
    for i in 0..points {
        let t = 2.0 * PI * i as f64 / points as f64;
        let x = (radius_cm as f64 * t.sin()) as i32;
        let y = (radius_cm as f64 * t.sin() * t.cos()) as i32;
        plan.add_waypoint(Waypoint::new(x, y, altitude).with_speed(speed));
    }
    plan
}

/// Lawn-mower sweep over a centered rectangle, alternating row direction
pub fn survey_grid(
    width_cm: i32,
    height_cm: i32,
    spacing_cm: i32,
    altitude: i32,
    speed: u32,
) -> FlightPlan {
    let mut plan = FlightPlan::new("Survey Grid");
    let rows = height_cm / spacing_cm + 1;
    let left_x = -width_cm / 2;
    let right_x = width_cm / 2;
    let start_y = -height_cm / 2;

    for row in 0..rows {
        let y = start_y + row * spacing_cm;
        let (first, second) = if row % 2 == 0 {
            (left_x, right_x)
        } else {
            (right_x, left_x)
        };
        plan.add_waypoint(Waypoint::new(first, y, altitude).with_speed(speed));
        plan.add_waypoint(Waypoint::new(second, y, altitude).with_speed(speed));
    }
    plan
}

// ============================================================================
// TESTS
// ============================================================================
