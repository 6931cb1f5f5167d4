//! Forward-facing depth camera built on the environment ray-caster

use crate::Environment;
use chrono::{DateTime, Utc};
use flight_core::DroneState;
use serde::{Deserialize, Serialize};

/// A single depth scan across the camera's horizontal FOV.
///
/// Ray 0 is the leftmost edge of the fan, ray `num_rays - 1` the
/// rightmost; all three per-ray arrays have length `num_rays`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraFrame {
    /// Distance per ray in cm, clamped to `max_range`
    pub depths: Vec<f64>,
    /// Obstacle type per ray, empty string when the ray missed
    pub obstacle_types: Vec<String>,
    /// Height of the detected obstacle per ray, 0 on a miss
    pub obstacle_heights: Vec<f64>,
    /// Horizontal FOV in degrees
    pub fov_h: f64,
    pub num_rays: usize,
    pub max_range: f64,
    pub drone_yaw: f64,
    pub drone_z: f64,
    pub timestamp: DateTime<Utc>,
}

impl CameraFrame {
    /// Copy with depths and heights rounded to 0.1 for wire serialization
    pub fn rounded(&self) -> Self {
        let round1 = |v: &f64| (v * 10.0).round() / 10.0;
        Self {
            depths: self.depths.iter().map(round1).collect(),
            obstacle_heights: self.obstacle_heights.iter().map(round1).collect(),
            drone_yaw: round1(&self.drone_yaw),
            drone_z: round1(&self.drone_z),
            ..self.clone()
        }
    }
}

/// Simulated depth camera: casts `num_rays` rays uniformly across `fov_h`
/// degrees centered on the drone's heading
#[derive(Debug, Clone)]
pub struct DepthCamera {
    pub fov_h: f64,
    pub num_rays: usize,
    pub max_range: f64,
}

impl Default for DepthCamera {
    fn default() -> Self {
        Self {
            fov_h: 70.0,
            num_rays: 48,
            max_range: 500.0,
        }
    }
}

impl DepthCamera {
    pub fn new(fov_h: f64, num_rays: usize, max_range: f64) -> Self {
        Self {
            fov_h,
            num_rays,
            max_range,
        }
    }

    /// Scan the environment from the drone's current pose
    pub fn capture(&self, state: &DroneState, environment: &Environment) -> CameraFrame {
        let mut depths = Vec::with_capacity(self.num_rays);
        let mut obstacle_types = Vec::with_capacity(self.num_rays);
        let mut obstacle_heights = Vec::with_capacity(self.num_rays);

        let yaw_rad = state.yaw.to_radians();
        let fov_rad = self.fov_h.to_radians();

        for i in 0..self.num_rays {
            let frac = (i as f64 / (self.num_rays - 1).max(1) as f64) - 0.5;
            let ray_angle = yaw_rad + frac * fov_rad;

            let (dist, obs) =
                environment.ray_cast(state.x, state.y, state.z, ray_angle, self.max_range);

            depths.push(dist);
            match obs {
                Some(obs) => {
                    obstacle_types.push(obs.obstacle_type.as_str().to_string());
                    obstacle_heights.push(obs.height);
                }
                None => {
                    obstacle_types.push(String::new());
                    obstacle_heights.push(0.0);
                }
            }
        }

        CameraFrame {
            depths,
            obstacle_types,
            obstacle_heights,
            fov_h: self.fov_h,
            num_rays: self.num_rays,
            max_range: self.max_range,
            drone_yaw: state.yaw,
            drone_z: state.z,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
