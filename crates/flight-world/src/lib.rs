//! # Flight World
//!
//! The simulated world the drone flies in: an ordered obstacle scene with
//! 2-D ray casting (altitude-gated) and point-collision queries, plus the
//! depth camera that scans it.

pub mod camera;
pub mod obstacle;

pub use camera::{CameraFrame, DepthCamera};
pub use obstacle::{Obstacle, ObstacleType};

/// Default altitude-gate margin for ray casts, in cm
pub const RAY_ALTITUDE_MARGIN: f64 = 30.0;

/// Default collision sphere radius, in cm
pub const COLLISION_RADIUS: f64 = 20.0;

/// Ordered collection of obstacles.
///
/// Mutation is add-only; iteration order is insertion order, and ray-cast
/// ties resolve to the first-inserted obstacle.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Cast a ray from `(ox, oy, oz)` at `angle_rad` in the horizontal
    /// plane. Returns the distance to the nearest altitude-overlapping
    /// obstacle and a reference to it, or `(max_range, None)` on a miss.
    pub fn ray_cast(
        &self,
        ox: f64,
        oy: f64,
        oz: f64,
        angle_rad: f64,
        max_range: f64,
    ) -> (f64, Option<&Obstacle>) {
        let dx = angle_rad.cos();
        let dy = angle_rad.sin();

        let mut nearest_dist = max_range;
        let mut nearest_obs = None;

        for obs in &self.obstacles {
            if !obs.overlaps_altitude(oz, RAY_ALTITUDE_MARGIN) {
                continue;
            }
            if let Some(dist) = obs.ray_intersect_2d(ox, oy, dx, dy, max_range) {
                if dist < nearest_dist {
                    nearest_dist = dist;
                    nearest_obs = Some(obs);
                }
            }
        }

        (nearest_dist, nearest_obs)
    }

    /// True when a sphere of `radius` at `(x, y, z)` overlaps any obstacle
    pub fn check_collision(&self, x: f64, y: f64, z: f64, radius: f64) -> bool {
        for obs in &self.obstacles {
            if !obs.overlaps_altitude(z, radius) {
                continue;
            }
            if obs.is_cylindrical {
                let dist = ((x - obs.x).powi(2) + (y - obs.y).powi(2)).sqrt();
                if dist < obs.width / 2.0 + radius {
                    return true;
                }
            } else {
                let half_w = obs.width / 2.0 + radius;
                let half_d = obs.depth / 2.0 + radius;
                if (x - obs.x).abs() < half_w && (y - obs.y).abs() < half_d {
                    return true;
                }
            }
        }
        false
    }

    /// The stock scene: a cluster of buildings, trees, walls, and pillars
    /// around the origin
    pub fn default_environment() -> Self {
        let mut env = Self::new();

        // Buildings
        env.add_obstacle(Obstacle::rectangular(
            180.0,
            200.0,
            0.0,
            80.0,
            80.0,
            200.0,
            ObstacleType::Building,
        ));
        env.add_obstacle(Obstacle::rectangular(
            -150.0,
            120.0,
            0.0,
            100.0,
            60.0,
            180.0,
            ObstacleType::Building,
        ));
        env.add_obstacle(Obstacle::rectangular(
            -200.0,
            -180.0,
            0.0,
            70.0,
            90.0,
            160.0,
            ObstacleType::Building,
        ));
        env.add_obstacle(Obstacle::rectangular(
            100.0,
            -200.0,
            0.0,
            60.0,
            60.0,
            140.0,
            ObstacleType::Building,
        ));

        // Trees
        env.add_obstacle(Obstacle::cylindrical(
            60.0,
            280.0,
            0.0,
            50.0,
            250.0,
            ObstacleType::Tree,
        ));
        env.add_obstacle(Obstacle::cylindrical(
            -80.0,
            -100.0,
            0.0,
            40.0,
            200.0,
            ObstacleType::Tree,
        ));
        env.add_obstacle(Obstacle::cylindrical(
            250.0,
            80.0,
            0.0,
            45.0,
            220.0,
            ObstacleType::Tree,
        ));
        env.add_obstacle(Obstacle::cylindrical(
            -250.0,
            50.0,
            0.0,
            35.0,
            180.0,
            ObstacleType::Tree,
        ));

        // Walls
        env.add_obstacle(Obstacle::rectangular(
            0.0,
            380.0,
            0.0,
            300.0,
            20.0,
            150.0,
            ObstacleType::Wall,
        ));
        env.add_obstacle(Obstacle::rectangular(
            300.0,
            0.0,
            0.0,
            20.0,
            250.0,
            170.0,
            ObstacleType::Wall,
        ));

        // Pillars
        env.add_obstacle(Obstacle::cylindrical(
            -30.0,
            150.0,
            0.0,
            25.0,
            300.0,
            ObstacleType::Pillar,
        ));
        env.add_obstacle(Obstacle::cylindrical(
            150.0,
            -80.0,
            0.0,
            20.0,
            280.0,
            ObstacleType::Pillar,
        ));

        env
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_raycast_empty_environment() {
        let env = Environment::new();
        let (dist, obs) = env.ray_cast(0.0, 0.0, 100.0, 0.0, 500.0);
        assert_eq!(dist, 500.0);
        assert!(obs.is_none());
    }

    #[test]
    fn test_raycast_north_hits_wall() {
        // Due north from the origin at z=100: the wall at (0, 380) is the
        // nearest overlapping obstacle, near face at 370
        let env = Environment::default_environment();
        let (dist, obs) = env.ray_cast(0.0, 0.0, 100.0, FRAC_PI_2, 500.0);
        let obs = obs.expect("expected a hit");
        assert!((dist - 370.0).abs() < 1.0, "got {dist}");
        assert_eq!(obs.obstacle_type, ObstacleType::Wall);
    }

    #[test]
    fn test_raycast_altitude_gating() {
        // Above every obstacle (plus margin) nothing is hit
        let env = Environment::default_environment();
        let (dist, obs) = env.ray_cast(0.0, 0.0, 400.0, FRAC_PI_2, 500.0);
        assert_eq!(dist, 500.0);
        assert!(obs.is_none());
    }

    #[test]
    fn test_raycast_picks_nearest() {
        let mut env = Environment::new();
        env.add_obstacle(Obstacle::rectangular(
            200.0,
            0.0,
            0.0,
            20.0,
            20.0,
            100.0,
            ObstacleType::Building,
        ));
        env.add_obstacle(Obstacle::rectangular(
            100.0,
            0.0,
            0.0,
            20.0,
            20.0,
            100.0,
            ObstacleType::Wall,
        ));

        let (dist, obs) = env.ray_cast(0.0, 0.0, 50.0, 0.0, 500.0);
        assert!((dist - 90.0).abs() < 1e-6);
        assert_eq!(obs.unwrap().obstacle_type, ObstacleType::Wall);
    }

    #[test]
    fn test_raycast_tie_breaks_to_first_inserted() {
        let mut env = Environment::new();
        env.add_obstacle(Obstacle::rectangular(
            100.0,
            0.0,
            0.0,
            20.0,
            20.0,
            100.0,
            ObstacleType::Building,
        ));
        env.add_obstacle(Obstacle::rectangular(
            100.0,
            0.0,
            0.0,
            20.0,
            20.0,
            100.0,
            ObstacleType::Wall,
        ));

        let (_, obs) = env.ray_cast(0.0, 0.0, 50.0, 0.0, 500.0);
        assert_eq!(obs.unwrap().obstacle_type, ObstacleType::Building);
    }

    #[test]
    fn test_raycast_returns_within_range() {
        // Property: any hit distance is at most max_range and the hit
        // obstacle overlaps the query altitude
        let env = Environment::default_environment();
        for i in 0..16 {
            let angle = 2.0 * PI * (i as f64) / 16.0;
            let (dist, obs) = env.ray_cast(0.0, 0.0, 100.0, angle, 500.0);
            assert!(dist <= 500.0);
            if let Some(obs) = obs {
                assert!(obs.overlaps_altitude(100.0, RAY_ALTITUDE_MARGIN));
            }
        }
    }

    #[test]
    fn test_collision_at_every_obstacle_base() {
        let env = Environment::default_environment();
        for obs in env.obstacles() {
            assert!(
                env.check_collision(obs.x, obs.y, obs.z_base, 0.0),
                "no collision at base of obstacle at ({}, {})",
                obs.x,
                obs.y
            );
        }
    }

    #[test]
    fn test_collision_clear_space() {
        let env = Environment::default_environment();
        assert!(!env.check_collision(0.0, 0.0, 80.0, COLLISION_RADIUS));
    }

    #[test]
    fn test_collision_radius_inflation() {
        let mut env = Environment::new();
        env.add_obstacle(Obstacle::cylindrical(
            100.0,
            0.0,
            0.0,
            40.0,
            200.0,
            ObstacleType::Pillar,
        ));

        // 25 cm from the surface: only a radius above that touches
        assert!(!env.check_collision(145.0, 0.0, 50.0, 20.0));
        assert!(env.check_collision(145.0, 0.0, 50.0, 30.0));
    }
}
