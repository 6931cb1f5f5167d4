//! Scene obstacles and their 2-D ray intersection tests

use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;

/// Category of a scene obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleType {
    Building,
    Tree,
    Wall,
    Pillar,
}

impl ObstacleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Tree => "tree",
            Self::Wall => "wall",
            Self::Pillar => "pillar",
        }
    }
}

/// An immutable obstacle in the world.
///
/// Boxes extend `width` along x and `depth` along y around the center.
/// Cylindrical obstacles use `width` as diameter and ignore `depth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    /// Center x in cm
    pub x: f64,
    /// Center y in cm
    pub y: f64,
    /// Base altitude in cm, usually 0
    pub z_base: f64,
    /// Extent in x, or diameter when cylindrical
    pub width: f64,
    /// Extent in y, ignored when cylindrical
    pub depth: f64,
    /// Vertical extent in cm
    pub height: f64,
    #[serde(rename = "type")]
    pub obstacle_type: ObstacleType,
    pub is_cylindrical: bool,
}

impl Obstacle {
    pub fn rectangular(
        x: f64,
        y: f64,
        z_base: f64,
        width: f64,
        depth: f64,
        height: f64,
        obstacle_type: ObstacleType,
    ) -> Self {
        Self {
            x,
            y,
            z_base,
            width,
            depth,
            height,
            obstacle_type,
            is_cylindrical: false,
        }
    }

    pub fn cylindrical(
        x: f64,
        y: f64,
        z_base: f64,
        diameter: f64,
        height: f64,
        obstacle_type: ObstacleType,
    ) -> Self {
        Self {
            x,
            y,
            z_base,
            width: diameter,
            depth: diameter,
            height,
            obstacle_type,
            is_cylindrical: true,
        }
    }

    /// True when altitude `z` falls within the obstacle's vertical range,
    /// widened by `margin` on both ends
    pub fn overlaps_altitude(&self, z: f64, margin: f64) -> bool {
        (z + margin) >= self.z_base && (z - margin) <= (self.z_base + self.height)
    }

    /// Distance along a 2-D ray to this obstacle's silhouette, if hit
    /// within `max_range`. The ray starts at `(ox, oy)` with unit
    /// direction `(dx, dy)`.
    pub fn ray_intersect_2d(
        &self,
        ox: f64,
        oy: f64,
        dx: f64,
        dy: f64,
        max_range: f64,
    ) -> Option<f64> {
        if self.is_cylindrical {
            self.ray_circle_intersect(ox, oy, dx, dy, max_range)
        } else {
            self.ray_aabb_intersect(ox, oy, dx, dy, max_range)
        }
    }

    /// Slab method. A ray parallel to an axis misses unless the origin
    /// already lies inside that slab; origins inside the footprint hit at
    /// the exit distance.
    fn ray_aabb_intersect(&self, ox: f64, oy: f64, dx: f64, dy: f64, max_range: f64) -> Option<f64> {
        let half_w = self.width / 2.0;
        let half_d = self.depth / 2.0;
        let (x_min, x_max) = (self.x - half_w, self.x + half_w);
        let (y_min, y_max) = (self.y - half_d, self.y + half_d);

        let (t_min_x, t_max_x) = if dx.abs() < EPS {
            if ox < x_min || ox > x_max {
                return None;
            }
            (f64::NEG_INFINITY, f64::INFINITY)
        } else {
            let t1 = (x_min - ox) / dx;
            let t2 = (x_max - ox) / dx;
            (t1.min(t2), t1.max(t2))
        };

        let (t_min_y, t_max_y) = if dy.abs() < EPS {
            if oy < y_min || oy > y_max {
                return None;
            }
            (f64::NEG_INFINITY, f64::INFINITY)
        } else {
            let t1 = (y_min - oy) / dy;
            let t2 = (y_max - oy) / dy;
            (t1.min(t2), t1.max(t2))
        };

        let t_enter = t_min_x.max(t_min_y);
        let t_exit = t_max_x.min(t_max_y);

        if t_enter > t_exit || t_exit < 0.0 {
            return None;
        }

        let t = if t_enter >= 0.0 { t_enter } else { t_exit };
        if t > max_range || t < 0.0 {
            return None;
        }
        Some(t)
    }

    /// Quadratic ray/circle test, picking the smaller non-negative root
    fn ray_circle_intersect(
        &self,
        ox: f64,
        oy: f64,
        dx: f64,
        dy: f64,
        max_range: f64,
    ) -> Option<f64> {
        let radius = self.width / 2.0;
        let fx = ox - self.x;
        let fy = oy - self.y;

        let a = dx * dx + dy * dy;
        let b = 2.0 * (fx * dx + fy * dy);
        let c = fx * fx + fy * fy - radius * radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        let t = if t1 >= 0.0 { t1 } else { t2 };
        if t < 0.0 || t > max_range {
            return None;
        }
        Some(t)
    }
}

// ============================================================================
// TESTS
// ============================================================================
