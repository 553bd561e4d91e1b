//! Static level geometry seen by the gameplay core.
//!
//! Level construction lives outside this crate. The core only needs two
//! things from it: rays against static colliders and spawn points per team.

use favela_common::Team;
use glam::Vec3;

/// Nearest static surface struck by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticHit {
    /// Distance from the ray origin
    pub distance: f32,
    /// World-space point of impact
    pub point: Vec3,
}

/// Provider of static colliders and spawn locations.
pub trait Geometry {
    /// Casts a ray against static colliders. `direction` must be normalized.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<StaticHit>;

    /// Candidate spawn positions for a team, in a stable order.
    fn spawn_points(&self, team: Team) -> &[Vec3];

    /// Height of the first surface below `point`, searching at most `max_drop`.
    fn ground_below(&self, point: Vec3, max_drop: f32) -> Option<f32> {
        self.raycast(point, Vec3::NEG_Y, max_drop).map(|hit| hit.point.y)
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from its corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates a box from its center and half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        Self::new(center - half, center + half)
    }

    /// Returns true if the point lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test. Returns the entry distance along the ray, or zero if the
    /// origin is already inside.
    #[must_use]
    pub fn ray_distance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let inv = direction.recip();
        let t1 = (self.min - origin) * inv;
        let t2 = (self.max - origin) * inv;
        let near = t1.min(t2).max_element();
        let far = t1.max(t2).min_element();
        if far < 0.0 || near > far {
            return None;
        }
        let t = near.max(0.0);
        (t <= max_distance).then_some(t)
    }
}

/// Simple world made of a ground plane at `y = 0` and solid boxes.
///
/// Used by the headless arena and by tests.
#[derive(Debug, Clone, Default)]
pub struct BoxWorld {
    /// Solid colliders
    pub boxes: Vec<Aabb>,
    /// Spawn points indexed by `Team::index`
    pub spawns: [Vec<Vec3>; 2],
    /// Whether the ground plane blocks rays
    pub ground: bool,
}

impl BoxWorld {
    /// Empty world with a ground plane.
    #[must_use]
    pub fn open_ground() -> Self {
        Self {
            ground: true,
            ..Self::default()
        }
    }

    /// Adds a solid box.
    #[must_use]
    pub fn with_box(mut self, aabb: Aabb) -> Self {
        self.boxes.push(aabb);
        self
    }

    /// Sets the spawn points of a team.
    #[must_use]
    pub fn with_spawns(mut self, team: Team, points: Vec<Vec3>) -> Self {
        self.spawns[team.index()] = points;
        self
    }
}

impl Geometry for BoxWorld {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<StaticHit> {
        let mut nearest: Option<f32> = None;

        if self.ground && direction.y < 0.0 && origin.y >= 0.0 {
            let t = -origin.y / direction.y;
            if t <= max_distance {
                nearest = Some(t);
            }
        }

        for aabb in &self.boxes {
            if let Some(t) = aabb.ray_distance(origin, direction, max_distance) {
                if nearest.map_or(true, |best| t < best) {
                    nearest = Some(t);
                }
            }
        }

        nearest.map(|distance| StaticHit {
            distance,
            point: origin + direction * distance,
        })
    }

    fn spawn_points(&self, team: Team) -> &[Vec3] {
        &self.spawns[team.index()]
    }
}
