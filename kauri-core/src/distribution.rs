//! Attraction-point clouds in the shapes the growth domains start from.
//!
//! All shapes share the signature `generate(count, radius, origin, rng)`.
//! The growth engine never looks at the shape, only at the points.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI, TAU};

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Points of a [`Distribution::Canopy`] below its center are kept clear of
/// the trunk by this horizontal distance.
pub const CANOPY_TRUNK_CLEARANCE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distribution {
    /// Full ball hanging below `origin`, densest towards its shell.
    Sphere,
    /// Upper half ball sitting on top of `origin`.
    Hemisphere,
    /// Ball around the upper trunk with its lower third and the space next
    /// to the trunk cut away, like the crown of a grown tree.
    Canopy,
    /// Axis-aligned cube of half-size `radius` hanging below `origin`.
    Cube,
    /// Upright cone of height `radius` and 30° half-angle based at `origin`.
    Cone,
}

impl Distribution {
    /// Samples `count` points.
    ///
    /// ### Parameters
    /// - `count` - Number of points returned.
    /// - `radius` - Size of the shape (ball radius, cube half-size or cone height).
    /// - `origin` - Anchor point the shape is placed relative to.
    /// - `rng` - Random source; the draw order is fixed per shape.
    pub fn generate(self, count: usize, radius: f32, origin: Vec3, rng: &mut impl Rng) -> Vec<Vec3> {
        let mut points = Vec::with_capacity(count);
        match self {
            Distribution::Sphere => {
                let center = origin - Vec3::new(0.0, radius, 0.0);
                for _ in 0..count {
                    points.push(center + ball_sample(radius, TAU, rng));
                }
            }
            Distribution::Hemisphere => {
                let center = origin + Vec3::new(0.0, radius, 0.0);
                for _ in 0..count {
                    points.push(center + ball_sample(radius, PI, rng));
                }
            }
            Distribution::Canopy => {
                let center = origin + Vec3::new(0.0, radius * 0.5, 0.0);
                // Rejection sampling; the upper half is always accepted, so
                // this terminates.
                while points.len() < count {
                    let p = ball_sample(radius, TAU, rng);
                    if p.y < -radius / 3.0 {
                        continue;
                    }
                    if p.y < 0.0 && Vec2::new(p.x, p.z).length() < CANOPY_TRUNK_CLEARANCE {
                        continue;
                    }
                    points.push(center + p);
                }
            }
            Distribution::Cube => {
                let center = origin - Vec3::new(0.0, radius, 0.0);
                for _ in 0..count {
                    let x = rng.random_range(-1.0f32..1.0) * radius;
                    let y = rng.random_range(-1.0f32..1.0) * radius;
                    let z = rng.random_range(-1.0f32..1.0) * radius;
                    points.push(center + Vec3::new(x, y, z));
                }
            }
            Distribution::Cone => {
                let height = radius;
                for _ in 0..count {
                    let h = rng.random_range(0.0f32..1.0) * height;
                    let max_r = FRAC_PI_6.tan() * (height - h);
                    let r = rng.random_range(0.0f32..1.0) * max_r;
                    let angle = rng.random_range(0.0f32..TAU);
                    points.push(origin + Vec3::new(r * angle.sin(), h, r * angle.cos()));
                }
            }
        }
        points
    }
}

/// One point inside a ball of `radius` centered on the origin.
///
/// The radial coordinate is `sin(u·π/2)^0.8`, which pushes points towards
/// the shell. `theta_span` of `PI` restricts the result to `y >= 0`.
fn ball_sample(radius: f32, theta_span: f32, rng: &mut impl Rng) -> Vec3 {
    let u = rng.random_range(0.0f32..1.0);
    let r = (u * FRAC_PI_2).sin().powf(0.8) * radius;
    let alpha = rng.random_range(0.0f32..PI);
    let theta = rng.random_range(0.0f32..theta_span);
    Vec3::new(
        r * theta.cos() * alpha.sin(),
        r * theta.sin() * alpha.sin(),
        r * alpha.cos(),
    )
}
