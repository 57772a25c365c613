use glam::Vec3;
use rand::Rng;

use crate::distribution::Distribution;

/// The unconsumed attraction points of one growth domain.
///
/// Points are kept in insertion order. Growth only ever removes them; a
/// removed point is gone for good.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttractorField {
    pub points: Vec<Vec3>,
}

impl AttractorField {
    pub fn from_positions(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Samples `count` points from `distribution` around `origin`.
    pub fn generate(
        distribution: Distribution,
        count: usize,
        radius: f32,
        origin: Vec3,
        rng: &mut impl Rng,
    ) -> Self {
        Self::from_positions(distribution.generate(count, radius, origin, rng))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.points.iter()
    }

    pub fn extend(&mut self, points: impl IntoIterator<Item = Vec3>) {
        self.points.extend(points);
    }

    /// Removes every point whose index is flagged in `marked`.
    ///
    /// `marked` must have one entry per point. The relative order of the
    /// surviving points is preserved. Returns the number of removed points.
    pub fn remove_marked(&mut self, marked: &[bool]) -> usize {
        assert_eq!(marked.len(), self.points.len());
        let before = self.points.len();
        let mut flags = marked.iter();
        self.points.retain(|_| !flags.next().copied().unwrap_or(false));
        before - self.points.len()
    }
}
