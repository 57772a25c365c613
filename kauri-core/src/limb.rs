use glam::Vec3;

use crate::error::{KauriError, Result};
use crate::types::{LimbId, LimbKind};

/// One straight segment of the tree skeleton.
///
/// Everything except `children` and `size` is fixed at creation. `size` is
/// written by [`crate::mesh::propagate_sizes`] and is `0.0` until then.
#[derive(Clone, Debug, PartialEq)]
pub struct Limb {
    pub start: Vec3,
    pub end: Vec3,
    /// Unit growth direction.
    pub direction: Vec3,
    pub parent: Option<LimbId>,
    pub children: Vec<LimbId>,
    pub distance_from_root: u32,
    pub kind: LimbKind,
    pub size: f32,
}

impl Limb {
    pub fn new_root(start: Vec3, direction: Vec3, length: f32, kind: LimbKind) -> Self {
        Self {
            start,
            end: start + direction * length,
            direction,
            parent: None,
            children: Vec::with_capacity(2),
            distance_from_root: 0,
            kind,
            size: 0.0,
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Append-only arena of limbs.
///
/// Children are always pushed after their parent, so a child's id is
/// strictly greater than its parent's. Limbs are never removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LimbGraph {
    pub limbs: Vec<Limb>,
}

impl LimbGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parentless limb and returns its id.
    ///
    /// `direction` is normalized; a zero direction is rejected as
    /// non-finite geometry.
    pub fn add_root(
        &mut self,
        start: Vec3,
        direction: Vec3,
        length: f32,
        kind: LimbKind,
    ) -> Result<LimbId> {
        let id = self.limbs.len();
        let direction = direction.normalize_or_zero();
        let limb = Limb::new_root(start, direction, length, kind);
        if direction == Vec3::ZERO || !limb.start.is_finite() || !limb.end.is_finite() {
            return Err(KauriError::NonFiniteGeometry {
                parent: id,
                end: limb.end.to_array(),
            });
        }
        self.limbs.push(limb);
        Ok(id)
    }

    /// Grows a new limb from the end of `parent` and returns its id.
    ///
    /// ### Parameters
    /// - `parent` - Limb whose `end` becomes the new limb's `start`.
    /// - `direction` - Unit growth direction of the new limb.
    /// - `length` - Segment length.
    /// - `kind` - Kind recorded on the new limb.
    ///
    /// ### Errors
    /// [`KauriError::UnknownLimb`] for a bad `parent`, and
    /// [`KauriError::NonFiniteGeometry`] if the new end point is not finite.
    /// The graph is unchanged on error.
    pub fn add_child(
        &mut self,
        parent: LimbId,
        direction: Vec3,
        length: f32,
        kind: LimbKind,
    ) -> Result<LimbId> {
        let (start, depth) = {
            let p = self.get(parent)?;
            (p.end, p.distance_from_root + 1)
        };
        let end = start + direction * length;
        if !end.is_finite() {
            return Err(KauriError::NonFiniteGeometry {
                parent,
                end: end.to_array(),
            });
        }

        let id = self.limbs.len();
        self.limbs.push(Limb {
            start,
            end,
            direction,
            parent: Some(parent),
            children: Vec::with_capacity(2),
            distance_from_root: depth,
            kind,
            size: 0.0,
        });
        self.limbs[parent].children.push(id);
        Ok(id)
    }

    pub fn get(&self, id: LimbId) -> Result<&Limb> {
        self.limbs.get(id).ok_or(KauriError::UnknownLimb {
            id,
            len: self.limbs.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.limbs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn last_id(&self) -> Option<LimbId> {
        self.limbs.len().checked_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LimbId, &Limb)> {
        self.limbs.iter().enumerate()
    }

    /// Ids of all limbs without children, in creation order.
    pub fn leaves(&self) -> Vec<LimbId> {
        self.iter()
            .filter(|(_, l)| l.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Ids of all parentless limbs, in creation order.
    pub fn roots(&self) -> Vec<LimbId> {
        self.iter()
            .filter(|(_, l)| l.is_root())
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trunk() -> LimbGraph {
        let mut g = LimbGraph::new();
        g.add_root(Vec3::ZERO, Vec3::Y, 1.0, LimbKind::Trunk).unwrap();
        g
    }

    #[test]
    fn add_root_places_end_along_direction() {
        let g = trunk();
        let root = g.get(0).unwrap();

        assert_eq!(root.end, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(root.direction, Vec3::Y);
        assert_eq!(root.distance_from_root, 0);
        assert!(root.is_root());
        assert!(root.is_leaf());
    }

    #[test]
    fn add_root_normalizes_direction() {
        let mut g = LimbGraph::new();
        g.add_root(Vec3::ZERO, Vec3::new(0.0, 0.5, 0.0), 2.0, LimbKind::Trunk)
            .unwrap();
        assert_eq!(g.limbs[0].direction, Vec3::Y);
        assert_eq!(g.limbs[0].end, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn add_root_rejects_zero_direction() {
        let mut g = LimbGraph::new();
        let err = g.add_root(Vec3::ZERO, Vec3::ZERO, 1.0, LimbKind::Root);
        assert!(matches!(err, Err(KauriError::NonFiniteGeometry { .. })));
        assert!(g.is_empty());
    }

    #[test]
    fn add_child_links_both_ways() {
        let mut g = trunk();
        let a = g.add_child(0, Vec3::X, 0.5, LimbKind::Branch).unwrap();
        let b = g.add_child(a, Vec3::Y, 0.5, LimbKind::Branch).unwrap();

        assert_eq!((a, b), (1, 2));
        assert_eq!(g.limbs[0].children, vec![a]);
        assert_eq!(g.limbs[a].children, vec![b]);
        assert_eq!(g.limbs[b].parent, Some(a));
        assert_eq!(g.limbs[a].start, g.limbs[0].end);
        assert_eq!(g.limbs[b].end, Vec3::new(0.5, 1.5, 0.0));
    }

    #[test]
    fn distance_from_root_is_parent_plus_one() {
        let mut g = trunk();
        let mut tip = 0;
        for _ in 0..5 {
            tip = g.add_child(tip, Vec3::Y, 1.0, LimbKind::Trunk).unwrap();
        }
        for limb in &g.limbs {
            let expected = limb
                .parent
                .map_or(0, |p| g.limbs[p].distance_from_root + 1);
            assert_eq!(limb.distance_from_root, expected);
        }
        assert_eq!(g.limbs[tip].distance_from_root, 5);
    }

    #[test]
    fn add_child_rejects_unknown_parent() {
        let mut g = trunk();
        let err = g.add_child(9, Vec3::Y, 1.0, LimbKind::Branch);
        assert!(matches!(err, Err(KauriError::UnknownLimb { id: 9, len: 1 })));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn add_child_rejects_non_finite_end_without_mutating() {
        let mut g = trunk();
        let err = g.add_child(0, Vec3::new(f32::NAN, 0.0, 0.0), 1.0, LimbKind::Branch);
        assert!(matches!(err, Err(KauriError::NonFiniteGeometry { parent: 0, .. })));
        assert_eq!(g.len(), 1);
        assert!(g.limbs[0].children.is_empty());
    }

    #[test]
    fn leaves_and_roots() {
        let mut g = trunk();
        g.add_child(0, Vec3::X, 1.0, LimbKind::Branch).unwrap();
        g.add_child(0, Vec3::Z, 1.0, LimbKind::Branch).unwrap();

        assert_eq!(g.leaves(), vec![1, 2]);
        assert_eq!(g.roots(), vec![0]);
        assert_eq!(g.last_id(), Some(2));
        assert_eq!(LimbGraph::new().last_id(), None);
    }
}
