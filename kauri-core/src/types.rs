use serde::{Deserialize, Serialize};

/// Identifier for a limb in a [`crate::limb::LimbGraph`].
///
/// This is an index into `LimbGraph::limbs`, and is only meaningful within
/// the lifetime of a given `LimbGraph` instance.
pub type LimbId = usize;

/// What a limb represents in the finished tree.
///
/// The kind is fixed when the limb is created. Growth does not depend on it;
/// it only tells renderers how to color or label the segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimbKind {
    Trunk,
    Branch,
    Root,
}

/// Which half of the tree a growth step is acting on.
///
/// Roots may only grow sideways or down towards their attractors, branches
/// only sideways or up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Root,
    Branch,
}

impl Domain {
    /// Returns `true` if a limb tip at height `tip_y` may be pulled towards
    /// an attraction point at height `point_y`.
    #[inline]
    pub fn admits(self, tip_y: f32, point_y: f32) -> bool {
        match self {
            Domain::Root => tip_y >= point_y,
            Domain::Branch => tip_y <= point_y,
        }
    }

    /// Kind given to limbs grown by attraction in this domain.
    #[inline]
    pub fn limb_kind(self) -> LimbKind {
        match self {
            Domain::Root => LimbKind::Root,
            Domain::Branch => LimbKind::Branch,
        }
    }
}
