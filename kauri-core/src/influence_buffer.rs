use crate::types::LimbId;
use glam::Vec3;

/// Per-limb scratch space for the attraction points assigned during one
/// growth step.
///
/// For each `LimbId`, this buffer stores:
///
/// - The sum of the unit vectors pointing from the limb's tip to each
///   attraction point assigned to it.
/// - How many points were assigned.
///
/// It is the arena-side counterpart of a limb's "pending attractors": it is
/// cleared at the start of every step and only the average direction is
/// ever read back. Slot `i` belongs to limb `i`.
#[derive(Debug, Default)]
pub struct InfluenceBuffer {
    /// Accumulated unit directions per limb.
    dir: Vec<Vec3>,
    /// Number of assigned points per limb.
    pub count: Vec<u32>,
}

impl InfluenceBuffer {
    /// Creates a zeroed buffer with room for `len` limbs.
    pub fn with_len(len: usize) -> Self {
        Self {
            dir: vec![Vec3::ZERO; len],
            count: vec![0; len],
        }
    }

    /// Resizes the buffer to exactly `len` slots and clears every slot,
    /// whether or not the length changed.
    ///
    /// ### Parameters
    /// - `len` - Number of limbs in the graph about to be scanned.
    pub fn ensure_len(&mut self, len: usize) {
        if self.dir.len() != len {
            self.dir.resize(len, Vec3::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    /// Resets all slots without changing the length.
    pub fn clear(&mut self) {
        self.dir.fill(Vec3::ZERO);
        self.count.fill(0);
    }

    /// Records one attraction point for limb `id`.
    ///
    /// ### Parameters
    /// - `id` - Limb the point was assigned to.
    /// - `dir` - Unit vector from the limb's tip towards the point.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: LimbId, dir: Vec3) {
        self.dir[id] += dir;
        self.count[id] += 1;
    }

    /// Returns the average of the directions recorded for `id`, or
    /// `Vec3::ZERO` when nothing was recorded.
    ///
    /// The result is not normalized and may itself be zero when the
    /// recorded directions cancel out.
    #[inline]
    pub fn avg_dir(&self, id: LimbId) -> Vec3 {
        let c = self.count[id];
        if c == 0 {
            Vec3::ZERO
        } else {
            self.dir[id] / (c as f32)
        }
    }

    #[inline]
    pub fn is_influenced(&self, id: LimbId) -> bool {
        self.count[id] > 0
    }

    /// Iterates over the limbs that received at least one point, in id order.
    pub fn influenced_indices(&self) -> impl Iterator<Item = LimbId> + '_ {
        self.count
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| if c > 0 { Some(i) } else { None })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_initializes_zeroed_state() {
        let buf = InfluenceBuffer::with_len(5);

        assert_eq!(buf.len(), 5);
        assert!(buf.dir.iter().all(|v| *v == Vec3::ZERO));
        assert!(buf.count.iter().all(|c| *c == 0));
    }

    #[test]
    fn ensure_len_clears_when_same_length() {
        let mut buf = InfluenceBuffer::with_len(3);
        buf.add(1, Vec3::X);
        assert!(buf.is_influenced(1));

        buf.ensure_len(3);

        assert_eq!(buf.len(), 3);
        assert!(!buf.is_influenced(1));
        assert_eq!(buf.avg_dir(1), Vec3::ZERO);
    }

    #[test]
    fn ensure_len_resizes_and_clears() {
        let mut buf = InfluenceBuffer::with_len(2);
        buf.add(0, Vec3::X);

        buf.ensure_len(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.influenced_indices().count(), 0);

        buf.ensure_len(0);
        assert!(buf.is_empty());
    }

    #[test]
    fn avg_dir_averages_recorded_directions() {
        let mut buf = InfluenceBuffer::with_len(2);

        assert_eq!(buf.avg_dir(1), Vec3::ZERO);

        buf.add(1, Vec3::X);
        buf.add(1, Vec3::Y);

        assert_eq!(buf.count[1], 2);
        assert_eq!(buf.avg_dir(1), Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn opposite_directions_cancel_to_zero() {
        let mut buf = InfluenceBuffer::with_len(1);
        buf.add(0, Vec3::X);
        buf.add(0, Vec3::NEG_X);

        assert!(buf.is_influenced(0));
        assert_eq!(buf.avg_dir(0), Vec3::ZERO);
    }

    #[test]
    fn influenced_indices_returns_only_nodes_with_nonzero_count() {
        let mut buf = InfluenceBuffer::with_len(4);
        buf.add(0, Vec3::X);
        buf.add(2, Vec3::Z);

        let ids: Vec<LimbId> = buf.influenced_indices().collect();
        assert_eq!(ids, vec![0, 2]);

        buf.clear();
        assert!(buf.influenced_indices().next().is_none());
    }
}
