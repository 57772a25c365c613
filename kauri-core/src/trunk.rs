use crate::{
    error::{KauriError, Result},
    limb::LimbGraph,
    types::{LimbId, LimbKind},
};

/// Extends the most recent limb straight ahead until its tip reaches
/// `target_height`.
///
/// Each new limb is a [`LimbKind::Trunk`] child of the previous one, keeps
/// its direction and is `segment_length` long. No attraction points and no
/// randomness are involved.
///
/// ### Returns
/// The ids of the added limbs, bottom to top. Empty if the tip is already
/// at or above `target_height`.
///
/// ### Errors
/// - [`KauriError::EmptyGraph`] if there is no limb to extend.
/// - [`KauriError::InvalidSegmentLength`] for a non-positive or
///   non-finite `segment_length`.
/// - [`KauriError::InvalidTrunkHeight`] for a non-finite `target_height`.
/// - [`KauriError::NonUpwardTrunk`] if growth is needed but the direction
///   has no upward component, since the target could never be reached.
/// - [`KauriError::TrunkStepTooSmall`] if one segment's vertical gain is
///   below the `f32` spacing somewhere between the tip and the target.
pub fn grow_trunk(
    graph: &mut LimbGraph,
    target_height: f32,
    segment_length: f32,
) -> Result<Vec<LimbId>> {
    let mut tip = graph.last_id().ok_or(KauriError::EmptyGraph)?;
    if !(segment_length.is_finite() && segment_length > 0.0) {
        return Err(KauriError::InvalidSegmentLength {
            length: segment_length,
        });
    }

    if !target_height.is_finite() {
        return Err(KauriError::InvalidTrunkHeight {
            height: target_height,
        });
    }

    let mut added = Vec::new();
    let direction = graph.limbs[tip].direction;
    if graph.limbs[tip].end.y >= target_height {
        return Ok(added);
    }
    if !(direction.y > 0.0) {
        return Err(KauriError::NonUpwardTrunk {
            direction: direction.to_array(),
            target_height,
        });
    }

    // Float spacing only grows with magnitude, so a step of at least one ulp
    // at the largest height crossed raises the tip on every segment.
    let step = direction.y * segment_length;
    let height = graph.limbs[tip].end.y.abs().max(target_height.abs());
    if step < ulp(height) {
        return Err(KauriError::TrunkStepTooSmall { step, height });
    }

    while graph.limbs[tip].end.y < target_height {
        tip = graph.add_child(tip, direction, segment_length, LimbKind::Trunk)?;
        added.push(tip);
    }

    log::info!(
        "trunk reached height {:.3} after {} segments",
        graph.limbs[tip].end.y,
        added.len()
    );
    Ok(added)
}

/// Distance from `x` (finite, non-negative) to the next larger `f32`.
fn ulp(x: f32) -> f32 {
    f32::from_bits(x.to_bits() + 1) - x
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn seed(direction: Vec3) -> LimbGraph {
        let mut g = LimbGraph::new();
        g.add_root(Vec3::ZERO, direction, 0.5, LimbKind::Trunk).unwrap();
        g
    }

    #[test]
    fn grows_until_target_height() {
        let mut g = seed(Vec3::Y);

        let added = grow_trunk(&mut g, 2.0, 0.5).unwrap();

        assert_eq!(added, vec![1, 2, 3]);
        let tip = &g.limbs[3];
        assert!(tip.end.y >= 2.0);
        assert!(g.limbs[2].end.y < 2.0);
        for &id in &added {
            let limb = &g.limbs[id];
            assert_eq!(limb.kind, LimbKind::Trunk);
            assert_eq!(limb.parent, Some(id - 1));
            assert_eq!(limb.direction, Vec3::Y);
            assert!((limb.length() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn slanted_trunk_keeps_its_direction() {
        let dir = Vec3::new(1.0, 1.0, 0.0).normalize();
        let mut g = seed(dir);

        grow_trunk(&mut g, 3.0, 0.5).unwrap();

        assert!(g.limbs.iter().all(|l| (l.direction - dir).length() < 1e-6));
        assert!(g.limbs.last().unwrap().end.y >= 3.0);
    }

    #[test]
    fn already_tall_enough_is_noop() {
        let mut g = seed(Vec3::Y);
        assert!(grow_trunk(&mut g, 0.25, 0.5).unwrap().is_empty());
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn horizontal_trunk_fails_fast() {
        let mut g = seed(Vec3::X);
        let err = grow_trunk(&mut g, 5.0, 0.5);
        assert!(matches!(err, Err(KauriError::NonUpwardTrunk { .. })));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn downward_trunk_below_target_fails_fast() {
        let mut g = seed(Vec3::NEG_Y);
        assert!(matches!(
            grow_trunk(&mut g, 1.0, 0.5),
            Err(KauriError::NonUpwardTrunk { .. })
        ));
    }

    #[test]
    fn step_below_float_resolution_fails_fast() {
        let mut g = LimbGraph::new();
        g.add_root(Vec3::new(0.0, 3.0e7, 0.0), Vec3::Y, 0.5, LimbKind::Trunk)
            .unwrap();

        let err = grow_trunk(&mut g, 3.0e7 + 64.0, 0.5);

        assert!(matches!(err, Err(KauriError::TrunkStepTooSmall { .. })));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn non_finite_target_height_is_rejected() {
        let mut g = seed(Vec3::Y);
        for height in [f32::INFINITY, f32::NAN] {
            assert!(matches!(
                grow_trunk(&mut g, height, 0.5),
                Err(KauriError::InvalidTrunkHeight { .. })
            ));
        }
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn tall_trunk_with_coarse_floats_still_terminates() {
        let mut g = LimbGraph::new();
        g.add_root(Vec3::new(0.0, 1.0e6, 0.0), Vec3::Y, 0.5, LimbKind::Trunk)
            .unwrap();

        let added = grow_trunk(&mut g, 1.0e6 + 8.0, 0.5).unwrap();

        assert!(!added.is_empty());
        assert!(g.limbs.last().unwrap().end.y >= 1.0e6 + 8.0);
    }

    #[test]
    fn rejects_bad_segment_length_and_empty_graph() {
        let mut g = seed(Vec3::Y);
        assert!(matches!(
            grow_trunk(&mut g, 2.0, 0.0),
            Err(KauriError::InvalidSegmentLength { .. })
        ));

        let mut empty = LimbGraph::new();
        assert!(matches!(
            grow_trunk(&mut empty, 2.0, 0.5),
            Err(KauriError::EmptyGraph)
        ));
    }
}
