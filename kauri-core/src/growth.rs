//! One space-colonization growth step.
//!
//! A step runs in three passes so the attractor field is never mutated while
//! it is being iterated:
//! 1. Scan: every point looks for a limb tip within kill distance (it is
//!    then marked for removal) or else for its nearest admissible tip (its
//!    direction is then recorded in an [`InfluenceBuffer`]).
//! 2. Consume: marked points are removed from the field.
//! 3. Grow: influenced limbs sprout one child towards their points; if no
//!    point saw any admissible tip, every extremity extends straight ahead
//!    instead so growth never stalls. A step that consumes the last points
//!    grows nothing.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

use crate::{
    attractor::AttractorField,
    config::GrowthConfig,
    error::{KauriError, Result},
    influence_buffer::InfluenceBuffer,
    limb::LimbGraph,
    types::{Domain, LimbId},
};

/// What a call to [`grow_limbs`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum GrowthStep {
    /// At least one point saw an admissible tip; influenced limbs grew
    /// towards their points.
    Attracted {
        new_limbs: Vec<LimbId>,
        consumed: usize,
    },
    /// No point saw an admissible tip; every extremity was extended along
    /// its own direction. Empty when the step consumed the last points.
    Extended {
        new_limbs: Vec<LimbId>,
        consumed: usize,
    },
    /// The field is empty. Nothing was changed. Carries the extremities
    /// current at completion so the caller can e.g. place leaves on them.
    Complete { extremities: Vec<LimbId> },
}

impl GrowthStep {
    pub fn new_limbs(&self) -> &[LimbId] {
        match self {
            GrowthStep::Attracted { new_limbs, .. } | GrowthStep::Extended { new_limbs, .. } => {
                new_limbs
            }
            GrowthStep::Complete { .. } => &[],
        }
    }

    pub fn consumed(&self) -> usize {
        match self {
            GrowthStep::Attracted { consumed, .. } | GrowthStep::Extended { consumed, .. } => {
                *consumed
            }
            GrowthStep::Complete { .. } => 0,
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, GrowthStep::Complete { .. })
    }
}

/// Advances one tree by one growth step.
///
/// ### Parameters
/// - `graph` - The tree being grown; new limbs are appended.
/// - `extremities` - Current growable tips; rebuilt or advanced in place.
/// - `attractors` - Points of this domain; reached points are removed.
/// - `cfg` - Kill distance, segment length and jitter.
/// - `domain` - Decides which tips a point may pull on and the kind of
///   new limbs.
/// - `rng` - Source of the jitter; two draws per grown limb when
///   `cfg.jitter > 0`, none otherwise.
/// - `acc` - Scratch buffer, resized to the graph.
///
/// ### Errors
/// Invalid configuration, non-finite attraction points and new limbs whose
/// end point would not be finite are all reported before anything is
/// modified.
pub fn grow_limbs_with(
    graph: &mut LimbGraph,
    extremities: &mut Vec<LimbId>,
    attractors: &mut AttractorField,
    cfg: &GrowthConfig,
    domain: Domain,
    rng: &mut impl Rng,
    acc: &mut InfluenceBuffer,
) -> Result<GrowthStep> {
    if attractors.is_empty() {
        return Ok(GrowthStep::Complete {
            extremities: extremities.clone(),
        });
    }
    cfg.validate()?;

    let (marked, active) = attraction_phase(graph, attractors, cfg, domain, acc)?;
    // Every new segment is planned and checked before the field, the
    // extremities or the graph change, so a failing step leaves no trace.
    let plan = if active {
        plan_attracted_growth(graph, acc, cfg, rng)?
    } else if marked.iter().all(|&m| m) {
        // The last points were just consumed; nothing is left to grow towards.
        Vec::new()
    } else {
        plan_extension(graph, extremities, cfg)?
    };
    let consumed = attractors.remove_marked(&marked);

    let new_limbs = if active {
        attracted_growth_phase(graph, extremities, &plan, cfg, domain)?
    } else {
        extension_phase(graph, extremities, &plan, cfg)?
    };

    log::debug!(
        "{:?} step: {} new limbs ({}), {} points consumed, {} remaining",
        domain,
        new_limbs.len(),
        if active { "attracted" } else { "extended" },
        consumed,
        attractors.len()
    );

    Ok(if active {
        GrowthStep::Attracted {
            new_limbs,
            consumed,
        }
    } else {
        GrowthStep::Extended {
            new_limbs,
            consumed,
        }
    })
}

/// [`grow_limbs_with`] using a fresh scratch buffer.
pub fn grow_limbs(
    graph: &mut LimbGraph,
    extremities: &mut Vec<LimbId>,
    attractors: &mut AttractorField,
    cfg: &GrowthConfig,
    domain: Domain,
    rng: &mut impl Rng,
) -> Result<GrowthStep> {
    let mut acc = InfluenceBuffer::default();
    grow_limbs_with(graph, extremities, attractors, cfg, domain, rng, &mut acc)
}

/// Assigns every point either to the removal set or to its nearest
/// admissible tip.
///
/// Limbs are scanned in creation order. The first tip within
/// `cfg.kill_distance` (admissible or not) marks the point and ends its
/// scan. Among admissible tips the strictly closest wins, so ties keep the
/// earliest limb.
///
/// Returns the removal flags (one per point) and whether any point saw an
/// admissible tip.
fn attraction_phase(
    graph: &LimbGraph,
    attractors: &AttractorField,
    cfg: &GrowthConfig,
    domain: Domain,
    acc: &mut InfluenceBuffer,
) -> Result<(Vec<bool>, bool)> {
    acc.ensure_len(graph.len());
    let mut marked = vec![false; attractors.len()];
    let mut active = false;

    for (i, &p) in attractors.iter().enumerate() {
        if !p.is_finite() {
            return Err(KauriError::NonFiniteAttractor {
                index: i,
                point: p.to_array(),
            });
        }

        let mut nearest: Option<LimbId> = None;
        let mut best_d = f32::MAX;

        for (id, limb) in graph.iter() {
            let d = limb.end.distance(p);
            if d <= cfg.kill_distance {
                marked[i] = true;
                break;
            }
            if domain.admits(limb.end.y, p.y) {
                active = true;
                if d < best_d {
                    best_d = d;
                    nearest = Some(id);
                }
            }
        }

        if marked[i] {
            continue;
        }
        if let Some(id) = nearest {
            let dir = (p - graph.limbs[id].end).normalize_or_zero();
            acc.add(id, dir);
        }
    }

    Ok((marked, active))
}

/// Picks the growth direction of every influenced limb, in id order.
///
/// Draws the jitter (if any) and rejects segments whose end point would not
/// be finite.
fn plan_attracted_growth(
    graph: &LimbGraph,
    acc: &InfluenceBuffer,
    cfg: &GrowthConfig,
    rng: &mut impl Rng,
) -> Result<Vec<(LimbId, Vec3)>> {
    let mut plan = Vec::with_capacity(16);
    for id in acc.influenced_indices() {
        let limb = &graph.limbs[id];
        let dir = growth_direction(acc.avg_dir(id), limb.direction, cfg.jitter, rng);
        check_segment(limb.end, id, dir, cfg.segment_length)?;
        plan.push((id, dir));
    }
    Ok(plan)
}

/// One straight segment per extremity, along the extremity's own direction.
fn plan_extension(
    graph: &LimbGraph,
    extremities: &[LimbId],
    cfg: &GrowthConfig,
) -> Result<Vec<(LimbId, Vec3)>> {
    extremities
        .iter()
        .map(|&tip| {
            let limb = graph.get(tip)?;
            check_segment(limb.end, tip, limb.direction, cfg.segment_length)?;
            Ok((tip, limb.direction))
        })
        .collect()
}

fn check_segment(start: Vec3, parent: LimbId, dir: Vec3, length: f32) -> Result<()> {
    let end = start + dir * length;
    if end.is_finite() {
        Ok(())
    } else {
        Err(KauriError::NonFiniteGeometry {
            parent,
            end: end.to_array(),
        })
    }
}

/// Grows the planned child of every influenced limb and rebuilds
/// `extremities`.
///
/// Only limbs that existed before the step are visited. Influenced limbs
/// contribute their new child to the extremity set; untouched childless
/// limbs stay in it as they are.
fn attracted_growth_phase(
    graph: &mut LimbGraph,
    extremities: &mut Vec<LimbId>,
    plan: &[(LimbId, Vec3)],
    cfg: &GrowthConfig,
    domain: Domain,
) -> Result<Vec<LimbId>> {
    let existing = graph.len();
    let mut new_limbs = Vec::with_capacity(plan.len());
    let mut planned = plan.iter().peekable();
    extremities.clear();

    for id in 0..existing {
        if let Some(&(_, dir)) = planned.next_if(|(parent, _)| *parent == id) {
            let child = graph.add_child(id, dir, cfg.segment_length, domain.limb_kind())?;
            new_limbs.push(child);
            extremities.push(child);
        } else if graph.limbs[id].is_leaf() {
            extremities.push(id);
        }
    }

    Ok(new_limbs)
}

/// Grows the planned straight segments and replaces each extremity with
/// its new tip. An empty plan leaves the extremities as they are.
fn extension_phase(
    graph: &mut LimbGraph,
    extremities: &mut [LimbId],
    plan: &[(LimbId, Vec3)],
    cfg: &GrowthConfig,
) -> Result<Vec<LimbId>> {
    let mut new_limbs = Vec::with_capacity(plan.len());
    for (tip, &(parent, dir)) in extremities.iter_mut().zip(plan) {
        let kind = graph.get(parent)?.kind;
        let child = graph.add_child(parent, dir, cfg.segment_length, kind)?;
        new_limbs.push(child);
        *tip = child;
    }
    Ok(new_limbs)
}

/// Turns an averaged attraction vector into a unit growth direction.
///
/// A zero-length average (points pulling in exactly opposite directions)
/// falls back to `prior`. When `jitter > 0`, a random unit vector scaled by
/// `jitter` is added and the result renormalized; with zero jitter no
/// random numbers are drawn.
pub fn growth_direction(avg: Vec3, prior: Vec3, jitter: f32, rng: &mut impl Rng) -> Vec3 {
    let base = match avg.try_normalize() {
        Some(dir) => dir,
        None => {
            log::trace!("degenerate attraction average, keeping direction {prior:?}");
            prior
        }
    };

    if jitter > 0.0 {
        (base + random_unit_vector(rng) * jitter).normalize_or(base)
    } else {
        base
    }
}

/// Uniformly distributed point on the unit sphere.
pub fn random_unit_vector(rng: &mut impl Rng) -> Vec3 {
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}
