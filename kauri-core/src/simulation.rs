//! A whole tree: trunk, crown and optional root system grown tick by tick.
//!
//! Each tick advances the root system first and then the branches. When
//! the branches run out of attraction points the tick reports, exactly
//! once, where leaves should be placed; the simulation itself never creates
//! anything visual.

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{
    attractor::AttractorField,
    config::{DomainConfig, GrowthConfig, SimConfig},
    error::Result,
    growth::{GrowthStep, grow_limbs_with},
    influence_buffer::InfluenceBuffer,
    limb::LimbGraph,
    mesh::{TubeMesh, to_mesh},
    trunk::grow_trunk,
    types::{Domain, LimbId, LimbKind},
};

/// Where and how to attach one leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafPlacement {
    /// Tip of the limb carrying the leaf.
    pub position: Vec3,
    /// Growth direction of that limb.
    pub direction: Vec3,
}

/// One independently growing half of the tree.
#[derive(Debug)]
pub struct GrowthDomain {
    pub domain: Domain,
    pub graph: LimbGraph,
    pub extremities: Vec<LimbId>,
    pub attractors: AttractorField,
    pub growth: GrowthConfig,
    complete: bool,
    acc: InfluenceBuffer,
}

impl GrowthDomain {
    pub fn new(
        domain: Domain,
        graph: LimbGraph,
        extremities: Vec<LimbId>,
        attractors: AttractorField,
        growth: GrowthConfig,
    ) -> Self {
        let acc = InfluenceBuffer::with_len(graph.len());
        Self {
            domain,
            graph,
            extremities,
            attractors,
            growth,
            complete: false,
            acc,
        }
    }

    /// Runs one growth step. Returns the step and whether this is the first
    /// time the domain reported completion.
    pub fn step(&mut self, rng: &mut StdRng) -> Result<(GrowthStep, bool)> {
        let step = grow_limbs_with(
            &mut self.graph,
            &mut self.extremities,
            &mut self.attractors,
            &self.growth,
            self.domain,
            rng,
            &mut self.acc,
        )?;
        let newly_complete = step.is_complete() && !self.complete;
        if newly_complete {
            self.complete = true;
            log::info!(
                "{:?} growth complete: {} limbs, {} extremities",
                self.domain,
                self.graph.len(),
                self.extremities.len()
            );
        }
        Ok((step, newly_complete))
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Outcome of [`Simulation::tick`].
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// `None` when the root system is disabled.
    pub roots: Option<GrowthStep>,
    pub branches: GrowthStep,
    /// Non-empty only on the tick the branches completed.
    pub leaves: Vec<LeafPlacement>,
}

/// Skinned geometry of both halves of the tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeMeshes {
    pub branches: TubeMesh,
    pub roots: Option<TubeMesh>,
}

/// Owns everything needed to grow one tree.
#[derive(Debug)]
pub struct Simulation {
    cfg: SimConfig,
    pub branches: GrowthDomain,
    pub roots: Option<GrowthDomain>,
    leaves: Vec<LeafPlacement>,
    ticks: u64,
    rng: StdRng,
}

impl Simulation {
    /// Builds a tree with attraction points sampled from the configured
    /// distributions.
    ///
    /// The branch points are placed relative to the top of the trunk and
    /// the root points relative to the tip of the first root limb.
    pub fn new(cfg: SimConfig) -> Result<Self> {
        cfg.validate()?;
        let mut rng = make_rng(cfg.seed);

        let (graph, extremities) = grow_trunk_graph(&cfg)?;
        let crown_base = graph
            .last_id()
            .map_or(cfg.branches.start, |id| graph.limbs[id].end);
        let branch_field = sample_field(&cfg.branches, crown_base, &mut rng);
        let branches = GrowthDomain::new(
            Domain::Branch,
            graph,
            extremities,
            branch_field,
            cfg.branches.growth,
        );

        let roots = match &cfg.roots {
            Some(rc) => {
                let mut domain = root_domain(rc, AttractorField::default())?;
                let tip = domain.graph.limbs[0].end;
                domain.attractors = sample_field(rc, tip, &mut rng);
                Some(domain)
            }
            None => None,
        };

        Ok(Self::assemble(cfg, branches, roots, rng))
    }

    /// Builds a tree around caller-supplied attraction points.
    ///
    /// `root_points` is ignored when the root system is disabled.
    pub fn with_attractors(
        cfg: SimConfig,
        branch_points: Vec<Vec3>,
        root_points: Vec<Vec3>,
    ) -> Result<Self> {
        cfg.validate()?;
        let rng = make_rng(cfg.seed);

        let (graph, extremities) = grow_trunk_graph(&cfg)?;
        let branches = GrowthDomain::new(
            Domain::Branch,
            graph,
            extremities,
            AttractorField::from_positions(branch_points),
            cfg.branches.growth,
        );
        let roots = match &cfg.roots {
            Some(rc) => Some(root_domain(rc, AttractorField::from_positions(root_points))?),
            None => None,
        };

        Ok(Self::assemble(cfg, branches, roots, rng))
    }

    fn assemble(
        cfg: SimConfig,
        branches: GrowthDomain,
        roots: Option<GrowthDomain>,
        rng: StdRng,
    ) -> Self {
        log::debug!(
            "new tree: {} trunk limbs, {} branch points, {} root points",
            branches.graph.len(),
            branches.attractors.len(),
            roots.as_ref().map_or(0, |r| r.attractors.len())
        );
        Self {
            cfg,
            branches,
            roots,
            leaves: Vec::new(),
            ticks: 0,
            rng,
        }
    }

    /// Advances the root system, then the branches, by one step each.
    pub fn tick(&mut self) -> Result<TickReport> {
        let roots = match self.roots.as_mut() {
            Some(domain) => Some(domain.step(&mut self.rng)?.0),
            None => None,
        };

        let (branches, newly_complete) = self.branches.step(&mut self.rng)?;
        let mut leaves = Vec::new();
        if newly_complete && let GrowthStep::Complete { extremities } = &branches {
            leaves = extremities
                .iter()
                .map(|&id| {
                    let limb = &self.branches.graph.limbs[id];
                    LeafPlacement {
                        position: limb.end,
                        direction: limb.direction,
                    }
                })
                .collect();
            self.leaves.clone_from(&leaves);
        }

        self.ticks += 1;
        Ok(TickReport {
            roots,
            branches,
            leaves,
        })
    }

    /// Ticks until both halves are complete or `max_ticks` ticks have run.
    /// Returns the number of ticks performed.
    pub fn run(&mut self, max_ticks: usize) -> Result<usize> {
        let mut done = 0;
        while done < max_ticks && !self.is_finished() {
            self.tick()?;
            done += 1;
        }
        Ok(done)
    }

    /// Skins both halves with the configured mesh parameters.
    pub fn meshes(&mut self) -> Result<TreeMeshes> {
        let origin = self.cfg.origin;
        let branches = to_mesh(&mut self.branches.graph, origin, &self.cfg.mesh)?;
        let roots = match self.roots.as_mut() {
            Some(domain) => Some(to_mesh(&mut domain.graph, origin, &self.cfg.mesh)?),
            None => None,
        };
        Ok(TreeMeshes { branches, roots })
    }

    pub fn is_finished(&self) -> bool {
        self.branches.is_complete() && self.roots.as_ref().is_none_or(|r| r.is_complete())
    }

    /// Leaf placements reported when the branches completed.
    pub fn leaves(&self) -> &[LeafPlacement] {
        &self.leaves
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    pub fn limb_count(&self) -> usize {
        self.branches.graph.len() + self.roots.as_ref().map_or(0, |r| r.graph.len())
    }

    pub fn attractor_count(&self) -> usize {
        self.branches.attractors.len() + self.roots.as_ref().map_or(0, |r| r.attractors.len())
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// First upright limb at the branch start, grown up to the trunk height.
fn grow_trunk_graph(cfg: &SimConfig) -> Result<(LimbGraph, Vec<LimbId>)> {
    let start = cfg.branches.start;
    let segment = cfg.branches.growth.segment_length;
    let mut graph = LimbGraph::new();
    graph.add_root(start, Vec3::Y, segment, LimbKind::Trunk)?;
    grow_trunk(&mut graph, start.y + cfg.trunk_height, segment)?;
    let extremities = graph.last_id().into_iter().collect();
    Ok((graph, extremities))
}

/// First downward limb of the root system.
fn root_domain(rc: &DomainConfig, field: AttractorField) -> Result<GrowthDomain> {
    let mut graph = LimbGraph::new();
    let id = graph.add_root(rc.start, Vec3::NEG_Y, rc.growth.segment_length, LimbKind::Root)?;
    Ok(GrowthDomain::new(
        Domain::Root,
        graph,
        vec![id],
        field,
        rc.growth,
    ))
}

fn sample_field(dc: &DomainConfig, origin: Vec3, rng: &mut StdRng) -> AttractorField {
    AttractorField::generate(
        dc.distribution,
        dc.attractor_count,
        dc.spread_radius,
        origin,
        rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshConfig;

    fn seeded(seed: u64) -> SimConfig {
        SimConfig {
            seed: Some(seed),
            ..SimConfig::default()
        }
    }

    #[test]
    fn new_grows_trunk_to_height() {
        let sim = Simulation::new(seeded(1)).unwrap();
        let g = &sim.branches.graph;

        assert!(g.limbs.iter().all(|l| l.kind == LimbKind::Trunk));
        assert!(g.limbs.last().unwrap().end.y >= 3.0);
        assert_eq!(sim.branches.extremities, vec![g.len() - 1]);
        assert_eq!(sim.branches.attractors.len(), 400);

        let roots = sim.roots.as_ref().unwrap();
        assert_eq!(roots.graph.len(), 1);
        assert_eq!(roots.graph.limbs[0].direction, Vec3::NEG_Y);
        assert_eq!(roots.attractors.len(), 400);
    }

    #[test]
    fn roots_can_be_disabled() {
        let cfg = SimConfig {
            roots: None,
            ..seeded(2)
        };
        let mut sim = Simulation::with_attractors(cfg, vec![Vec3::new(0.0, 10.0, 0.0)], vec![])
            .unwrap();
        let report = sim.tick().unwrap();

        assert!(report.roots.is_none());
        assert!(sim.meshes().unwrap().roots.is_none());
    }

    #[test]
    fn leaves_are_reported_once_on_completion() {
        let cfg = SimConfig {
            roots: None,
            ..seeded(3)
        };
        let mut sim = Simulation::with_attractors(cfg, vec![], vec![]).unwrap();
        let tip = *sim.branches.extremities.first().unwrap();

        let first = sim.tick().unwrap();
        assert!(first.branches.is_complete());
        assert_eq!(first.leaves.len(), 1);
        assert_eq!(first.leaves[0].position, sim.branches.graph.limbs[tip].end);
        assert!(sim.is_finished());

        let second = sim.tick().unwrap();
        assert!(second.branches.is_complete());
        assert!(second.leaves.is_empty());
        assert_eq!(sim.leaves().len(), 1);
    }

    #[test]
    fn tick_grows_roots_down_and_branches_up() {
        let mut sim = Simulation::with_attractors(
            seeded(4),
            vec![Vec3::new(0.0, 20.0, 0.0)],
            vec![Vec3::new(0.0, -20.0, 0.0)],
        )
        .unwrap();
        let trunk_tip = sim.branches.graph.limbs.last().unwrap().end;

        let report = sim.tick().unwrap();

        assert_eq!(report.branches.new_limbs().len(), 1);
        assert_eq!(report.roots.as_ref().unwrap().new_limbs().len(), 1);
        let branch = sim.branches.graph.limbs.last().unwrap();
        assert_eq!(branch.kind, LimbKind::Branch);
        assert!(branch.end.y > trunk_tip.y);
        let root = sim.roots.as_ref().unwrap().graph.limbs.last().unwrap();
        assert_eq!(root.kind, LimbKind::Root);
        assert!(root.end.y < 0.0);
        assert_eq!(sim.ticks(), 1);
    }

    #[test]
    fn run_stops_when_finished() {
        let cfg = SimConfig {
            branches: DomainConfig {
                attractor_count: 60,
                ..DomainConfig::branches()
            },
            roots: Some(DomainConfig {
                attractor_count: 60,
                ..DomainConfig::roots()
            }),
            ..seeded(5)
        };
        let mut sim = Simulation::new(cfg).unwrap();

        let ticks = sim.run(2_000).unwrap();

        assert!(sim.is_finished());
        assert!(ticks < 2_000);
        assert_eq!(sim.attractor_count(), 0);
        assert!(!sim.leaves().is_empty());
        assert_eq!(sim.run(10).unwrap(), 0);
    }

    #[test]
    fn meshes_match_limb_counts() {
        let cfg = SimConfig {
            mesh: MeshConfig {
                radial_subdivisions: 5,
                ..MeshConfig::default()
            },
            ..seeded(6)
        };
        let mut sim = Simulation::new(cfg).unwrap();
        for _ in 0..10 {
            sim.tick().unwrap();
        }

        let meshes = sim.meshes().unwrap();
        let n = sim.branches.graph.len();
        assert_eq!(meshes.branches.vertices.len(), n * 5 + 5);
        assert_eq!(meshes.branches.triangles.len(), n * 10);
        let r = sim.roots.as_ref().unwrap().graph.len();
        assert_eq!(meshes.roots.unwrap().vertices.len(), r * 5 + 5);
        assert_eq!(sim.limb_count(), n + r);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = seeded(7);
        cfg.branches.growth.segment_length = -1.0;
        assert!(Simulation::new(cfg).is_err());
    }
}
