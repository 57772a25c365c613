//! Tube skinning of a limb graph.
//!
//! [`to_mesh`] turns the skeleton into an indexed triangle mesh in three
//! passes over the arena:
//! 1. [`propagate_sizes`]: radii flow from the tips towards the base
//!    (reverse creation order, children always come after their parent).
//! 2. Rings: one ring of `radial_subdivisions` vertices at every limb's
//!    end, plus one base ring at the start of every parentless limb,
//!    appended after all limb rings.
//! 3. Triangles: each limb's ring is stitched to its parent's ring (or to
//!    its base ring) with two triangles per radial step.

use std::f32::consts::TAU;
use std::io::Write as _;

use glam::{Quat, Vec3};

use crate::{config::MeshConfig, error::Result, limb::LimbGraph};

/// Indexed triangle mesh.
///
/// Triangles wind counter-clockwise when seen from outside the tube.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TubeMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TubeMesh {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Area-weighted per-vertex normals, one per vertex.
    ///
    /// Vertices touched by no triangle get `Vec3::ZERO`.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| self.vertices[i as usize]);
            // Unnormalized cross product: longer for larger faces.
            let n = (b - a).cross(c - a);
            for &i in tri {
                normals[i as usize] += n;
            }
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        normals
    }

    /// Writes the mesh as Wavefront OBJ (1-based face indices).
    pub fn write_obj(&self, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "# kauri tree mesh")?;
        writeln!(
            out,
            "# {} vertices, {} triangles",
            self.vertices.len(),
            self.triangles.len()
        )?;
        for v in &self.vertices {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for [a, b, c] in &self.triangles {
            writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }
        Ok(())
    }

    /// Writes the mesh as an OBJ file at `path`.
    pub fn save_obj(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write_obj(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

/// Writes the thickness of every limb into `Limb::size`.
///
/// Limbs without children get `extremity_size`. Every other limb gets the
/// power mean `(Σ child.size^p)^(1/p)` of its children with
/// `p = size_exponent`, so a single child passes its size through unchanged.
pub fn propagate_sizes(graph: &mut LimbGraph, extremity_size: f32, size_exponent: f32) {
    for id in (0..graph.limbs.len()).rev() {
        let size = if graph.limbs[id].children.is_empty() {
            extremity_size
        } else {
            let sum: f32 = graph.limbs[id]
                .children
                .iter()
                .map(|&c| graph.limbs[c].size.powf(size_exponent))
                .sum();
            sum.powf(size_exponent.recip())
        };
        graph.limbs[id].size = size;
    }
}

/// Skins `graph` into a [`TubeMesh`].
///
/// Sizes are recomputed first, so this is safe to call repeatedly and gives
/// identical buffers for an unchanged graph.
///
/// ### Parameters
/// - `graph` - Skeleton to skin; only `Limb::size` is written.
/// - `origin` - Vertex positions are stored relative to this point.
/// - `cfg` - Ring resolution, tip thickness and power-mean exponent.
///
/// ### Returns
/// `N·S + R·S` vertices and `2·N·S` triangles for `N` limbs, `R`
/// parentless limbs and `S` subdivisions. An empty graph gives an empty mesh.
pub fn to_mesh(graph: &mut LimbGraph, origin: Vec3, cfg: &MeshConfig) -> Result<TubeMesh> {
    cfg.validate()?;
    if graph.is_empty() {
        return Ok(TubeMesh::default());
    }
    propagate_sizes(graph, cfg.extremity_size, cfg.size_exponent);

    let s = cfg.radial_subdivisions;
    let n = graph.len();
    let roots = graph.roots();

    let ring = canonical_ring(s);
    let mut vertices = Vec::with_capacity((n + roots.len()) * s);

    for limb in &graph.limbs {
        push_ring(&mut vertices, &ring, limb.end - origin, limb.direction, limb.size);
    }
    // base_ring[k] is the first vertex of the base ring of roots[k].
    let mut base_ring = Vec::with_capacity(roots.len());
    for &id in &roots {
        let limb = &graph.limbs[id];
        base_ring.push(vertices.len());
        push_ring(&mut vertices, &ring, limb.start - origin, limb.direction, limb.size);
    }

    let mut triangles = Vec::with_capacity(n * s * 2);
    // Roots are met in the same order their base rings were pushed.
    let mut bases = base_ring.into_iter();
    for (id, limb) in graph.iter() {
        let top = id * s;
        let bottom = match limb.parent {
            Some(p) => p * s,
            None => bases.next().unwrap_or(top),
        };
        for i in 0..s {
            let j = (i + 1) % s;
            let (a, b) = ((top + i) as u32, (top + j) as u32);
            let (c, d) = ((bottom + i) as u32, (bottom + j) as u32);
            triangles.push([c, a, b]);
            triangles.push([c, b, d]);
        }
    }

    Ok(TubeMesh {
        vertices,
        triangles,
    })
}

/// Unit circle in the XZ plane, going from +X towards +Z.
fn canonical_ring(subdivisions: usize) -> Vec<Vec3> {
    (0..subdivisions)
        .map(|i| {
            let a = i as f32 / subdivisions as f32 * TAU;
            Vec3::new(a.cos(), 0.0, a.sin())
        })
        .collect()
}

/// Appends `ring` scaled by `radius`, turned so +Y follows `direction`, and
/// moved to `center`.
fn push_ring(out: &mut Vec<Vec3>, ring: &[Vec3], center: Vec3, direction: Vec3, radius: f32) {
    let rotation = Quat::from_rotation_arc(Vec3::Y, direction);
    out.extend(ring.iter().map(|&p| center + rotation * (p * radius)));
}
