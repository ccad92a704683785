//! Periodic radical Voronoi decomposition.
//!
//! Every atom of the unit cell gets its own convex cell, clipped by the
//! radical planes of neighbouring atom images in order of increasing
//! distance. Cells are built independently in parallel. A sequential merge
//! then identifies vertices and edges shared between cells (and between
//! periodic images of the same cell) and turns them into the nodes and
//! edges of one [`VoronoiNetwork`].

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, trace};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::bitcell::BitVectorCell;
use crate::error::{Error, Result};
use crate::geometry::{radical_plane, segment_surface_distance, surface_distance};
use crate::image_searcher::ImageSearcher;
use crate::lattice::{Lattice, Shift};
use crate::network::{AtomCell, CellFace, VoronoiEdge, VoronoiNetwork, VoronoiNode, canonical_edge};
use crate::polyhedron::{ConvexCell, CutOutcome};
use crate::registry::AtomRegistry;
use crate::types::{Site, Sphere};

/// Largest number of merge buckets along one lattice axis.
const MAX_BINS_PER_AXIS: usize = 32;

/// Settings for [`decompose_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecomposeOptions {
    /// Atoms closer than this (Å, periodic images included) are rejected.
    pub coincidence_tolerance: f64,
    /// Cell vertices closer than this (Å) are merged into one node.
    pub merge_tolerance: f64,
    /// Also return the Voronoi cell of every atom.
    pub atom_cells: bool,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        Self {
            coincidence_tolerance: 1e-4,
            merge_tolerance: 1e-5,
            atom_cells: false,
        }
    }
}

impl DecomposeOptions {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("coincidence tolerance", self.coincidence_tolerance),
            ("merge tolerance", self.merge_tolerance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::geometry(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Result of [`decompose_with`]: the network, with the per-atom cells when
/// they were requested.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decomposition {
    Network(VoronoiNetwork),
    WithAtomCells {
        network: VoronoiNetwork,
        atom_cells: Vec<AtomCell>,
    },
}

impl Decomposition {
    #[must_use]
    pub const fn network(&self) -> &VoronoiNetwork {
        match self {
            Self::Network(network) | Self::WithAtomCells { network, .. } => network,
        }
    }

    #[must_use]
    pub fn atom_cells(&self) -> Option<&[AtomCell]> {
        match self {
            Self::Network(_) => None,
            Self::WithAtomCells { atom_cells, .. } => Some(atom_cells),
        }
    }

    #[must_use]
    pub fn into_network(self) -> VoronoiNetwork {
        self.into_parts().0
    }

    #[must_use]
    pub fn into_parts(self) -> (VoronoiNetwork, Option<Vec<AtomCell>>) {
        match self {
            Self::Network(network) => (network, None),
            Self::WithAtomCells {
                network,
                atom_cells,
            } => (network, Some(atom_cells)),
        }
    }
}

/// Decompose a periodic structure with default options.
///
/// # Errors
/// See [`decompose_with`].
pub fn decompose(registry: &AtomRegistry, lattice: &Lattice) -> Result<VoronoiNetwork> {
    decompose_with(registry, lattice, &DecomposeOptions::default()).map(Decomposition::into_network)
}

/// Build the periodic radical Voronoi network of the atoms in `registry`.
///
/// # Errors
/// - [`Error::InvalidGeometry`] for invalid options or atom data
/// - [`Error::DegenerateInput`] if two atoms (or periodic images) coincide
/// - [`Error::IncompleteCell`] if a cell cannot be closed
pub fn decompose_with(
    registry: &AtomRegistry,
    lattice: &Lattice,
    options: &DecomposeOptions,
) -> Result<Decomposition> {
    options.validate()?;

    let spheres = registry
        .iter()
        .map(|atom| {
            if !atom.radius.is_finite() || atom.radius < 0.0 {
                return Err(Error::geometry(format!(
                    "atom {} has invalid radius {}",
                    atom.index, atom.radius
                )));
            }
            Ok(Sphere::new(atom.position, atom.radius))
        })
        .collect::<Result<Vec<_>>>()?;
    let atom_count = spheres.len();

    if atom_count == 0 {
        debug!("empty registry, returning empty network");
        let network = VoronoiNetwork::empty(*lattice, 0);
        return Ok(if options.atom_cells {
            Decomposition::WithAtomCells {
                network,
                atom_cells: Vec::new(),
            }
        } else {
            Decomposition::Network(network)
        });
    }

    let searcher = ImageSearcher::new(lattice, spheres);
    if let Some((first, second, distance)) = searcher.find_coincident(options.coincidence_tolerance)
    {
        return Err(Error::DegenerateInput {
            first,
            second,
            distance,
        });
    }

    debug!(
        "building {atom_count} cells, first neighbour shell {:.3}",
        searcher.initial_radius()
    );

    let cells = (0..atom_count)
        .into_par_iter()
        .map(|atom| build_cell(&searcher, lattice, atom))
        .collect::<Result<Vec<_>>>()?;

    let raw_vertices: usize = cells.iter().map(|c| c.vertices.len()).sum();
    let raw_edges: usize = cells.iter().map(|c| c.edges.len()).sum();
    debug!("cells built: {raw_vertices} vertices, {raw_edges} edges");

    let (network, atom_cells) = merge_cells(lattice, atom_count, &cells, options.merge_tolerance)?;

    info!(
        "decomposed {atom_count} atoms into {} nodes and {} edges",
        network.nodes().len(),
        network.edges().len()
    );

    Ok(if options.atom_cells {
        Decomposition::WithAtomCells {
            network,
            atom_cells,
        }
    } else {
        Decomposition::Network(network)
    })
}

/// Vertex of one atom's cell in absolute Cartesian coordinates.
struct RawVertex {
    position: Point3<f64>,
    radius: f64,
    /// The owning atom and every atom whose plane passes through the vertex.
    atoms: Vec<usize>,
}

struct RawEdge {
    a: usize,
    b: usize,
    radius: f64,
    atoms: Vec<usize>,
}

struct RawCell {
    atom: usize,
    vertices: Vec<RawVertex>,
    edges: Vec<RawEdge>,
    faces: Vec<CellFace>,
    volume: f64,
}

/// Clip a bounding cube around `atom` until no farther image can change it.
fn build_cell(searcher: &ImageSearcher<'_>, lattice: &Lattice, atom: usize) -> Result<RawCell> {
    let own = searcher.spheres()[atom];
    let local_own = Sphere::new(Point3::origin(), own.r);
    let max_radius = searcher.max_radius();
    let limit = 4.0 * (lattice.perimeter() + max_radius);

    let mut cell = ConvexCell::cube(lattice.perimeter());
    let mut sites: Vec<Site> = Vec::new();
    let mut inner = 0.0;
    let mut outer = searcher.initial_radius().max(lattice.min_edge());

    'shells: loop {
        for valued in searcher.sites_in_shell(atom, inner, outer) {
            if !cell.has_boundary_faces() && valued.value >= cell.reach(own.r, max_radius) {
                break 'shells;
            }
            let local = Sphere::new(
                Point3::from(valued.site.sphere.center - own.center),
                valued.site.sphere.r,
            );
            let Some(plane) = radical_plane(&local_own, &local) else {
                continue;
            };
            match cell.cut(&plane, sites.len()) {
                CutOutcome::Unchanged => {}
                CutOutcome::Cut => sites.push(valued.site),
                CutOutcome::Emptied => {
                    // Engulfed by a larger neighbour: no power cell at all
                    trace!("atom {atom}: empty cell");
                    return Ok(RawCell {
                        atom,
                        vertices: Vec::new(),
                        edges: Vec::new(),
                        faces: Vec::new(),
                        volume: 0.0,
                    });
                }
            }
        }

        if !cell.has_boundary_faces() && outer >= cell.reach(own.r, max_radius) {
            break;
        }
        if outer >= limit {
            return Err(Error::IncompleteCell { atom });
        }
        inner = outer;
        outer *= 2.0;
    }

    let owner_and = |labels: &[usize]| -> (Vec<Sphere>, Vec<usize>) {
        let mut spheres = vec![own];
        let mut atoms = vec![atom];
        for &label in labels {
            spheres.push(sites[label].sphere);
            atoms.push(sites[label].atom);
        }
        atoms.sort_unstable();
        atoms.dedup();
        (spheres, atoms)
    };

    let vertices: Vec<RawVertex> = cell
        .vertices()
        .iter()
        .zip(cell.vertex_sites())
        .map(|(local, labels)| {
            let position = own.center + local.coords;
            let (spheres, atoms) = owner_and(&labels);
            let radius = spheres
                .iter()
                .map(|s| surface_distance(s, &position))
                .fold(f64::INFINITY, f64::min);
            RawVertex {
                position,
                radius,
                atoms,
            }
        })
        .collect();

    let edges = cell
        .edges()
        .into_iter()
        .map(|edge| {
            let (pa, pb) = (&vertices[edge.a].position, &vertices[edge.b].position);
            let (spheres, atoms) = owner_and(&edge.sites);
            let radius = spheres
                .iter()
                .map(|s| segment_surface_distance(s, pa, pb))
                .fold(f64::INFINITY, f64::min)
                .min(vertices[edge.a].radius)
                .min(vertices[edge.b].radius);
            RawEdge {
                a: edge.a,
                b: edge.b,
                radius,
                atoms,
            }
        })
        .collect::<Vec<_>>();

    let mut faces: Vec<CellFace> = cell
        .face_geometry()
        .into_iter()
        .map(|face| {
            let site = &sites[face.site];
            CellFace {
                neighbor: site.atom,
                shift: site.shift,
                center: own.center + face.centroid.coords,
                area: face.area,
            }
        })
        .collect();
    faces.sort_by_key(|f| (f.neighbor, <[i32; 3]>::from(f.shift)));

    trace!(
        "atom {atom}: {} planes, {} vertices, {} edges",
        sites.len(),
        vertices.len(),
        edges.len()
    );

    Ok(RawCell {
        atom,
        volume: cell.volume(),
        vertices,
        edges,
        faces,
    })
}

/// Node under construction during the merge.
struct MergedNode {
    /// Fractional coordinates in `[0, 1)`.
    fractional: Vector3<f64>,
    radius: f64,
    atoms: BTreeSet<usize>,
}

struct MergedEdge {
    from: usize,
    to: usize,
    shift: Shift,
    radius: f64,
    atoms: BTreeSet<usize>,
}

/// Identifies cell vertices that coincide modulo lattice translations.
///
/// Nodes are bucketed by fractional position so a lookup only inspects the
/// neighbouring buckets, with wraparound at the cell faces.
struct VertexMerger<'a> {
    lattice: &'a Lattice,
    tolerance: f64,
    bins: [usize; 3],
    buckets: HashMap<[usize; 3], Vec<usize>>,
    nodes: Vec<MergedNode>,
}

impl<'a> VertexMerger<'a> {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn new(lattice: &'a Lattice, tolerance: f64, expected: usize) -> Self {
        let per_axis = (expected as f64).cbrt().ceil().max(1.0) as usize;
        let bins = std::array::from_fn(|axis| {
            // A bucket must be at least as wide as the tolerance along its axis
            let widest = (lattice.plane_spacing(axis) / tolerance).floor().max(1.0) as usize;
            per_axis.min(widest).clamp(1, MAX_BINS_PER_AXIS)
        });
        Self {
            lattice,
            tolerance,
            bins,
            buckets: HashMap::new(),
            nodes: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn bucket_of(&self, reduced: &Vector3<f64>) -> [usize; 3] {
        std::array::from_fn(|axis| {
            let n = self.bins[axis];
            ((reduced[axis] * n as f64) as usize).min(n - 1)
        })
    }

    fn neighbour_buckets(&self, bucket: [usize; 3]) -> Vec<[usize; 3]> {
        let around = |axis: usize| -> Vec<usize> {
            let n = self.bins[axis];
            let mut values: Vec<usize> = [n - 1, 0, 1]
                .iter()
                .map(|d| (bucket[axis] + d) % n)
                .collect();
            values.sort_unstable();
            values.dedup();
            values
        };
        let (xs, ys, zs) = (around(0), around(1), around(2));
        let mut result = Vec::with_capacity(xs.len() * ys.len() * zs.len());
        for &x in &xs {
            for &y in &ys {
                for &z in &zs {
                    result.push([x, y, z]);
                }
            }
        }
        result
    }

    /// Node id of the vertex at `position` and the lattice shift of the
    /// vertex relative to the node's canonical image.
    fn insert(&mut self, position: &Point3<f64>, radius: f64, atoms: &[usize]) -> (usize, Shift) {
        let fractional = self.lattice.to_fractional(position);
        let (reduced, wrap) = Lattice::wrap_fractional(&fractional);
        let bucket = self.bucket_of(&reduced);

        let existing = self
            .neighbour_buckets(bucket)
            .into_iter()
            .filter_map(|b| self.buckets.get(&b))
            .flatten()
            .copied()
            .filter(|&id| {
                let df = self.nodes[id].fractional - reduced;
                self.lattice.minimum_image_norm(&df) < self.tolerance
            })
            .min();

        let (id, shift) = if let Some(id) = existing {
            let shift = (fractional - self.nodes[id].fractional).map(round_to_i32);
            (id, shift)
        } else {
            let id = self.nodes.len();
            self.nodes.push(MergedNode {
                fractional: reduced,
                radius,
                atoms: BTreeSet::new(),
            });
            self.buckets.entry(bucket).or_default().push(id);
            (id, wrap)
        };

        let node = &mut self.nodes[id];
        node.radius = node.radius.min(radius);
        node.atoms.extend(atoms.iter().copied());
        (id, shift)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i32(x: f64) -> i32 {
    x.round() as i32
}

/// Merge the per-atom cells into a network, and express every cell through
/// the network's ids.
fn merge_cells(
    lattice: &Lattice,
    atom_count: usize,
    cells: &[RawCell],
    tolerance: f64,
) -> Result<(VoronoiNetwork, Vec<AtomCell>)> {
    let expected = cells.iter().map(|c| c.vertices.len()).sum::<usize>() / 4;
    let mut merger = VertexMerger::new(lattice, tolerance, expected);
    let mut edge_index: HashMap<(usize, usize, [i32; 3]), usize> = HashMap::new();
    let mut merged_edges: Vec<MergedEdge> = Vec::new();

    // Per atom: merged node ids and merged edge ids, before renumbering
    let mut memberships: Vec<(Vec<usize>, Vec<usize>)> = Vec::with_capacity(cells.len());

    for cell in cells {
        let placed: Vec<(usize, Shift)> = cell
            .vertices
            .iter()
            .map(|v| merger.insert(&v.position, v.radius, &v.atoms))
            .collect();

        let mut cell_edges = Vec::with_capacity(cell.edges.len());
        for edge in &cell.edges {
            let (from, from_shift) = placed[edge.a];
            let (to, to_shift) = placed[edge.b];
            let Some((from, to, shift)) = canonical_edge(from, to, to_shift - from_shift) else {
                continue;
            };
            let id = *edge_index
                .entry((from, to, shift.into()))
                .or_insert_with(|| {
                    merged_edges.push(MergedEdge {
                        from,
                        to,
                        shift,
                        radius: edge.radius,
                        atoms: BTreeSet::new(),
                    });
                    merged_edges.len() - 1
                });
            let merged = &mut merged_edges[id];
            merged.radius = merged.radius.min(edge.radius);
            merged.atoms.extend(edge.atoms.iter().copied());
            cell_edges.push(id);
        }

        memberships.push((placed.iter().map(|&(id, _)| id).collect(), cell_edges));
    }

    let merged_nodes = merger.nodes;
    debug!(
        "merged into {} nodes and {} edges",
        merged_nodes.len(),
        merged_edges.len()
    );

    // Canonical order: Cartesian position, then first-seen order
    let positions: Vec<Point3<f64>> = merged_nodes
        .iter()
        .map(|n| lattice.to_cartesian(&n.fractional))
        .collect();
    let mut order: Vec<usize> = (0..merged_nodes.len()).collect();
    order.sort_by(|&i, &j| {
        let (p, q) = (&positions[i], &positions[j]);
        p.x.total_cmp(&q.x)
            .then(p.y.total_cmp(&q.y))
            .then(p.z.total_cmp(&q.z))
            .then(i.cmp(&j))
    });
    let mut node_id = vec![0; merged_nodes.len()];
    for (new, &old) in order.iter().enumerate() {
        node_id[old] = new;
    }

    let nodes = order
        .iter()
        .enumerate()
        .map(|(id, &old)| {
            let merged = &merged_nodes[old];
            Ok(VoronoiNode {
                id,
                position: positions[old],
                radius: merged.radius,
                cell: BitVectorCell::from_indices(atom_count, merged.atoms.iter().copied())?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut keyed: Vec<(usize, usize, Shift, usize)> = merged_edges
        .iter()
        .enumerate()
        .filter_map(|(old, e)| {
            canonical_edge(node_id[e.from], node_id[e.to], e.shift)
                .map(|(from, to, shift)| (from, to, shift, old))
        })
        .collect();
    keyed.sort_by(|a, b| (a.0, a.1, <[i32; 3]>::from(a.2)).cmp(&(b.0, b.1, b.2.into())));

    let mut edge_id = vec![usize::MAX; merged_edges.len()];
    let mut edges = Vec::with_capacity(keyed.len());
    for (id, &(from, to, shift, old)) in keyed.iter().enumerate() {
        edge_id[old] = id;
        let merged = &merged_edges[old];
        let target = nodes[to].position + lattice.translation(&shift);
        let radius = merged
            .radius
            .min(nodes[from].radius)
            .min(nodes[to].radius);
        edges.push(VoronoiEdge {
            id,
            from,
            to,
            shift,
            radius,
            length: (target - nodes[from].position).norm(),
            cell: BitVectorCell::from_indices(atom_count, merged.atoms.iter().copied())?,
        });
    }

    let atom_cells = cells
        .iter()
        .zip(memberships)
        .map(|(cell, (cell_nodes, cell_edges))| {
            let nodes: BTreeSet<usize> = cell_nodes.into_iter().map(|n| node_id[n]).collect();
            let edges: BTreeSet<usize> = cell_edges
                .into_iter()
                .map(|e| edge_id[e])
                .filter(|&e| e != usize::MAX)
                .collect();
            AtomCell {
                atom: cell.atom,
                nodes: nodes.into_iter().collect(),
                edges: edges.into_iter().collect(),
                faces: cell.faces.clone(),
                volume: cell.volume,
            }
        })
        .collect();

    let network = VoronoiNetwork::from_parts(*lattice, atom_count, nodes, edges)?;
    Ok((network, atom_cells))
}
