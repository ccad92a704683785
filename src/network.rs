//! The periodic Voronoi network: nodes, edges and their atom cells.

use std::collections::HashSet;

use nalgebra::Point3;

use crate::bitcell::{BitVectorCell, CellSource};
use crate::error::{Error, Result};
use crate::lattice::{Lattice, Shift};

/// Voronoi vertex in its canonical image (fractional coordinates in `[0, 1)`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoronoiNode {
    pub id: usize,
    pub position: Point3<f64>,
    /// Free-sphere radius; negative when the node lies inside an atom.
    pub radius: f64,
    /// Atoms bounding the node.
    pub cell: BitVectorCell,
}

/// Voronoi edge from node `from` to the image of node `to` displaced by
/// `shift` lattice translations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoronoiEdge {
    pub id: usize,
    pub from: usize,
    pub to: usize,
    pub shift: Shift,
    /// Bottleneck radius along the edge.
    pub radius: f64,
    pub length: f64,
    /// Atoms bounding the edge.
    pub cell: BitVectorCell,
}

/// Radical Voronoi cell of one atom, expressed through network ids.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomCell {
    pub atom: usize,
    /// Ids of the nodes on the cell boundary, ascending.
    pub nodes: Vec<usize>,
    /// Ids of the edges on the cell boundary, ascending.
    pub edges: Vec<usize>,
    /// Faces ordered by neighbour atom, then by image shift.
    pub faces: Vec<CellFace>,
    pub volume: f64,
}

/// Face of an atom cell shared with one neighbouring atom image.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellFace {
    pub neighbor: usize,
    /// Lattice shift of the neighbour image relative to the cell's atom.
    pub shift: Shift,
    /// Area-weighted centroid, Cartesian.
    pub center: Point3<f64>,
    pub area: f64,
}

/// Neighbour of a node through one edge, seen from that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub edge: usize,
    pub node: usize,
    /// Lattice shift of the neighbour's image relative to this node.
    pub shift: Shift,
}

/// Whether the first non-zero component of `shift` is positive.
#[inline]
pub(crate) fn is_positive(shift: &Shift) -> bool {
    shift.iter().find(|&&x| x != 0).is_some_and(|&x| x > 0)
}

/// Orient an edge so that `from < to`, or `from == to` with a positive
/// shift. Returns `None` for an edge that collapses onto a single image.
pub(crate) fn canonical_edge(from: usize, to: usize, shift: Shift) -> Option<(usize, usize, Shift)> {
    if from < to || (from == to && is_positive(&shift)) {
        Some((from, to, shift))
    } else if from > to || is_positive(&(-shift)) {
        Some((to, from, -shift))
    } else {
        None
    }
}

/// Nodes and edges of the periodic radical Voronoi diagram of a structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoronoiNetwork {
    lattice: Lattice,
    atom_count: usize,
    nodes: Vec<VoronoiNode>,
    edges: Vec<VoronoiEdge>,
}

impl VoronoiNetwork {
    /// Network without nodes or edges.
    #[must_use]
    pub const fn empty(lattice: Lattice, atom_count: usize) -> Self {
        Self {
            lattice,
            atom_count,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Assemble a network from nodes and edges, checking that ids match
    /// positions, edges reference existing nodes in canonical orientation
    /// without duplicates, and every cell has width `atom_count`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidNetwork`] describing the first violation.
    pub fn from_parts(
        lattice: Lattice,
        atom_count: usize,
        nodes: Vec<VoronoiNode>,
        edges: Vec<VoronoiEdge>,
    ) -> Result<Self> {
        for (index, node) in nodes.iter().enumerate() {
            if node.id != index {
                return Err(Error::network(format!(
                    "node at position {index} has id {}",
                    node.id
                )));
            }
            if node.cell.width() != atom_count {
                return Err(Error::network(format!(
                    "node {index} has a cell of width {}, expected {atom_count}",
                    node.cell.width()
                )));
            }
            if !node.radius.is_finite() || node.position.iter().any(|x| !x.is_finite()) {
                return Err(Error::network(format!("node {index} is not finite")));
            }
        }

        let mut seen = HashSet::with_capacity(edges.len());
        for (index, edge) in edges.iter().enumerate() {
            if edge.id != index {
                return Err(Error::network(format!(
                    "edge at position {index} has id {}",
                    edge.id
                )));
            }
            if edge.from >= nodes.len() || edge.to >= nodes.len() {
                return Err(Error::network(format!(
                    "edge {index} references node {} but only {} nodes exist",
                    edge.from.max(edge.to),
                    nodes.len()
                )));
            }
            if canonical_edge(edge.from, edge.to, edge.shift) != Some((edge.from, edge.to, edge.shift))
            {
                return Err(Error::network(format!(
                    "edge {index} ({} -> {} shift {:?}) is not canonically oriented",
                    edge.from,
                    edge.to,
                    edge.shift.as_slice()
                )));
            }
            if !seen.insert((edge.from, edge.to, edge.shift)) {
                return Err(Error::network(format!(
                    "edge {index} duplicates ({}, {}, {:?})",
                    edge.from,
                    edge.to,
                    edge.shift.as_slice()
                )));
            }
            if edge.cell.width() != atom_count {
                return Err(Error::network(format!(
                    "edge {index} has a cell of width {}, expected {atom_count}",
                    edge.cell.width()
                )));
            }
            if !edge.radius.is_finite() {
                return Err(Error::network(format!("edge {index} radius is not finite")));
            }
        }

        Ok(Self {
            lattice,
            atom_count,
            nodes,
            edges,
        })
    }

    #[inline]
    #[must_use]
    pub const fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Number of atoms the network was built from; the width of every cell.
    #[inline]
    #[must_use]
    pub const fn atom_count(&self) -> usize {
        self.atom_count
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[VoronoiNode] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[VoronoiEdge] {
        &self.edges
    }

    #[must_use]
    pub fn node(&self, id: usize) -> Option<&VoronoiNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn edge(&self, id: usize) -> Option<&VoronoiEdge> {
        self.edges.get(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Midpoint of edge `id`, next to its `from` node.
    #[must_use]
    pub fn edge_center(&self, id: usize) -> Option<Point3<f64>> {
        let edge = self.edges.get(id)?;
        let from = self.nodes[edge.from].position;
        let to = self.nodes[edge.to].position + self.lattice.translation(&edge.shift);
        Some(nalgebra::center(&from, &to))
    }

    /// Midpoints of all edges, indexed by edge id.
    #[must_use]
    pub fn edge_centers(&self) -> Vec<Point3<f64>> {
        (0..self.edges.len())
            .filter_map(|id| self.edge_center(id))
            .collect()
    }

    /// For every node, the edges leaving it. A self-loop appears twice, once
    /// in each direction.
    #[must_use]
    pub fn adjacency(&self) -> Vec<Vec<Neighbor>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.from].push(Neighbor {
                edge: edge.id,
                node: edge.to,
                shift: edge.shift,
            });
            adjacency[edge.to].push(Neighbor {
                edge: edge.id,
                node: edge.from,
                shift: -edge.shift,
            });
        }
        adjacency
    }

    /// Radius of the largest included sphere. `None` for an empty network.
    #[must_use]
    pub fn max_node_radius(&self) -> Option<f64> {
        self.nodes.iter().map(|n| n.radius).reduce(f64::max)
    }

    /// Largest edge bottleneck, the radius of the largest free sphere that
    /// can move along some edge.
    #[must_use]
    pub fn max_edge_radius(&self) -> Option<f64> {
        self.edges.iter().map(|e| e.radius).reduce(f64::max)
    }
}

impl CellSource for VoronoiNetwork {
    fn atom_count(&self) -> usize {
        self.atom_count
    }

    fn node_cell(&self, node: usize) -> Option<&BitVectorCell> {
        self.nodes.get(node).map(|n| &n.cell)
    }

    fn edge_cell(&self, edge: usize) -> Option<&BitVectorCell> {
        self.edges.get(edge).map(|e| &e.cell)
    }
}
