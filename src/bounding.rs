//! Atoms bounding a channel: the union of its node and edge cells.

use rayon::prelude::*;

use crate::bitcell::{BitVectorCell, CellSource};
use crate::channels::Channel;
use crate::error::{ElementKind, Error, Result};

/// Sorted, duplicate-free indices of the atoms bounding `channel`.
///
/// Works for pockets as well as channels.
///
/// # Errors
/// - [`Error::MissingCell`] if `cells` has no cell for a member node or edge
/// - [`Error::CellWidthMismatch`] if cells of different widths are combined
/// - [`Error::DegenerateChannel`] if the union is empty
pub fn find_bounding_atoms(channel: &Channel, cells: &impl CellSource) -> Result<Vec<usize>> {
    let mut union = BitVectorCell::new(cells.atom_count());

    for &node in &channel.nodes {
        let cell = cells.node_cell(node).ok_or(Error::MissingCell {
            kind: ElementKind::Node,
            index: node,
        })?;
        union.union_with(cell)?;
    }
    for &edge in &channel.edges {
        let cell = cells.edge_cell(edge).ok_or(Error::MissingCell {
            kind: ElementKind::Edge,
            index: edge,
        })?;
        union.union_with(cell)?;
    }

    if union.is_empty() {
        return Err(Error::DegenerateChannel {
            channel: channel.id,
        });
    }
    Ok(union.to_vec())
}

/// Bounding atoms of every channel, in channel order.
///
/// # Errors
/// The first error of [`find_bounding_atoms`] over the channels.
pub fn find_all_bounding_atoms<S>(channels: &[Channel], cells: &S) -> Result<Vec<Vec<usize>>>
where
    S: CellSource + Sync,
{
    channels
        .par_iter()
        .map(|channel| find_bounding_atoms(channel, cells))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{Lattice, Shift};
    use crate::network::{VoronoiEdge, VoronoiNetwork, VoronoiNode};
    use nalgebra::Point3;

    fn network(width: usize, node_atoms: &[&[usize]], edge_atoms: &[usize]) -> VoronoiNetwork {
        let nodes = node_atoms
            .iter()
            .enumerate()
            .map(|(id, atoms)| VoronoiNode {
                id,
                position: Point3::origin(),
                radius: 1.0,
                cell: BitVectorCell::from_indices(width, atoms.iter().copied()).unwrap(),
            })
            .collect();
        let edges = vec![VoronoiEdge {
            id: 0,
            from: 0,
            to: 1,
            shift: Shift::zeros(),
            radius: 1.0,
            length: 1.0,
            cell: BitVectorCell::from_indices(width, edge_atoms.iter().copied()).unwrap(),
        }];
        VoronoiNetwork::from_parts(Lattice::cubic(3.0).unwrap(), width, nodes, edges).unwrap()
    }

    fn channel(nodes: Vec<usize>, edges: Vec<usize>) -> Channel {
        let images = vec![Shift::zeros(); nodes.len()];
        Channel {
            id: 4,
            nodes,
            edges,
            dimensionality: 1,
            basis: vec![Shift::new(1, 0, 0)],
            images,
            largest_included_sphere: 1.0,
        }
    }

    #[test]
    fn union_of_node_and_edge_cells() {
        let network = network(70, &[&[5, 3], &[3, 69]], &[0, 5]);
        let atoms = find_bounding_atoms(&channel(vec![0, 1], vec![0]), &network).unwrap();
        assert_eq!(atoms, vec![0, 3, 5, 69]);

        // Idempotent
        let again = find_bounding_atoms(&channel(vec![0, 1], vec![0]), &network).unwrap();
        assert_eq!(atoms, again);
    }

    #[test]
    fn missing_cells_are_reported() {
        let network = network(4, &[&[0], &[1]], &[2]);
        assert!(matches!(
            find_bounding_atoms(&channel(vec![0, 7], vec![]), &network),
            Err(Error::MissingCell {
                kind: ElementKind::Node,
                index: 7
            })
        ));
        assert!(matches!(
            find_bounding_atoms(&channel(vec![0], vec![3]), &network),
            Err(Error::MissingCell {
                kind: ElementKind::Edge,
                index: 3
            })
        ));
    }

    #[test]
    fn empty_union_is_degenerate() {
        let network = network(4, &[&[], &[]], &[]);
        assert!(matches!(
            find_bounding_atoms(&channel(vec![0, 1], vec![0]), &network),
            Err(Error::DegenerateChannel { channel: 4 })
        ));
    }

    #[test]
    fn all_channels_in_order() {
        let network = network(4, &[&[0], &[1]], &[2]);
        let channels = vec![channel(vec![1], vec![]), channel(vec![0], vec![0])];
        let atoms = find_all_bounding_atoms(&channels, &network).unwrap();
        assert_eq!(atoms, vec![vec![1], vec![0, 2]]);
    }
}
