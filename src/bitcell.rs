//! Fixed-width atom membership sets ("bit-vector cells") and the sources
//! that hand them out per node and edge.

use crate::error::{Error, Result};
use crate::network::AtomCell;

const WORD_BITS: usize = u64::BITS as usize;

/// Set of atom indices in `0..width`, one bit per atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitVectorCell {
    width: usize,
    words: Vec<u64>,
}

impl BitVectorCell {
    /// Empty cell able to hold indices below `width`.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            words: vec![0; width.div_ceil(WORD_BITS)],
        }
    }

    /// Cell containing the given indices.
    ///
    /// # Errors
    /// Returns [`Error::AtomIndexOutOfRange`] if an index is not below `width`.
    pub fn from_indices(width: usize, indices: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut cell = Self::new(width);
        for index in indices {
            cell.insert(index)?;
        }
        Ok(cell)
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Add an index. Returns whether it was newly inserted.
    ///
    /// # Errors
    /// Returns [`Error::AtomIndexOutOfRange`] if `index >= width`.
    pub fn insert(&mut self, index: usize) -> Result<bool> {
        if index >= self.width {
            return Err(Error::AtomIndexOutOfRange {
                index,
                width: self.width,
            });
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1u64 << (index % WORD_BITS);
        let fresh = *word & mask == 0;
        *word |= mask;
        Ok(fresh)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < self.width && self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Bitwise OR of `other` into `self`.
    ///
    /// # Errors
    /// Returns [`Error::CellWidthMismatch`] if the widths differ.
    pub fn union_with(&mut self, other: &Self) -> Result<()> {
        if self.width != other.width {
            return Err(Error::CellWidthMismatch {
                left: self.width,
                right: other.width,
            });
        }
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word |= other;
        }
        Ok(())
    }

    /// Number of atoms in the cell.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(w * WORD_BITS + bit)
            })
        })
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
}

/// Provider of the bit-vector cell of every node and edge of a network.
///
/// Implemented by [`crate::VoronoiNetwork`] for the cells cached during
/// decomposition and by [`AtomCellIndex`] for cells rebuilt from per-atom
/// Voronoi cells.
pub trait CellSource {
    /// Width of every cell handed out.
    fn atom_count(&self) -> usize;

    fn node_cell(&self, node: usize) -> Option<&BitVectorCell>;

    fn edge_cell(&self, edge: usize) -> Option<&BitVectorCell>;
}

/// Node and edge cells derived from per-atom Voronoi cells: an atom belongs
/// to a node (edge) cell when the node (edge) lies on its Voronoi cell.
#[derive(Debug, Clone)]
pub struct AtomCellIndex {
    atom_count: usize,
    node_cells: Vec<BitVectorCell>,
    edge_cells: Vec<BitVectorCell>,
}

impl AtomCellIndex {
    /// # Errors
    /// Returns [`Error::AtomIndexOutOfRange`] if a cell names an atom beyond
    /// `atom_count`, or [`Error::InvalidNetwork`] if it names a node or edge
    /// beyond the given counts.
    pub fn new(
        atom_count: usize,
        node_count: usize,
        edge_count: usize,
        cells: &[AtomCell],
    ) -> Result<Self> {
        let mut node_cells = vec![BitVectorCell::new(atom_count); node_count];
        let mut edge_cells = vec![BitVectorCell::new(atom_count); edge_count];

        for cell in cells {
            for &node in &cell.nodes {
                node_cells
                    .get_mut(node)
                    .ok_or_else(|| {
                        Error::network(format!("atom cell {} names node {node}", cell.atom))
                    })?
                    .insert(cell.atom)?;
            }
            for &edge in &cell.edges {
                edge_cells
                    .get_mut(edge)
                    .ok_or_else(|| {
                        Error::network(format!("atom cell {} names edge {edge}", cell.atom))
                    })?
                    .insert(cell.atom)?;
            }
        }

        Ok(Self {
            atom_count,
            node_cells,
            edge_cells,
        })
    }
}

impl CellSource for AtomCellIndex {
    fn atom_count(&self) -> usize {
        self.atom_count
    }

    fn node_cell(&self, node: usize) -> Option<&BitVectorCell> {
        self.node_cells.get(node)
    }

    fn edge_cell(&self, edge: usize) -> Option<&BitVectorCell> {
        self.edge_cells.get(edge)
    }
}
