// Copyright (c) 2026 the voidnet authors
// Part of the voidnet project, licensed under the MIT License.
// SPDX-License-Identifier: MIT

//! Validated atom records for one periodic structure.
//!
//! Radii missing from the input are filled in from an [`ElementTable`];
//! masses are assigned from the table whenever it has one.

pub mod elements;

use log::debug;
use nalgebra::{Point3, Vector3};

pub use elements::{ElementData, ElementTable};

use crate::error::{Error, Result};
use crate::lattice::Lattice;

/// One atom of the structure.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    /// Position in the registry, stable for the registry's lifetime.
    pub index: usize,
    /// Type label as given, e.g. `"Si1"`.
    pub label: String,
    /// Element symbol derived from the label.
    pub element: String,
    pub position: Point3<f64>,
    pub radius: f64,
    pub mass: Option<f64>,
}

/// Immutable collection of atoms, indexed `0..len`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomRegistry {
    atoms: Vec<Atom>,
}

impl AtomRegistry {
    #[must_use]
    pub fn builder() -> AtomRegistryBuilder {
        AtomRegistryBuilder::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// Largest atom radius, 0 for an empty registry.
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.atoms.iter().map(|a| a.radius).fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a AtomRegistry {
    type Item = &'a Atom;
    type IntoIter = std::slice::Iter<'a, Atom>;

    fn into_iter(self) -> Self::IntoIter {
        self.atoms.iter()
    }
}

struct PendingAtom {
    label: String,
    position: Point3<f64>,
    radius: Option<f64>,
}

/// Collects atoms and validates them in [`AtomRegistryBuilder::build`].
#[derive(Default)]
pub struct AtomRegistryBuilder {
    table: Option<ElementTable>,
    pending: Vec<PendingAtom>,
}

impl AtomRegistryBuilder {
    /// Element table used for missing radii and for masses.
    #[must_use]
    pub fn with_table(mut self, table: ElementTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Add an atom at a Cartesian position. Without an explicit radius the
    /// element table must know the label.
    #[must_use]
    pub fn add_atom(mut self, label: &str, position: Point3<f64>, radius: Option<f64>) -> Self {
        self.pending.push(PendingAtom {
            label: label.to_string(),
            position,
            radius,
        });
        self
    }

    /// Add an atom given in fractional coordinates of `lattice`.
    #[must_use]
    pub fn add_fractional_atom(
        self,
        label: &str,
        fractional: Vector3<f64>,
        lattice: &Lattice,
        radius: Option<f64>,
    ) -> Self {
        let position = lattice.to_cartesian(&fractional);
        self.add_atom(label, position, radius)
    }

    /// Validate the collected atoms.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] for non-finite coordinates or a
    /// negative or non-finite radius, and [`Error::UnknownElement`] for an
    /// atom without radius whose label the table does not know.
    pub fn build(self) -> Result<AtomRegistry> {
        let table = self.table;
        let atoms = self
            .pending
            .into_iter()
            .enumerate()
            .map(|(index, pending)| {
                if pending.position.iter().any(|x| !x.is_finite()) {
                    return Err(Error::geometry(format!(
                        "atom {index} ('{}') has non-finite coordinates",
                        pending.label
                    )));
                }

                let data = table.as_ref().and_then(|t| t.lookup(&pending.label));
                let radius = match (pending.radius, data) {
                    (Some(r), _) => r,
                    (None, Some(d)) => d.radius,
                    (None, None) => {
                        return Err(Error::UnknownElement {
                            label: pending.label,
                        });
                    }
                };
                if !radius.is_finite() || radius < 0.0 {
                    return Err(Error::geometry(format!(
                        "atom {index} ('{}') has invalid radius {radius}",
                        pending.label
                    )));
                }

                let element = table
                    .as_ref()
                    .and_then(|t| t.symbol_for(&pending.label))
                    .unwrap_or_else(|| elements::guess_symbol(&pending.label));

                Ok(Atom {
                    index,
                    label: pending.label,
                    element,
                    position: pending.position,
                    radius,
                    mass: data.and_then(|d| d.mass),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("registry built with {} atoms", atoms.len());
        Ok(AtomRegistry { atoms })
    }
}
