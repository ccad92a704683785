// Copyright (c) 2026 the voidnet authors
// Part of the voidnet project, licensed under the MIT License.
// SPDX-License-Identifier: MIT

//! Element radius and mass lookup.
//!
//! Atom labels in crystal structures carry site suffixes and charges
//! (`"Si1"`, `"o2-"`); lookups strip them and try the two-letter symbol
//! before the one-letter one.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Radius and mass of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    pub radius: f64,
    pub mass: Option<f64>,
}

/// Element table keyed by symbol.
#[derive(Debug, Clone)]
pub struct ElementTable {
    entries: HashMap<String, ElementData>,
}

impl Default for ElementTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTable {
    /// Table with CCDC van der Waals radii and standard atomic weights.
    #[must_use]
    pub fn new() -> Self {
        let entries = DEFAULT_ELEMENTS
            .iter()
            .map(|&(symbol, radius, mass)| {
                (
                    symbol.to_string(),
                    ElementData {
                        radius,
                        mass: Some(mass),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Table without entries, for custom data.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace an element.
    pub fn insert(&mut self, symbol: &str, data: ElementData) {
        self.entries.insert(title_case(symbol), data);
    }

    /// Load entries from text, one per line: `Symbol radius [mass]`.
    /// Lines starting with '#' are comments.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTable`] with the 1-based line number if a line
    /// has too few fields, an unparsable number, or a negative value.
    pub fn load_from_text(&mut self, text: &str) -> Result<()> {
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = |reason: String| Error::InvalidTable {
                line: index + 1,
                reason,
            };

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 2 {
                return Err(invalid(format!("expected 'symbol radius [mass]', got '{line}'")));
            }
            if !parts[0].chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(invalid(format!("invalid element symbol '{}'", parts[0])));
            }

            let parse = |field: &str, name: &str| -> Result<f64> {
                let value: f64 = field
                    .parse()
                    .map_err(|_| invalid(format!("invalid {name} value '{field}'")))?;
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid(format!("{name} must be non-negative, got {value}")));
                }
                Ok(value)
            };

            let radius = parse(parts[1], "radius")?;
            let mass = parts.get(2).copied().map(|m| parse(m, "mass")).transpose()?;
            self.insert(parts[0], ElementData { radius, mass });
        }
        Ok(())
    }

    /// Element symbol a label refers to, if the table knows it.
    #[must_use]
    pub fn symbol_for(&self, label: &str) -> Option<String> {
        candidate_symbols(label)
            .into_iter()
            .find(|symbol| self.entries.contains_key(symbol))
    }

    /// Look up the entry for an atom label.
    #[must_use]
    pub fn lookup(&self, label: &str) -> Option<&ElementData> {
        candidate_symbols(label)
            .into_iter()
            .find_map(|symbol| self.entries.get(&symbol))
    }

    #[must_use]
    pub fn radius(&self, label: &str) -> Option<f64> {
        self.lookup(label).map(|d| d.radius)
    }

    #[must_use]
    pub fn mass(&self, label: &str) -> Option<f64> {
        self.lookup(label).and_then(|d| d.mass)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Element symbol guessed from the letters of a label, without a table.
pub(crate) fn guess_symbol(label: &str) -> String {
    candidate_symbols(label)
        .into_iter()
        .next()
        .unwrap_or_default()
}

/// Two-letter candidate first, then the one-letter one.
fn candidate_symbols(label: &str) -> Vec<String> {
    let letters: String = label
        .trim()
        .chars()
        .take_while(char::is_ascii_alphabetic)
        .take(2)
        .collect();
    match letters.len() {
        0 => Vec::new(),
        1 => vec![title_case(&letters)],
        _ => vec![title_case(&letters), title_case(&letters[..1])],
    }
}

fn title_case(symbol: &str) -> String {
    let mut chars = symbol.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
    })
}

// CCDC van der Waals radii (2.0 where none is tabulated) and standard atomic weights
const DEFAULT_ELEMENTS: &[(&str, f64, f64)] = &[
    ("H", 1.09, 1.008),
    ("He", 1.40, 4.0026),
    ("Li", 1.82, 6.94),
    ("Be", 2.00, 9.0122),
    ("B", 2.00, 10.81),
    ("C", 1.70, 12.011),
    ("N", 1.55, 14.007),
    ("O", 1.52, 15.999),
    ("F", 1.47, 18.998),
    ("Ne", 1.54, 20.180),
    ("Na", 2.27, 22.990),
    ("Mg", 1.73, 24.305),
    ("Al", 2.00, 26.982),
    ("Si", 2.10, 28.085),
    ("P", 1.80, 30.974),
    ("S", 1.80, 32.06),
    ("Cl", 1.75, 35.45),
    ("Ar", 1.88, 39.948),
    ("K", 2.75, 39.098),
    ("Ca", 2.00, 40.078),
    ("Sc", 2.00, 44.956),
    ("Ti", 2.00, 47.867),
    ("V", 2.00, 50.942),
    ("Cr", 2.00, 51.996),
    ("Mn", 2.00, 54.938),
    ("Fe", 2.00, 55.845),
    ("Co", 2.00, 58.933),
    ("Ni", 1.63, 58.693),
    ("Cu", 1.40, 63.546),
    ("Zn", 1.39, 65.38),
    ("Ga", 1.87, 69.723),
    ("Ge", 2.00, 72.630),
    ("As", 1.85, 74.922),
    ("Se", 1.90, 78.971),
    ("Br", 1.85, 79.904),
    ("Kr", 2.02, 83.798),
    ("Rb", 2.00, 85.468),
    ("Sr", 2.00, 87.62),
    ("Y", 2.00, 88.906),
    ("Zr", 2.00, 91.224),
    ("Nb", 2.00, 92.906),
    ("Mo", 2.00, 95.95),
    ("Ru", 2.00, 101.07),
    ("Rh", 2.00, 102.91),
    ("Pd", 1.63, 106.42),
    ("Ag", 1.72, 107.87),
    ("Cd", 1.58, 112.41),
    ("In", 1.93, 114.82),
    ("Sn", 2.17, 118.71),
    ("Sb", 2.00, 121.76),
    ("Te", 2.06, 127.60),
    ("I", 1.98, 126.90),
    ("Xe", 2.16, 131.29),
    ("Cs", 2.00, 132.91),
    ("Ba", 2.00, 137.33),
    ("La", 2.00, 138.91),
    ("Ce", 2.00, 140.12),
    ("W", 2.00, 183.84),
    ("Pt", 1.72, 195.08),
    ("Au", 1.66, 196.97),
    ("Hg", 1.55, 200.59),
    ("Tl", 1.96, 204.38),
    ("Pb", 2.02, 207.2),
    ("Bi", 2.00, 208.98),
    ("U", 1.86, 238.03),
];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn labels_are_normalised() {
        let table = ElementTable::new();
        assert_eq!(table.symbol_for("Si1").as_deref(), Some("Si"));
        assert_eq!(table.symbol_for("si2").as_deref(), Some("Si"));
        assert_eq!(table.symbol_for("Si2+").as_deref(), Some("Si"));
        assert_eq!(table.symbol_for("O12").as_deref(), Some("O"));
        // No "Ow" element, fall back to oxygen
        assert_eq!(table.symbol_for("Ow").as_deref(), Some("O"));
        assert_eq!(table.symbol_for("12"), None);
    }

    #[test]
    fn default_values() {
        let table = ElementTable::new();
        assert_relative_eq!(table.radius("Si").unwrap(), 2.10);
        assert_relative_eq!(table.radius("O1").unwrap(), 1.52);
        assert_relative_eq!(table.mass("Mg").unwrap(), 24.305);
        assert!(table.radius("Xx").is_none());
    }

    #[test]
    fn custom_entries() {
        let mut table = ElementTable::empty();
        assert!(table.is_empty());
        table
            .load_from_text("# custom\nSi 1.35 28.0855\n\no 1.2\n")
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.radius("Si3").unwrap(), 1.35);
        assert_relative_eq!(table.radius("O").unwrap(), 1.2);
        assert!(table.mass("O").is_none());
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let mut table = ElementTable::empty();
        let err = table.load_from_text("Si 1.0\nO\n").unwrap_err();
        assert!(matches!(err, Error::InvalidTable { line: 2, .. }));

        let err = table.load_from_text("O -1.0").unwrap_err();
        assert!(matches!(err, Error::InvalidTable { line: 1, .. }));

        let err = table.load_from_text("O 1.0 heavy").unwrap_err();
        assert!(matches!(err, Error::InvalidTable { line: 1, .. }));

        let err = table.load_from_text("1O 1.0").unwrap_err();
        assert!(matches!(err, Error::InvalidTable { line: 1, .. }));
    }
}
