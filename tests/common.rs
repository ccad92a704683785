#![allow(dead_code)]

use nalgebra::Point3;
use voidnet::{
    AtomRegistry, BitVectorCell, Lattice, Shift, VoronoiEdge, VoronoiNetwork, VoronoiNode,
};

pub const EPSILON: f64 = 1e-9;

#[allow(unused_macros)]
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {
        approx::assert_relative_eq!($actual, $expected, epsilon = $crate::common::EPSILON)
    };
}
#[allow(unused_imports)]
pub(crate) use assert_approx;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Registry of unnamed atoms given as `(x, y, z, radius)`.
pub fn registry(atoms: &[(f64, f64, f64, f64)]) -> AtomRegistry {
    atoms
        .iter()
        .fold(AtomRegistry::builder(), |builder, &(x, y, z, r)| {
            builder.add_atom("X", Point3::new(x, y, z), Some(r))
        })
        .build()
        .expect("valid atoms")
}

/// Eight point atoms on a simple cubic grid of spacing `l`, in a cubic box
/// of edge `2l`.
pub fn simple_cubic_supercell(l: f64) -> (AtomRegistry, Lattice) {
    let mut atoms = Vec::new();
    for x in [0.0, l] {
        for y in [0.0, l] {
            for z in [0.0, l] {
                atoms.push((x, y, z, 0.0));
            }
        }
    }
    let lattice = Lattice::cubic(2.0 * l).expect("valid lattice");
    (registry(&atoms), lattice)
}

/// One point atom at the origin of an orthorhombic box.
pub fn single_atom_box(a: f64, b: f64, c: f64) -> (AtomRegistry, Lattice) {
    let lattice = Lattice::from_corners((0.0, 0.0, 0.0), (a, b, c)).expect("valid lattice");
    (registry(&[(0.0, 0.0, 0.0, 0.0)]), lattice)
}

/// A small triclinic structure with unequal radii and no symmetry.
pub fn irregular_structure() -> (AtomRegistry, Lattice) {
    let lattice =
        Lattice::from_parameters(7.2, 8.1, 6.6, 88.0, 97.0, 104.0).expect("valid lattice");
    let atoms = [
        (0.3, 0.4, 0.2, 1.2),
        (3.1, 0.9, 1.4, 0.9),
        (1.2, 4.4, 0.8, 1.5),
        (4.6, 4.1, 3.3, 1.1),
        (2.0, 2.2, 4.9, 0.7),
        (5.5, 6.8, 5.0, 1.3),
        (0.8, 6.1, 3.9, 1.0),
    ];
    (registry(&atoms), lattice)
}

/// Network assembled by hand: nodes as `(radius, atoms)`, edges as
/// `(from, to, shift, radius, atoms)`.
pub fn synthetic_network(
    atom_count: usize,
    nodes: &[(f64, &[usize])],
    edges: &[(usize, usize, [i32; 3], f64, &[usize])],
) -> VoronoiNetwork {
    let nodes = nodes
        .iter()
        .enumerate()
        .map(|(id, &(radius, atoms))| VoronoiNode {
            id,
            position: Point3::origin(),
            radius,
            cell: BitVectorCell::from_indices(atom_count, atoms.iter().copied())
                .expect("atoms in range"),
        })
        .collect();
    let edges = edges
        .iter()
        .enumerate()
        .map(|(id, &(from, to, shift, radius, atoms))| VoronoiEdge {
            id,
            from,
            to,
            shift: Shift::from(shift),
            radius,
            length: 1.0,
            cell: BitVectorCell::from_indices(atom_count, atoms.iter().copied())
                .expect("atoms in range"),
        })
        .collect();
    VoronoiNetwork::from_parts(
        Lattice::cubic(10.0).expect("valid lattice"),
        atom_count,
        nodes,
        edges,
    )
    .expect("valid network")
}
