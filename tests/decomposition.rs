//! Structural properties of decomposed networks.

mod common;

use common::{init_logging, irregular_structure, registry, simple_cubic_supercell};
use voidnet::{
    AtomCellIndex, CellSource, DecomposeOptions, Decomposition, Error, Lattice, decompose,
    decompose_with, find_bounding_atoms, find_channels,
};

fn with_atom_cells() -> DecomposeOptions {
    DecomposeOptions {
        atom_cells: true,
        ..DecomposeOptions::default()
    }
}

#[test]
fn decomposition_is_deterministic() {
    init_logging();
    let (registry, lattice) = irregular_structure();
    let first = decompose(&registry, &lattice).unwrap();
    let second = decompose(&registry, &lattice).unwrap();
    assert_eq!(first, second);
}

#[test]
fn network_invariants_hold() {
    let (registry, lattice) = irregular_structure();
    let network = decompose(&registry, &lattice).unwrap();
    assert_eq!(network.atom_count(), registry.len());

    let positions: Vec<_> = network.nodes().iter().map(|n| n.position).collect();
    for pair in positions.windows(2) {
        let key = |p: &nalgebra::Point3<f64>| (p.x, p.y, p.z);
        assert!(key(&pair[0]) <= key(&pair[1]));
    }
    for node in network.nodes() {
        let f = lattice.to_fractional(&node.position);
        assert!(f.iter().all(|&x| (-1e-9..1.0 + 1e-9).contains(&x)));
        assert!(!node.cell.is_empty());
        // The free sphere touches no atom more closely than its radius
        for atom in registry.iter().filter(|a| node.cell.contains(a.index)) {
            let f = lattice.to_fractional(&atom.position) - lattice.to_fractional(&node.position);
            let wrapped = f.map(|x| x - x.round());
            let distance = (lattice.matrix() * wrapped).norm() - atom.radius;
            assert!(distance >= node.radius - 1e-6);
        }
    }

    let mut previous = None;
    for edge in network.edges() {
        assert!(
            edge.from < edge.to || (edge.from == edge.to && edge.shift != voidnet::Shift::zeros())
        );
        assert!(edge.radius <= network.nodes()[edge.from].radius + 1e-12);
        assert!(edge.radius <= network.nodes()[edge.to].radius + 1e-12);
        assert!(edge.length > 0.0);
        let key = (edge.from, edge.to, <[i32; 3]>::from(edge.shift));
        if let Some(previous) = previous {
            assert!(previous < key);
        }
        previous = Some(key);
    }
}

#[test]
fn atom_cell_volumes_sum_to_lattice_volume() {
    let (registry, lattice) = irregular_structure();
    let decomposition = decompose_with(&registry, &lattice, &with_atom_cells()).unwrap();
    let cells = decomposition.atom_cells().unwrap();
    assert_eq!(cells.len(), registry.len());

    let total: f64 = cells.iter().map(|c| c.volume).sum();
    approx::assert_relative_eq!(total, lattice.volume(), max_relative = 1e-9);

    let (registry, lattice) = simple_cubic_supercell(1.5);
    let decomposition = decompose_with(&registry, &lattice, &with_atom_cells()).unwrap();
    for cell in decomposition.atom_cells().unwrap() {
        approx::assert_relative_eq!(cell.volume, 1.5f64.powi(3), epsilon = 1e-9);
        assert_eq!(cell.nodes.len(), 8);
        assert_eq!(cell.edges.len(), 12);
    }
}

#[test]
fn cell_faces_lie_on_radical_planes_and_pair_up() {
    let (registry, lattice) = irregular_structure();
    let decomposition = decompose_with(&registry, &lattice, &with_atom_cells()).unwrap();
    let cells = decomposition.atom_cells().unwrap();
    let atoms: Vec<_> = registry.iter().collect();
    let power = |p: &nalgebra::Point3<f64>, centre: &nalgebra::Point3<f64>, r: f64| {
        (p - centre).norm_squared() - r * r
    };

    for cell in cells {
        assert!(!cell.faces.is_empty());
        let own = atoms[cell.atom];
        for face in &cell.faces {
            assert!(face.area > 0.0);
            let other = atoms[face.neighbor];
            let image = other.position + lattice.translation(&face.shift);
            approx::assert_relative_eq!(
                power(&face.center, &own.position, own.radius),
                power(&face.center, &image, other.radius),
                epsilon = 1e-6
            );

            if face.area < 1e-6 {
                continue;
            }
            // The neighbour's cell has the same face, seen from the other side
            let twin = cells[face.neighbor]
                .faces
                .iter()
                .find(|f| f.neighbor == cell.atom && f.shift == -face.shift)
                .expect("shared face");
            approx::assert_relative_eq!(twin.area, face.area, max_relative = 1e-6);
            let shifted = face.center - lattice.translation(&face.shift);
            approx::assert_relative_eq!(twin.center, shifted, epsilon = 1e-6);
        }
    }
}

#[test]
fn atom_cells_give_the_same_bounding_atoms() {
    let (registry, lattice) = irregular_structure();
    let decomposition = decompose_with(&registry, &lattice, &with_atom_cells()).unwrap();
    let Decomposition::WithAtomCells {
        network,
        atom_cells,
    } = decomposition
    else {
        panic!("atom cells were requested");
    };

    let index = AtomCellIndex::new(
        network.atom_count(),
        network.nodes().len(),
        network.edges().len(),
        &atom_cells,
    )
    .unwrap();
    for node in 0..network.nodes().len() {
        assert_eq!(
            index.node_cell(node).unwrap().to_vec(),
            network.node_cell(node).unwrap().to_vec()
        );
    }

    let (channels, _) = find_channels(&network, 0.0).unwrap();
    assert!(!channels.is_empty());
    for channel in &channels {
        assert_eq!(
            find_bounding_atoms(channel, &network).unwrap(),
            find_bounding_atoms(channel, &index).unwrap()
        );
    }
}

#[test]
fn network_only_result_has_no_atom_cells() {
    let (registry, lattice) = simple_cubic_supercell(1.0);
    let decomposition = decompose_with(&registry, &lattice, &DecomposeOptions::default()).unwrap();
    assert!(matches!(decomposition, Decomposition::Network(_)));
    assert!(decomposition.atom_cells().is_none());
    let (network, cells) = decomposition.into_parts();
    assert!(cells.is_none());
    assert_eq!(network.nodes().len(), 8);
}

#[test]
fn engulfed_atom_has_an_empty_cell() {
    let lattice = Lattice::cubic(6.0).unwrap();
    let registry = registry(&[(0.0, 0.0, 0.0, 2.5), (0.3, 0.0, 0.0, 0.2)]);
    let decomposition = decompose_with(&registry, &lattice, &with_atom_cells()).unwrap();
    let cells = decomposition.atom_cells().unwrap();
    assert!(cells[1].nodes.is_empty());
    approx::assert_relative_eq!(cells[1].volume, 0.0);
    approx::assert_relative_eq!(cells[0].volume, lattice.volume(), epsilon = 1e-9);
}

#[test]
fn bad_input_is_rejected() {
    let lattice = Lattice::cubic(5.0).unwrap();
    let near = registry(&[(0.0, 0.0, 0.0, 1.0), (5.0 + 1e-6, 5.0, 0.0, 1.0)]);
    assert!(matches!(
        decompose(&near, &lattice),
        Err(Error::DegenerateInput { first: 0, second: 1, .. })
    ));

    assert!(matches!(
        Lattice::from_vectors((1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (1.0, 1.0, 0.0)),
        Err(Error::InvalidGeometry { .. })
    ));
}
