//! Registry to bounding atoms on structures with known answers.

mod common;

use common::{assert_approx, init_logging, simple_cubic_supercell, single_atom_box};
use voidnet::{Shift, decompose, find_bounding_atoms, find_channels};

#[test]
fn simple_cubic_supercell_has_one_3d_channel() {
    init_logging();
    let l = 2.0;
    let (registry, lattice) = simple_cubic_supercell(l);
    let network = decompose(&registry, &lattice).unwrap();

    assert_eq!(network.nodes().len(), 8);
    assert_eq!(network.edges().len(), 24);
    for node in network.nodes() {
        assert_approx!(node.radius, l * 3f64.sqrt() / 2.0);
        assert_eq!(node.cell.len(), 8);
    }
    for edge in network.edges() {
        assert_approx!(edge.radius, l / 2f64.sqrt());
        assert_approx!(edge.length, l);
        assert_eq!(edge.cell.len(), 4);
    }

    let (channels, access) = find_channels(&network, 0.9 * l / 2.0).unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].dimensionality, 3);
    assert_eq!(channels[0].nodes, (0..8).collect::<Vec<_>>());
    assert_eq!(channels[0].edges.len(), 24);
    assert!(access.flags().iter().all(|&a| a));

    let atoms = find_bounding_atoms(&channels[0], &network).unwrap();
    assert_eq!(atoms, (0..8).collect::<Vec<_>>());
}

#[test]
fn probe_larger_than_every_bottleneck_finds_nothing() {
    let (registry, lattice) = simple_cubic_supercell(2.0);
    let network = decompose(&registry, &lattice).unwrap();

    let (channels, access) = find_channels(&network, 10.0).unwrap();
    assert!(channels.is_empty());
    assert_eq!(access.len(), network.nodes().len());
    assert_eq!(access.accessible_nodes().count(), 0);

    // Fits in the nodes but not through any edge
    let (channels, access) = find_channels(&network, 1.5).unwrap();
    assert!(channels.is_empty());
    assert_eq!(access.accessible_nodes().count(), 0);
}

#[test]
fn elongated_box_gives_layer() {
    let (registry, lattice) = single_atom_box(1.0, 1.0, 3.0);
    let network = decompose(&registry, &lattice).unwrap();
    assert_eq!(network.nodes().len(), 1);
    assert_eq!(network.edges().len(), 3);

    let (channels, _) = find_channels(&network, 1.0).unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].dimensionality, 2);
    assert!(!channels[0].basis.contains(&Shift::new(0, 0, 1)));

    let (channels, _) = find_channels(&network, 0.5).unwrap();
    assert_eq!(channels[0].dimensionality, 3);
}

#[test]
fn flattened_box_gives_tunnel() {
    let (registry, lattice) = single_atom_box(1.0, 3.0, 3.0);
    let network = decompose(&registry, &lattice).unwrap();
    let x_edge = network
        .edges()
        .iter()
        .find(|e| e.shift == Shift::new(1, 0, 0))
        .unwrap();
    assert_approx!(x_edge.radius, 4.5f64.sqrt());

    let (channels, access) = find_channels(&network, 2.0).unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].dimensionality, 1);
    assert_eq!(channels[0].basis, vec![Shift::new(1, 0, 0)]);
    assert!(access.is_accessible(0));
    assert_approx!(channels[0].largest_included_sphere, 4.75f64.sqrt());

    let atoms = find_bounding_atoms(&channels[0], &network).unwrap();
    assert_eq!(atoms, vec![0]);
}
