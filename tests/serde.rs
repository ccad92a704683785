//! Persisting results through the optional `serde` feature.
#![cfg(feature = "serde")]

mod common;

use common::simple_cubic_supercell;
use voidnet::{ChannelSearch, ChannelOptions, VoronoiNetwork, decompose, find_channels_with};

#[test]
fn network_and_channels_survive_json() {
    let (registry, lattice) = simple_cubic_supercell(2.0);
    let network = decompose(&registry, &lattice).unwrap();
    let search = find_channels_with(&network, 0.5, &ChannelOptions::default()).unwrap();

    let json = serde_json::to_string(&network).unwrap();
    let restored: VoronoiNetwork = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, network);

    let json = serde_json::to_string(&search).unwrap();
    let restored: ChannelSearch = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.channels, search.channels);
    assert_eq!(restored.accessibility, search.accessibility);
}
