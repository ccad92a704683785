//! Void networks of periodic atomic structures.
//!
//! This library builds the radical (power) Voronoi network of the atoms in a
//! crystal, finds the channels a spherical probe can travel through, and
//! reports which atoms bound each channel.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use voidnet::{AtomRegistry, Lattice, decompose, find_bounding_atoms, find_channels};
//!
//! let lattice = Lattice::cubic(4.0)?;
//! let registry = AtomRegistry::builder()
//!     .add_atom("Si1", Point3::new(0.0, 0.0, 0.0), Some(1.0))
//!     .build()?;
//!
//! let network = decompose(&registry, &lattice)?;
//! let (channels, access) = find_channels(&network, 1.0)?;
//!
//! assert_eq!(channels.len(), 1);
//! assert_eq!(channels[0].dimensionality, 3);
//! assert!(access.is_accessible(0));
//!
//! for channel in &channels {
//!     let atoms = find_bounding_atoms(channel, &network)?;
//!     println!("channel {}: {} bounding atoms", channel.id, atoms.len());
//! }
//! # Ok::<(), voidnet::Error>(())
//! ```

mod bitcell;
mod bounding;
mod channels;
mod decomposition;
mod error;
mod geometry;
mod image_searcher;
mod lattice;
mod network;
mod polyhedron;
pub mod registry;
mod types;

pub use bitcell::{AtomCellIndex, BitVectorCell, CellSource};
pub use bounding::{find_all_bounding_atoms, find_bounding_atoms};
pub use channels::{
    AccessibilityInfo, AccessibilityPolicy, Channel, ChannelOptions, ChannelSearch, find_channels,
    find_channels_with,
};
pub use decomposition::{DecomposeOptions, Decomposition, decompose, decompose_with};
pub use error::{ElementKind, Error, Result};
pub use lattice::{Lattice, Shift};
pub use network::{AtomCell, CellFace, Neighbor, VoronoiEdge, VoronoiNetwork, VoronoiNode};
pub use registry::{Atom, AtomRegistry, AtomRegistryBuilder, ElementData, ElementTable};
