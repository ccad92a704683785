use thiserror::Error;

/// Which kind of network element a cell lookup referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Edge,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

/// Errors produced while building registries, decomposing structures and
/// analysing channels.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed lattice, non-finite coordinates or negative radii.
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// No explicit radius was given and the element table has no entry.
    #[error("no radius known for atom label '{label}'")]
    UnknownElement { label: String },

    /// Two atoms (possibly periodic images of each other) coincide.
    #[error("atoms {first} and {second} coincide (distance {distance:.3e})")]
    DegenerateInput {
        first: usize,
        second: usize,
        distance: f64,
    },

    /// The Voronoi cell of an atom could not be closed.
    #[error("Voronoi cell of atom {atom} could not be completed")]
    IncompleteCell { atom: usize },

    #[error("invalid probe radius: {0} (must be non-negative and finite)")]
    InvalidProbeRadius(f64),

    /// A network assembled from parts violates a structural invariant.
    #[error("invalid network: {reason}")]
    InvalidNetwork { reason: String },

    #[error("atom index {index} is outside a cell of width {width}")]
    AtomIndexOutOfRange { index: usize, width: usize },

    #[error("cannot combine cells of width {left} and {right}")]
    CellWidthMismatch { left: usize, right: usize },

    /// The cell source has no cell for a member of the channel.
    #[error("no bit-vector cell for {kind} {index}")]
    MissingCell { kind: ElementKind, index: usize },

    /// A channel whose cells are all empty; the network and its cells disagree.
    #[error("channel {channel} has no bounding atoms")]
    DegenerateChannel { channel: usize },

    #[error("channel detection was cancelled")]
    Cancelled,

    #[error("invalid element table entry at line {line}: {reason}")]
    InvalidTable { line: usize, reason: String },
}

impl Error {
    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }

    pub(crate) fn network(reason: impl Into<String>) -> Self {
        Self::InvalidNetwork {
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
