//! Probe-accessible channels and pockets of a Voronoi network.
//!
//! Nodes and edges wide enough for the probe form a graph whose connected
//! components are unfolded across periodic images. A component that
//! reaches another image of itself repeats along one or more lattice
//! directions and is a channel; one that does not is a pocket.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::lattice::Shift;
use crate::network::VoronoiNetwork;

/// Which nodes count as accessible to the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessibilityPolicy {
    /// The probe fits in the node and can leave it along at least one edge.
    #[default]
    Traversable,
    /// The probe fits in the node.
    NodeRadius,
}

/// Settings for [`find_channels_with`].
#[derive(Debug, Clone, Default)]
pub struct ChannelOptions {
    pub policy: AccessibilityPolicy,
    /// Checked between components; once set the search returns
    /// [`Error::Cancelled`].
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Connected accessible region of the network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    pub id: usize,
    /// Member node ids, ascending.
    pub nodes: Vec<usize>,
    /// Member edge ids, ascending.
    pub edges: Vec<usize>,
    /// Number of independent lattice directions the region repeats along.
    pub dimensionality: usize,
    /// Independent lattice translations mapping the region onto itself.
    pub basis: Vec<Shift>,
    /// Per member node (same order as `nodes`), the image it was reached in
    /// when unfolding from the first node.
    pub images: Vec<Shift>,
    /// Radius of the largest sphere that fits at a member node.
    pub largest_included_sphere: f64,
}

impl Channel {
    /// Whether the region extends infinitely through the crystal.
    #[must_use]
    pub const fn is_periodic(&self) -> bool {
        self.dimensionality > 0
    }

    #[must_use]
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }
}

/// Per-node accessibility over the whole network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessibilityInfo {
    accessible: Vec<bool>,
    channel_of: Vec<Option<usize>>,
}

impl AccessibilityInfo {
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessible.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessible.is_empty()
    }

    /// Whether the probe can occupy `node`; `false` for unknown ids.
    #[must_use]
    pub fn is_accessible(&self, node: usize) -> bool {
        self.accessible.get(node).copied().unwrap_or(false)
    }

    /// Flags indexed by node id.
    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.accessible
    }

    /// Id of the channel containing `node`, if any.
    #[must_use]
    pub fn channel_of(&self, node: usize) -> Option<usize> {
        self.channel_of.get(node).copied().flatten()
    }

    pub fn accessible_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.accessible
            .iter()
            .enumerate()
            .filter_map(|(node, &open)| open.then_some(node))
    }
}

/// Full result of [`find_channels_with`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSearch {
    pub channels: Vec<Channel>,
    pub pockets: Vec<Channel>,
    pub accessibility: AccessibilityInfo,
}

/// Channels of `network` for a probe of radius `probe_radius`, with the
/// default options.
///
/// # Errors
/// Returns [`Error::InvalidProbeRadius`] for a negative or non-finite radius.
pub fn find_channels(
    network: &VoronoiNetwork,
    probe_radius: f64,
) -> Result<(Vec<Channel>, AccessibilityInfo)> {
    let search = find_channels_with(network, probe_radius, &ChannelOptions::default())?;
    Ok((search.channels, search.accessibility))
}

/// Channels and pockets of `network` for a probe of radius `probe_radius`.
///
/// # Errors
/// Returns [`Error::InvalidProbeRadius`] for a negative or non-finite radius
/// and [`Error::Cancelled`] if the cancel flag was raised.
pub fn find_channels_with(
    network: &VoronoiNetwork,
    probe_radius: f64,
    options: &ChannelOptions,
) -> Result<ChannelSearch> {
    if !probe_radius.is_finite() || probe_radius < 0.0 {
        return Err(Error::InvalidProbeRadius(probe_radius));
    }
    let cancelled = || {
        options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    };

    let node_open: Vec<bool> = network
        .nodes()
        .iter()
        .map(|n| n.radius >= probe_radius)
        .collect();
    let edge_open: Vec<bool> = network
        .edges()
        .iter()
        .map(|e| e.radius >= probe_radius && node_open[e.from] && node_open[e.to])
        .collect();

    let accessible: Vec<bool> = match options.policy {
        AccessibilityPolicy::NodeRadius => node_open,
        AccessibilityPolicy::Traversable => {
            let mut traversable = vec![false; node_open.len()];
            for edge in network.edges().iter().filter(|e| edge_open[e.id]) {
                traversable[edge.from] = true;
                traversable[edge.to] = true;
            }
            traversable
        }
    };

    let components = connected_components(network, &accessible, &edge_open);
    debug!(
        "probe {probe_radius}: {} accessible nodes in {} components",
        accessible.iter().filter(|&&a| a).count(),
        components.len()
    );

    let unfolded = components
        .into_par_iter()
        .map(|component| {
            if cancelled() {
                return Err(Error::Cancelled);
            }
            Ok(unfold(network, component))
        })
        .collect::<Result<Vec<_>>>()?;
    if cancelled() {
        return Err(Error::Cancelled);
    }

    let mut channel_of = vec![None; accessible.len()];
    let (mut channels, mut pockets) = (Vec::new(), Vec::new());
    for mut region in unfolded {
        if region.is_periodic() {
            region.id = channels.len();
            for &node in &region.nodes {
                channel_of[node] = Some(region.id);
            }
            channels.push(region);
        } else {
            region.id = pockets.len();
            pockets.push(region);
        }
    }

    info!(
        "probe {probe_radius}: {} channels, {} pockets",
        channels.len(),
        pockets.len()
    );

    Ok(ChannelSearch {
        channels,
        pockets,
        accessibility: AccessibilityInfo {
            accessible,
            channel_of,
        },
    })
}

/// Component of the open graph before unfolding.
struct Component {
    nodes: Vec<usize>,
    edges: Vec<usize>,
}

/// Breadth-first components over accessible nodes and open edges, seeded in
/// increasing node order.
fn connected_components(
    network: &VoronoiNetwork,
    accessible: &[bool],
    edge_open: &[bool],
) -> Vec<Component> {
    let adjacency = network.adjacency();
    let mut visited = vec![false; accessible.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for seed in 0..accessible.len() {
        if !accessible[seed] || visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        while let Some(node) = queue.pop_front() {
            nodes.push(node);
            for neighbor in &adjacency[node] {
                if !edge_open[neighbor.edge] {
                    continue;
                }
                // Each edge is seen from both ends; keep it once
                if network.edges()[neighbor.edge].from == node
                    && neighbor.shift == network.edges()[neighbor.edge].shift
                {
                    edges.push(neighbor.edge);
                }
                if !visited[neighbor.node] {
                    visited[neighbor.node] = true;
                    queue.push_back(neighbor.node);
                }
            }
        }

        nodes.sort_unstable();
        edges.sort_unstable();
        edges.dedup();
        components.push(Component { nodes, edges });
    }
    components
}

/// Assign every node of a component an image offset and collect the
/// lattice translations closed by its cycles.
fn unfold(network: &VoronoiNetwork, component: Component) -> Channel {
    let Component { nodes, edges } = component;
    let position = |node: usize| nodes.binary_search(&node).ok();

    // Local adjacency: (neighbour position, shift seen from this node)
    let mut adjacency: Vec<Vec<(usize, Shift)>> = vec![Vec::new(); nodes.len()];
    for &id in &edges {
        let edge = &network.edges()[id];
        if let (Some(from), Some(to)) = (position(edge.from), position(edge.to)) {
            adjacency[from].push((to, edge.shift));
            adjacency[to].push((from, -edge.shift));
        }
    }

    let mut offsets: Vec<Option<Shift>> = vec![None; nodes.len()];
    offsets[0] = Some(Shift::zeros());
    let mut queue = VecDeque::from([0usize]);
    while let Some(local) = queue.pop_front() {
        let Some(offset) = offsets[local] else {
            continue;
        };
        for &(neighbor, shift) in &adjacency[local] {
            if offsets[neighbor].is_none() {
                offsets[neighbor] = Some(offset + shift);
                queue.push_back(neighbor);
            }
        }
    }
    let images: Vec<Shift> = offsets
        .into_iter()
        .map(|o| o.unwrap_or_else(Shift::zeros))
        .collect();

    let mut rank = IntegerRank::default();
    let mut basis = Vec::new();
    for &id in &edges {
        let edge = &network.edges()[id];
        let (Some(from), Some(to)) = (position(edge.from), position(edge.to)) else {
            continue;
        };
        let cycle = images[from] + edge.shift - images[to];
        if cycle != Shift::zeros() && rank.insert(&cycle) {
            basis.push(cycle);
        }
    }

    let largest_included_sphere = nodes
        .iter()
        .map(|&n| network.nodes()[n].radius)
        .fold(f64::NEG_INFINITY, f64::max);

    Channel {
        id: 0,
        dimensionality: basis.len(),
        nodes,
        edges,
        basis,
        images,
        largest_included_sphere,
    }
}

/// Incremental rank of integer 3-vectors by fraction-free elimination.
#[derive(Default)]
struct IntegerRank {
    /// Rows in echelon form, sorted by pivot column.
    rows: Vec<(usize, [i64; 3])>,
}

impl IntegerRank {
    /// Add a vector; returns whether it is independent of those before.
    fn insert(&mut self, v: &Shift) -> bool {
        let mut v = [i64::from(v.x), i64::from(v.y), i64::from(v.z)];
        for &(pivot, row) in &self.rows {
            if v[pivot] != 0 {
                let (a, b) = (row[pivot], v[pivot]);
                for (x, r) in v.iter_mut().zip(row) {
                    *x = *x * a - r * b;
                }
                let g = v.iter().fold(0, |g, &x| gcd(g, x.abs()));
                if g > 1 {
                    v.iter_mut().for_each(|x| *x /= g);
                }
            }
        }
        let Some(pivot) = v.iter().position(|&x| x != 0) else {
            return false;
        };
        let at = self.rows.partition_point(|&(p, _)| p < pivot);
        self.rows.insert(at, (pivot, v));
        true
    }
}

const fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
