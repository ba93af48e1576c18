// ManetSim: Simulating On-Demand Routing in Dynamic Wireless Networks
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Topology manager: the half of [`Network`] that builds the random
//! topology and keeps it in one connected piece. Bridging disconnected
//! parts by widening transmission ranges is a simulation convenience, not a
//! protocol behavior, which is why none of this lives anywhere near the
//! routing code.

use crate::netsim::network::Network;
use crate::netsim::types::NodeId;

use itertools::{iproduct, Itertools};
use log::*;
use rand::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

impl Network {
    /// Check whether the topology forms a single connected component, by a
    /// breadth-first search from the lowest node id. An empty network counts
    /// as connected.
    pub fn is_connected(&self) -> bool {
        let start = match self.get_nodes().into_iter().next() {
            Some(start) => start,
            None => return true,
        };
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors(current) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        visited.len() == self.nodes.len()
    }

    /// Install the initial links of a freshly generated topology: every
    /// pair of nodes where at least one endpoint's transmission range covers
    /// the distance gets a link with a uniform random delay in `(0, 1)`.
    pub(crate) fn generate_links(&mut self) {
        let pairs: Vec<(NodeId, NodeId)> =
            self.get_nodes().into_iter().tuple_combinations().collect();
        for (a, b) in pairs {
            let reachable = {
                let na = &self.nodes[&a];
                let nb = &self.nodes[&b];
                na.can_reach(nb) || nb.can_reach(na)
            };
            if reachable {
                let delay = self.rng.gen_range(0.0, 1.0);
                self.graph.add_edge(a, b, delay);
            }
        }
    }

    /// Attach every node without a single link to its closest already
    /// connected node (falling back to the closest other orphan when the
    /// whole network is orphans). Repeats until no orphan is left or no
    /// candidate can be found.
    pub(crate) fn connect_isolated_nodes(&mut self) {
        loop {
            let isolated: Vec<NodeId> = self
                .get_nodes()
                .into_iter()
                .filter(|id| self.graph.neighbors(*id).next().is_none())
                .collect();
            if isolated.is_empty() {
                return;
            }
            debug!("Found {} isolated nodes, attaching them", isolated.len());
            let mut progress = false;
            for orphan in isolated.iter().copied() {
                if self.graph.neighbors(orphan).next().is_some() {
                    // attached earlier in this pass
                    continue;
                }
                let connected: Vec<NodeId> = self
                    .get_nodes()
                    .into_iter()
                    .filter(|id| *id != orphan && self.graph.neighbors(*id).next().is_some())
                    .collect();
                let pool = if connected.is_empty() {
                    isolated.iter().copied().filter(|id| *id != orphan).collect()
                } else {
                    connected
                };
                match self.closest_to(orphan, &pool) {
                    Some(target) => {
                        self.bridge(orphan, target);
                        progress = true;
                    }
                    None => {
                        warn!("No candidate found to attach node {} to", orphan.index());
                    }
                }
            }
            if !progress {
                return;
            }
        }
    }

    /// Make the network one connected component: bridge the closest node
    /// pair of every adjacent pair of components (in index order), then fall
    /// back to bridging all component pairs if that was not enough.
    pub(crate) fn ensure_connected(&mut self) {
        if self.is_connected() {
            return;
        }
        let components = self.components();
        debug!("Found {} disconnected components", components.len());
        for i in 0..components.len() - 1 {
            if let Some((a, b)) = self.closest_pair(&components[i], &components[i + 1]) {
                self.bridge(a, b);
            }
        }
        if !self.is_connected() {
            self.connect_all_components();
        }
    }

    /// Restore connectivity after a link removal: first re-attach orphans,
    /// then bridge the remaining components.
    pub(crate) fn restore_connectivity(&mut self) {
        self.connect_isolated_nodes();
        self.ensure_connected();
    }

    /// Bridge the closest node pair of every pair of components. This always
    /// succeeds in connecting the network unless closest pairs cannot be
    /// computed at all.
    fn connect_all_components(&mut self) {
        debug!("Bridging every pair of components");
        let components = self.components();
        let pairs: Vec<(usize, usize)> = (0..components.len()).tuple_combinations().collect();
        for (i, j) in pairs {
            if let Some((a, b)) = self.closest_pair(&components[i], &components[j]) {
                if self.graph.find_edge(a, b).is_none() {
                    self.bridge(a, b);
                }
            }
        }
        if !self.is_connected() {
            warn!("Network is still not fully connected after bridging all components");
        }
    }

    /// Enumerate the connected components by depth-first search, in
    /// ascending order of their lowest node id. Every component is sorted.
    fn components(&self) -> Vec<Vec<NodeId>> {
        let mut components: Vec<Vec<NodeId>> = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        for start in self.get_nodes() {
            if visited.contains(&start) {
                continue;
            }
            let mut component: Vec<NodeId> = Vec::new();
            let mut stack: Vec<NodeId> = vec![start];
            while let Some(current) = stack.pop() {
                if !visited.insert(current) {
                    continue;
                }
                component.push(current);
                for neighbor in self.graph.neighbors(current) {
                    if !visited.contains(&neighbor) {
                        stack.push(neighbor);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// The node of `pool` closest to `id` by Euclidean distance.
    fn closest_to(&self, id: NodeId, pool: &[NodeId]) -> Option<NodeId> {
        let node = &self.nodes[&id];
        pool.iter().copied().min_by(|a, b| {
            let da = node.distance_to(&self.nodes[a]);
            let db = node.distance_to(&self.nodes[b]);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        })
    }

    /// The closest cross pair between two components.
    fn closest_pair(&self, comp_a: &[NodeId], comp_b: &[NodeId]) -> Option<(NodeId, NodeId)> {
        iproduct!(comp_a.iter().copied(), comp_b.iter().copied()).min_by(|x, y| {
            let dx = self.pair_distance(*x);
            let dy = self.pair_distance(*y);
            dx.partial_cmp(&dy).unwrap_or(Ordering::Equal)
        })
    }

    fn pair_distance(&self, (a, b): (NodeId, NodeId)) -> f64 {
        self.nodes[&a].distance_to(&self.nodes[&b])
    }

    /// Link two nodes with a uniform random delay, widening both
    /// transmission ranges to 1.1 times their distance where needed so the
    /// link is physically plausible.
    fn bridge(&mut self, a: NodeId, b: NodeId) {
        let distance = self.pair_distance((a, b));
        let widened = distance * 1.1;
        if let Some(node) = self.nodes.get_mut(&a) {
            node.widen_range(widened);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.widen_range(widened);
        }
        let delay = self.rng.gen_range(0.0, 1.0);
        debug!(
            "Bridging node {} to node {} (distance {:.2}, delay {:.3})",
            a.index(),
            b.index(),
            distance,
            delay
        );
        self.graph.add_edge(a, b, delay);
    }
}
