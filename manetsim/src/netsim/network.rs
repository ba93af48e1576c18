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

//! # Top-level Network module
//!
//! This module represents the wireless topology, owns every node, and drives
//! all packet exchanges between them.

use crate::netsim::node::{link_cost, Node, RreqAction};
use crate::netsim::packet::{DataPacket, DispatchQueue, Packet, Rerr, Rrep, Rreq};
use crate::netsim::stats::{MessageStats, NetworkStats};
use crate::netsim::types::{LinkGraph, LinkWeight, NetworkError, NodeId};

use itertools::Itertools;
use log::*;
use petgraph::algo::astar;
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::{BTreeSet, HashMap};

static DEFAULT_HOP_CAP: u32 = 40;

/// Result of a successful end-to-end data transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct Transmission {
    /// Every node the packet visited, starting at the source and ending at
    /// the destination
    pub path: Vec<NodeId>,
    /// Number of links travelled
    pub hops: u32,
    /// Accumulated delay of the travelled links
    pub cost: LinkWeight,
}

/// # Network struct
///
/// The struct contains the underlying wireless topology (an undirected,
/// delay-annotated link graph), owns all nodes, and handles every packet
/// exchanged between them. Execution is single-threaded and event-driven:
/// the only deferred-delivery mechanism is the FIFO dispatch queue, which
/// carries route-request floods and is drained to fixpoint inside
/// [`Network::route_discovery`]. Route replies, route errors and data
/// packets are delivered as synchronous call chains. Because the queue is
/// FIFO and every forwarder enqueues at the tail, the request flood
/// traverses the network breadth-first in hop count.
///
/// All randomness (topology bootstrap, bridge delays, scenario driving)
/// flows through a single PRNG owned by the network and seeded at
/// construction, so a run is fully reproducible from its seed.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) graph: LinkGraph,
    pub(crate) nodes: HashMap<NodeId, Node>,
    queue: DispatchQueue,
    pub(crate) rng: StdRng,
    hop_cap: u32,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Generate an empty Network
    pub fn new() -> Self {
        Self {
            graph: LinkGraph::default(),
            nodes: HashMap::new(),
            queue: DispatchQueue::new(),
            rng: StdRng::seed_from_u64(0),
            hop_cap: DEFAULT_HOP_CAP,
        }
    }

    /// Generate a random network of `n` nodes with uniform positions in a
    /// square area and uniform transmission ranges, deterministic in `seed`.
    /// Any pair of nodes where at least one endpoint's range covers the
    /// other is linked with a uniform random delay in `(0, 1)`. The
    /// resulting graph has no isolated nodes and forms a single connected
    /// component: orphans and disconnected components are attached by
    /// linking the closest cross pairs, widening their transmission ranges
    /// where needed.
    pub fn create_random(
        n: usize,
        seed: u64,
        area_size: f64,
        min_range: f64,
        max_range: f64,
    ) -> Self {
        let mut net = Self::new();
        net.rng = StdRng::seed_from_u64(seed);
        info!("Creating random network with {} nodes (seed {})", n, seed);
        for _ in 0..n {
            let x = net.rng.gen_range(0.0, area_size);
            let y = net.rng.gen_range(0.0, area_size);
            let range = net.rng.gen_range(min_range, max_range);
            net.add_node(x, y, range);
        }
        net.generate_links();
        net.connect_isolated_nodes();
        net.ensure_connected();
        net
    }

    /// Add a new node at the given position to the topology. This function
    /// returns the ID of the node, which can be used to reference it in all
    /// other operations. Nodes are never removed, so the IDs stay dense.
    pub fn add_node(&mut self, x: f64, y: f64, transmission_range: f64) -> NodeId {
        let node_id = self.graph.add_node(());
        self.nodes.insert(node_id, Node::new(node_id, x, y, transmission_range));
        node_id
    }

    /// Returns the number of nodes in the topology
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns a reference to a node.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns all node IDs in ascending order
    pub fn get_nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().sorted().collect()
    }

    /// Add a symmetric link between two nodes with the given delay. Does
    /// nothing if the link already exists, if both endpoints are the same
    /// node, or if either endpoint is unknown.
    pub fn add_link(&mut self, a: NodeId, b: NodeId, delay: LinkWeight) {
        if a == b || !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
            return;
        }
        if self.graph.find_edge(a, b).is_some() {
            return;
        }
        debug!("Adding link {} -- {} (delay {:.3})", a.index(), b.index(), delay);
        self.graph.add_edge(a, b, delay);
    }

    /// Remove the link between two nodes. If the removal splits the graph,
    /// connectivity is restored right away by bridging the closest nodes of
    /// the separated parts (see the topology manager).
    pub fn remove_link(&mut self, a: NodeId, b: NodeId) {
        if let Some(edge) = self.graph.find_edge(a, b) {
            self.graph.remove_edge(edge);
            debug!("Removed link {} -- {}", a.index(), b.index());
            if !self.is_connected() {
                debug!("Network disconnected after removing {} -- {}", a.index(), b.index());
                self.restore_connectivity();
            }
        }
    }

    /// Symmetric membership test for a link.
    pub fn link_exists(&self, a: NodeId, b: NodeId) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    /// Delay of the link between two nodes, or infinite if no link exists.
    pub fn get_link_cost(&self, a: NodeId, b: NodeId) -> LinkWeight {
        link_cost(&self.graph, a, b)
    }

    /// Returns every undirected link exactly once as `(a, b, delay)` with
    /// `a < b`, sorted by endpoints.
    pub fn get_all_links(&self) -> Vec<(NodeId, NodeId, LinkWeight)> {
        let mut links: Vec<(NodeId, NodeId, LinkWeight)> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = self.graph.edge_endpoints(e)?;
                let weight = *self.graph.edge_weight(e)?;
                Some(if a < b { (a, b, weight) } else { (b, a, weight) })
            })
            .collect();
        links.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        links
    }

    /// Returns every currently unconnected pair of nodes that is within
    /// transmission reach (of at least one endpoint), as `(a, b)` with
    /// `a < b`. These are the candidate locations for new links.
    pub fn get_unconnected_pairs(&self) -> Vec<(NodeId, NodeId)> {
        self.get_nodes()
            .into_iter()
            .tuple_combinations()
            .filter(|(a, b)| self.graph.find_edge(*a, *b).is_none())
            .filter(|(a, b)| {
                let na = &self.nodes[a];
                let nb = &self.nodes[b];
                na.can_reach(nb) || nb.can_reach(na)
            })
            .collect()
    }

    /// Returns the adjacency matrix of the topology with delays as weights,
    /// `0` on the diagonal and infinity for absent links.
    pub fn adjacency_matrix(&self) -> Vec<Vec<LinkWeight>> {
        let n = self.nodes.len();
        let mut matrix = vec![vec![f64::INFINITY; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        for (a, b, delay) in self.get_all_links() {
            matrix[a.index()][b.index()] = delay;
            matrix[b.index()][a.index()] = delay;
        }
        matrix
    }

    /// Returns the minimum-cost path between two nodes on the current
    /// topology, together with its cost. This is the reference optimum to
    /// compare discovered routes against; the routing protocol itself
    /// prefers fresh routes over cheap ones and may settle on a different
    /// path.
    pub fn shortest_path(&self, src: NodeId, dst: NodeId) -> Option<(Vec<NodeId>, LinkWeight)> {
        astar(&self.graph, src, |n| n == dst, |e| *e.weight(), |_| 0.0)
            .map(|(cost, path)| (path, cost))
    }

    /// Configure the hop cap for data forwarding. The cap is a diagnostic
    /// safeguard: loop detection should stop any cycle long before, so
    /// breaching the cap fails the run with
    /// [`NetworkError::HopCapExceeded`].
    pub fn set_hop_cap(&mut self, hop_cap: u32) {
        self.hop_cap = hop_cap;
    }

    /// Initiate a route discovery from `src` towards `dst` and process the
    /// resulting flood until the network is quiet again. The request is
    /// enqueued to every neighbor of the originator and the dispatch queue
    /// is drained to fixpoint; replies and errors triggered along the way
    /// are delivered synchronously.
    pub fn route_discovery(&mut self, src: NodeId, dst: NodeId) -> Result<(), NetworkError> {
        if !self.nodes.contains_key(&dst) {
            return Err(NetworkError::NodeNotFound(dst));
        }
        if src == dst {
            return Ok(());
        }
        let rreq = self
            .nodes
            .get_mut(&src)
            .ok_or(NetworkError::NodeNotFound(src))?
            .originate_rreq(dst);
        debug!(
            "Node {}: route discovery for {} (broadcast id {})",
            src.index(),
            dst.index(),
            rreq.broadcast_id
        );
        let neighbors: Vec<NodeId> = self.graph.neighbors(src).collect();
        for neighbor in neighbors {
            self.queue.push_back((neighbor, Packet::Rreq(rreq.clone()), src));
        }
        self.do_queue()
    }

    /// Seed one-hop routes on a single node: for every neighbor without a
    /// routing entry, originate a request targeted directly at that
    /// neighbor, which answers immediately with a reply. Both endpoints end
    /// up with a route to each other.
    pub fn discover_neighbors(&mut self, id: NodeId) -> Result<(), NetworkError> {
        let neighbors: Vec<NodeId> = self.graph.neighbors(id).collect();
        for neighbor in neighbors {
            let node = self.nodes.get_mut(&id).ok_or(NetworkError::NodeNotFound(id))?;
            if node.routing_table.get(neighbor).is_some() {
                continue;
            }
            let rreq = node.originate_rreq(neighbor);
            self.queue.push_back((neighbor, Packet::Rreq(rreq), id));
            self.do_queue()?;
        }
        Ok(())
    }

    /// Run [`Network::discover_neighbors`] on every node, bootstrapping the
    /// direct-neighbor routes of the whole network.
    pub fn neighbor_discovery(&mut self) -> Result<(), NetworkError> {
        for id in self.get_nodes() {
            self.discover_neighbors(id)?;
        }
        Ok(())
    }

    /// Check whether `src` holds a usable route towards `dst`: an entry
    /// whose next-hop link is alive. If the entry exists but its link died,
    /// every route through that dead neighbor is invalidated, a route error
    /// naming the lost destinations is flooded, and `false` is returned.
    pub fn can_send(&mut self, src: NodeId, dst: NodeId) -> Result<bool, NetworkError> {
        let next_hop = match self.nodes.get(&src).and_then(|n| n.routing_table.get(dst)) {
            Some(entry) => entry.next_hop,
            None => return Ok(false),
        };
        if self.graph.find_edge(src, next_hop).is_some() {
            return Ok(true);
        }
        debug!(
            "Node {}: next hop {} towards {} lost its link",
            src.index(),
            next_hop.index(),
            dst.index()
        );
        let lost: BTreeSet<NodeId> = self
            .nodes
            .get_mut(&src)
            .ok_or(NetworkError::NodeNotFound(src))?
            .routing_table
            .remove_via(next_hop)
            .into_iter()
            .collect();
        self.send_rerr(src, lost)?;
        Ok(false)
    }

    /// Simulate an end-to-end data transmission from `src` to `dst`. If the
    /// source holds a usable route, the packet is sent directly; otherwise
    /// one route discovery is run and the send is retried exactly once.
    /// Returns `Ok(None)` if no route could be found, if the packet was
    /// dropped along the way (broken link or loop, with the corresponding
    /// route error emitted), or if `src == dst`.
    pub fn simulate_transmission(
        &mut self,
        src: NodeId,
        dst: NodeId,
        payload: impl Into<String>,
    ) -> Result<Option<Transmission>, NetworkError> {
        if !self.nodes.contains_key(&src) {
            return Err(NetworkError::NodeNotFound(src));
        }
        if !self.nodes.contains_key(&dst) {
            return Err(NetworkError::NodeNotFound(dst));
        }
        if src == dst {
            return Ok(None);
        }
        if !self.can_send(src, dst)? {
            debug!(
                "Node {}: no usable route towards {}, starting route discovery",
                src.index(),
                dst.index()
            );
            self.route_discovery(src, dst)?;
            if !self.can_send(src, dst)? {
                debug!("Node {}: no route towards {} after discovery", src.index(), dst.index());
                return Ok(None);
            }
        }
        self.send_msg(src, dst, payload.into())
    }

    /// Aggregate the per-node message counters into network-wide statistics.
    pub fn stats(&self) -> NetworkStats {
        let mut counters = MessageStats::default();
        for node in self.nodes.values() {
            counters.add(&node.stats);
        }
        NetworkStats::from_counters(counters)
    }

    /// Drop all routing state, counters and suppression sets of every node,
    /// keeping the topology untouched. Used to run independent experiments
    /// on the same network.
    pub fn reset_protocol_state(&mut self) {
        self.queue.clear();
        for node in self.nodes.values_mut() {
            node.reset();
        }
    }

    // ********************
    // * Packet exchange  *
    // ********************

    /// Execute the queue until it is empty.
    fn do_queue(&mut self) -> Result<(), NetworkError> {
        while self.do_queue_step()? {}
        Ok(())
    }

    /// Executes one single step. If the result is Ok(true), then a step was
    /// successfully executed. If the result is Ok(false), then there was no
    /// pending delivery in the queue.
    fn do_queue_step(&mut self) -> Result<bool, NetworkError> {
        if let Some((receiver, packet, forwarder)) = self.queue.pop_front() {
            self.deliver(receiver, packet, forwarder)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Deliver a single packet, dispatching on the variant. This is the one
    /// funnel all deliveries go through, whether they come off the dispatch
    /// queue (request floods) or from a synchronous chain (replies, errors,
    /// data). Only data packets produce a value: the transmission report
    /// when they reach their destination.
    fn deliver(
        &mut self,
        receiver: NodeId,
        packet: Packet,
        forwarder: NodeId,
    ) -> Result<Option<Transmission>, NetworkError> {
        match packet {
            Packet::Rreq(rreq) => {
                self.receive_rreq(receiver, rreq, forwarder)?;
                Ok(None)
            }
            Packet::Rrep(rrep) => {
                self.receive_rrep(receiver, rrep, forwarder)?;
                Ok(None)
            }
            Packet::Rerr(rerr) => {
                self.receive_rerr(receiver, rerr, forwarder)?;
                Ok(None)
            }
            Packet::Data(msg) => self.receive_data(receiver, msg, forwarder),
        }
    }

    /// Let a node process a route request. Replies start the unicast chain
    /// back along the reverse path; forwarded copies are enqueued to every
    /// neighbor except the one the request came from.
    fn receive_rreq(
        &mut self,
        receiver: NodeId,
        rreq: Rreq,
        forwarder: NodeId,
    ) -> Result<(), NetworkError> {
        let action = self
            .nodes
            .get_mut(&receiver)
            .ok_or(NetworkError::NodeNotFound(receiver))?
            .handle_rreq(&rreq, forwarder, &self.graph);
        match action {
            RreqAction::Drop => Ok(()),
            RreqAction::Reply(rrep) => self.send_rrep(receiver, rrep),
            RreqAction::Forward(forwarded) => {
                let neighbors: Vec<NodeId> =
                    self.graph.neighbors(receiver).filter(|n| *n != forwarder).collect();
                for neighbor in neighbors {
                    self.queue.push_back((neighbor, Packet::Rreq(forwarded.clone()), receiver));
                }
                Ok(())
            }
        }
    }

    /// Emit a route reply from `origin` towards its destination, using the
    /// reverse-path entry the request flood installed moments ago. If that
    /// entry is gone the reply is silently lost.
    fn send_rrep(&mut self, origin: NodeId, rrep: Rrep) -> Result<(), NetworkError> {
        let node = self.nodes.get_mut(&origin).ok_or(NetworkError::NodeNotFound(origin))?;
        let next_hop = match node.routing_table.get(rrep.dest) {
            Some(entry) => entry.next_hop,
            None => {
                debug!(
                    "Node {}: no route back to {}, RREP not sent",
                    origin.index(),
                    rrep.dest.index()
                );
                return Ok(());
            }
        };
        node.stats.rrep_sent += 1;
        trace!(
            "Node {}: RREP for {} towards {} via {}",
            origin.index(),
            rrep.originator.index(),
            rrep.dest.index(),
            next_hop.index()
        );
        self.deliver(next_hop, Packet::Rrep(rrep), origin).map(|_| ())
    }

    /// Let a node process a route reply and forward it along the reverse
    /// path until it reaches the request originator.
    fn receive_rrep(
        &mut self,
        receiver: NodeId,
        mut rrep: Rrep,
        forwarder: NodeId,
    ) -> Result<(), NetworkError> {
        let next = self
            .nodes
            .get_mut(&receiver)
            .ok_or(NetworkError::NodeNotFound(receiver))?
            .handle_rrep(&mut rrep, forwarder, &self.graph);
        if let Some(next_hop) = next {
            self.deliver(next_hop, Packet::Rrep(rrep), receiver)?;
        }
        Ok(())
    }

    /// Flood a route error from `origin` to every neighbor. The flood is a
    /// synchronous depth-first tree rooted at the detector, pruned by each
    /// node's duplicate suppression.
    pub(crate) fn send_rerr(
        &mut self,
        origin: NodeId,
        unreachable: BTreeSet<NodeId>,
    ) -> Result<(), NetworkError> {
        if unreachable.is_empty() {
            return Ok(());
        }
        let rerr = Rerr { unreachable };
        debug!(
            "Node {}: RERR for {:?}",
            origin.index(),
            rerr.identity().iter().map(|n| n.index()).collect::<Vec<_>>()
        );
        self.nodes
            .get_mut(&origin)
            .ok_or(NetworkError::NodeNotFound(origin))?
            .note_rerr_sent(&rerr);
        let neighbors: Vec<NodeId> = self.graph.neighbors(origin).collect();
        for neighbor in neighbors {
            self.deliver(neighbor, Packet::Rerr(rerr.clone()), origin)?;
        }
        Ok(())
    }

    /// Let a node process a route error and forward it to all neighbors
    /// except the one it came from, unless it was already seen.
    fn receive_rerr(
        &mut self,
        receiver: NodeId,
        rerr: Rerr,
        forwarder: NodeId,
    ) -> Result<(), NetworkError> {
        let forward = self
            .nodes
            .get_mut(&receiver)
            .ok_or(NetworkError::NodeNotFound(receiver))?
            .handle_rerr(&rerr);
        if forward {
            let neighbors: Vec<NodeId> =
                self.graph.neighbors(receiver).filter(|n| *n != forwarder).collect();
            for neighbor in neighbors {
                self.deliver(neighbor, Packet::Rerr(rerr.clone()), receiver)?;
            }
        }
        Ok(())
    }

    /// Originate a data packet at `src`. The caller has verified that a
    /// usable route exists.
    fn send_msg(
        &mut self,
        src: NodeId,
        dst: NodeId,
        payload: String,
    ) -> Result<Option<Transmission>, NetworkError> {
        let node = self.nodes.get_mut(&src).ok_or(NetworkError::NodeNotFound(src))?;
        let next_hop = match node.routing_table.get(dst) {
            Some(entry) => entry.next_hop,
            None => return Ok(None),
        };
        node.stats.data_sent += 1;
        let msg = DataPacket { src, dst, payload, hops: 0, cost: 0.0, path: vec![src] };
        self.deliver(next_hop, Packet::Data(msg), src)
    }

    /// Let a node process a data packet: charge the incoming link, detect
    /// routing loops, consume the packet if it arrived, or forward it to the
    /// next hop (discovering a route on demand). Broken next hops and loops
    /// invalidate the offending routes, flood a route error, and drop the
    /// packet.
    fn receive_data(
        &mut self,
        receiver: NodeId,
        mut msg: DataPacket,
        forwarder: NodeId,
    ) -> Result<Option<Transmission>, NetworkError> {
        let dst = msg.dst;
        msg.path.push(receiver);
        msg.hops += 1;
        msg.cost += link_cost(&self.graph, receiver, forwarder);

        if msg.hops > self.hop_cap {
            error!("Hop cap ({}) exceeded! path: {:?}", self.hop_cap, msg.path);
            return Err(NetworkError::HopCapExceeded(msg.path));
        }

        // loop detection: a stale route pointing back into the travelled
        // path would cycle forever
        let looping_next = self
            .nodes
            .get(&receiver)
            .and_then(|n| n.routing_table.get(dst))
            .map(|e| e.next_hop)
            .filter(|next_hop| msg.path.contains(next_hop));
        if let Some(next_hop) = looping_next {
            debug!(
                "Node {}: next hop {} already on path, invalidating route to {}",
                receiver.index(),
                next_hop.index(),
                dst.index()
            );
            if let Some(node) = self.nodes.get_mut(&receiver) {
                node.routing_table.remove(dst);
            }
            let mut unreachable = BTreeSet::new();
            unreachable.insert(dst);
            self.send_rerr(receiver, unreachable)?;
            if receiver == msg.src {
                self.route_discovery(receiver, dst)?;
            }
            return Ok(None);
        }

        if receiver == dst {
            let report = Transmission { path: msg.path.clone(), hops: msg.hops, cost: msg.cost };
            self.nodes
                .get_mut(&receiver)
                .ok_or(NetworkError::NodeNotFound(receiver))?
                .record_receipt(msg);
            debug!(
                "Node {}: received data from {} after {} hops",
                receiver.index(),
                report.path[0].index(),
                report.hops
            );
            return Ok(Some(report));
        }

        // make sure a route exists, discovering on demand
        if self
            .nodes
            .get(&receiver)
            .ok_or(NetworkError::NodeNotFound(receiver))?
            .routing_table
            .get(dst)
            .is_none()
        {
            self.route_discovery(receiver, dst)?;
        }
        let next_hop = match self.nodes[&receiver].routing_table.get(dst) {
            Some(entry) => entry.next_hop,
            None => {
                debug!(
                    "Node {}: no route towards {} even after discovery, packet dropped",
                    receiver.index(),
                    dst.index()
                );
                return Ok(None);
            }
        };

        if self.graph.find_edge(receiver, next_hop).is_none() {
            // the next hop died while the packet was in flight
            let lost: BTreeSet<NodeId> = self
                .nodes
                .get_mut(&receiver)
                .ok_or(NetworkError::NodeNotFound(receiver))?
                .routing_table
                .remove_via(next_hop)
                .into_iter()
                .collect();
            debug!(
                "Node {}: broken link towards next hop {}, packet dropped",
                receiver.index(),
                next_hop.index()
            );
            self.send_rerr(receiver, lost)?;
            return Ok(None);
        }

        self.deliver(next_hop, Packet::Data(msg), receiver)
    }
}
