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

//! Module defining a wireless node with its on-demand routing state machine.

use crate::netsim::packet::{DataPacket, Rerr, Rrep, Rreq};
use crate::netsim::routing_table::{RouteEntry, RoutingTable};
use crate::netsim::stats::MessageStats;
use crate::netsim::{LinkGraph, LinkWeight, NodeId};
use log::*;
use std::collections::HashSet;

/// What a node decided to do with a received route request. The network
/// executes the action: replies start a unicast chain along the reverse
/// path, forwards are enqueued to every neighbor except the forwarder.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RreqAction {
    /// Duplicate request, ignore it
    Drop,
    /// Answer the request with this reply (the node is the destination, or
    /// it knows a route at least as fresh as the requester does)
    Reply(Rrep),
    /// Flood this updated copy onwards
    Forward(Rreq),
}

/// Wireless Node
///
/// A positional entity with a transmission range, a monotonic sequence
/// number, a routing table, and the duplicate-suppression state of the
/// routing protocol. The node never touches other nodes directly: handlers
/// mutate local state only and return what the network should do next. The
/// link graph is passed in by reference, so a node can inspect its own
/// neighborhood without owning any part of the network.
#[derive(Debug, Clone)]
pub struct Node {
    /// ID of the node
    node_id: NodeId,
    /// Horizontal position
    x: f64,
    /// Vertical position
    y: f64,
    /// Maximum distance this node can transmit over
    transmission_range: f64,
    /// Own sequence number, monotonically non-decreasing
    seq: u32,
    /// Counter of route discoveries originated by this node
    broadcast_id: u32,
    /// Routes towards other nodes
    pub(crate) routing_table: RoutingTable,
    /// `(originator, broadcast_id)` pairs of requests already processed
    pub(crate) seen_rreqs: HashSet<(NodeId, u32)>,
    /// Canonical identities of route errors already processed
    seen_rerrs: HashSet<Vec<NodeId>>,
    /// Message counters
    pub(crate) stats: MessageStats,
    /// Data packets that arrived here as their final destination
    received_msgs: Vec<DataPacket>,
}

impl Node {
    pub(crate) fn new(node_id: NodeId, x: f64, y: f64, transmission_range: f64) -> Self {
        Self {
            node_id,
            x,
            y,
            transmission_range,
            seq: 0,
            broadcast_id: 0,
            routing_table: RoutingTable::new(),
            seen_rreqs: HashSet::new(),
            seen_rerrs: HashSet::new(),
            stats: MessageStats::default(),
            received_msgs: Vec::new(),
        }
    }

    /// Return the id of the node
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Return the position of the node
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Return the transmission range of the node
    pub fn transmission_range(&self) -> f64 {
        self.transmission_range
    }

    /// Return the current sequence number of the node
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Return the current broadcast counter of the node
    pub fn broadcast_id(&self) -> u32 {
        self.broadcast_id
    }

    /// Return the routing table of the node
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Return the message counters of the node
    pub fn stats(&self) -> &MessageStats {
        &self.stats
    }

    /// Return the data packets this node received as final destination
    pub fn received_messages(&self) -> &[DataPacket] {
        &self.received_msgs
    }

    /// Euclidean distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Check whether this node's transmission range covers another node.
    pub fn can_reach(&self, other: &Node) -> bool {
        if self.node_id == other.node_id {
            return false;
        }
        self.distance_to(other) <= self.transmission_range
    }

    /// Widen the transmission range up to the given value. Never shrinks.
    pub(crate) fn widen_range(&mut self, range: f64) {
        if self.transmission_range < range {
            self.transmission_range = range;
        }
    }

    /// Build a fresh route request towards `dest`, bumping the sequence
    /// number and the broadcast counter, and recording the request in the
    /// own duplicate-suppression set so the flood never loops back.
    pub(crate) fn originate_rreq(&mut self, dest: NodeId) -> Rreq {
        self.seq += 1;
        self.broadcast_id += 1;
        self.seen_rreqs.insert((self.node_id, self.broadcast_id));
        self.stats.rreq_sent += 1;
        Rreq {
            originator: self.node_id,
            broadcast_id: self.broadcast_id,
            dest,
            originator_seq: self.seq,
            dest_seq_known: self.routing_table.get(dest).map(|e| e.dest_seq).unwrap_or(0),
            hops: 0,
            cost: 0.0,
        }
    }

    /// Process a route request that arrived from `forwarder`.
    ///
    /// Installs the reverse route towards the originator, then decides
    /// whether to answer (as destination or on behalf of it) or to flood
    /// onwards. Duplicates are dropped before any counter is touched.
    pub(crate) fn handle_rreq(
        &mut self,
        rreq: &Rreq,
        forwarder: NodeId,
        graph: &LinkGraph,
    ) -> RreqAction {
        if !self.seen_rreqs.insert((rreq.originator, rreq.broadcast_id)) {
            trace!(
                "Node {}: duplicate RREQ ({}, {}) dropped",
                self.node_id.index(),
                rreq.originator.index(),
                rreq.broadcast_id
            );
            return RreqAction::Drop;
        }
        self.stats.rreq_recv += 1;

        // install the reverse path towards the originator
        let in_cost = link_cost(graph, self.node_id, forwarder);
        self.install_route(
            RouteEntry {
                dest: rreq.originator,
                next_hop: forwarder,
                dest_seq: rreq.originator_seq,
                hops: rreq.hops + 1,
                cost: rreq.cost + in_cost,
            },
            graph,
        );

        if rreq.dest == self.node_id {
            // answer as the destination. The own sequence number must end up
            // strictly larger than whatever the requester already knows.
            self.seq = self.seq.max(rreq.dest_seq_known);
            if self.seq == rreq.dest_seq_known {
                self.seq += 1;
            }
            return RreqAction::Reply(Rrep {
                originator: self.node_id,
                dest: rreq.originator,
                dest_seq: self.seq,
                hops: 0,
                cost: 0.0,
            });
        }

        // answer on behalf of the destination if the local route is live and
        // at least as fresh as what the requester knows
        if let Some(route) = self.routing_table.get(rreq.dest) {
            let live = graph.find_edge(self.node_id, route.next_hop).is_some();
            let fresher = route.dest_seq > rreq.dest_seq_known
                || (route.dest_seq == rreq.dest_seq_known && route.cost < rreq.cost);
            if live && fresher {
                return RreqAction::Reply(Rrep {
                    originator: rreq.dest,
                    dest: rreq.originator,
                    dest_seq: route.dest_seq,
                    hops: route.hops,
                    cost: route.cost,
                });
            }
        }

        let mut forwarded = rreq.clone();
        forwarded.hops += 1;
        forwarded.cost += in_cost;
        RreqAction::Forward(forwarded)
    }

    /// Process a route reply that arrived from `forwarder`. The reply is
    /// charged with the link it travelled over, then the route towards the
    /// reply's originator is installed under the freshness rule. Returns the
    /// next hop to forward the reply to, or `None` if it arrived at its
    /// destination (or the reverse route vanished, in which case the reply
    /// is lost).
    pub(crate) fn handle_rrep(
        &mut self,
        rrep: &mut Rrep,
        forwarder: NodeId,
        graph: &LinkGraph,
    ) -> Option<NodeId> {
        self.stats.rrep_recv += 1;
        rrep.hops += 1;
        rrep.cost += link_cost(graph, self.node_id, forwarder);
        self.install_route(
            RouteEntry {
                dest: rrep.originator,
                next_hop: forwarder,
                dest_seq: rrep.dest_seq,
                hops: rrep.hops,
                cost: rrep.cost,
            },
            graph,
        );

        if rrep.dest == self.node_id {
            return None;
        }
        match self.routing_table.get(rrep.dest) {
            Some(entry) => Some(entry.next_hop),
            None => {
                debug!(
                    "Node {}: no reverse route towards {}, RREP lost",
                    self.node_id.index(),
                    rrep.dest.index()
                );
                None
            }
        }
    }

    /// Process a route error that arrived from a neighbor. Removes every
    /// named destination from the routing table. Returns `true` if the error
    /// was new and must be forwarded to the remaining neighbors.
    pub(crate) fn handle_rerr(&mut self, rerr: &Rerr) -> bool {
        if !self.seen_rerrs.insert(rerr.identity()) {
            return false;
        }
        self.stats.rerr_recv += 1;
        for dest in rerr.unreachable.iter() {
            if self.routing_table.remove(*dest).is_some() {
                debug!(
                    "Node {}: removed route to {} (RERR)",
                    self.node_id.index(),
                    dest.index()
                );
            }
        }
        true
    }

    /// Record that this node originated the given route error, so the flood
    /// coming back over other links is recognized as already seen.
    pub(crate) fn note_rerr_sent(&mut self, rerr: &Rerr) {
        self.seen_rerrs.insert(rerr.identity());
        self.stats.rerr_sent += 1;
    }

    /// Record the receipt of a data packet addressed to this node.
    pub(crate) fn record_receipt(&mut self, msg: DataPacket) {
        self.stats.data_recv += 1;
        self.received_msgs.push(msg);
    }

    /// Install a candidate route under the freshness rule, checking against
    /// the graph whether the currently stored next hop is still a live
    /// neighbor. Returns `true` if the candidate won.
    pub(crate) fn install_route(&mut self, candidate: RouteEntry, graph: &LinkGraph) -> bool {
        debug_assert_ne!(candidate.dest, self.node_id);
        let current_link_alive = match self.routing_table.get(candidate.dest) {
            Some(current) => graph.find_edge(self.node_id, current.next_hop).is_some(),
            None => true,
        };
        self.routing_table.update(candidate, current_link_alive)
    }

    /// Forget all protocol state (routes, counters, suppression sets, and
    /// the receipt log), keeping only the position and transmission range.
    pub(crate) fn reset(&mut self) {
        self.seq = 0;
        self.broadcast_id = 0;
        self.routing_table = RoutingTable::new();
        self.seen_rreqs.clear();
        self.seen_rerrs.clear();
        self.stats = MessageStats::default();
        self.received_msgs.clear();
    }
}

/// Delay of the link between two nodes, or infinite if they are not
/// connected.
pub(crate) fn link_cost(graph: &LinkGraph, a: NodeId, b: NodeId) -> LinkWeight {
    graph
        .find_edge(a, b)
        .and_then(|e| graph.edge_weight(e))
        .copied()
        .unwrap_or(f64::INFINITY)
}
