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

//! Module for defining the packets exchanged between nodes

use crate::netsim::{LinkWeight, NodeId};
use std::collections::{BTreeSet, VecDeque};

/// Route Request, flooded through the network during route discovery.
///
/// A RREQ is immutable once originated; every forwarder enqueues a modified
/// copy with `hops` and `cost` increased by the link the request came in on.
#[derive(Debug, Clone, PartialEq)]
pub struct Rreq {
    /// Node which started the route discovery
    pub originator: NodeId,
    /// Discovery instance counter of the originator. Together with
    /// `originator`, this forms the duplicate-suppression key.
    pub broadcast_id: u32,
    /// Node the originator wants a route to
    pub dest: NodeId,
    /// Sequence number of the originator at origination time
    pub originator_seq: u32,
    /// Last destination sequence number known to the originator (0 if the
    /// destination was never heard of)
    pub dest_seq_known: u32,
    /// Number of links travelled so far
    pub hops: u32,
    /// Accumulated delay of the links travelled so far
    pub cost: LinkWeight,
}

/// Route Reply, unicast back along the reverse path installed by the RREQ
/// flood.
#[derive(Debug, Clone, PartialEq)]
pub struct Rrep {
    /// Node the reply speaks for (the destination of the RREQ)
    pub originator: NodeId,
    /// Node the reply is addressed to (the originator of the RREQ)
    pub dest: NodeId,
    /// Destination sequence number carried by the reply
    pub dest_seq: u32,
    /// Number of links between the answering node and `originator`, growing
    /// by one at every hop of the reply
    pub hops: u32,
    /// Accumulated delay towards `originator`, growing at every hop
    pub cost: LinkWeight,
}

/// Route Error, flooded to invalidate routes towards unreachable nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Rerr {
    /// Destinations that can no longer be reached through the sender
    pub unreachable: BTreeSet<NodeId>,
}

impl Rerr {
    /// Canonical identity of the error, used for duplicate suppression. The
    /// ordered set makes two errors naming the same destinations compare
    /// equal regardless of how they were built.
    pub fn identity(&self) -> Vec<NodeId> {
        self.unreachable.iter().copied().collect()
    }
}

/// Data packet travelling hop-by-hop along the installed routes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPacket {
    /// Originating node
    pub src: NodeId,
    /// Final destination
    pub dst: NodeId,
    /// Opaque payload
    pub payload: String,
    /// Number of links travelled so far
    pub hops: u32,
    /// Accumulated delay of the links travelled so far
    pub cost: LinkWeight,
    /// Every node visited so far, starting with `src`. Used for loop
    /// detection: a next hop that is already on the path means a stale
    /// route built a cycle.
    pub path: Vec<NodeId>,
}

/// Packet to deliver
///
/// The closed set of packet variants exchanged between nodes. The network
/// dispatches on the variant at the queue boundary; the forwarding rules
/// differ enough per variant that each one has its own receive path.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Route request (flooded via the dispatch queue)
    Rreq(Rreq),
    /// Route reply (unicast along the reverse path)
    Rrep(Rrep),
    /// Route error (flooded synchronously to the neighbors)
    Rerr(Rerr),
    /// Data packet (forwarded along the routing tables)
    Data(DataPacket),
}

/// Dispatch queue for pending packet deliveries: `(receiver, packet,
/// forwarder)`. The queue is FIFO, which makes the RREQ flood breadth-first
/// in hop count.
pub(crate) type DispatchQueue = VecDeque<(NodeId, Packet, NodeId)>;
