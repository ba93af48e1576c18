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

//! Module defining the per-node routing table and its freshness rule.

use crate::netsim::{LinkWeight, NodeId};
use std::collections::hash_map::Iter;
use std::collections::HashMap;

/// A single route towards a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    /// Destination the entry routes towards
    pub dest: NodeId,
    /// Neighbor to hand packets for `dest` to. Must be a live neighbor at
    /// installation time; if the link disappears later the entry is broken
    /// and will be replaced or invalidated before use.
    pub next_hop: NodeId,
    /// Destination sequence number the entry was learned with
    pub dest_seq: u32,
    /// Number of links to the destination, at least 1
    pub hops: u32,
    /// Accumulated delay to the destination
    pub cost: LinkWeight,
}

/// Routing table of a single node, mapping destinations to route entries.
/// Entries for the node itself are never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingTable {
    entries: HashMap<NodeId, RouteEntry>,
}

impl RoutingTable {
    /// Create an empty routing table
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup the route towards the given destination.
    pub fn get(&self, dest: NodeId) -> Option<&RouteEntry> {
        self.entries.get(&dest)
    }

    /// Remove the route towards the given destination, returning the entry
    /// that was stored.
    pub fn remove(&mut self, dest: NodeId) -> Option<RouteEntry> {
        self.entries.remove(&dest)
    }

    /// Iterate over all `(destination, entry)` pairs.
    pub fn iter(&self) -> Iter<'_, NodeId, RouteEntry> {
        self.entries.iter()
    }

    /// Number of destinations the table knows a route for.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no route at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the freshness rule to a candidate entry and install it if it
    /// wins. `current_link_alive` tells whether the link towards the stored
    /// entry's next hop still exists; the caller checks this against the
    /// topology since the table itself has no view of the graph.
    ///
    /// The candidate replaces the stored entry iff, tested in order:
    /// 1. no entry is stored for the destination, or
    /// 2. the stored entry's next hop lost its link (broken route), or
    /// 3. the candidate has a strictly larger destination sequence, or
    /// 4. the sequences are equal and the candidate has a strictly lower
    ///    cost.
    ///
    /// Candidates with a strictly older sequence never win, even against a
    /// higher-cost entry. Returns `true` if the candidate was installed.
    pub(crate) fn update(&mut self, candidate: RouteEntry, current_link_alive: bool) -> bool {
        debug_assert!(candidate.hops >= 1);
        let install = match self.entries.get(&candidate.dest) {
            None => true,
            Some(_) if !current_link_alive => true,
            Some(current) => {
                candidate.dest_seq > current.dest_seq
                    || (candidate.dest_seq == current.dest_seq && candidate.cost < current.cost)
            }
        };
        if install {
            self.entries.insert(candidate.dest, candidate);
        }
        install
    }

    /// Remove every entry whose next hop is the given neighbor and return
    /// the destinations that were dropped, in ascending id order. Used when
    /// the link towards that neighbor is detected dead.
    pub(crate) fn remove_via(&mut self, next_hop: NodeId) -> Vec<NodeId> {
        let mut dests: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.next_hop == next_hop)
            .map(|(d, _)| *d)
            .collect();
        dests.sort();
        for dest in dests.iter() {
            self.entries.remove(dest);
        }
        dests
    }
}
