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

//! # Helper (printer) functions for the Network
//! Module containing helper functions to get formatted strings and print
//! information about the network.

use crate::netsim::network::Network;
use crate::netsim::types::{NetworkError, NodeId};
use itertools::Itertools;

/// Get a vector of strings, which represent the routing table of the given
/// node. Each `String` is one known route, sorted by destination id.
pub fn routing_table(net: &Network, id: NodeId) -> Result<Vec<String>, NetworkError> {
    let node = net.get_node(id).ok_or(NetworkError::NodeNotFound(id))?;
    Ok(node
        .routing_table()
        .iter()
        .sorted_by_key(|(dest, _)| *dest)
        .map(|(dest, entry)| {
            format!(
                "{dest} via {nh} (seq: {seq}, hops: {hops}, cost: {cost:.3})",
                dest = dest.index(),
                nh = entry.next_hop.index(),
                seq = entry.dest_seq,
                hops = entry.hops,
                cost = entry.cost,
            )
        })
        .collect())
}

/// Print the routing table of a given node.
pub fn print_routing_table(net: &Network, id: NodeId) -> Result<(), NetworkError> {
    println!("Routing table of node {}", id.index());
    for line in routing_table(net, id)? {
        println!("  {}", line);
    }
    Ok(())
}

/// Get a vector of strings representing the per-node message counters, one
/// line per node, preceded by a header line.
pub fn stats_table(net: &Network) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "node", "rreq_sent", "rreq_recv", "rrep_sent", "rrep_recv", "rerr_sent", "rerr_recv",
        "data_sent", "data_recv"
    )];
    for id in net.get_nodes() {
        if let Some(node) = net.get_node(id) {
            let s = node.stats();
            lines.push(format!(
                "{:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                id.index(),
                s.rreq_sent,
                s.rreq_recv,
                s.rrep_sent,
                s.rrep_recv,
                s.rerr_sent,
                s.rerr_recv,
                s.data_sent,
                s.data_recv
            ));
        }
    }
    lines
}

/// Print the per-node statistics table and the aggregate efficiency.
pub fn print_stats(net: &Network) {
    for line in stats_table(net) {
        println!("{}", line);
    }
    let stats = net.stats();
    println!(
        "Total packets exchanged: {}, useful: {}, efficiency: {:.3}",
        stats.total_exchanged, stats.useful, stats.efficiency
    );
}
