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

//! Test route discovery and data transmission on static topologies.

use crate::netsim::{Network, NodeId};
use assert_approx_eq::assert_approx_eq;
use std::collections::{HashMap, HashSet, VecDeque};

/// Shortest hop distance from `src` to every other node, computed on the
/// link list alone. Reference for the hop counts the protocol installs.
fn bfs_hops(net: &Network, src: NodeId) -> HashMap<NodeId, u32> {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for (a, b, _) in net.get_all_links() {
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }
    let mut hops = HashMap::new();
    hops.insert(src, 0);
    let mut queue = VecDeque::new();
    queue.push_back(src);
    while let Some(current) = queue.pop_front() {
        let distance = hops[&current];
        for neighbor in adjacency.get(&current).cloned().unwrap_or_default() {
            hops.entry(neighbor).or_insert_with(|| {
                queue.push_back(neighbor);
                distance + 1
            });
        }
    }
    hops
}

#[test]
fn test_two_node_discovery() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 2.0);
    let n1 = net.add_node(1.0, 0.0, 2.0);
    net.add_link(n0, n1, 0.5);

    net.route_discovery(n0, n1).unwrap();

    // both endpoints have each other installed
    let forward = net.get_node(n0).unwrap().routing_table().get(n1).unwrap();
    assert_eq!(forward.next_hop, n1);
    assert_eq!(forward.hops, 1);
    assert_approx_eq!(forward.cost, 0.5);

    let reverse = net.get_node(n1).unwrap().routing_table().get(n0).unwrap();
    assert_eq!(reverse.next_hop, n0);
    assert_eq!(reverse.hops, 1);
    assert_approx_eq!(reverse.cost, 0.5);

    let delivery = net.simulate_transmission(n0, n1, "hi").unwrap().unwrap();
    assert_eq!(delivery.path, vec![n0, n1]);
    assert_eq!(delivery.hops, 1);
    assert_approx_eq!(delivery.cost, 0.5);

    assert_eq!(net.get_node(n1).unwrap().received_messages().len(), 1);
    assert_eq!(net.get_node(n1).unwrap().received_messages()[0].payload, "hi");
}

#[test]
fn test_three_node_chain() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 1.5);
    let n1 = net.add_node(1.0, 0.0, 1.5);
    let n2 = net.add_node(2.0, 0.0, 1.5);
    net.add_link(n0, n1, 0.2);
    net.add_link(n1, n2, 0.3);

    net.route_discovery(n0, n2).unwrap();

    let route = net.get_node(n0).unwrap().routing_table().get(n2).unwrap();
    assert_eq!(route.next_hop, n1);
    assert_eq!(route.hops, 2);
    assert_approx_eq!(route.cost, 0.5);

    // the middle node learned both directions along the way
    let middle = net.get_node(n1).unwrap();
    assert_eq!(middle.routing_table().get(n0).unwrap().hops, 1);
    assert_eq!(middle.routing_table().get(n2).unwrap().hops, 1);

    // the destination installed the reverse route with the accumulated
    // flood cost
    let reverse = net.get_node(n2).unwrap().routing_table().get(n0).unwrap();
    assert_eq!(reverse.next_hop, n1);
    assert_eq!(reverse.hops, 2);
    assert_approx_eq!(reverse.cost, 0.5);

    let delivery = net.simulate_transmission(n0, n2, "x").unwrap().unwrap();
    assert_eq!(delivery.path, vec![n0, n1, n2]);
    assert_eq!(delivery.hops, 2);
    assert_approx_eq!(delivery.cost, 0.5);

    // exactly one request origination, two receipts, one reply travelling
    // two hops, and one delivered data packet
    let stats = net.stats();
    assert_eq!(stats.counters.rreq_sent, 1);
    assert_eq!(stats.counters.rreq_recv, 2);
    assert_eq!(stats.counters.rrep_sent, 1);
    assert_eq!(stats.counters.rrep_recv, 2);
    assert_eq!(stats.counters.data_sent, 1);
    assert_eq!(stats.counters.data_recv, 1);
    assert_eq!(stats.total_exchanged, 8);
    assert_eq!(stats.useful, 1);
    assert_approx_eq!(stats.efficiency, 0.125);
}

#[test]
fn test_ring_duplicate_suppression() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 2.0);
    let n1 = net.add_node(1.0, 0.0, 2.0);
    let n2 = net.add_node(1.0, 1.0, 2.0);
    let n3 = net.add_node(0.0, 1.0, 2.0);
    net.add_link(n0, n1, 0.25);
    net.add_link(n1, n2, 0.25);
    net.add_link(n2, n3, 0.25);
    net.add_link(n3, n0, 0.25);

    net.route_discovery(n0, n2).unwrap();

    // the flood reaches n2 over both sides of the ring, but every node
    // processes the discovery instance exactly once
    for id in net.get_nodes() {
        assert_eq!(net.get_node(id).unwrap().seen_rreqs.len(), 1);
    }
    assert_eq!(net.get_node(n0).unwrap().stats().rreq_recv, 0);
    assert_eq!(net.get_node(n1).unwrap().stats().rreq_recv, 1);
    assert_eq!(net.get_node(n2).unwrap().stats().rreq_recv, 1);
    assert_eq!(net.get_node(n3).unwrap().stats().rreq_recv, 1);

    // and the discovered route crosses exactly one ring side
    let route = net.get_node(n0).unwrap().routing_table().get(n2).unwrap();
    assert_eq!(route.hops, 2);
}

#[test]
fn test_intermediate_node_answers_with_fresh_route() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 2.0);
    let n1 = net.add_node(1.0, 0.0, 2.0);
    let n2 = net.add_node(2.0, 0.0, 2.0);
    let n3 = net.add_node(1.0, 1.0, 2.0);
    net.add_link(n0, n1, 0.2);
    net.add_link(n1, n2, 0.3);
    net.add_link(n3, n1, 0.4);

    // after this discovery, n1 holds a fresh route towards n2
    net.route_discovery(n0, n2).unwrap();
    let before = net.get_node(n2).unwrap().stats().rreq_recv;

    // n3's request is answered by n1 on behalf of n2: the flood never
    // reaches the destination itself
    net.route_discovery(n3, n2).unwrap();
    assert_eq!(net.get_node(n2).unwrap().stats().rreq_recv, before);

    let route = net.get_node(n3).unwrap().routing_table().get(n2).unwrap();
    assert_eq!(route.next_hop, n1);
    assert_eq!(route.hops, 2);
    assert_approx_eq!(route.cost, 0.7);
}

#[test]
fn test_discovery_installs_shortest_hop_routes() {
    let mut net = Network::create_random(15, 3, 10.0, 1.0, 3.0);
    let ids = net.get_nodes();
    let src = ids[0];

    for dst in ids.iter().copied().skip(1) {
        net.reset_protocol_state();
        let reference = bfs_hops(&net, src);

        net.route_discovery(src, dst).unwrap();

        // both directions are installed, with minimal hop counts
        let forward = net.get_node(src).unwrap().routing_table().get(dst).unwrap();
        let reverse = net.get_node(dst).unwrap().routing_table().get(src).unwrap();
        assert_eq!(forward.hops, reference[&dst]);
        assert_eq!(reverse.hops, reference[&dst]);
        assert_approx_eq!(forward.cost, reverse.cost);
    }
}

#[test]
fn test_transmission_on_connected_graph_always_succeeds() {
    let mut net = Network::create_random(12, 11, 10.0, 1.0, 3.0);
    let ids = net.get_nodes();

    for dst in ids.iter().copied().skip(1) {
        let delivery = net.simulate_transmission(ids[0], dst, "ping").unwrap();
        let delivery = delivery.expect("static connected graph must deliver");

        assert_eq!(delivery.path[0], ids[0]);
        assert_eq!(*delivery.path.last().unwrap(), dst);
        assert_eq!(delivery.path.len() as u32, delivery.hops + 1);
        // consecutive path elements are live neighbors
        for pair in delivery.path.windows(2) {
            assert!(net.link_exists(pair[0], pair[1]));
        }
        // and the path never visits a node twice
        let unique: HashSet<NodeId> = delivery.path.iter().copied().collect();
        assert_eq!(unique.len(), delivery.path.len());
    }
}

#[test]
fn test_discovery_to_self_is_a_no_op() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 2.0);
    let n1 = net.add_node(1.0, 0.0, 2.0);
    net.add_link(n0, n1, 0.5);

    net.route_discovery(n0, n0).unwrap();
    assert!(net.get_node(n0).unwrap().routing_table().is_empty());
    assert_eq!(net.stats().total_exchanged, 0);

    assert_eq!(net.simulate_transmission(n0, n0, "self").unwrap(), None);
}

#[test]
fn test_unknown_node_is_an_error() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 2.0);

    assert!(net.route_discovery(n0, 9.into()).is_err());
    assert!(net.simulate_transmission(n0, 9.into(), "x").is_err());
}

#[test]
fn test_neighbor_discovery_seeds_one_hop_routes() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 1.5);
    let n1 = net.add_node(1.0, 0.0, 1.5);
    let n2 = net.add_node(2.0, 0.0, 1.5);
    net.add_link(n0, n1, 0.2);
    net.add_link(n1, n2, 0.3);

    net.neighbor_discovery().unwrap();

    // every node knows a one-hop route to each of its neighbors
    for (a, b, delay) in net.get_all_links() {
        let forward = net.get_node(a).unwrap().routing_table().get(b).unwrap();
        assert_eq!(forward.next_hop, b);
        assert_eq!(forward.hops, 1);
        assert_approx_eq!(forward.cost, delay);

        let reverse = net.get_node(b).unwrap().routing_table().get(a).unwrap();
        assert_eq!(reverse.next_hop, a);
        assert_eq!(reverse.hops, 1);
        assert_approx_eq!(reverse.cost, delay);
    }

    // the targeted requests never flood: nobody saw more than its own and
    // its neighbors' discovery instances
    assert_eq!(net.get_node(n0).unwrap().routing_table().len(), 1);
    assert_eq!(net.get_node(n1).unwrap().routing_table().len(), 2);
    assert_eq!(net.get_node(n2).unwrap().routing_table().len(), 1);
}
