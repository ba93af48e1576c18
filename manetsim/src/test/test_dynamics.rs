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

//! Test the protocol under topology changes, and the scenario driver.

use crate::netsim::{Network, NodeId};
use crate::scenario::{run_dynamic_scenario, ScenarioConfig};
use std::collections::HashMap;

/// Mid-path link failure.
///
/// ```text
/// n2 --0.3-- n1 --0.2-- n0
///                       (n2 sits right next to n0, but starts out linked
///                        only through n1)
/// ```
#[test]
fn test_mid_path_link_failure() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 1.2);
    let n1 = net.add_node(5.0, 0.0, 1.2);
    let n2 = net.add_node(-1.0, 0.5, 1.2);
    net.add_link(n0, n1, 0.2);
    net.add_link(n1, n2, 0.3);

    net.route_discovery(n0, n2).unwrap();
    assert_eq!(net.get_node(n0).unwrap().routing_table().get(n2).unwrap().next_hop, n1);

    // n2 is torn off; the topology manager re-attaches it to its closest
    // node, which is n0
    net.remove_link(n1, n2);
    assert!(!net.link_exists(n1, n2));
    assert!(net.link_exists(n0, n2));

    // the stale route via n1 is still installed, so the first transmission
    // runs into the broken link at n1: the packet is lost and the route
    // error cleans the stale entries everywhere
    assert_eq!(net.simulate_transmission(n0, n2, "y").unwrap(), None);
    assert!(net.get_node(n0).unwrap().routing_table().get(n2).is_none());
    assert!(net.get_node(n1).unwrap().routing_table().get(n2).is_none());
    assert_eq!(net.get_node(n1).unwrap().stats().rerr_sent, 1);
    assert_eq!(net.get_node(n0).unwrap().stats().rerr_recv, 1);

    // the next transmission rediscovers and uses the new direct link
    let delivery = net.simulate_transmission(n0, n2, "y").unwrap().unwrap();
    assert_eq!(delivery.path, vec![n0, n2]);
    assert_eq!(delivery.hops, 1);
    // and it no longer crosses the removed edge
    assert!(!delivery.path.windows(2).any(|p| (p[0], p[1]) == (n1, n2)));
}

/// Route error propagation along a line.
///
/// ```text
/// n0 --0.2-- n1 --0.2-- n2 --0.2-- n3
/// ```
///
/// (n3 sits right above n0, so tearing off n3 re-attaches it to n0.)
#[test]
fn test_rerr_propagation() {
    let mut net = Network::new();
    let n0 = net.add_node(0.0, 0.0, 1.2);
    let n1 = net.add_node(1.0, 0.0, 1.2);
    let n2 = net.add_node(2.0, 0.0, 1.2);
    let n3 = net.add_node(0.0, 1.0, 1.2);
    net.add_link(n0, n1, 0.2);
    net.add_link(n1, n2, 0.2);
    net.add_link(n2, n3, 0.2);

    net.route_discovery(n0, n3).unwrap();
    assert_eq!(net.get_node(n0).unwrap().routing_table().get(n3).unwrap().hops, 3);

    net.remove_link(n2, n3);
    assert!(net.link_exists(n0, n3));

    // n2 detects the broken next hop mid-path, emits the route error, and
    // every node upstream drops its route towards n3
    assert_eq!(net.simulate_transmission(n0, n3, "z").unwrap(), None);
    for id in [n0, n1, n2].iter() {
        assert!(net.get_node(*id).unwrap().routing_table().get(n3).is_none());
    }
    assert_eq!(net.get_node(n2).unwrap().stats().rerr_sent, 1);
    assert_eq!(net.get_node(n1).unwrap().stats().rerr_recv, 1);
    assert_eq!(net.get_node(n0).unwrap().stats().rerr_recv, 1);

    // a fresh discovery finds the bridge link
    let delivery = net.simulate_transmission(n0, n3, "z").unwrap().unwrap();
    assert_eq!(delivery.path, vec![n0, n3]);
    assert_eq!(delivery.hops, 1);
}

#[test]
fn test_efficiency_statistic() {
    let mut net = Network::create_random(10, 7, 10.0, 1.0, 3.0);
    net.neighbor_discovery().unwrap();

    let config = ScenarioConfig { steps: 15, ..Default::default() };
    run_dynamic_scenario(&mut net, &config).unwrap();

    let stats = net.stats();
    let expected_total = stats.counters.rreq_sent
        + stats.counters.rreq_recv
        + stats.counters.rrep_sent
        + stats.counters.rrep_recv
        + stats.counters.rerr_sent
        + stats.counters.rerr_recv
        + stats.counters.data_sent
        + stats.counters.data_recv;
    assert_eq!(stats.total_exchanged, expected_total);
    assert_eq!(stats.useful, stats.counters.data_recv);
    if stats.total_exchanged > 0 {
        let expected = stats.useful as f64 / stats.total_exchanged as f64;
        assert!((stats.efficiency - expected).abs() < 1e-12);
    } else {
        assert_eq!(stats.efficiency, 0.0);
    }
}

#[test]
fn test_scenario_is_deterministic() {
    let run = || {
        let mut net = Network::create_random(10, 21, 10.0, 1.0, 3.0);
        net.neighbor_discovery().unwrap();
        let config = ScenarioConfig { steps: 20, ..Default::default() };
        let reports = run_dynamic_scenario(&mut net, &config).unwrap();
        (reports, net.get_all_links(), net.stats())
    };

    let (reports_a, links_a, stats_a) = run();
    let (reports_b, links_b, stats_b) = run();

    assert_eq!(reports_a, reports_b);
    assert_eq!(links_a, links_b);
    assert_eq!(stats_a, stats_b);
}

#[test]
fn test_invariants_hold_during_scenario() {
    let mut net = Network::create_random(12, 9, 10.0, 1.0, 3.0);
    net.neighbor_discovery().unwrap();

    let mut last_seq: HashMap<NodeId, u32> = HashMap::new();
    let config = ScenarioConfig { steps: 1, ..Default::default() };

    for _ in 0..20 {
        run_dynamic_scenario(&mut net, &config).unwrap();

        // the graph stays one connected component
        assert!(net.is_connected());

        // links stay symmetric
        for (a, b, delay) in net.get_all_links() {
            assert_eq!(net.get_link_cost(a, b), delay);
            assert_eq!(net.get_link_cost(b, a), delay);
        }

        // own sequence numbers never decrease
        for id in net.get_nodes() {
            let seq = net.get_node(id).unwrap().seq();
            let last = last_seq.entry(id).or_insert(0);
            assert!(seq >= *last);
            *last = seq;
        }
    }
}

#[test]
fn test_reset_protocol_state() {
    let mut net = Network::create_random(8, 5, 10.0, 1.0, 3.0);
    net.neighbor_discovery().unwrap();
    let links = net.get_all_links();
    assert!(net.stats().total_exchanged > 0);

    net.reset_protocol_state();

    // the topology is untouched, all protocol state is gone
    assert_eq!(net.get_all_links(), links);
    assert_eq!(net.stats().total_exchanged, 0);
    for id in net.get_nodes() {
        let node = net.get_node(id).unwrap();
        assert!(node.routing_table().is_empty());
        assert_eq!(node.seq(), 0);
        assert_eq!(node.broadcast_id(), 0);
        assert!(node.received_messages().is_empty());
    }
}
