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

//! # Scenario driver
//!
//! Stochastic step loop exercising a network: every discrete time step runs
//! three independent Bernoulli trials, requesting a data transmission
//! between a random pair, failing a random link, and creating a random new
//! link within transmission reach. All randomness is drawn from the
//! network's own PRNG, so a whole scenario is reproducible from the network
//! seed.

use crate::netsim::{LinkWeight, Network, NetworkError, NodeId};
use log::*;
use rand::prelude::*;

/// Parameters of a dynamic scenario run.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of discrete time steps to run
    pub steps: usize,
    /// Probability per step of a data request between a random pair of
    /// distinct nodes
    pub p_request: f64,
    /// Probability per step of removing a uniformly chosen link
    pub p_fail: f64,
    /// Probability per step of creating a link on a uniformly chosen
    /// unconnected pair within transmission reach
    pub p_new: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self { steps: 20, p_request: 0.5, p_fail: 0.1, p_new: 0.1 }
    }
}

/// A single event that occurred during a scenario step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    /// A data packet was delivered end-to-end.
    Delivered {
        /// Source of the transmission
        src: NodeId,
        /// Destination of the transmission
        dst: NodeId,
        /// Path the packet travelled
        path: Vec<NodeId>,
        /// Number of links travelled
        hops: u32,
        /// Accumulated delay of the travelled links
        cost: LinkWeight,
    },
    /// A data request failed, even after one route discovery.
    TransmissionFailed {
        /// Source of the transmission
        src: NodeId,
        /// Destination of the transmission
        dst: NodeId,
    },
    /// A link disappeared. Connectivity restoration may have added bridge
    /// links in the same step.
    LinkRemoved {
        /// First endpoint
        a: NodeId,
        /// Second endpoint
        b: NodeId,
    },
    /// A new link appeared and the first endpoint seeded its one-hop routes.
    LinkAdded {
        /// First endpoint
        a: NodeId,
        /// Second endpoint
        b: NodeId,
        /// Delay of the new link
        delay: LinkWeight,
    },
}

/// Log of a single scenario step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Step number, starting at 1
    pub step: usize,
    /// Everything that happened during the step
    pub events: Vec<StepEvent>,
}

/// Run the stochastic step loop on the given network and return the per-step
/// event log.
pub fn run_dynamic_scenario(
    net: &mut Network,
    config: &ScenarioConfig,
) -> Result<Vec<StepReport>, NetworkError> {
    let mut reports = Vec::with_capacity(config.steps);
    for step in 0..config.steps {
        let mut events = Vec::new();
        let ids = net.get_nodes();

        // data request between a random pair of distinct nodes
        if ids.len() >= 2 && net.rng.gen::<f64>() < config.p_request {
            let src = ids[net.rng.gen_range(0, ids.len())];
            let mut dst = ids[net.rng.gen_range(0, ids.len())];
            while dst == src {
                dst = ids[net.rng.gen_range(0, ids.len())];
            }
            info!("[step {}] data request {} -> {}", step + 1, src.index(), dst.index());
            match net.simulate_transmission(src, dst, format!("step {} payload", step + 1))? {
                Some(t) => {
                    events.push(StepEvent::Delivered {
                        src,
                        dst,
                        path: t.path,
                        hops: t.hops,
                        cost: t.cost,
                    });
                }
                None => events.push(StepEvent::TransmissionFailed { src, dst }),
            }
        }

        // link failure
        if net.rng.gen::<f64>() < config.p_fail {
            let links = net.get_all_links();
            if !links.is_empty() {
                let (a, b, _) = links[net.rng.gen_range(0, links.len())];
                info!("[step {}] link failure {} -- {}", step + 1, a.index(), b.index());
                net.remove_link(a, b);
                events.push(StepEvent::LinkRemoved { a, b });
            }
        }

        // link birth
        if net.rng.gen::<f64>() < config.p_new {
            let pairs = net.get_unconnected_pairs();
            if !pairs.is_empty() {
                let (a, b) = pairs[net.rng.gen_range(0, pairs.len())];
                let delay = net.rng.gen_range(0.1, 1.0);
                info!(
                    "[step {}] new link {} -- {} (delay {:.3})",
                    step + 1,
                    a.index(),
                    b.index(),
                    delay
                );
                net.add_link(a, b, delay);
                net.discover_neighbors(a)?;
                events.push(StepEvent::LinkAdded { a, b, delay });
            }
        }

        reports.push(StepReport { step: step + 1, events });
    }
    Ok(reports)
}
