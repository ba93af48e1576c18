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

//! Command-line driver: build a random wireless network, run the dynamic
//! scenario on it, and print the step log and the statistics.

use clap::Parser;
use log::*;
use manetsim::netsim::{printer, Network};
use manetsim::scenario::{run_dynamic_scenario, ScenarioConfig, StepEvent};
use std::error::Error;

/// Simulate on-demand route discovery over a dynamic wireless network.
#[derive(Debug, Parser)]
#[command(name = "manetsim")]
struct Args {
    /// Number of nodes
    #[arg(short, long, default_value_t = 10)]
    nodes: usize,
    /// Number of scenario steps
    #[arg(short = 't', long, default_value_t = 20)]
    steps: usize,
    /// Seed for the network PRNG (drawn randomly when omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Probability of a data request per step
    #[arg(long, default_value_t = 0.5)]
    p_request: f64,
    /// Probability of a link failure per step
    #[arg(long, default_value_t = 0.1)]
    p_fail: f64,
    /// Probability of a new link per step
    #[arg(long, default_value_t = 0.1)]
    p_new: f64,
    /// Side length of the square simulation area
    #[arg(long, default_value_t = 10.0)]
    area_size: f64,
    /// Minimum transmission range
    #[arg(long, default_value_t = 1.0)]
    min_range: f64,
    /// Maximum transmission range
    #[arg(long, default_value_t = 3.0)]
    max_range: f64,
    /// Print every node's routing table after the run
    #[arg(long)]
    tables: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    println!("Random seed: {}", seed);

    let mut net =
        Network::create_random(args.nodes, seed, args.area_size, args.min_range, args.max_range);
    info!("Network has {} links", net.get_all_links().len());
    net.neighbor_discovery()?;

    let config = ScenarioConfig {
        steps: args.steps,
        p_request: args.p_request,
        p_fail: args.p_fail,
        p_new: args.p_new,
    };
    let reports = run_dynamic_scenario(&mut net, &config)?;

    for report in &reports {
        for event in &report.events {
            match event {
                StepEvent::Delivered { src, dst, path, hops, cost } => println!(
                    "[step {}] packet {} -> {} delivered via {:?} ({} hops, cost {:.3})",
                    report.step,
                    src.index(),
                    dst.index(),
                    path.iter().map(|n| n.index()).collect::<Vec<_>>(),
                    hops,
                    cost
                ),
                StepEvent::TransmissionFailed { src, dst } => println!(
                    "[step {}] packet {} -> {} failed (no route)",
                    report.step,
                    src.index(),
                    dst.index()
                ),
                StepEvent::LinkRemoved { a, b } => println!(
                    "[step {}] link removed: {} -- {}",
                    report.step,
                    a.index(),
                    b.index()
                ),
                StepEvent::LinkAdded { a, b, delay } => println!(
                    "[step {}] link added: {} -- {} (delay {:.3})",
                    report.step,
                    a.index(),
                    b.index(),
                    delay
                ),
            }
        }
    }

    println!();
    if args.tables {
        for id in net.get_nodes() {
            printer::print_routing_table(&net, id)?;
        }
    }
    printer::print_stats(&net);

    Ok(())
}
