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

//! Module containing all type definitions

use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use thiserror::Error;

type IndexType = u32;
/// Node Identification (and index into the graph)
pub type NodeId = NodeIndex<IndexType>;
/// Link delay, also used as the accumulated cost of a route
pub type LinkWeight = f64;
/// Wireless link graph. Links are undirected edges annotated with their
/// delay, which makes the symmetric-link invariant structural: both
/// endpoints always observe the same weight.
pub type LinkGraph = StableGraph<(), LinkWeight, Undirected, IndexType>;

/// Network Errors
///
/// Protocol-level failures (no route after discovery, broken next hops,
/// dropped duplicates) are not errors; they are reported as `None` return
/// values or handled internally. An `Err` from the network means the caller
/// passed an unknown node, or the simulation tripped the hop-cap bug signal.
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    /// Node is not present in the topology
    #[error("Network node was not found in topology: {0:?}")]
    NodeNotFound(NodeId),
    /// A data packet exceeded the configured hop cap. Duplicate suppression
    /// and loop detection should make this unreachable; hitting it means a
    /// routing invariant was violated. The path travelled so far is attached
    /// for diagnosis.
    #[error("Hop cap exceeded while forwarding! path: {0:?}")]
    HopCapExceeded(Vec<NodeId>),
}
