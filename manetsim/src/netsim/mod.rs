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

#![deny(missing_docs, missing_debug_implementations)]

//! # NetSim
//!
//! Discrete-event simulator of an on-demand distance-vector routing
//! protocol over a dynamic wireless multi-hop network. The
//! [`Network`] owns all nodes and links; routes are discovered reactively
//! by flooding route requests over a FIFO dispatch queue and unicasting
//! replies back along the installed reverse paths.
//!
//! ## Example usage
//!
//! The following example builds a three-node chain, discovers a route
//! across it, and transmits a data packet end-to-end:
//!
//! ```rust
//! use manetsim::netsim::Network;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//!     let mut net = Network::new();
//!
//!     let a = net.add_node(0.0, 0.0, 2.0);
//!     let b = net.add_node(1.0, 0.0, 2.0);
//!     let c = net.add_node(2.0, 0.0, 2.0);
//!
//!     net.add_link(a, b, 0.2);
//!     net.add_link(b, c, 0.3);
//!
//!     net.route_discovery(a, c)?;
//!
//!     let route = net.get_node(a).unwrap().routing_table().get(c).unwrap();
//!     assert_eq!(route.next_hop, b);
//!     assert_eq!(route.hops, 2);
//!
//!     let delivery = net.simulate_transmission(a, c, "hello")?.unwrap();
//!     assert_eq!(delivery.path, vec![a, b, c]);
//!     assert_eq!(delivery.hops, 2);
//!
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod node;
pub mod packet;
pub mod printer;
pub mod routing_table;
pub mod stats;
mod topology;
pub mod types;

pub use network::{Network, Transmission};
pub use node::Node;
pub use packet::{DataPacket, Packet, Rerr, Rrep, Rreq};
pub use routing_table::{RouteEntry, RoutingTable};
pub use stats::{MessageStats, NetworkStats};
pub use types::{LinkGraph, LinkWeight, NetworkError, NodeId};
