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

#![deny(missing_docs)]

//! # ManetSim: Simulating On-Demand Routing in Dynamic Wireless Networks
//!
//! This is a library for simulating a reactive (on-demand) distance-vector
//! routing protocol over a dynamic wireless multi-hop network. Routes are
//! discovered only when needed, by flooding route requests and unicasting
//! replies back along the reverse paths the flood installs; link failures
//! are announced with route errors that invalidate the affected routes
//! network-wide.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`NetSim`](netsim)**: The simulator core. See the main structure
//!   [`Network`](netsim::Network), which owns the nodes, the delay-annotated
//!   link graph, and the FIFO dispatch queue driving the request floods.
//!   The per-node protocol state machine lives in
//!   [`Node`](netsim::Node), and the topology manager keeps the link graph
//!   one connected component while links come and go.
//!
//! - **[`Scenario`](scenario)**: A stochastic step driver that exercises a
//!   network with random data requests, link failures, and link births, and
//!   returns a per-step event log.
//!
//! Execution is strictly single-threaded and event-driven: the dispatch
//! queue is drained to fixpoint inside every discovery, and all other
//! deliveries are synchronous call chains. Given the same seed and the same
//! sequence of calls, a simulation is bit-identical across runs.

pub mod netsim;
pub mod scenario;

mod test;
