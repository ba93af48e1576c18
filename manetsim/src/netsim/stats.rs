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

//! Module containing the per-node message counters and the network-wide
//! aggregate statistics.

/// Per-node message counters. `*_sent` counts originations, `*_recv` counts
/// receipts that were actually processed (duplicates dropped by suppression
/// do not count). `data_recv` only counts packets that arrived at their
/// final destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageStats {
    /// Route requests originated
    pub rreq_sent: usize,
    /// Route requests processed
    pub rreq_recv: usize,
    /// Route replies emitted
    pub rrep_sent: usize,
    /// Route replies received (including at intermediate hops)
    pub rrep_recv: usize,
    /// Route errors originated
    pub rerr_sent: usize,
    /// Route errors received and processed
    pub rerr_recv: usize,
    /// Data packets originated
    pub data_sent: usize,
    /// Data packets delivered to this node as final destination
    pub data_recv: usize,
}

impl MessageStats {
    /// Sum of all eight counters.
    pub fn total(&self) -> usize {
        self.rreq_sent
            + self.rreq_recv
            + self.rrep_sent
            + self.rrep_recv
            + self.rerr_sent
            + self.rerr_recv
            + self.data_sent
            + self.data_recv
    }

    pub(crate) fn add(&mut self, other: &MessageStats) {
        self.rreq_sent += other.rreq_sent;
        self.rreq_recv += other.rreq_recv;
        self.rrep_sent += other.rrep_sent;
        self.rrep_recv += other.rrep_recv;
        self.rerr_sent += other.rerr_sent;
        self.rerr_recv += other.rerr_recv;
        self.data_sent += other.data_sent;
        self.data_recv += other.data_recv;
    }
}

/// Network-wide statistics, aggregated by summing the per-node counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStats {
    /// Summed per-node counters
    pub counters: MessageStats,
    /// Total number of packets exchanged (all eight counters)
    pub total_exchanged: usize,
    /// Number of useful packets: data packets that reached their destination
    pub useful: usize,
    /// `useful / total_exchanged`, or 0 if nothing was exchanged
    pub efficiency: f64,
}

impl NetworkStats {
    pub(crate) fn from_counters(counters: MessageStats) -> Self {
        let total_exchanged = counters.total();
        let useful = counters.data_recv;
        let efficiency = if total_exchanged == 0 {
            0.0
        } else {
            useful as f64 / total_exchanged as f64
        };
        Self { counters, total_exchanged, useful, efficiency }
    }
}
