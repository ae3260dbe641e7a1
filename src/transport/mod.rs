// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport layer: [`TransportMode::IntraProcess`] for
//! in-memory pub/sub that still runs the full discovery/QoS pipeline, and
//! [`TransportMode::UdpMulticast`] for real RTPS-over-UDP.

pub mod intra;
pub mod locator;
pub mod ports;
pub mod udp;

pub use intra::{IntraBus, IntraMessage, SharedIntraBus};
pub use locator::Locator;
pub use ports::PortMapping;
pub use udp::UdpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    IntraProcess,
    UdpMulticast,
}
