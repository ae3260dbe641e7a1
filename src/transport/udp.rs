// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `UDP_MULTICAST` transport: one multicast socket per
//! participant for discovery traffic, joined to [`DEFAULT_MULTICAST_GROUP`].

use std::io;
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};

use super::locator::DEFAULT_MULTICAST_GROUP;
use super::ports::PortMapping;

pub struct UdpTransport {
    pub domain_id: u32,
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    /// Bind the discovery multicast socket with `SO_REUSEADDR` (so multiple
    /// participants on one host can share the discovery port) and join
    /// [`DEFAULT_MULTICAST_GROUP`].
    pub fn new(domain_id: u32, mapping: PortMapping) -> io::Result<Self> {
        let raw = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        raw.set_reuse_address(true)?;
        let bind_addr: SocketAddr = SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, mapping.discovery_port).into();
        raw.bind(&bind_addr.into())?;

        let socket: UdpSocket = raw.into();
        socket.join_multicast_v4(&DEFAULT_MULTICAST_GROUP, &std::net::Ipv4Addr::UNSPECIFIED)?;
        socket.set_multicast_loop_v4(true)?;

        log::debug!("UDP transport bound domain={domain_id} port={}", mapping.discovery_port);
        Ok(Self { domain_id, socket: Arc::new(socket) })
    }

    pub fn send_to(&self, buf: &[u8], port: u16) -> io::Result<usize> {
        self.socket.send_to(buf, SocketAddrV4::new(DEFAULT_MULTICAST_GROUP, port))
    }

    pub fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }
}
