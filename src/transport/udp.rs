use super::traits::SomeIpTransport;
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::io::{Error, ErrorKind, Result};
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn new(bind_addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)?;
        Ok(UdpTransport { socket })
    }

    /// Bind with address (and, on Unix, port) reuse so several SD endpoints can
    /// share the well-known SD port on one host.
    pub fn new_multicast(bind_addr: SocketAddr) -> Result<Self> {
        let socket = Socket::new(Domain::for_address(bind_addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true)?;
        socket.bind(&bind_addr.into())?;
        Ok(UdpTransport { socket: socket.into() })
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(UdpTransport { socket: self.socket.try_clone()? })
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.socket.set_nonblocking(nonblocking)
    }

    pub fn join_multicast_v4(&self, multiaddr: &Ipv4Addr, interface: &Ipv4Addr) -> Result<()> {
        self.socket.join_multicast_v4(multiaddr, interface)
    }

    /// Outgoing interface for multicast datagrams.
    pub fn set_multicast_if_v4(&self, interface: &Ipv4Addr) -> Result<()> {
        SockRef::from(&self.socket).set_multicast_if_v4(interface)
    }

    pub fn set_multicast_loop_v4(&self, enabled: bool) -> Result<()> {
        self.socket.set_multicast_loop_v4(enabled)
    }
}

impl SomeIpTransport for UdpTransport {
    fn send(&self, data: &[u8], destination: Option<SocketAddr>) -> Result<usize> {
        match destination {
            Some(dest) => self.socket.send_to(data, dest),
            None => Err(Error::new(ErrorKind::InvalidInput, "UDP requires a destination address")),
        }
    }

    fn receive(&self, buffer: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket.recv_from(buffer)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr()
    }
}
