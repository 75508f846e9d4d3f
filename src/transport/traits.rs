use std::io::Result;
use std::net::SocketAddr;

/// A datagram channel SD messages are sent over.
///
/// Object-safe and `&self`-based so one socket can be shared, or replaced by a mock.
pub trait SomeIpTransport: Send + Sync {
    /// Send one datagram. UDP transports require a `destination`.
    fn send(&self, data: &[u8], destination: Option<SocketAddr>) -> Result<usize>;

    /// Returns the number of bytes read and the source address.
    fn receive(&self, buffer: &mut [u8]) -> Result<(usize, SocketAddr)>;

    fn local_addr(&self) -> Result<SocketAddr>;
}

impl<T: SomeIpTransport + ?Sized> SomeIpTransport for std::sync::Arc<T> {
    fn send(&self, data: &[u8], destination: Option<SocketAddr>) -> Result<usize> {
        (**self).send(data, destination)
    }

    fn receive(&self, buffer: &mut [u8]) -> Result<(usize, SocketAddr)> {
        (**self).receive(buffer)
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        (**self).local_addr()
    }
}
