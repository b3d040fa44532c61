use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use super::protocol::MAX_PACKET_SIZE;
use super::stats::NetworkStats;

/// Datagram boundary consumed by the replication engine.
///
/// Both directions must be non-blocking: `recv_from` returns `Ok(None)` as
/// soon as nothing is queued.
pub trait Transport {
    fn local_addr(&self) -> SocketAddr;

    fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize>;

    fn recv_from(&mut self) -> io::Result<Option<(Vec<u8>, SocketAddr)>>;

    fn stats(&self) -> &NetworkStats;
}

pub struct NetworkEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    stats: NetworkStats,
    recv_buffer: [u8; MAX_PACKET_SIZE],
}

impl NetworkEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            stats: NetworkStats::default(),
            recv_buffer: [0u8; MAX_PACKET_SIZE],
        })
    }

    /// Listening socket for the master on every interface.
    pub fn listen(port: u16) -> io::Result<Self> {
        Self::bind(("0.0.0.0", port))
    }

    /// Ephemeral socket for a peer joining a master.
    pub fn ephemeral() -> io::Result<Self> {
        Self::bind("0.0.0.0:0")
    }
}

impl Transport for NetworkEndpoint {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Packet exceeds MTU",
            ));
        }

        let bytes = self.socket.send_to(data, addr)?;

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;

        Ok(bytes)
    }

    fn recv_from(&mut self) -> io::Result<Option<(Vec<u8>, SocketAddr)>> {
        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((size, addr)) => {
                    self.stats.packets_received += 1;
                    self.stats.bytes_received += size as u64;
                    return Ok(Some((self.recv_buffer[..size].to_vec(), addr)));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                // Windows reports an ICMP port-unreachable from an earlier send
                // as a reset on the next receive.
                Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_is_non_blocking() {
        let mut endpoint = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        assert!(endpoint.recv_from().unwrap().is_none());
    }

    #[test]
    fn oversize_send_is_refused() {
        let mut endpoint = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let target = endpoint.local_addr();
        let data = vec![0u8; MAX_PACKET_SIZE + 1];

        let err = endpoint.send_to(&data, target).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(endpoint.stats().packets_sent, 0);
    }
}
