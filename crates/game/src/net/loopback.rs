use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;

use super::protocol::MAX_PACKET_SIZE;
use super::stats::NetworkStats;
use super::transport::Transport;

type Mailbox = VecDeque<(Vec<u8>, SocketAddr)>;

/// In-process datagram network for deterministic single-threaded runs.
///
/// Delivery is instant and ordered; datagrams sent to an address nobody bound
/// are dropped, like UDP.
#[derive(Debug, Clone, Default)]
pub struct LoopbackNetwork {
    mailboxes: Rc<RefCell<HashMap<SocketAddr, Mailbox>>>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, addr: SocketAddr) -> io::Result<LoopbackTransport> {
        let mut mailboxes = self.mailboxes.borrow_mut();
        if mailboxes.contains_key(&addr) {
            return Err(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("{} already bound", addr),
            ));
        }
        mailboxes.insert(addr, VecDeque::new());

        Ok(LoopbackTransport {
            network: self.clone(),
            local_addr: addr,
            stats: NetworkStats::default(),
            fail_next_send: false,
            fail_next_recv: false,
        })
    }

    /// Queue raw bytes for `to` as if they were sent by `from`.
    pub fn inject(&self, to: SocketAddr, from: SocketAddr, data: &[u8]) {
        if let Some(mailbox) = self.mailboxes.borrow_mut().get_mut(&to) {
            mailbox.push_back((data.to_vec(), from));
        }
    }

    pub fn pending(&self, addr: SocketAddr) -> usize {
        self.mailboxes
            .borrow()
            .get(&addr)
            .map_or(0, VecDeque::len)
    }
}

#[derive(Debug)]
pub struct LoopbackTransport {
    network: LoopbackNetwork,
    local_addr: SocketAddr,
    stats: NetworkStats,
    fail_next_send: bool,
    fail_next_recv: bool,
}

impl LoopbackTransport {
    /// Make the next `send_to` fail with a broken-pipe error.
    pub fn fail_next_send(&mut self) {
        self.fail_next_send = true;
    }

    /// Make the next `recv_from` fail without consuming a datagram.
    pub fn fail_next_recv(&mut self) {
        self.fail_next_recv = true;
    }
}

impl Transport for LoopbackTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> io::Result<usize> {
        if std::mem::take(&mut self.fail_next_send) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected failure"));
        }
        if data.len() > MAX_PACKET_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Packet exceeds MTU",
            ));
        }

        self.network.inject(addr, self.local_addr, data);
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += data.len() as u64;
        Ok(data.len())
    }

    fn recv_from(&mut self) -> io::Result<Option<(Vec<u8>, SocketAddr)>> {
        if std::mem::take(&mut self.fail_next_recv) {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "injected failure"));
        }
        let received = self
            .network
            .mailboxes
            .borrow_mut()
            .get_mut(&self.local_addr)
            .and_then(VecDeque::pop_front);

        if let Some((data, _)) = &received {
            self.stats.packets_received += 1;
            self.stats.bytes_received += data.len() as u64;
        }
        Ok(received)
    }

    fn stats(&self) -> &NetworkStats {
        &self.stats
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        self.network.mailboxes.borrow_mut().remove(&self.local_addr);
    }
}
