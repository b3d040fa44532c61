use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Duration;

use glam::Vec2;

use crate::error::NetError;
use crate::net::{
    Action, ActionBatch, ActionKind, MASTER_PLAYER_ID, NetworkStats, Packet, PacketHeader,
    PacketType, PeerIdentity, PeerInfo, PeerRegistry, PeerRole, PlayerId, Registration,
    ReplicationStats, Transport,
};
use crate::session::{SessionError, SessionEvent, SessionMachine, SessionState, Transition};
use crate::sim::Simulation;

use super::config::SessionConfig;
use super::events::NetEvent;
use super::queue::OutgoingQueue;
use super::timer::IntervalTimer;

/// What one call to [`ReplicationEngine::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub received: usize,
    pub applied: usize,
    pub malformed: usize,
    pub frozen_dropped: usize,
    pub advanced: bool,
    /// Number of actions sent, when this tick flushed.
    pub flushed: Option<usize>,
}

/// Snapshot of the local node for front ends.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub name: String,
    pub role: Option<PeerRole>,
    pub state: SessionState,
    pub started: bool,
    pub player_id: Option<PlayerId>,
    pub local_addr: SocketAddr,
    pub peer_count: usize,
    pub queued: usize,
}

/// Owns the session state, the outgoing queue and the transport, and is the
/// only path by which network traffic reaches the simulation.
pub struct ReplicationEngine<T: Transport> {
    transport: T,
    config: SessionConfig,
    session: SessionMachine,
    player_id: Option<PlayerId>,
    master_addr: Option<SocketAddr>,
    welcomed: bool,
    peers: PeerRegistry,
    outgoing: OutgoingQueue,
    flush_timer: IntervalTimer,
    hello_timer: IntervalTimer,
    send_sequence: u32,
    batch_sequence: u32,
    stats: ReplicationStats,
    pending_events: VecDeque<NetEvent>,
}

impl<T: Transport> ReplicationEngine<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            peers: PeerRegistry::new(config.max_peers),
            flush_timer: IntervalTimer::new(config.flush_interval),
            hello_timer: IntervalTimer::new(config.hello_interval),
            config,
            session: SessionMachine::new(),
            player_id: None,
            master_addr: None,
            welcomed: false,
            outgoing: OutgoingQueue::new(),
            send_sequence: 0,
            batch_sequence: 0,
            stats: ReplicationStats::default(),
            pending_events: VecDeque::new(),
        }
    }

    pub fn init_as_master(&mut self) -> Result<(), NetError> {
        self.session.apply(SessionEvent::BoundAsMaster)?;
        self.player_id = Some(MASTER_PLAYER_ID);

        log::info!(
            "{} hosting as master on {}",
            self.config.name,
            self.transport.local_addr()
        );
        Ok(())
    }

    pub fn init_as_peer(&mut self, master: SocketAddr) -> Result<(), NetError> {
        let transition = self.session.plan(SessionEvent::BoundAsPeer)?;

        self.send_hello(master)?;
        self.session.commit(transition)?;
        self.master_addr = Some(master);

        log::info!(
            "{} joining master at {} from {}, waiting for start",
            self.config.name,
            master,
            self.transport.local_addr()
        );
        Ok(())
    }

    pub fn is_master(&self) -> bool {
        self.session.is_master()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    pub fn is_started(&self) -> bool {
        self.session.is_started()
    }

    pub fn can_originate(&self) -> bool {
        self.session.can_originate()
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    pub fn master_addr(&self) -> Option<SocketAddr> {
        self.master_addr
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn queued_actions(&self) -> &[Action] {
        self.outgoing.pending()
    }

    pub fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    pub fn network_stats(&self) -> &NetworkStats {
        self.transport.stats()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = NetEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            name: self.config.name.clone(),
            role: self.session.role(),
            state: self.session.state(),
            started: self.session.is_started(),
            player_id: self.player_id,
            local_addr: self.transport.local_addr(),
            peer_count: self.peers.len(),
            queued: self.outgoing.len(),
        }
    }

    /// Queue an action for the next flush. No state check: callers decide
    /// whether they may originate actions.
    pub fn add_action(&mut self, kind: ActionKind, position: Vec2) {
        self.outgoing.add_action(kind, position);
    }

    /// Apply a locally generated action and queue it for replication, through
    /// the same boundary remote actions use.
    pub fn originate<S: Simulation>(&mut self, action: Action, sim: &mut S) -> Result<(), NetError> {
        if !self.session.can_originate() {
            return Err(NetError::NotActive);
        }
        sim.apply_action(&action);
        self.outgoing.push(action);
        Ok(())
    }

    /// Broadcast the rescue signal. Returns whether the session started; a
    /// peer asking is ignored.
    pub fn request_start(&mut self) -> Result<bool, NetError> {
        let transition = match self.session.plan(SessionEvent::StartRequested) {
            Ok(transition) => transition,
            Err(SessionError::NotMaster) => {
                log::warn!("ignoring start request: {}", NetError::IllegalStartRequest);
                return Ok(false);
            }
            Err(SessionError::AlreadyStarted) => {
                log::debug!("start requested but session already started");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        if self.peers.len() < self.config.min_peers_to_start {
            log::info!(
                "not starting: {} of {} required peers joined",
                self.peers.len(),
                self.config.min_peers_to_start
            );
            return Ok(false);
        }

        self.run_rescue_broadcast(transition)?;
        Ok(true)
    }

    fn run_rescue_broadcast(&mut self, transition: Transition) -> Result<(), NetError> {
        let peer_count = self.peers.len();
        let payload = PacketType::Start {
            peer_count: peer_count as u32,
        };
        let addrs = self.peers.addrs();

        self.broadcast(payload, &addrs)?;
        self.session.commit(transition)?;
        self.flush_timer.reset();

        log::info!("session started with {} peers", peer_count);
        self.pending_events
            .push_back(NetEvent::StartBroadcast { peer_count });
        Ok(())
    }

    /// One network service step. Inbound first, then simulation advance and
    /// flush when active.
    pub fn tick<S: Simulation>(&mut self, dt: Duration, sim: &mut S) -> Result<TickReport, NetError> {
        let mut report = TickReport::default();

        match self.session.state() {
            SessionState::Uninitialized => return Ok(report),
            SessionState::Delayed | SessionState::Active => {}
        }

        self.process_incoming(sim, &mut report)?;

        // Keep knocking until the master has both welcomed and started us. A
        // started master answers a known peer with the start signal again.
        let waiting = !self.welcomed || !self.session.is_started();
        if !self.session.is_master() && waiting && self.hello_timer.advance(dt) {
            if let Some(master) = self.master_addr {
                log::debug!("still waiting on {}, resending hello", master);
                self.send_hello(master)?;
            }
        }

        if self.session.simulation_enabled() {
            sim.advance(dt);
            report.advanced = true;

            if self.flush_timer.advance(dt) {
                report.flushed = Some(self.outgoing.len());
                self.flush()?;
            }
        }

        Ok(report)
    }

    /// Send every queued action as one batch to every known peer.
    ///
    /// The queue is consumed even if a send fails; the first failure is
    /// returned after all destinations were tried.
    pub fn flush(&mut self) -> Result<usize, NetError> {
        let actions = self.outgoing.drain();
        let count = actions.len();
        let batch = self.batch_sequence;
        self.batch_sequence = self.batch_sequence.wrapping_add(1);

        let addrs = self.peers.addrs();
        let chunk_size = self.config.max_actions_per_packet.max(1);
        // An empty queue still sends one empty batch.
        let chunks: Vec<&[Action]> = if actions.is_empty() {
            vec![&actions[..]]
        } else {
            actions.chunks(chunk_size).collect()
        };
        let mut first_error = None;

        for chunk in chunks {
            let payload = PacketType::Actions(ActionBatch {
                batch,
                actions: chunk.iter().map(|&a| a.into()).collect(),
            });
            if let Err(e) = self.broadcast(payload, &addrs) {
                first_error.get_or_insert(e);
            }
            self.stats.batches_sent += 1;
        }
        self.stats.actions_sent += count as u64;

        if count > 0 {
            log::debug!(
                "flushed batch {} with {} actions to {} peers",
                batch,
                count,
                addrs.len()
            );
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    fn process_incoming<S: Simulation>(
        &mut self,
        sim: &mut S,
        report: &mut TickReport,
    ) -> Result<(), NetError> {
        while let Some((data, from)) = self.transport.recv_from()? {
            report.received += 1;

            match Packet::deserialize(&data) {
                Ok(packet) => {
                    let kind = packet.payload.name();
                    if let Err(e) = self.handle_packet(packet, from, sim, report) {
                        log::warn!("failed to answer {} from {}: {}", kind, from, e);
                    }
                }
                Err(source) => {
                    let e = NetError::Malformed { from, source };
                    log::warn!("dropping datagram: {}", e);
                    report.malformed += 1;
                    self.stats.malformed_dropped += 1;
                }
            }
        }
        Ok(())
    }

    fn handle_packet<S: Simulation>(
        &mut self,
        packet: Packet,
        from: SocketAddr,
        sim: &mut S,
        report: &mut TickReport,
    ) -> Result<(), NetError> {
        match packet.payload {
            PacketType::Hello { name } => self.handle_hello(from, &name)?,
            PacketType::Welcome {
                player_id,
                master_name,
                peers,
            } => self.handle_welcome(from, player_id, master_name, &peers),
            PacketType::Introduce(info) => self.handle_introduce(from, &info),
            PacketType::NotMaster => {
                log::warn!("{} is not the master peer", from);
                self.pending_events
                    .push_back(NetEvent::NotMaster { addr: from });
            }
            PacketType::Denied { reason } => {
                log::error!("join denied by {}: {}", from, reason);
                self.pending_events
                    .push_back(NetEvent::JoinDenied { addr: from, reason });
            }
            PacketType::Start { peer_count } => self.handle_start(from, peer_count)?,
            PacketType::Actions(batch) => self.handle_actions(from, batch, sim, report),
        }
        Ok(())
    }

    fn handle_hello(&mut self, from: SocketAddr, name: &str) -> Result<(), NetError> {
        if !self.session.is_master() {
            return self.send_packet(PacketType::NotMaster, from);
        }

        if self.session.is_started() && !self.peers.contains_addr(&from) {
            log::warn!("refusing late join from {} ({})", name, from);
            let reason = "Session already started".to_string();
            return self.send_packet(PacketType::Denied { reason }, from);
        }

        let registration = match self.peers.register(from, name) {
            Ok(registration) => registration,
            Err(reason) => {
                log::warn!("refusing {} ({}): {}", name, from, reason);
                let reason = reason.to_string();
                return self.send_packet(PacketType::Denied { reason }, from);
            }
        };
        let player_id = registration.player_id();

        let others: Vec<PeerInfo> = self
            .peers
            .iter()
            .filter(|p| p.player_id != player_id)
            .map(PeerIdentity::to_info)
            .collect();
        let welcome = PacketType::Welcome {
            player_id,
            master_name: self.config.name.clone(),
            peers: others,
        };
        self.send_packet(welcome, from)?;

        if self.session.is_started() {
            log::info!("repeating start signal to {} ({})", name, from);
            let peer_count = self.peers.len() as u32;
            self.send_packet(PacketType::Start { peer_count }, from)?;
        }

        if let Registration::New(_) = registration {
            log::info!("{} joined from {} as player {}", name, from, player_id);
            self.pending_events.push_back(NetEvent::PeerJoined {
                player_id,
                name: name.to_string(),
                addr: from,
            });

            let introduce = PacketType::Introduce(PeerInfo {
                player_id,
                name: name.to_string(),
                addr: from.to_string(),
            });
            let existing: Vec<SocketAddr> = self
                .peers
                .iter()
                .filter(|p| p.player_id != player_id)
                .map(|p| p.addr)
                .collect();
            self.broadcast(introduce, &existing)?;
        }
        Ok(())
    }

    fn handle_welcome(
        &mut self,
        from: SocketAddr,
        player_id: PlayerId,
        master_name: String,
        peers: &[PeerInfo],
    ) {
        if self.session.is_master() || self.master_addr != Some(from) {
            log::warn!("ignoring welcome from {}", from);
            return;
        }
        if self.welcomed {
            return;
        }

        self.peers.insert(PeerIdentity {
            player_id: MASTER_PLAYER_ID,
            name: master_name.clone(),
            addr: from,
            role: PeerRole::Master,
        });
        for info in peers {
            match PeerIdentity::from_info(info, PeerRole::Peer) {
                Ok(identity) => self.peers.insert(identity),
                Err(e) => log::warn!("skipping peer {} in welcome: {}", info.name, e),
            }
        }

        self.welcomed = true;
        self.player_id = Some(player_id);

        log::info!(
            "welcomed by {} as player {} ({} other peers)",
            master_name,
            player_id,
            peers.len()
        );
        self.pending_events.push_back(NetEvent::Welcomed {
            player_id,
            master_name,
            peer_count: peers.len(),
        });
    }

    fn handle_introduce(&mut self, from: SocketAddr, info: &PeerInfo) {
        if self.session.is_master() || self.master_addr != Some(from) {
            log::warn!("ignoring introduction of {} from {}", info.name, from);
            return;
        }

        match PeerIdentity::from_info(info, PeerRole::Peer) {
            Ok(identity) => {
                log::info!("introduced to {} at {}", identity.name, identity.addr);
                self.pending_events.push_back(NetEvent::PeerIntroduced {
                    player_id: identity.player_id,
                    name: identity.name.clone(),
                    addr: identity.addr,
                });
                self.peers.insert(identity);
            }
            Err(e) => log::warn!("bad introduction from {}: {}", from, e),
        }
    }

    fn handle_start(&mut self, from: SocketAddr, peer_count: u32) -> Result<(), NetError> {
        if self.master_addr != Some(from) {
            log::warn!("ignoring start signal from non-master {}", from);
            return Ok(());
        }

        let transition = match self.session.plan(SessionEvent::RescueReceived) {
            Ok(transition) => transition,
            Err(e) => {
                log::warn!("ignoring start signal from {}: {}", from, e);
                return Ok(());
            }
        };
        self.session.commit(transition)?;

        if !self.peers.contains_addr(&from) {
            // Start overtook the welcome; the welcome fills in the name.
            self.peers.insert(PeerIdentity {
                player_id: MASTER_PLAYER_ID,
                name: String::new(),
                addr: from,
                role: PeerRole::Master,
            });
        }

        if transition.changes_state() {
            self.flush_timer.reset();
            log::info!("rescued by master: session started with {} peers", peer_count);
            self.pending_events.push_back(NetEvent::SessionStarted);
        }
        Ok(())
    }

    fn handle_actions<S: Simulation>(
        &mut self,
        from: SocketAddr,
        batch: ActionBatch,
        sim: &mut S,
        report: &mut TickReport,
    ) {
        if !self.session.simulation_enabled() {
            log::debug!("frozen: dropping batch {} from {}", batch.batch, from);
            report.frozen_dropped += 1;
            self.stats.frozen_dropped += 1;
            return;
        }
        if !self.peers.contains_addr(&from) {
            log::warn!("ignoring actions from unknown sender {}", from);
            return;
        }

        for record in batch.actions {
            sim.apply_action(&Action::from(record));
            report.applied += 1;
            self.stats.actions_applied += 1;
        }
    }

    fn send_hello(&mut self, master: SocketAddr) -> Result<(), NetError> {
        let name = self.config.name.clone();
        self.send_packet(PacketType::Hello { name }, master)
    }

    fn next_header(&mut self) -> PacketHeader {
        let sequence = self.send_sequence;
        self.send_sequence = self.send_sequence.wrapping_add(1);
        PacketHeader::new(sequence, self.player_id.unwrap_or(0))
    }

    fn send_packet(&mut self, payload: PacketType, addr: SocketAddr) -> Result<(), NetError> {
        let data = Packet::new(self.next_header(), payload).serialize()?;
        self.transport.send_to(&data, addr)?;
        Ok(())
    }

    /// Encode once and send the same message to every destination.
    fn broadcast(&mut self, payload: PacketType, addrs: &[SocketAddr]) -> Result<(), NetError> {
        if addrs.is_empty() {
            return Ok(());
        }

        let kind = payload.name();
        let data = Packet::new(self.next_header(), payload).serialize()?;
        let mut first_error = None;
        for &addr in addrs {
            if let Err(e) = self.transport.send_to(&data, addr) {
                log::warn!("send of {} to {} failed: {}", kind, addr, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
