use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::NetError;
use crate::net::Transport;
use crate::replication::{NetEvent, ReplicationEngine, SessionStatus, TickReport};
use crate::sim::UnitWorld;

use super::input::{InputEvent, InputSource, SpawnRng};

pub trait Renderer {
    fn render(
        &mut self,
        world: &UnitWorld,
        status: &SessionStatus,
        events: &[NetEvent],
    ) -> io::Result<()>;
}

/// Fixed-tick loop: input, network, simulation, render, then sleep out the
/// rest of the tick.
pub struct GameLoop<T: Transport, I: InputSource, R: Renderer> {
    engine: ReplicationEngine<T>,
    world: UnitWorld,
    input: I,
    renderer: R,
    rng: SpawnRng,
    running: Arc<AtomicBool>,
    auto_start: bool,
}

impl<T: Transport, I: InputSource, R: Renderer> GameLoop<T, I, R> {
    pub fn new(engine: ReplicationEngine<T>, input: I, renderer: R, rng: SpawnRng) -> Self {
        Self {
            engine,
            world: UnitWorld::new(),
            input,
            renderer,
            rng,
            running: Arc::new(AtomicBool::new(true)),
            auto_start: false,
        }
    }

    /// Master only: start as soon as enough peers have joined.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn engine(&self) -> &ReplicationEngine<T> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ReplicationEngine<T> {
        &mut self.engine
    }

    pub fn world(&self) -> &UnitWorld {
        &self.world
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn run(&mut self) -> io::Result<()> {
        let tick_duration = self.engine.config().tick_duration;

        while self.running.load(Ordering::SeqCst) {
            let started = Instant::now();
            self.tick_once(tick_duration)?;

            if let Some(rest) = tick_duration.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        log::info!("{} leaving the session", self.engine.name());
        Ok(())
    }

    /// One loop iteration. Recoverable engine failures are logged and
    /// retried next tick; others stop the loop after this frame.
    pub fn tick_once(&mut self, dt: Duration) -> io::Result<Option<TickReport>> {
        for event in self.input.poll()? {
            self.handle_input(event);
        }
        if !self.running.load(Ordering::SeqCst) {
            return Ok(None);
        }

        if self.auto_start
            && self.engine.is_master()
            && !self.engine.is_started()
            && self.engine.peer_count() >= self.engine.config().min_peers_to_start
        {
            self.request_start();
        }

        let report = match self.engine.tick(dt, &mut self.world) {
            Ok(report) => Some(report),
            Err(e) if e.is_recoverable() => {
                log::warn!("network tick failed: {}", e);
                None
            }
            Err(e) => {
                log::error!("network tick failed, leaving: {}", e);
                self.running.store(false, Ordering::SeqCst);
                None
            }
        };

        let events: Vec<NetEvent> = self.engine.drain_events().collect();
        let status = self.engine.status();
        self.renderer.render(&self.world, &status, &events)?;

        Ok(report)
    }

    fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => self.running.store(false, Ordering::SeqCst),
            InputEvent::StartSession => self.request_start(),
            _ => {
                let Some(action) = event.to_action(&mut self.rng) else {
                    return;
                };
                match self.engine.originate(action, &mut self.world) {
                    Ok(()) => {}
                    Err(NetError::NotActive) => {
                        log::debug!("session not started, ignoring {}", action.kind.as_str());
                    }
                    Err(e) => log::warn!("failed to originate {}: {}", action.kind.as_str(), e),
                }
            }
        }
    }

    fn request_start(&mut self) {
        if let Err(e) = self.engine.request_start() {
            log::warn!("start broadcast failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::net::SocketAddr;

    use glam::Vec2;

    use super::*;
    use crate::net::{LoopbackNetwork, LoopbackTransport};
    use crate::replication::SessionConfig;
    use crate::session::SessionState;

    const TICK: Duration = Duration::from_micros(16_700);

    #[derive(Default)]
    struct Scripted {
        frames: VecDeque<Vec<InputEvent>>,
    }

    impl Scripted {
        fn new(frames: Vec<Vec<InputEvent>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl InputSource for Scripted {
        fn poll(&mut self) -> io::Result<Vec<InputEvent>> {
            Ok(self.frames.pop_front().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct Recorder {
        frames: usize,
        events: Vec<NetEvent>,
        last_state: Option<SessionState>,
    }

    impl Renderer for Recorder {
        fn render(
            &mut self,
            _world: &UnitWorld,
            status: &SessionStatus,
            events: &[NetEvent],
        ) -> io::Result<()> {
            self.frames += 1;
            self.events.extend_from_slice(events);
            self.last_state = Some(status.state);
            Ok(())
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn node(
        net: &LoopbackNetwork,
        port: u16,
        name: &str,
        frames: Vec<Vec<InputEvent>>,
    ) -> GameLoop<LoopbackTransport, Scripted, Recorder> {
        let transport = net.bind(addr(port)).unwrap();
        let engine = ReplicationEngine::new(transport, SessionConfig::with_name(name));
        GameLoop::new(engine, Scripted::new(frames), Recorder::default(), SpawnRng::new(5))
    }

    #[test]
    fn quit_stops_before_touching_the_network() {
        let net = LoopbackNetwork::new();
        let mut game = node(&net, 8000, "Harris", vec![vec![InputEvent::Quit]]);
        game.engine_mut().init_as_master().unwrap();

        assert_eq!(game.tick_once(TICK).unwrap(), None);
        assert!(!game.running().load(Ordering::SeqCst));
        assert_eq!(game.renderer().frames, 0);
    }

    #[test]
    fn input_before_start_is_not_applied() {
        let net = LoopbackNetwork::new();
        let at = Vec2::new(100.0, 100.0);
        let mut game = node(&net, 8000, "Harris", vec![vec![InputEvent::CreateUnit(at)]]);
        game.engine_mut().init_as_master().unwrap();

        game.tick_once(TICK).unwrap();
        assert_eq!(game.world().unit_count(), 0);
        assert!(game.engine().queued_actions().is_empty());
    }

    #[test]
    fn started_master_applies_and_queues_input() {
        let net = LoopbackNetwork::new();
        let at = Vec2::new(100.0, 100.0);
        let mut game = node(
            &net,
            8000,
            "Harris",
            vec![
                vec![InputEvent::StartSession],
                vec![InputEvent::CreateUnit(at), InputEvent::CreateRandomUnit],
            ],
        );
        game.engine_mut().init_as_master().unwrap();

        game.tick_once(TICK).unwrap();
        assert!(game.engine().is_started());
        assert!(game.renderer().events.contains(&NetEvent::StartBroadcast { peer_count: 0 }));

        game.tick_once(TICK).unwrap();
        assert_eq!(game.world().unit_count(), 2);
        assert_eq!(game.engine().queued_actions().len(), 2);
    }

    #[test]
    fn receive_failure_keeps_the_loop_running() {
        let net = LoopbackNetwork::new();
        let mut game = node(&net, 8000, "Harris", Vec::new());
        game.engine_mut().init_as_master().unwrap();
        game.engine_mut().transport_mut().fail_next_recv();

        assert_eq!(game.tick_once(TICK).unwrap(), None);
        assert!(game.running().load(Ordering::SeqCst));
        assert_eq!(game.renderer().frames, 1);

        assert!(game.tick_once(TICK).unwrap().is_some());
    }

    #[test]
    fn auto_start_waits_for_the_minimum_peers() {
        let net = LoopbackNetwork::new();
        let transport = net.bind(addr(8000)).unwrap();
        let config = SessionConfig {
            min_peers_to_start: 1,
            ..SessionConfig::with_name("Harris")
        };
        let engine = ReplicationEngine::new(transport, config);
        let mut master = GameLoop::new(engine, Scripted::default(), Recorder::default(), SpawnRng::new(1))
            .with_auto_start(true);
        master.engine_mut().init_as_master().unwrap();
        let mut peer = node(&net, 8001, "Guest", Vec::new());
        peer.engine_mut().init_as_peer(addr(8000)).unwrap();

        // First tick registers the peer; the next one starts.
        master.tick_once(TICK).unwrap();
        assert!(!master.engine().is_started());
        master.tick_once(TICK).unwrap();
        assert!(master.engine().is_started());

        peer.tick_once(TICK).unwrap();
        assert_eq!(peer.renderer().last_state, Some(SessionState::Active));
    }
}
